//! CLI command definitions and dispatch.
//!
//! Each subcommand runs one stage of the reconcile workflow and passes its
//! output to the next through a JSON session file:
//! - `scan`: read local tags
//! - `compare`: fetch the Plex snapshot and classify local files
//! - `match`: auto-match local files against MusicBrainz
//! - `preview`, `rename`, `plan`, `move`, `rollback`: organize files

mod compare;
mod matching;
mod organize;
mod scan;
mod settings;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::session::Session;

pub use compare::cmd_compare;
pub use matching::cmd_match;
pub use organize::{cmd_move, cmd_plan, cmd_preview, cmd_rename, cmd_rollback};
pub use scan::cmd_scan;
pub use settings::cmd_config;

/// Music Reconciler CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Session file chaining the stages (default: session.json in the config dir)
    #[arg(long, global = true, env = "MUSIC_RECONCILER_SESSION")]
    pub session: Option<PathBuf>,

    /// Config file (default: config.toml in the config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory and store its tracks in the session
    Scan {
        /// Path to the directory to scan
        path: PathBuf,
    },
    /// Compare scanned tracks against the Plex library
    Compare {
        /// Plex music section key (default: config, then the first music section)
        #[arg(long)]
        section: Option<String>,
        /// Plex server URL
        #[arg(long, env = "PLEX_URL")]
        plex_url: Option<String>,
        /// Plex token
        #[arg(long, env = "PLEX_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Export the conflict report as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Auto-match scanned tracks against MusicBrainz
    Match,
    /// Preview renames for matched tracks
    Preview {
        /// Base directory of the renamed layout
        #[arg(long)]
        base: Option<PathBuf>,
    },
    /// Apply the previewed renames
    Rename {
        /// Show what would be done without moving files
        #[arg(long)]
        dry_run: bool,
    },
    /// Build a move plan into the live library
    Plan {
        /// Root of the live library on disk
        #[arg(long)]
        library_root: Option<PathBuf>,
        /// Also replace files of equal or better quality
        #[arg(long)]
        force: bool,
    },
    /// Move renamed files into the live library
    Move {
        /// Root of the live library on disk
        #[arg(long)]
        library_root: Option<PathBuf>,
        /// Also replace files of equal or better quality
        #[arg(long)]
        force: bool,
        /// Show what would be done without moving files
        #[arg(long)]
        dry_run: bool,
    },
    /// Undo the last rename or move batch
    Rollback,
    /// Show or edit the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config file actions
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the config file location and the settings in effect
    Show,
    /// Write a config file with every setting at its default
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Store the Plex server connection
    SetPlex {
        #[arg(long)]
        url: Option<String>,
        #[arg(long, hide_env_values = true)]
        token: Option<String>,
        /// Music library section key
        #[arg(long)]
        section: Option<String>,
    },
    /// Store library locations
    SetLibrary {
        /// Base directory for rename previews
        #[arg(long)]
        base_path: Option<PathBuf>,
        /// Root of the live library on disk
        #[arg(long)]
        library_root: Option<PathBuf>,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let ctx = Context::load(cli)?;

    match &cli.command {
        Commands::Scan { path } => cmd_scan(&rt, &ctx, path),
        Commands::Compare {
            section,
            plex_url,
            token,
            csv,
        } => cmd_compare(
            &rt,
            &ctx,
            section.as_deref(),
            plex_url.as_deref(),
            token.as_deref(),
            csv.as_deref(),
        ),
        Commands::Match => cmd_match(&rt, &ctx),
        Commands::Preview { base } => cmd_preview(&ctx, base.as_deref()),
        Commands::Rename { dry_run } => cmd_rename(&ctx, *dry_run),
        Commands::Plan {
            library_root,
            force,
        } => cmd_plan(&ctx, library_root.as_deref(), *force),
        Commands::Move {
            library_root,
            force,
            dry_run,
        } => cmd_move(&ctx, library_root.as_deref(), *force, *dry_run),
        Commands::Rollback => cmd_rollback(&ctx),
        Commands::Config { action } => cmd_config(&ctx, action),
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Config and file locations shared by every command.
pub(crate) struct Context {
    pub config: Config,
    pub session_path: PathBuf,
    pub config_path: Option<PathBuf>,
}

impl Context {
    fn load(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = cli.config.clone().or_else(config::config_path);
        let config = match &config_path {
            Some(path) => config::load_from(path),
            None => config::load(),
        };
        let session_path = cli
            .session
            .clone()
            .or_else(config::session_path)
            .context("Could not determine a session file location; pass --session")?;
        Ok(Self {
            config,
            session_path,
            config_path,
        })
    }

    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        self.config_path
            .clone()
            .context("Could not determine a config file location; pass --config")
    }

    pub fn load_session(&self) -> anyhow::Result<Session> {
        Ok(Session::load(&self.session_path)?)
    }

    pub fn save_session(&self, session: &mut Session) -> anyhow::Result<()> {
        session.save(&self.session_path)?;
        Ok(())
    }

    pub fn journal_path(&self) -> anyhow::Result<PathBuf> {
        self.config
            .journal
            .resolved_path()
            .context("Could not determine a journal location; set [journal] path in the config")
    }
}

/// First of an explicit value and a configured fallback.
pub(crate) fn required_path(
    explicit: Option<&Path>,
    configured: Option<&PathBuf>,
    what: &str,
) -> anyhow::Result<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| configured.cloned())
        .with_context(|| format!("No {} given and none configured", what))
}
