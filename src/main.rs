//! Music Reconciler - match an offline music collection against a live
//! Plex library, rename it from canonical metadata and move it in safely.
//!
//! The workflow runs as a sequence of CLI stages: scan, compare, match,
//! preview, rename, plan, move and rollback.

pub mod cli;
pub mod compare;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod matching;
pub mod metadata;
pub mod model;
pub mod organizer;
pub mod plex;
pub mod progress;
pub mod quality;
pub mod scanner;
pub mod session;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("music_reconciler=info".parse()?))
        .init();

    cli::run_command(&args)
}
