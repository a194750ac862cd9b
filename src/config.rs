//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\music-reconciler\config.toml
//! - macOS: ~/Library/Application Support/music-reconciler/config.toml
//! - Linux: ~/.config/music-reconciler/config.toml
//!
//! The config file is human-readable and editable. Every section has
//! defaults, so a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::enrichment::musicbrainz::{DEFAULT_BASE_URL, DEFAULT_REQUEST_INTERVAL};
use crate::matching::MatchThresholds;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plex server connection
    pub plex: PlexConfig,

    /// MusicBrainz search settings
    pub musicbrainz: MusicBrainzConfig,

    /// Auto-match and comparison thresholds
    pub matching: MatchingConfig,

    /// Library locations
    pub library: LibraryConfig,

    /// Rollback journal location
    pub journal: JournalConfig,
}

/// Plex server connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlexConfig {
    /// Server URL, e.g. `http://localhost:32400`
    pub url: String,

    /// X-Plex-Token (can also come from PLEX_TOKEN)
    pub token: Option<String>,

    /// Music library section key
    pub section_id: Option<String>,
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:32400".to_string(),
            token: None,
            section_id: None,
        }
    }
}

/// MusicBrainz search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicBrainzConfig {
    pub base_url: String,

    /// Minimum spacing between requests. MusicBrainz allows one per second.
    pub request_interval_ms: u64,
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_interval_ms: DEFAULT_REQUEST_INTERVAL.as_millis() as u64,
        }
    }
}

impl MusicBrainzConfig {
    /// Request spacing, never below the service's one request per second.
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms.max(1000))
    }
}

/// Thresholds (0-100)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Confidence at or above which a rename is applied without review
    pub auto_approve_threshold: u8,

    /// Confidence at or above which a rename needs review rather than manual work
    pub review_threshold: u8,

    /// Title similarity for the comparator's fuzzy fallback; unset keeps it off
    pub near_miss_threshold: Option<u8>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        let thresholds = MatchThresholds::default();
        Self {
            auto_approve_threshold: thresholds.auto_approve,
            review_threshold: thresholds.review,
            near_miss_threshold: None,
        }
    }
}

impl MatchingConfig {
    /// Matcher thresholds, clamped so review never exceeds auto-approve.
    pub fn thresholds(&self) -> MatchThresholds {
        let auto_approve = self.auto_approve_threshold.clamp(1, 100);
        MatchThresholds {
            auto_approve,
            review: self.review_threshold.clamp(1, auto_approve),
        }
    }
}

/// Library locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Base directory for local rename previews
    pub base_path: Option<PathBuf>,

    /// Root of the live (Plex) library on disk
    pub library_root: Option<PathBuf>,
}

/// Rollback journal location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Defaults to `journal.json` in the config directory
    pub path: Option<PathBuf>,
}

impl JournalConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| config_dir().map(|d| d.join("journal.json")))
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("music-reconciler"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Default session file path
pub fn session_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("session.json"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from a specific file, with the same fallbacks as [`load`].
pub fn load_from(path: &std::path::Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to a specific file
pub fn save_to(config: &Config, path: &std::path::Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
