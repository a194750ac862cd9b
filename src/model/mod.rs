//! Core data types shared by every reconciliation stage.
//!
//! - [`TrackDescriptor`] - artist/album/title plus format and bitrate
//! - [`LocalTrack`] - a scanned file and its descriptor
//! - [`RemoteTrack`] - a track reported by the live (Plex) library
//!
//! Descriptors are built through [`TrackDescriptor::new`], which trims every
//! field and replaces blank or placeholder values with [`UNKNOWN`]. The
//! matching and comparison code relies on that: an artist or title is never
//! an empty string.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sentinel stored in place of a missing artist, album or title.
pub const UNKNOWN: &str = "Unknown";

/// Placeholder values written by taggers and scanners that mean "no value".
const PLACEHOLDERS: &[&str] = &[
    "unknown",
    "unknown artist",
    "unknown album",
    "unknown title",
    "<unknown>",
];

/// Normalized description of one recording, independent of where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DescriptorFields")]
pub struct TrackDescriptor {
    pub artist: String,
    pub album: String,
    pub title: String,
    /// Lowercase canonical format name (see [`normalize_format`])
    pub format: String,
    /// Bitrate in kbps, `None` when unknown
    pub bitrate_kbps: Option<u32>,
    /// Position on the album, used only by the path template
    pub track_number: Option<u32>,
}

/// Raw wire shape; deserialization goes through the validating constructor.
#[derive(Deserialize)]
struct DescriptorFields {
    #[serde(default)]
    artist: String,
    #[serde(default)]
    album: String,
    #[serde(default)]
    title: String,
    #[serde(default, alias = "codec")]
    format: String,
    #[serde(default)]
    bitrate_kbps: Option<u32>,
    #[serde(default)]
    track_number: Option<u32>,
}

impl From<DescriptorFields> for TrackDescriptor {
    fn from(raw: DescriptorFields) -> Self {
        TrackDescriptor::new(&raw.artist, &raw.album, &raw.title, &raw.format)
            .with_bitrate(raw.bitrate_kbps)
            .with_track_number(raw.track_number)
    }
}

impl TrackDescriptor {
    /// Build a descriptor, cleaning every text field.
    pub fn new(artist: &str, album: &str, title: &str, format: &str) -> Self {
        Self {
            artist: clean_field(artist),
            album: clean_field(album),
            title: clean_field(title),
            format: normalize_format(format),
            bitrate_kbps: None,
            track_number: None,
        }
    }

    /// Set the bitrate. Zero is treated as unknown.
    pub fn with_bitrate(mut self, bitrate_kbps: Option<u32>) -> Self {
        self.bitrate_kbps = bitrate_kbps.filter(|b| *b > 0);
        self
    }

    pub fn with_track_number(mut self, track_number: Option<u32>) -> Self {
        self.track_number = track_number.filter(|n| *n > 0);
        self
    }

    pub fn has_unknown_artist(&self) -> bool {
        is_unknown(&self.artist)
    }

    pub fn has_unknown_title(&self) -> bool {
        is_unknown(&self.title)
    }

    pub fn has_unknown_album(&self) -> bool {
        is_unknown(&self.album)
    }
}

/// A file found by the local scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTrack {
    pub file_path: PathBuf,
    pub metadata: TrackDescriptor,
    /// Artist derived from the folder layout (`Artist/Album/file`)
    #[serde(default)]
    pub folder_artist: Option<String>,
}

impl LocalTrack {
    /// Create a local track, filling unknown fields from the file location.
    ///
    /// A missing artist falls back to `folder_artist`, a missing title to
    /// the file name stem.
    pub fn new(
        file_path: impl Into<PathBuf>,
        mut metadata: TrackDescriptor,
        folder_artist: Option<String>,
    ) -> Self {
        let file_path = file_path.into();
        let folder_artist = folder_artist.filter(|a| !is_unknown(a));

        if metadata.has_unknown_artist()
            && let Some(ref artist) = folder_artist
        {
            metadata.artist = clean_field(artist);
        }

        if metadata.has_unknown_title()
            && let Some(stem) = file_path.file_stem().and_then(|s| s.to_str())
        {
            metadata.title = clean_field(stem);
        }

        Self {
            file_path,
            metadata,
            folder_artist,
        }
    }

    /// Lowercase file extension, `None` when the path has none.
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.file_path)
    }

    /// File name for progress reporting.
    pub fn display_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.display().to_string())
    }
}

/// A track reported by the live library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTrack {
    #[serde(flatten)]
    pub descriptor: TrackDescriptor,
    /// File backing the track on the live library, when the server reports it
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

impl RemoteTrack {
    pub fn new(descriptor: TrackDescriptor) -> Self {
        Self {
            descriptor,
            file_path: None,
        }
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }
}

/// What should happen to a local file relative to the live library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Add,
    Replace,
    Skip,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Replace => "REPLACE",
            Self::Skip => "SKIP",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a text field carries no usable value.
pub fn is_unknown(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || PLACEHOLDERS.contains(&trimmed.to_lowercase().as_str())
}

fn clean_field(value: &str) -> String {
    if is_unknown(value) {
        UNKNOWN.to_string()
    } else {
        value.trim().to_string()
    }
}

/// Map a codec or extension name onto one canonical lowercase format.
///
/// Unrecognized names pass through lowercased; an empty name is `"unknown"`.
pub fn normalize_format(raw: &str) -> String {
    let lower = raw.trim().trim_start_matches('.').to_lowercase();
    let canonical = match lower.as_str() {
        "" => "unknown",
        "mpeg" | "mp3" | "mpga" => "mp3",
        "m4a" | "mp4" | "aac" | "he-aac" => "aac",
        "ogg" | "oga" | "vorbis" => "vorbis",
        "opus" => "opus",
        "flac" => "flac",
        "alac" => "alac",
        "wav" | "wave" | "pcm" => "wav",
        "aif" | "aiff" | "aifc" => "aiff",
        "wma" | "wmav1" | "wmav2" | "wmapro" => "wma",
        "wmalossless" => "wmalossless",
        "wv" | "wavpack" => "wv",
        "ape" => "ape",
        "dsf" | "dff" | "dsd" => "dsd",
        other => other,
    };
    canonical.to_string()
}

/// Lowercase extension of a path.
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
