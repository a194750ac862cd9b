//! Internal domain models for canonical-metadata search.
//!
//! These types are OUR types - they don't change when external APIs change.
//! Provider responses get converted into these types via adapters.

use serde::{Deserialize, Serialize};

use crate::model::{TrackDescriptor, UNKNOWN};

/// What we ask a canonical-metadata provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub artist: String,
    pub album: Option<String>,
    pub title: Option<String>,
}

impl SearchQuery {
    /// Build a query from a local descriptor, dropping unknown fields.
    ///
    /// Returns `None` when there is nothing worth searching for.
    pub fn from_descriptor(descriptor: &TrackDescriptor) -> Option<Self> {
        let artist_known = !descriptor.has_unknown_artist();
        let title_known = !descriptor.has_unknown_title();
        if !artist_known && !title_known {
            return None;
        }

        Some(Self {
            artist: if artist_known {
                descriptor.artist.clone()
            } else {
                String::new()
            },
            album: (!descriptor.has_unknown_album()).then(|| descriptor.album.clone()),
            title: title_known.then(|| descriptor.title.clone()),
        })
    }
}

/// One candidate returned by a canonical-metadata provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalCandidate {
    /// Canonical artist/album/title/track number (format is unknown)
    pub descriptor: TrackDescriptor,
    /// Provider-assigned confidence (0-100)
    pub provider_score: u8,
    /// MusicBrainz recording ID (if available)
    #[serde(default)]
    pub recording_id: Option<String>,
    /// MusicBrainz release (album) ID
    #[serde(default)]
    pub release_id: Option<String>,
    pub source: EnrichmentSource,
}

impl CanonicalCandidate {
    pub fn new(artist: &str, album: Option<&str>, title: &str, provider_score: u8) -> Self {
        Self {
            descriptor: TrackDescriptor::new(artist, album.unwrap_or(UNKNOWN), title, ""),
            provider_score: provider_score.min(100),
            recording_id: None,
            release_id: None,
            source: EnrichmentSource::MusicBrainz,
        }
    }
}

/// Source of enrichment data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentSource {
    MusicBrainz,
}

/// Errors that can occur while talking to external providers
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnrichmentError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Unauthorized - check the configured token")]
    Unauthorized,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}
