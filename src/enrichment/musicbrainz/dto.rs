//! MusicBrainz API Data Transfer Objects
//!
//! These types match EXACTLY what the MusicBrainz API returns.
//! DO NOT add fields that aren't in the API response.
//! DO NOT use these types outside the musicbrainz module - convert to domain types.
//!
//! API Reference: https://musicbrainz.org/doc/MusicBrainz_API/Search
//!
//! We use the /recording search endpoint with a Lucene query built from the
//! local artist, album and title.

use serde::{Deserialize, Serialize};

/// Recording search response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    /// Total hits for the query
    pub count: Option<u32>,
    /// Offset of this page
    pub offset: Option<u32>,
    /// Recordings on this page, best first
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

/// One recording hit
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Recording {
    /// MusicBrainz recording ID
    pub id: String,
    /// Search relevance (0-100)
    pub score: Option<u8>,
    /// Track title
    pub title: String,
    /// Duration in milliseconds
    pub length: Option<u64>,
    /// Artist credits
    #[serde(default)]
    pub artist_credit: Vec<ArtistCredit>,
    /// Releases this recording appears on
    #[serde(default)]
    pub releases: Vec<Release>,
}

/// Artist credit (can be multiple for collaborations)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistCredit {
    /// The artist
    pub artist: Artist,
    /// How this artist is credited (may differ from official name)
    pub name: Option<String>,
    /// Join phrase (e.g., " & ", " feat. ")
    pub joinphrase: Option<String>,
}

/// Artist info
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Artist {
    /// MusicBrainz artist ID
    pub id: String,
    /// Official artist name
    pub name: String,
    /// Sort name (e.g., "Beatles, The")
    pub sort_name: Option<String>,
}

/// Release (album/single/EP)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Release {
    /// MusicBrainz release ID
    pub id: String,
    /// Release title
    pub title: String,
    /// Release status (Official, Bootleg, etc.)
    pub status: Option<String>,
    /// Release date (YYYY, YYYY-MM, or YYYY-MM-DD)
    pub date: Option<String>,
    /// Release group (groups same album across editions)
    pub release_group: Option<ReleaseGroup>,
    /// Media (discs) holding this recording
    #[serde(default)]
    pub media: Vec<Medium>,
}

/// Release group (e.g., "Abbey Road" across all editions)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseGroup {
    /// MusicBrainz release group ID
    pub id: String,
    /// Primary type (Album, Single, EP, etc.)
    pub primary_type: Option<String>,
}

/// Medium (disc) within a release
///
/// Search results list only the track matching the recording, under `track`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Medium {
    /// Position in release (disc number)
    pub position: Option<u32>,
    /// Format (CD, Vinyl, Digital, etc.)
    pub format: Option<String>,
    /// Number of tracks
    pub track_count: Option<u32>,
    /// Matching tracks on this medium
    #[serde(default)]
    pub track: Vec<Track>,
}

/// Track on a medium
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Track {
    /// MusicBrainz track ID
    pub id: Option<String>,
    /// Track number (may include disc prefix like "1-5" or vinyl side "A3")
    pub number: Option<String>,
    /// Track title (may differ from recording title)
    pub title: Option<String>,
    /// Track length in milliseconds
    pub length: Option<u64>,
}

/// Error response from MusicBrainz API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: String,
    pub help: Option<String>,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================

#[cfg(test)]
mod contract_tests {
    use super::*;

    /// Test parsing an empty search page
    #[test]
    fn test_parse_empty_search() {
        let json = r#"{"created":"2024-01-01T00:00:00.000Z","count":0,"offset":0,"recordings":[]}"#;

        let response: SearchResponse =
            serde_json::from_str(json).expect("Should parse empty search");

        assert_eq!(response.count, Some(0));
        assert!(response.recordings.is_empty());
    }

    /// Test parsing a recording hit with releases and media
    #[test]
    fn test_parse_recording_hit() {
        let json = r#"{
            "count": 1,
            "offset": 0,
            "recordings": [{
                "id": "rec-123",
                "score": 100,
                "title": "Bohemian Rhapsody",
                "length": 354000,
                "artist-credit": [{
                    "name": "Queen",
                    "artist": {"id": "art-123", "name": "Queen", "sort-name": "Queen"}
                }],
                "releases": [{
                    "id": "rel-123",
                    "title": "A Night at the Opera",
                    "status": "Official",
                    "date": "1975-11-21",
                    "release-group": {"id": "rg-1", "primary-type": "Album"},
                    "media": [{
                        "position": 1,
                        "format": "CD",
                        "track-count": 12,
                        "track-offset": 10,
                        "track": [{"id": "trk-1", "number": "11", "title": "Bohemian Rhapsody", "length": 354000}]
                    }]
                }]
            }]
        }"#;

        let response: SearchResponse =
            serde_json::from_str(json).expect("Should parse recording hit");

        let rec = &response.recordings[0];
        assert_eq!(rec.score, Some(100));
        assert_eq!(rec.artist_credit[0].artist.name, "Queen");
        let release = &rec.releases[0];
        assert_eq!(
            release.release_group.as_ref().unwrap().primary_type.as_deref(),
            Some("Album")
        );
        assert_eq!(release.media[0].track[0].number.as_deref(), Some("11"));
    }

    /// Test parsing error response
    #[test]
    fn test_parse_error_response() {
        let json = r#"{
            "error": "Invalid query",
            "help": "For usage, please see: https://musicbrainz.org/doc/MusicBrainz_API"
        }"#;

        let error: ApiError = serde_json::from_str(json).expect("Should parse error");
        assert_eq!(error.error, "Invalid query");
        assert!(error.help.is_some());
    }
}
