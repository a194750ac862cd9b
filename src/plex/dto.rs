//! Plex Media Server API Data Transfer Objects
//!
//! These types match what the Plex library endpoints return with
//! `Accept: application/json`. Only the fields we read are declared; serde
//! ignores the rest.
//!
//! DO NOT use these types outside the plex module - convert to domain types.

use serde::{Deserialize, Serialize};

/// `GET /library/sections/{id}/all?type=10` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TracksResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: TrackContainer,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackContainer {
    pub size: Option<u32>,
    /// Absent when the section is empty
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<TrackMetadata>,
}

/// One track
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    pub rating_key: Option<String>,
    /// Track title
    pub title: Option<String>,
    /// Album title
    pub parent_title: Option<String>,
    /// Album artist
    pub grandparent_title: Option<String>,
    /// Track artist when it differs from the album artist
    pub original_title: Option<String>,
    /// Track number
    pub index: Option<u32>,
    /// Versions of the track (usually one)
    #[serde(rename = "Media", default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    /// Bitrate in kbps
    pub bitrate: Option<u32>,
    pub audio_codec: Option<String>,
    pub container: Option<String>,
    #[serde(rename = "Part", default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Part {
    /// Absolute path on the server
    pub file: Option<String>,
}

/// `GET /library/sections` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SectionsResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: SectionContainer,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SectionContainer {
    #[serde(rename = "Directory", default)]
    pub directories: Vec<Directory>,
}

/// A library section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Directory {
    pub key: String,
    pub title: String,
    /// "artist" for music sections
    #[serde(rename = "type")]
    pub kind: String,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================

#[cfg(test)]
mod contract_tests {
    use super::*;

    #[test]
    fn test_parse_track_listing() {
        let json = r#"{
            "MediaContainer": {
                "size": 1,
                "librarySectionID": 3,
                "Metadata": [{
                    "ratingKey": "1234",
                    "type": "track",
                    "title": "Song 1",
                    "parentTitle": "Album X",
                    "grandparentTitle": "Artist A",
                    "index": 4,
                    "duration": 201000,
                    "Media": [{
                        "id": 99,
                        "duration": 201000,
                        "bitrate": 320,
                        "audioChannels": 2,
                        "audioCodec": "mp3",
                        "container": "mp3",
                        "Part": [{"id": 100, "key": "/library/parts/100/file.mp3", "file": "/data/music/Artist A/Album X/04 Song 1.mp3", "size": 8040000}]
                    }]
                }]
            }
        }"#;

        let response: TracksResponse = serde_json::from_str(json).expect("Should parse tracks");

        let track = &response.media_container.metadata[0];
        assert_eq!(track.rating_key.as_deref(), Some("1234"));
        assert_eq!(track.grandparent_title.as_deref(), Some("Artist A"));
        assert_eq!(track.index, Some(4));
        assert_eq!(track.media[0].bitrate, Some(320));
        assert_eq!(track.media[0].audio_codec.as_deref(), Some("mp3"));
        assert!(track.media[0].parts[0].file.as_deref().unwrap().ends_with("04 Song 1.mp3"));
    }

    #[test]
    fn test_parse_empty_section() {
        let json = r#"{"MediaContainer": {"size": 0}}"#;
        let response: TracksResponse = serde_json::from_str(json).expect("Should parse empty");
        assert!(response.media_container.metadata.is_empty());
    }

    #[test]
    fn test_parse_sections() {
        let json = r#"{
            "MediaContainer": {
                "size": 2,
                "Directory": [
                    {"key": "1", "title": "Movies", "type": "movie", "agent": "tv.plex.agents.movie"},
                    {"key": "3", "title": "Music", "type": "artist", "agent": "tv.plex.agents.music"}
                ]
            }
        }"#;

        let response: SectionsResponse = serde_json::from_str(json).expect("Should parse sections");
        let dirs = &response.media_container.directories;
        assert_eq!(dirs.len(), 2);
        assert_eq!(dirs[1].kind, "artist");
        assert_eq!(dirs[1].key, "3");
    }
}
