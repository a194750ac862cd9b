//! Test utilities and fixtures for music-reconciler tests.
//!
//! Factories for the core records so tests can state only the fields they
//! care about.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{local_track, remote_track};
//!
//! #[test]
//! fn test_something() {
//!     let offline = local_track("/in/a.flac", "Artist", "Album", "Song", "flac", None);
//!     let remote = remote_track("artist", "Album", "song", "mp3", Some(320));
//!     // ... test logic
//! }
//! ```

use crate::enrichment::CanonicalCandidate;
use crate::matching::{MatchCategory, MatchResult};
use crate::model::{LocalTrack, RemoteTrack, TrackDescriptor};

/// Creates a scanned track at `path`.
pub fn local_track(
    path: &str,
    artist: &str,
    album: &str,
    title: &str,
    format: &str,
    bitrate_kbps: Option<u32>,
) -> LocalTrack {
    LocalTrack::new(
        path,
        TrackDescriptor::new(artist, album, title, format).with_bitrate(bitrate_kbps),
        None,
    )
}

/// Creates a live library track without a file path.
pub fn remote_track(
    artist: &str,
    album: &str,
    title: &str,
    format: &str,
    bitrate_kbps: Option<u32>,
) -> RemoteTrack {
    RemoteTrack::new(TrackDescriptor::new(artist, album, title, format).with_bitrate(bitrate_kbps))
}

/// Creates a search candidate with a perfect provider score.
pub fn candidate(artist: &str, album: &str, title: &str) -> CanonicalCandidate {
    CanonicalCandidate::new(artist, Some(album), title, 100)
}

/// Creates a match result without running the matcher.
pub fn match_result(
    original: LocalTrack,
    candidate: Option<CanonicalCandidate>,
    confidence: u8,
    category: MatchCategory,
) -> MatchResult {
    MatchResult {
        original,
        candidate,
        confidence,
        category,
        reason: None,
    }
}
