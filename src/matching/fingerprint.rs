//! Track identity matching.
//!
//! Two descriptors refer to the same recording when their normalized artist
//! AND normalized title are identical. Album never rejects a pair; it only
//! breaks ties and adds to the score.
//!
//! Failing to match is the safe direction here: a false positive can turn
//! into a REPLACE that deletes a file, a false negative only produces an ADD
//! that the user sees in the plan.

use strsim::normalized_levenshtein;

use super::normalize::{normalize_album, normalize_artist, normalize_title};
use crate::model::TrackDescriptor;

/// Lowest score an exact artist+title identity can get.
pub const EXACT_IDENTITY_SCORE: u8 = 90;

/// Ceiling for anything that is not an exact identity.
const FUZZY_CEILING: u8 = EXACT_IDENTITY_SCORE - 1;

const ARTIST_WEIGHT: f64 = 0.45;
const TITLE_WEIGHT: f64 = 0.45;
const ALBUM_WEIGHT: f64 = 0.10;

/// Normalized (artist, title) pair used as a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub artist: String,
    pub title: String,
}

impl IdentityKey {
    /// Key for a descriptor, `None` when artist or title is unknown.
    pub fn of(descriptor: &TrackDescriptor) -> Option<Self> {
        if descriptor.has_unknown_artist() || descriptor.has_unknown_title() {
            return None;
        }
        let artist = normalize_artist(&descriptor.artist);
        let title = normalize_title(&descriptor.title);
        if artist.is_empty() || title.is_empty() {
            return None;
        }
        Some(Self { artist, title })
    }
}

/// Whether two descriptors are the same recording.
///
/// Unknown artists or titles never match anything.
pub fn matches(local: &TrackDescriptor, remote: &TrackDescriptor) -> bool {
    match (IdentityKey::of(local), IdentityKey::of(remote)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Whether both albums are known and equal after normalization.
pub fn same_album(a: &TrackDescriptor, b: &TrackDescriptor) -> bool {
    !a.has_unknown_album()
        && !b.has_unknown_album()
        && normalize_album(&a.album) == normalize_album(&b.album)
}

/// Similarity of two titles (0.0 - 1.0) after normalization.
pub fn title_similarity(a: &TrackDescriptor, b: &TrackDescriptor) -> f64 {
    if a.has_unknown_title() || b.has_unknown_title() {
        return 0.0;
    }
    normalized_levenshtein(&normalize_title(&a.title), &normalize_title(&b.title))
}

fn artist_similarity(a: &TrackDescriptor, b: &TrackDescriptor) -> f64 {
    if a.has_unknown_artist() || b.has_unknown_artist() {
        return 0.0;
    }
    normalized_levenshtein(&normalize_artist(&a.artist), &normalize_artist(&b.artist))
}

fn album_similarity(a: &TrackDescriptor, b: &TrackDescriptor) -> f64 {
    if a.has_unknown_album() || b.has_unknown_album() {
        return 0.0;
    }
    normalized_levenshtein(&normalize_album(&a.album), &normalize_album(&b.album))
}

/// Confidence (0-100) that `candidate` is the same recording as `local`.
///
/// An exact identity scores 90 plus up to 10 for album agreement. Anything
/// else is a weighted similarity capped at 89, so only an exact identity can
/// reach the auto-approve band.
pub fn score(local: &TrackDescriptor, candidate: &TrackDescriptor) -> u8 {
    let album = album_similarity(local, candidate);

    if matches(local, candidate) {
        let bonus = (album * 10.0).round() as u8;
        return EXACT_IDENTITY_SCORE.saturating_add(bonus).min(100);
    }

    let weighted = ARTIST_WEIGHT * artist_similarity(local, candidate)
        + TITLE_WEIGHT * title_similarity(local, candidate)
        + ALBUM_WEIGHT * album;

    ((weighted * 100.0).round() as u8).min(FUZZY_CEILING)
}
