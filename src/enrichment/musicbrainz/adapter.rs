//! Adapter layer: Convert MusicBrainz DTOs to domain models
//!
//! This is the ONLY place where DTO types are converted to domain types.
//! This isolates API changes - if MusicBrainz changes their response format,
//! only this file and dto.rs need to change.

use super::dto;
use crate::enrichment::domain::{CanonicalCandidate, EnrichmentSource};
use crate::model::TrackDescriptor;

/// Convert a search page into candidates, keeping the provider's order.
pub fn to_candidates(response: dto::SearchResponse) -> Vec<CanonicalCandidate> {
    response.recordings.into_iter().map(to_candidate).collect()
}

/// Convert one recording hit into a candidate
pub fn to_candidate(recording: dto::Recording) -> CanonicalCandidate {
    let artist = build_artist_string(&recording.artist_credit).unwrap_or_default();
    let release = pick_release(&recording.releases);

    let album = release.map(|r| r.title.as_str()).unwrap_or_default();
    let track_number = release.and_then(track_number_of);

    CanonicalCandidate {
        descriptor: TrackDescriptor::new(&artist, album, &recording.title, "")
            .with_track_number(track_number),
        provider_score: recording.score.unwrap_or(0).min(100),
        recording_id: Some(recording.id),
        release_id: release.map(|r| r.id.clone()),
        source: EnrichmentSource::MusicBrainz,
    }
}

/// Build a combined artist string from artist credits
fn build_artist_string(credits: &[dto::ArtistCredit]) -> Option<String> {
    if credits.is_empty() {
        return None;
    }

    let mut result = String::new();
    for credit in credits {
        // Use credited name if available, otherwise official name
        let name = credit.name.as_ref().unwrap_or(&credit.artist.name);
        result.push_str(name);

        if let Some(ref join) = credit.joinphrase {
            result.push_str(join);
        }
    }

    Some(result)
}

/// Prefer official albums, then any official release, then the first one.
fn pick_release(releases: &[dto::Release]) -> Option<&dto::Release> {
    let is_official = |r: &&dto::Release| r.status.as_deref() == Some("Official");

    releases
        .iter()
        .filter(is_official)
        .find(|r| {
            r.release_group
                .as_ref()
                .and_then(|rg| rg.primary_type.as_deref())
                == Some("Album")
        })
        .or_else(|| releases.iter().find(is_official))
        .or_else(|| releases.first())
}

/// Track number of the matching track, when it is plain numeric.
fn track_number_of(release: &dto::Release) -> Option<u32> {
    release
        .media
        .iter()
        .flat_map(|m| m.track.iter())
        .find_map(|t| t.number.as_deref())
        .and_then(|n| n.rsplit('-').next())
        .and_then(|n| n.trim().parse().ok())
}
