//! Adapter layer: Convert Plex DTOs to domain models
//!
//! This is the ONLY place where Plex DTO types are converted to domain types.

use std::path::PathBuf;

use super::dto;
use crate::model::{RemoteTrack, TrackDescriptor};
use crate::quality::QualityRank;

/// Convert a section listing into remote tracks, keeping Plex's order.
pub fn to_remote_tracks(response: dto::TracksResponse) -> Vec<RemoteTrack> {
    response
        .media_container
        .metadata
        .into_iter()
        .map(to_remote_track)
        .collect()
}

/// Convert one track.
///
/// The track artist wins over the album artist. When Plex holds several
/// versions of a track, the best quality one describes it.
pub fn to_remote_track(track: dto::TrackMetadata) -> RemoteTrack {
    let artist = track
        .original_title
        .as_deref()
        .or(track.grandparent_title.as_deref())
        .unwrap_or_default();

    let versions: Vec<(TrackDescriptor, Option<PathBuf>)> = track
        .media
        .iter()
        .map(|media| {
            let codec = media
                .audio_codec
                .as_deref()
                .or(media.container.as_deref())
                .unwrap_or_default();
            let descriptor = TrackDescriptor::new(
                artist,
                track.parent_title.as_deref().unwrap_or_default(),
                track.title.as_deref().unwrap_or_default(),
                codec,
            )
            .with_bitrate(media.bitrate)
            .with_track_number(track.index);
            let file = media
                .parts
                .iter()
                .find_map(|p| p.file.as_deref())
                .map(PathBuf::from);
            (descriptor, file)
        })
        .collect();

    let best = versions
        .into_iter()
        .enumerate()
        // ties keep the first version
        .max_by_key(|(idx, (d, _))| (QualityRank::of(d), std::cmp::Reverse(*idx)))
        .map(|(_, version)| version);

    match best {
        Some((descriptor, file)) => RemoteTrack {
            descriptor,
            file_path: file,
        },
        None => RemoteTrack::new(
            TrackDescriptor::new(
                artist,
                track.parent_title.as_deref().unwrap_or_default(),
                track.title.as_deref().unwrap_or_default(),
                "",
            )
            .with_track_number(track.index),
        ),
    }
}

/// Keys and titles of the music sections.
pub fn music_sections(response: dto::SectionsResponse) -> Vec<(String, String)> {
    response
        .media_container
        .directories
        .into_iter()
        .filter(|d| d.kind == "artist")
        .map(|d| (d.key, d.title))
        .collect()
}
