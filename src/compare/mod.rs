//! Local-vs-live library comparison.
//!
//! Every offline track is looked up in the remote snapshot and classified:
//!
//! | Situation | Category | Recommendation |
//! |---|---|---|
//! | no remote match | `SAFE_TO_ADD` | ADD |
//! | offline is better | `QUALITY_UPGRADE` | REPLACE |
//! | remote is better | `QUALITY_DOWNGRADE` | SKIP |
//! | equal quality | `SAME_QUALITY_DUPLICATE` | SKIP |
//!
//! `SAFE_TO_ADD` tracks are only counted; the report itemizes the other three
//! categories so output stays bounded for large libraries.
//!
//! The remote set is indexed by normalized (artist, title), so a comparison
//! is linear in the size of both sets.

pub mod report;

use serde::Serialize;
use std::collections::HashMap;

use crate::matching::fingerprint::{IdentityKey, same_album, title_similarity};
use crate::matching::normalize::normalize_artist;
use crate::model::{Action, LocalTrack, RemoteTrack, TrackDescriptor};
use crate::progress::{BatchStats, CancelFlag, ProgressEvent, ProgressSink, progress_event};
use crate::quality::{self, QualityComparison};

pub use report::{export_csv, write_csv};

/// Classification of one offline track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictCategory {
    SafeToAdd,
    QualityUpgrade,
    QualityDowngrade,
    SameQualityDuplicate,
}

impl ConflictCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SafeToAdd => "SAFE_TO_ADD",
            Self::QualityUpgrade => "QUALITY_UPGRADE",
            Self::QualityDowngrade => "QUALITY_DOWNGRADE",
            Self::SameQualityDuplicate => "SAME_QUALITY_DUPLICATE",
        }
    }

    pub fn recommendation(&self) -> Action {
        match self {
            Self::SafeToAdd => Action::Add,
            Self::QualityUpgrade => Action::Replace,
            Self::QualityDowngrade | Self::SameQualityDuplicate => Action::Skip,
        }
    }
}

/// Category for an offline track given its remote match, if any.
pub fn classify(local: &TrackDescriptor, remote: Option<&TrackDescriptor>) -> ConflictCategory {
    let Some(remote) = remote else {
        return ConflictCategory::SafeToAdd;
    };
    match quality::compare(local, remote) {
        QualityComparison::ABetter => ConflictCategory::QualityUpgrade,
        QualityComparison::BBetter => ConflictCategory::QualityDowngrade,
        QualityComparison::SameQuality => ConflictCategory::SameQualityDuplicate,
    }
}

/// One offline track paired with the remote track it collides with.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictRecord {
    pub local: LocalTrack,
    pub remote: Option<RemoteTrack>,
    pub category: ConflictCategory,
    pub recommendation: Action,
}

/// Per-category counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub safe_to_add: usize,
    pub quality_upgrade: usize,
    pub quality_downgrade: usize,
    pub same_quality_duplicate: usize,
}

impl CategoryCounts {
    fn bump(&mut self, category: ConflictCategory) {
        match category {
            ConflictCategory::SafeToAdd => self.safe_to_add += 1,
            ConflictCategory::QualityUpgrade => self.quality_upgrade += 1,
            ConflictCategory::QualityDowngrade => self.quality_downgrade += 1,
            ConflictCategory::SameQualityDuplicate => self.same_quality_duplicate += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.safe_to_add + self.quality_upgrade + self.quality_downgrade + self.same_quality_duplicate
    }
}

/// Result of comparing an offline collection against the live library.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonReport {
    pub counts: CategoryCounts,
    /// Upgrades, downgrades and duplicates, in offline order
    pub conflicts: Vec<ConflictRecord>,
    pub processed: usize,
    pub total: usize,
    pub cancelled: bool,
}

impl ComparisonReport {
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed)
    }

    /// Conflicts of a single category.
    pub fn conflicts_in(&self, category: ConflictCategory) -> impl Iterator<Item = &ConflictRecord> {
        self.conflicts.iter().filter(move |c| c.category == category)
    }
}

/// Lookup structure over a remote snapshot.
pub struct RemoteIndex<'a> {
    tracks: &'a [RemoteTrack],
    by_identity: HashMap<IdentityKey, Vec<usize>>,
    by_artist: HashMap<String, Vec<usize>>,
    near_miss_threshold: Option<u8>,
}

impl<'a> RemoteIndex<'a> {
    /// Index tracks by identity. Tracks with unknown artist or title are
    /// unreachable: they can never match.
    pub fn new(tracks: &'a [RemoteTrack]) -> Self {
        let mut by_identity: HashMap<IdentityKey, Vec<usize>> = HashMap::new();
        let mut by_artist: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, track) in tracks.iter().enumerate() {
            if let Some(key) = IdentityKey::of(&track.descriptor) {
                by_artist.entry(key.artist.clone()).or_default().push(idx);
                by_identity.entry(key).or_default().push(idx);
            }
        }

        Self {
            tracks,
            by_identity,
            by_artist,
            near_miss_threshold: None,
        }
    }

    /// Also accept same-artist titles whose similarity (0-100) reaches
    /// `threshold` when there is no exact identity.
    pub fn with_near_miss_threshold(mut self, threshold: Option<u8>) -> Self {
        self.near_miss_threshold = threshold;
        self
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Best remote match for a descriptor.
    ///
    /// Among several identical identities the one on the same album wins,
    /// otherwise the first in snapshot order.
    pub fn find(&self, local: &TrackDescriptor) -> Option<&'a RemoteTrack> {
        let key = IdentityKey::of(local)?;

        if let Some(indices) = self.by_identity.get(&key) {
            let best = indices
                .iter()
                .map(|&i| &self.tracks[i])
                .find(|t| same_album(local, &t.descriptor))
                .or_else(|| indices.first().map(|&i| &self.tracks[i]));
            if best.is_some() {
                return best;
            }
        }

        self.find_near_miss(local)
    }

    fn find_near_miss(&self, local: &TrackDescriptor) -> Option<&'a RemoteTrack> {
        let threshold = f64::from(self.near_miss_threshold?) / 100.0;
        let indices = self.by_artist.get(&normalize_artist(&local.artist))?;

        let mut best: Option<(usize, f64)> = None;
        for &idx in indices {
            let similarity = title_similarity(local, &self.tracks[idx].descriptor);
            if similarity >= threshold && best.is_none_or(|(_, s)| similarity > s) {
                best = Some((idx, similarity));
            }
        }

        best.map(|(idx, _)| &self.tracks[idx])
    }
}

/// Compares offline collections against a remote snapshot.
#[derive(Debug, Clone, Default)]
pub struct LibraryComparator {
    /// Optional fuzzy fallback for titles; `None` keeps matching exact
    pub near_miss_threshold: Option<u8>,
}

impl LibraryComparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_near_miss_threshold(threshold: Option<u8>) -> Self {
        Self {
            near_miss_threshold: threshold,
        }
    }

    /// Classify every offline track.
    ///
    /// Stops between tracks when `cancel` is set; the report then covers the
    /// processed prefix and is flagged `cancelled`.
    pub fn compare(
        &self,
        offline: &[LocalTrack],
        remote: &[RemoteTrack],
        progress: &mut impl ProgressSink,
        cancel: &CancelFlag,
    ) -> ComparisonReport {
        tracing::info!(
            offline = offline.len(),
            remote = remote.len(),
            "Comparing offline tracks against live library"
        );

        let index = RemoteIndex::new(remote).with_near_miss_threshold(self.near_miss_threshold);
        let mut report = ComparisonReport {
            total: offline.len(),
            ..Default::default()
        };

        for local in offline {
            if cancel.is_cancelled() {
                report.cancelled = true;
                tracing::info!(
                    processed = report.processed,
                    remaining = report.remaining(),
                    "Comparison cancelled"
                );
                break;
            }

            let matched = index.find(&local.metadata);
            let category = classify(&local.metadata, matched.map(|r| &r.descriptor));
            report.counts.bump(category);

            if category != ConflictCategory::SafeToAdd {
                tracing::debug!(
                    file = %local.file_path.display(),
                    category = category.as_str(),
                    "Conflict found"
                );
                report.conflicts.push(ConflictRecord {
                    local: local.clone(),
                    remote: matched.cloned(),
                    category,
                    recommendation: category.recommendation(),
                });
            }

            report.processed += 1;
            progress.emit(progress_event(
                report.processed,
                report.total,
                Some(local.display_name()),
            ));
        }

        progress.emit(ProgressEvent::Complete {
            stats: report.stats(),
        });

        tracing::info!(
            safe_to_add = report.counts.safe_to_add,
            upgrades = report.counts.quality_upgrade,
            downgrades = report.counts.quality_downgrade,
            duplicates = report.counts.same_quality_duplicate,
            "Comparison finished"
        );

        report
    }
}

impl ComparisonReport {
    /// Counters for the terminal progress event.
    pub fn stats(&self) -> BatchStats {
        let mut stats = BatchStats::new(self.total);
        stats.processed = self.processed;
        stats.cancelled = self.cancelled;
        for (category, count) in [
            (ConflictCategory::SafeToAdd, self.counts.safe_to_add),
            (ConflictCategory::QualityUpgrade, self.counts.quality_upgrade),
            (ConflictCategory::QualityDowngrade, self.counts.quality_downgrade),
            (ConflictCategory::SameQualityDuplicate, self.counts.same_quality_duplicate),
        ] {
            stats.counts.insert(category.as_str().to_string(), count);
        }
        stats
    }
}

/// Compare with exact matching and no progress reporting.
pub fn compare_libraries(offline: &[LocalTrack], remote: &[RemoteTrack]) -> ComparisonReport {
    LibraryComparator::new().compare(offline, remote, &mut crate::progress::NoProgress, &CancelFlag::new())
}


/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use crate::test_utils::{local_track, remote_track};
    use proptest::prelude::*;

    fn track_fields() -> impl Strategy<Value = (String, String, String, Option<u32>)> {
        (
            prop::sample::select(vec!["Artist A", "artist a", "Artist B", ""]),
            prop::sample::select(vec!["Song 1", "song 1 (Live)", "Song 2", ""]),
            prop::sample::select(vec!["flac", "mp3", "aac"]),
            proptest::option::of(prop::sample::select(vec![128u32, 256, 320])),
        )
            .prop_map(|(a, t, f, b)| (a.to_string(), t.to_string(), f.to_string(), b))
    }

    proptest! {
        /// Category counts always sum to the number of offline tracks, and
        /// every non-SAFE_TO_ADD track is itemized exactly once
        #[test]
        fn classification_partitions_offline_tracks(
            offline in prop::collection::vec(track_fields(), 0..20),
            remote in prop::collection::vec(track_fields(), 0..20),
        ) {
            let offline: Vec<_> = offline
                .into_iter()
                .enumerate()
                .map(|(i, (a, t, f, b))| local_track(&format!("/in/{}.{}", i, f), &a, "Album", &t, &f, b))
                .collect();
            let remote: Vec<_> = remote
                .into_iter()
                .map(|(a, t, f, b)| remote_track(&a, "Album", &t, &f, b))
                .collect();

            let report = compare_libraries(&offline, &remote);

            prop_assert_eq!(report.counts.total(), offline.len());
            prop_assert_eq!(report.counts.safe_to_add + report.conflicts.len(), offline.len());
            prop_assert!(report.conflicts.iter().all(|c| c.category != ConflictCategory::SafeToAdd));
        }
    }
}
