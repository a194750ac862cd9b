//! Auto-match: pick the best canonical candidate for each scanned file.
//!
//! For every file the search provider is queried with the local artist,
//! album and title. Each returned candidate is scored with
//! [`fingerprint::score`](super::fingerprint::score), the highest score wins
//! (ties go to the earlier candidate, i.e. the provider's ranking), and the
//! score decides the category:
//!
//! | Confidence | Category |
//! |---|---|
//! | >= 90 | `auto_approve` |
//! | 70 - 89 | `review` |
//! | 1 - 69 | `manual` |
//! | 0 or no candidates | `no_match` |
//!
//! A failed search marks that file `error`; a file with neither artist nor
//! title is `skipped` without calling the provider. Neither stops the batch.

use serde::{Deserialize, Serialize};

use super::fingerprint;
use crate::enrichment::{CanonicalCandidate, CanonicalSearch, EnrichmentError, SearchQuery};
use crate::model::LocalTrack;
use crate::progress::{BatchStats, CancelFlag, ProgressEvent, ProgressSink, progress_event};

/// Confidence category of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchCategory {
    AutoApprove,
    Review,
    Manual,
    Skipped,
    Error,
    NoMatch,
}

impl MatchCategory {
    pub const ALL: [MatchCategory; 6] = [
        Self::AutoApprove,
        Self::Review,
        Self::Manual,
        Self::Skipped,
        Self::Error,
        Self::NoMatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoApprove => "auto_approve",
            Self::Review => "review",
            Self::Manual => "manual",
            Self::Skipped => "skipped",
            Self::Error => "error",
            Self::NoMatch => "no_match",
        }
    }

    /// Whether files in this category may be renamed automatically.
    pub fn is_renamable(&self) -> bool {
        matches!(self, Self::AutoApprove | Self::Review)
    }
}

/// Confidence cut-offs (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchThresholds {
    pub auto_approve: u8,
    pub review: u8,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            auto_approve: 90,
            review: 70,
        }
    }
}

impl MatchThresholds {
    /// Category for a confidence score.
    pub fn categorize(&self, confidence: u8) -> MatchCategory {
        if confidence == 0 {
            MatchCategory::NoMatch
        } else if confidence >= self.auto_approve {
            MatchCategory::AutoApprove
        } else if confidence >= self.review {
            MatchCategory::Review
        } else {
            MatchCategory::Manual
        }
    }
}

/// Outcome of auto-matching one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub original: LocalTrack,
    pub candidate: Option<CanonicalCandidate>,
    /// Engine confidence (0-100) of `candidate`
    pub confidence: u8,
    pub category: MatchCategory,
    #[serde(default)]
    pub reason: Option<String>,
}

impl MatchResult {
    fn without_candidate(original: LocalTrack, category: MatchCategory, reason: String) -> Self {
        Self {
            original,
            candidate: None,
            confidence: 0,
            category,
            reason: Some(reason),
        }
    }
}

/// Results of a batch, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchBatch {
    pub results: Vec<MatchResult>,
    pub stats: BatchStats,
}

impl MatchBatch {
    pub fn count(&self, category: MatchCategory) -> usize {
        self.stats.count(category.as_str())
    }

    pub fn cancelled(&self) -> bool {
        self.stats.cancelled
    }
}

/// Highest scoring candidate; ties keep the earlier one.
pub fn best_candidate(
    local: &LocalTrack,
    candidates: &[CanonicalCandidate],
) -> Option<(usize, u8)> {
    let mut best: Option<(usize, u8)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let score = fingerprint::score(&local.metadata, &candidate.descriptor);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((idx, score));
        }
    }
    best
}

/// Matches scanned files against a canonical-metadata provider.
pub struct AutoMatcher<S> {
    search: S,
    thresholds: MatchThresholds,
}

impl<S: CanonicalSearch> AutoMatcher<S> {
    pub fn new(search: S) -> Self {
        Self::with_thresholds(search, MatchThresholds::default())
    }

    pub fn with_thresholds(search: S, thresholds: MatchThresholds) -> Self {
        Self { search, thresholds }
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    pub fn thresholds(&self) -> MatchThresholds {
        self.thresholds
    }

    /// Turn a search outcome into a result. Pure; no I/O.
    pub fn classify(
        &self,
        original: LocalTrack,
        outcome: Result<Vec<CanonicalCandidate>, EnrichmentError>,
    ) -> MatchResult {
        let mut candidates = match outcome {
            Ok(candidates) => candidates,
            Err(e) => {
                return MatchResult::without_candidate(original, MatchCategory::Error, e.to_string());
            }
        };

        if candidates.is_empty() {
            return MatchResult::without_candidate(
                original,
                MatchCategory::NoMatch,
                "no candidates returned".to_string(),
            );
        }

        let Some((idx, confidence)) = best_candidate(&original, &candidates) else {
            return MatchResult::without_candidate(
                original,
                MatchCategory::NoMatch,
                "no candidates returned".to_string(),
            );
        };

        let category = self.thresholds.categorize(confidence);
        let reason = match category {
            MatchCategory::AutoApprove => None,
            MatchCategory::NoMatch => Some("no candidate resembles the local tags".to_string()),
            _ => Some(format!("best candidate confidence {}", confidence)),
        };
        let candidate = (category != MatchCategory::NoMatch).then(|| candidates.swap_remove(idx));

        MatchResult {
            original,
            candidate,
            confidence: if category == MatchCategory::NoMatch { 0 } else { confidence },
            category,
            reason,
        }
    }

    /// Search and classify one file.
    pub async fn match_track(&self, track: &LocalTrack) -> MatchResult {
        let Some(query) = SearchQuery::from_descriptor(&track.metadata) else {
            return MatchResult::without_candidate(
                track.clone(),
                MatchCategory::Skipped,
                "no artist or title to search for".to_string(),
            );
        };

        let outcome = self.search.search(&query).await;
        if let Err(ref e) = outcome {
            tracing::warn!(file = %track.file_path.display(), "Search failed: {}", e);
        }
        self.classify(track.clone(), outcome)
    }

    /// Match every file in order.
    ///
    /// Each file is handled independently; a failed search is recorded as
    /// `error` and the batch moves on. `cancel` is checked before each
    /// file's search, so a cancelled batch holds only complete results.
    pub async fn match_batch(
        &self,
        tracks: &[LocalTrack],
        progress: &mut impl ProgressSink,
        cancel: &CancelFlag,
    ) -> MatchBatch {
        tracing::info!(files = tracks.len(), "Auto-matching files");

        let mut batch = MatchBatch {
            results: Vec::with_capacity(tracks.len()),
            stats: BatchStats::new(tracks.len()),
        };
        for category in MatchCategory::ALL {
            batch.stats.counts.insert(category.as_str().to_string(), 0);
        }

        for track in tracks {
            if cancel.is_cancelled() {
                batch.stats.cancelled = true;
                tracing::info!(
                    processed = batch.stats.processed,
                    remaining = batch.stats.remaining(),
                    "Auto-match cancelled"
                );
                break;
            }

            let result = self.match_track(track).await;
            tracing::debug!(
                file = %track.file_path.display(),
                category = result.category.as_str(),
                confidence = result.confidence,
                "Matched"
            );

            batch.stats.record(result.category.as_str());
            batch.stats.processed += 1;
            batch.results.push(result);

            progress.emit(progress_event(
                batch.stats.processed,
                batch.stats.total,
                Some(track.display_name()),
            ));
        }

        progress.emit(ProgressEvent::Complete {
            stats: batch.stats.clone(),
        });

        tracing::info!(
            auto_approve = batch.count(MatchCategory::AutoApprove),
            review = batch.count(MatchCategory::Review),
            manual = batch.count(MatchCategory::Manual),
            no_match = batch.count(MatchCategory::NoMatch),
            skipped = batch.count(MatchCategory::Skipped),
            errors = batch.count(MatchCategory::Error),
            "Auto-match finished"
        );

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::traits::mocks::{MockSearch, ScriptedSearch};
    use crate::progress::{ChannelSink, NoProgress};
    use crate::test_utils::local_track;
    use tokio::sync::mpsc;

    fn candidate(artist: &str, album: &str, title: &str) -> CanonicalCandidate {
        CanonicalCandidate::new(artist, Some(album), title, 100)
    }

    #[test]
    fn test_threshold_boundaries() {
        let t = MatchThresholds::default();
        assert_eq!(t.categorize(100), MatchCategory::AutoApprove);
        assert_eq!(t.categorize(90), MatchCategory::AutoApprove);
        assert_eq!(t.categorize(89), MatchCategory::Review);
        assert_eq!(t.categorize(70), MatchCategory::Review);
        assert_eq!(t.categorize(69), MatchCategory::Manual);
        assert_eq!(t.categorize(1), MatchCategory::Manual);
        assert_eq!(t.categorize(0), MatchCategory::NoMatch);
    }

    #[test]
    fn test_best_candidate_prefers_first_on_tie() {
        let local = local_track("/in/a.mp3", "Artist", "", "Song", "mp3", None);
        let candidates = vec![
            candidate("Artist", "Album One", "Song"),
            candidate("Artist", "Album Two", "Song"),
        ];
        assert_eq!(best_candidate(&local, &candidates), Some((0, 90)));
    }

    #[test]
    fn test_best_candidate_takes_maximum() {
        let local = local_track("/in/a.mp3", "Artist", "Album", "Song", "mp3", None);
        let candidates = vec![
            candidate("Someone", "Else", "Entirely"),
            candidate("Artist", "Album", "Song"),
        ];
        assert_eq!(best_candidate(&local, &candidates), Some((1, 100)));
    }

    #[tokio::test]
    async fn test_exact_candidate_is_auto_approved() {
        let matcher = AutoMatcher::new(MockSearch::with_results(vec![candidate(
            "artist a", "Album X", "song 1",
        )]));
        let track = local_track("/in/a.flac", "Artist A", "Album X", "Song 1", "flac", None);

        let result = matcher.match_track(&track).await;

        assert_eq!(result.category, MatchCategory::AutoApprove);
        assert_eq!(result.confidence, 100);
        assert!(result.candidate.is_some());
        assert!(result.reason.is_none());
    }

    #[tokio::test]
    async fn test_near_candidate_needs_review() {
        let matcher = AutoMatcher::new(MockSearch::with_results(vec![candidate(
            "Artist", "Album", "Songs",
        )]));
        let track = local_track("/in/a.mp3", "Artist", "Album", "Song", "mp3", None);

        let result = matcher.match_track(&track).await;

        assert_eq!(result.category, MatchCategory::Review);
        assert!(result.reason.is_some());
    }

    #[tokio::test]
    async fn test_zero_candidates_is_no_match() {
        let matcher = AutoMatcher::new(MockSearch::no_matches());
        let track = local_track("/in/a.mp3", "Artist", "Album", "Song", "mp3", None);

        let result = matcher.match_track(&track).await;

        assert_eq!(result.category, MatchCategory::NoMatch);
        assert!(result.candidate.is_none());
        assert_eq!(result.confidence, 0);
    }

    #[tokio::test]
    async fn test_unrelated_candidate_is_manual() {
        let matcher = AutoMatcher::new(MockSearch::with_results(vec![candidate(
            "Artist", "Other", "Different Thing",
        )]));
        let track = local_track("/in/a.mp3", "Artist", "Album", "Song", "mp3", None);

        let result = matcher.match_track(&track).await;

        assert_eq!(result.category, MatchCategory::Manual);
        assert!(result.confidence > 0 && result.confidence < 70);
    }

    #[tokio::test]
    async fn test_search_failure_is_error() {
        let matcher = AutoMatcher::new(MockSearch::with_error(EnrichmentError::RateLimited));
        let track = local_track("/in/a.mp3", "Artist", "Album", "Song", "mp3", None);

        let result = matcher.match_track(&track).await;

        assert_eq!(result.category, MatchCategory::Error);
        assert!(result.reason.unwrap().contains("Rate limited"));
    }

    #[tokio::test]
    async fn test_untagged_file_is_skipped_without_search() {
        let matcher = AutoMatcher::new(MockSearch::no_matches());
        let track = crate::model::LocalTrack {
            file_path: "/in/.mp3".into(),
            metadata: crate::model::TrackDescriptor::new("", "", "", "mp3"),
            folder_artist: None,
        };

        let result = matcher.match_track(&track).await;

        assert_eq!(result.category, MatchCategory::Skipped);
        assert_eq!(matcher.search().call_count(), 0);
    }

    #[tokio::test]
    async fn test_batch_continues_after_failure() {
        let search = ScriptedSearch::default()
            .answer("One", vec![candidate("Artist", "Album", "One")])
            .answer("Three", vec![]);
        let matcher = AutoMatcher::new(search);
        let tracks = vec![
            local_track("/in/1.mp3", "Artist", "Album", "One", "mp3", None),
            local_track("/in/2.mp3", "Artist", "Album", "Two", "mp3", None),
            local_track("/in/3.mp3", "Artist", "Album", "Three", "mp3", None),
        ];
        let mut events = Vec::new();

        let batch = matcher
            .match_batch(&tracks, &mut |e: ProgressEvent| events.push(e), &CancelFlag::new())
            .await;

        assert_eq!(batch.results.len(), 3);
        assert_eq!(batch.count(MatchCategory::AutoApprove), 1);
        assert_eq!(batch.count(MatchCategory::Error), 1);
        assert_eq!(batch.count(MatchCategory::NoMatch), 1);
        assert_eq!(batch.stats.processed, 3);
        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[1],
            ProgressEvent::Progress { processed: 2, total: 3, current_file: Some(f), .. } if f == "2.mp3"
        ));
        assert!(matches!(events[3], ProgressEvent::Complete { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_batch_reports_remaining() {
        let matcher = AutoMatcher::new(MockSearch::no_matches());
        let tracks = vec![
            local_track("/in/1.mp3", "A", "B", "One", "mp3", None),
            local_track("/in/2.mp3", "A", "B", "Two", "mp3", None),
        ];
        let cancel = CancelFlag::new();
        cancel.cancel();

        let batch = matcher.match_batch(&tracks, &mut NoProgress, &cancel).await;

        assert!(batch.cancelled());
        assert!(batch.results.is_empty());
        assert_eq!(batch.stats.remaining(), 2);
        assert_eq!(matcher.search().call_count(), 0);
    }

    #[tokio::test]
    async fn test_channel_sink_streams_batch_to_a_listener() {
        let matcher = AutoMatcher::new(MockSearch::no_matches());
        let tracks = vec![
            local_track("/in/1.mp3", "A", "B", "One", "mp3", None),
            local_track("/in/2.mp3", "A", "B", "Two", "mp3", None),
        ];

        let (tx, mut rx) = mpsc::unbounded_channel();
        let listener = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(event) = rx.recv().await {
                seen.push(event);
            }
            seen
        });

        let mut sink = ChannelSink(tx);
        let batch = matcher.match_batch(&tracks, &mut sink, &CancelFlag::new()).await;
        drop(sink);
        let seen = listener.await.unwrap();

        assert_eq!(batch.count(MatchCategory::NoMatch), 2);
        assert_eq!(seen.len(), 3);
        assert!(matches!(
            seen[1],
            ProgressEvent::Progress { processed: 2, total: 2, .. }
        ));
        assert!(matches!(&seen[2], ProgressEvent::Complete { stats } if stats.processed == 2));
    }
}
