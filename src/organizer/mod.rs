//! File organization: rename previews, move plans, execution and rollback.
//!
//! Every destination is computed from one template,
//! `{Artist}/{Album}/{TrackNum} - {Title}.{ext}`, under a base directory.
//!
//! # Features
//! - Rename preview from auto-match results (pure, no I/O)
//! - Move plans against a live library snapshot ([`plan`])
//! - Journaled execution with dry-run and rollback ([`executor`], [`journal`])
//! - Automatic cleanup of empty directories after rollback

pub mod executor;
pub mod journal;
pub mod plan;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, ResultExt};
use crate::matching::{MatchCategory, MatchResult};
use crate::model::{Action, TrackDescriptor, UNKNOWN, is_unknown};

pub use executor::{BatchState, ExecutionSummary, Executor, OperationOutcome, OperationStatus, RollbackSummary};
pub use journal::{JournalEntry, RollbackJournal};
pub use plan::{MoveMode, MovePlan, MovePlanOperation, plan_move};

/// Folder template shared by rename previews and move plans.
pub const PATH_TEMPLATE: &str = "{Artist}/{Album}/{TrackNum} - {Title}.{ext}";

/// Markers that end the primary artist credit.
const FEATURING_MARKERS: &[&str] = &[
    " feat. ", " feat ", " ft. ", " ft ", " featuring ", "(feat.", "(ft.", "(featuring", "[feat.",
];

/// Proposed new location of one matched file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePreview {
    pub original_path: PathBuf,
    pub proposed_path: PathBuf,
    /// False when the file is already where the template puts it
    pub changed: bool,
    pub category: MatchCategory,
    pub confidence: u8,
    /// Canonical fields with the local format and bitrate
    pub metadata: TrackDescriptor,
}

/// Per-bucket counts of a rename preview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSummary {
    pub auto_approve: usize,
    pub review: usize,
    pub manual: usize,
    pub skipped: usize,
    pub changed: usize,
}

/// Rename preview grouped by confidence.
///
/// Only `auto_approve` and `review` get a proposed path; `manual` and
/// `skipped` hold their match results untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenamePreviewReport {
    pub auto_approve: Vec<RenamePreview>,
    pub review: Vec<RenamePreview>,
    pub manual: Vec<MatchResult>,
    pub skipped: Vec<MatchResult>,
    pub summary: PreviewSummary,
}

impl RenamePreviewReport {
    /// Previews with a proposed path, auto-approved first.
    pub fn renamed(&self) -> impl Iterator<Item = &RenamePreview> {
        self.auto_approve.iter().chain(self.review.iter())
    }

    /// Move operations for every preview that changes a path.
    pub fn operations(&self) -> Vec<MovePlanOperation> {
        self.renamed()
            .filter(|p| p.changed)
            .map(|p| MovePlanOperation {
                source_path: p.original_path.clone(),
                destination_path: p.proposed_path.clone(),
                action: Action::Add,
                reason: None,
                replaces: None,
            })
            .collect()
    }
}

/// Build the rename preview for a batch of match results.
///
/// Fails only when `base` is empty; nothing is touched on disk.
pub fn preview_rename(results: &[MatchResult], base: &Path) -> Result<RenamePreviewReport> {
    if base.as_os_str().is_empty() {
        return Err(Error::invalid_input("a base path is required for rename preview"));
    }

    let mut report = RenamePreviewReport::default();

    for result in results {
        match result.category {
            MatchCategory::AutoApprove | MatchCategory::Review => {
                let preview = preview_one(result, base);
                if preview.changed {
                    report.summary.changed += 1;
                }
                if result.category == MatchCategory::AutoApprove {
                    report.auto_approve.push(preview);
                } else {
                    report.review.push(preview);
                }
            }
            MatchCategory::Manual => report.manual.push(result.clone()),
            MatchCategory::Skipped | MatchCategory::Error | MatchCategory::NoMatch => {
                report.skipped.push(result.clone())
            }
        }
    }

    report.summary.auto_approve = report.auto_approve.len();
    report.summary.review = report.review.len();
    report.summary.manual = report.manual.len();
    report.summary.skipped = report.skipped.len();

    tracing::info!(
        auto_approve = report.summary.auto_approve,
        review = report.summary.review,
        manual = report.summary.manual,
        skipped = report.summary.skipped,
        changed = report.summary.changed,
        "Rename preview built"
    );

    Ok(report)
}

fn preview_one(result: &MatchResult, base: &Path) -> RenamePreview {
    let metadata = proposed_metadata(result);
    let ext = result.original.extension().unwrap_or_else(|| "mp3".to_string());
    let proposed_path = render_path(base, &metadata, &ext);

    RenamePreview {
        changed: proposed_path != result.original.file_path,
        original_path: result.original.file_path.clone(),
        proposed_path,
        category: result.category,
        confidence: result.confidence,
        metadata,
    }
}

/// Canonical fields where known, falling back to the local tags per field.
pub fn proposed_metadata(result: &MatchResult) -> TrackDescriptor {
    let local = &result.original.metadata;
    let Some(candidate) = result.candidate.as_ref().map(|c| &c.descriptor) else {
        return local.clone();
    };

    let pick = |canonical: &str, fallback: &str| -> String {
        if is_unknown(canonical) {
            fallback.to_string()
        } else {
            canonical.to_string()
        }
    };

    TrackDescriptor::new(
        &pick(&candidate.artist, &local.artist),
        &pick(&candidate.album, &local.album),
        &pick(&candidate.title, &local.title),
        &local.format,
    )
    .with_bitrate(local.bitrate_kbps)
    .with_track_number(candidate.track_number.or(local.track_number))
}

/// Destination of a track under `base` following [`PATH_TEMPLATE`].
pub fn render_path(base: &Path, metadata: &TrackDescriptor, ext: &str) -> PathBuf {
    let track_num = metadata
        .track_number
        .map(|n| format!("{:02}", n))
        .unwrap_or_else(|| "00".to_string());

    let path_str = PATH_TEMPLATE
        .replace("{Artist}", &path_component(primary_artist(&metadata.artist)))
        .replace("{Album}", &path_component(&metadata.album))
        .replace("{Title}", &path_component(&metadata.title))
        .replace("{TrackNum}", &track_num)
        .replace("{ext}", &ext.to_lowercase());

    base.join(path_str)
}

/// The credited artist before any featuring marker.
///
/// `"Artist A feat. Artist B"` gives `"Artist A"`.
pub fn primary_artist(artist: &str) -> &str {
    let lower = artist.to_ascii_lowercase();
    let cut = FEATURING_MARKERS
        .iter()
        .filter_map(|marker| lower.find(marker))
        .min();

    match cut {
        Some(idx) if !artist[..idx].trim().is_empty() => artist[..idx].trim(),
        _ => artist.trim(),
    }
}

fn path_component(value: &str) -> String {
    let sanitized = sanitize_filename(value);
    if sanitized.is_empty() {
        UNKNOWN.to_string()
    } else {
        sanitized
    }
}

/// Sanitizes a filename by replacing invalid characters and trimming
/// trailing dots and spaces.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();

    replaced.trim_end_matches(['.', ' ']).to_string()
}

/// Move a file, creating the destination's parent directories.
///
/// Falls back to copy + delete when a rename is impossible (cross-device).
pub fn move_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(format!("Failed to create directory: {}", parent.display()))?;
    }

    if let Err(e) = fs::rename(source, destination) {
        tracing::debug!(error = %e, "Rename failed, falling back to copy");
        fs::copy(source, destination)
            .with_context(format!("Failed to copy file to: {}", destination.display()))?;
        fs::remove_file(source)
            .with_context(format!("Failed to remove source file: {}", source.display()))?;
    }

    Ok(())
}

/// Recursively removes empty directories up the tree
pub fn remove_empty_dirs(path: &Path) -> Result<()> {
    if path.is_dir() && fs::read_dir(path)?.next().is_none() {
        fs::remove_dir(path)?;
        if let Some(parent) = path.parent() {
            let _ = remove_empty_dirs(parent);
        }
    }
    Ok(())
}
