//! Plan execution and rollback.
//!
//! A batch moves through `Planned -> Executing -> Completed` (or
//! `CompletedWithErrors`). Each operation is attempted on its own; a failed
//! move is recorded and the batch carries on.
//!
//! A real run starts a fresh [`RollbackJournal`] and records every applied
//! move in it. A dry run walks the same operations, reports them as if
//! applied, and touches neither the filesystem nor the journal.
//!
//! The journal lives behind a mutex that is held for a whole execute or
//! rollback, so the two never interleave.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::journal::{JournalEntry, RollbackJournal};
use super::plan::MovePlanOperation;
use super::{move_file, remove_empty_dirs};
use crate::error::{Error, Result, ResultExt};
use crate::model::Action;
use crate::progress::{BatchStats, CancelFlag, ProgressEvent, ProgressSink, percent};

/// Lifecycle of one execution batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Planned,
    Executing,
    Completed,
    CompletedWithErrors,
}

/// What happened to one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Applied,
    /// Dry run: would have been applied
    WouldApply,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    pub operation: MovePlanOperation,
    pub status: OperationStatus,
    pub error: Option<String>,
}

/// Result of executing a batch.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    pub state: BatchState,
    pub dry_run: bool,
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
    pub outcomes: Vec<OperationOutcome>,
    /// Journal batch id of a real run
    pub batch_id: Option<String>,
    /// Why the batch was refused before anything ran
    pub refused: Option<String>,
}

impl ExecutionSummary {
    fn new(total: usize, dry_run: bool) -> Self {
        Self {
            state: BatchState::Planned,
            dry_run,
            total,
            processed: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            cancelled: false,
            outcomes: Vec::with_capacity(total),
            batch_id: None,
            refused: None,
        }
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed)
    }

    fn stats(&self) -> BatchStats {
        let mut stats = BatchStats::new(self.total);
        stats.processed = self.processed;
        stats.cancelled = self.cancelled;
        stats.counts.insert("succeeded".to_string(), self.succeeded);
        stats.counts.insert("failed".to_string(), self.failed);
        stats.counts.insert("skipped".to_string(), self.skipped);
        stats
    }
}

/// Result of rolling back the journal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RollbackSummary {
    pub restored: usize,
    pub failed: usize,
    /// Pre-existing files deleted by REPLACE operations
    pub permanently_deleted: usize,
    pub lost_files: Vec<PathBuf>,
    pub errors: Vec<String>,
    /// There was nothing to roll back
    pub no_journal: bool,
    pub batch_id: Option<String>,
}

/// Runs move operations and owns the rollback journal.
#[derive(Debug, Default)]
pub struct Executor {
    journal: Mutex<Option<RollbackJournal>>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor resuming a journal stored by an earlier run.
    pub fn with_journal(journal: Option<RollbackJournal>) -> Self {
        Self {
            journal: Mutex::new(journal),
        }
    }

    /// Snapshot of the current journal.
    pub fn journal(&self) -> Option<RollbackJournal> {
        self.journal.lock().clone()
    }

    pub fn has_journal(&self) -> bool {
        self.journal.lock().is_some()
    }

    /// Execute operations in order.
    ///
    /// SKIP operations are reported and left alone. A real run that has
    /// anything to apply replaces the previous journal.
    ///
    /// A batch in which two operations target the same destination or the
    /// same replaced file is refused as a whole: nothing runs, the journal
    /// is left as it was and an error event is emitted.
    pub fn execute(
        &self,
        operations: &[MovePlanOperation],
        dry_run: bool,
        progress: &mut impl ProgressSink,
        cancel: &CancelFlag,
    ) -> ExecutionSummary {
        let mut guard = self.journal.lock();
        let mut summary = ExecutionSummary::new(operations.len(), dry_run);

        if let Err(e) = check_claims(operations) {
            tracing::warn!("Batch refused: {}", e);
            summary.refused = Some(e.to_string());
            progress.emit(ProgressEvent::Error {
                message: e.to_string(),
            });
            return summary;
        }

        let applies_anything = operations.iter().any(|op| op.action != Action::Skip);
        if !dry_run && applies_anything {
            if let Some(previous) = guard.as_ref() {
                tracing::warn!(
                    batch = %previous.batch_id,
                    "Starting a new batch discards the previous rollback journal"
                );
            }
            let journal = RollbackJournal::new();
            summary.batch_id = Some(journal.batch_id.clone());
            *guard = Some(journal);
        }

        summary.state = BatchState::Executing;
        tracing::info!(operations = operations.len(), dry_run, "Executing batch");

        for op in operations {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                tracing::info!(
                    processed = summary.processed,
                    remaining = summary.remaining(),
                    "Execution cancelled"
                );
                break;
            }

            let outcome = if op.action == Action::Skip {
                summary.skipped += 1;
                OperationOutcome {
                    operation: op.clone(),
                    status: OperationStatus::Skipped,
                    error: None,
                }
            } else if dry_run {
                tracing::debug!(
                    action = op.action.as_str(),
                    from = %op.source_path.display(),
                    to = %op.destination_path.display(),
                    "Dry run"
                );
                summary.succeeded += 1;
                OperationOutcome {
                    operation: op.clone(),
                    status: OperationStatus::WouldApply,
                    error: None,
                }
            } else {
                match apply(op) {
                    Ok(entry) => {
                        if let Some(journal) = guard.as_mut() {
                            journal.record(entry);
                        }
                        summary.succeeded += 1;
                        OperationOutcome {
                            operation: op.clone(),
                            status: OperationStatus::Applied,
                            error: None,
                        }
                    }
                    Err(e) => {
                        tracing::warn!(file = %op.source_path.display(), "Operation failed: {}", e);
                        summary.failed += 1;
                        OperationOutcome {
                            operation: op.clone(),
                            status: OperationStatus::Failed,
                            error: Some(e.to_string()),
                        }
                    }
                }
            };

            summary.outcomes.push(outcome);
            summary.processed += 1;
            progress.emit(ProgressEvent::Executed {
                processed: summary.processed,
                total: summary.total,
                current_file: op
                    .source_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned()),
                progress: percent(summary.processed, summary.total),
                succeeded: summary.succeeded,
                failed: summary.failed,
            });
        }

        summary.state = if summary.failed > 0 {
            BatchState::CompletedWithErrors
        } else {
            BatchState::Completed
        };

        progress.emit(ProgressEvent::Complete {
            stats: summary.stats(),
        });

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            state = ?summary.state,
            "Batch finished"
        );

        summary
    }

    /// Undo the most recent batch, newest move first.
    ///
    /// Entries that cannot be restored stay in the journal so the rollback
    /// can be retried. Files deleted by REPLACE are reported as lost once,
    /// on the first attempt.
    pub fn rollback(&self, progress: &mut impl ProgressSink) -> RollbackSummary {
        let mut guard = self.journal.lock();

        let Some(journal) = guard.take() else {
            tracing::info!("Nothing to roll back");
            return RollbackSummary {
                no_journal: true,
                ..Default::default()
            };
        };

        tracing::info!(batch = %journal.batch_id, entries = journal.len(), "Rolling back");

        let total = journal.len();
        let mut summary = RollbackSummary {
            batch_id: Some(journal.batch_id.clone()),
            ..Default::default()
        };
        let mut unrestored = Vec::new();

        for (processed, entry) in journal.entries.iter().rev().enumerate() {
            match restore(entry) {
                Ok(()) => summary.restored += 1,
                Err(e) => {
                    tracing::warn!(file = %entry.destination.display(), "Restore failed: {}", e);
                    summary.failed += 1;
                    summary.errors.push(e.to_string());
                    unrestored.push(JournalEntry {
                        loss_reported: entry.loss_reported || entry.is_irreversible(),
                        ..entry.clone()
                    });
                }
            }

            if let Some(ref lost) = entry.deleted_existing
                && !entry.loss_reported
            {
                summary.permanently_deleted += 1;
                summary.lost_files.push(lost.clone());
            }

            progress.emit(ProgressEvent::Executed {
                processed: processed + 1,
                total,
                current_file: entry
                    .source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned()),
                progress: percent(processed + 1, total),
                succeeded: summary.restored,
                failed: summary.failed,
            });
        }

        if !unrestored.is_empty() {
            unrestored.reverse();
            *guard = Some(RollbackJournal {
                entries: unrestored,
                ..journal
            });
        }

        let mut stats = BatchStats::new(total);
        stats.processed = total;
        stats.counts.insert("restored".to_string(), summary.restored);
        stats.counts.insert("failed".to_string(), summary.failed);
        stats
            .counts
            .insert("permanently_deleted".to_string(), summary.permanently_deleted);
        progress.emit(ProgressEvent::Complete { stats });

        tracing::info!(
            restored = summary.restored,
            failed = summary.failed,
            permanently_deleted = summary.permanently_deleted,
            "Rollback finished"
        );

        summary
    }
}

/// Every destination and replaced file may be targeted by one operation.
fn check_claims(operations: &[MovePlanOperation]) -> Result<()> {
    let mut claimed: HashSet<&Path> = HashSet::new();

    for op in operations.iter().filter(|op| op.action != Action::Skip) {
        let destination = op.destination_path.as_path();
        let replaced = match op.action {
            Action::Replace => op.replaces.as_deref().filter(|r| *r != destination),
            _ => None,
        };
        for path in std::iter::once(destination).chain(replaced) {
            if !claimed.insert(path) {
                return Err(Error::refused(format!(
                    "{} is targeted by more than one operation",
                    path.display()
                )));
            }
        }
    }

    Ok(())
}

/// Apply one ADD or REPLACE operation.
///
/// A replaced file is parked next to itself until the move has succeeded,
/// and put back if the move fails.
fn apply(op: &MovePlanOperation) -> Result<JournalEntry> {
    if !op.source_path.exists() {
        return Err(Error::not_found(&op.source_path));
    }

    let mut entry = JournalEntry::moved(&op.source_path, &op.destination_path);
    let mut parked: Option<(PathBuf, PathBuf)> = None;

    match op.action {
        Action::Add => {
            if op.destination_path.exists() {
                return Err(Error::occupied(&op.destination_path));
            }
        }
        Action::Replace => {
            let target = op
                .replaces
                .clone()
                .unwrap_or_else(|| op.destination_path.clone());
            if target == op.source_path {
                return Err(Error::refused("a file cannot replace itself"));
            }
            if target != op.destination_path && op.destination_path.exists() {
                return Err(Error::occupied(&op.destination_path));
            }
            if target.exists() {
                let parking = parking_path(&target);
                if parking.exists() {
                    return Err(Error::occupied(&parking));
                }
                fs::rename(&target, &parking)
                    .with_context(format!("Failed to set aside {}", target.display()))?;
                parked = Some((target, parking));
            }
        }
        Action::Skip => return Err(Error::refused("SKIP operations are never applied")),
    }

    if let Err(e) = move_file(&op.source_path, &op.destination_path) {
        if let Some((target, parking)) = parked
            && let Err(put_back) = fs::rename(&parking, &target)
        {
            tracing::error!(
                file = %target.display(),
                parked = %parking.display(),
                "Move failed and the replaced file could not be put back: {}",
                put_back
            );
            return Err(e.context(format!(
                "replaced file left at {}",
                parking.display()
            )));
        }
        return Err(e);
    }

    if let Some((target, parking)) = parked {
        if let Err(e) = fs::remove_file(&parking) {
            tracing::warn!(file = %parking.display(), "Could not delete replaced file: {}", e);
        } else {
            tracing::debug!(file = %target.display(), "Deleted replaced file");
        }
        entry.deleted_existing = Some(target);
    }

    Ok(entry)
}

/// Sibling path a replaced file waits at while its replacement moves in.
fn parking_path(target: &Path) -> PathBuf {
    let mut name: OsString = target.file_name().unwrap_or_default().to_os_string();
    name.push(".replaced");
    target.with_file_name(name)
}

/// Move one journaled file back to where it came from.
fn restore(entry: &JournalEntry) -> Result<()> {
    if !entry.destination.exists() {
        return Err(Error::not_found(&entry.destination));
    }
    if entry.source.exists() {
        return Err(Error::occupied(&entry.source));
    }

    move_file(&entry.destination, &entry.source)?;

    if let Some(parent) = entry.destination.parent() {
        let _ = remove_empty_dirs(parent);
    }
    Ok(())
}
