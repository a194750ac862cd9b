//! Move plans: where renamed files go in the live library.
//!
//! Each renamed file gets a destination under the library root. When the
//! snapshot already holds the same recording, the quality comparator picks
//! the bucket:
//!
//! | Situation | Bucket | Action |
//! |---|---|---|
//! | no snapshot match | `new_files` | ADD |
//! | no match, destination exists on disk | `collisions` | SKIP |
//! | local is better | `upgrades` | REPLACE |
//! | local is worse | `downgrades` | SKIP |
//! | equal quality | `same_quality` | SKIP |
//! | destination claimed by a better file in the batch | `collisions` | SKIP |
//!
//! Building a plan only checks whether paths exist.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::{RenamePreview, render_path};
use crate::compare::RemoteIndex;
use crate::error::{Error, Result};
use crate::model::{Action, RemoteTrack, file_extension};
use crate::quality::{self, QualityComparison, QualityRank};

/// Reason given to an operation that lost its destination to a better file.
pub const DUPLICATE_IN_BATCH: &str = "duplicate in batch";

/// Whether downgrades and duplicates may be executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveMode {
    /// Only new files and upgrades are executable
    #[default]
    Safe,
    /// Downgrades and duplicates are executed as REPLACE too
    Force,
}

/// One file operation in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlanOperation {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub action: Action,
    #[serde(default)]
    pub reason: Option<String>,
    /// Pre-existing file a REPLACE deletes
    #[serde(default)]
    pub replaces: Option<PathBuf>,
}

impl MovePlanOperation {
    pub fn add(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            source_path: source,
            destination_path: destination,
            action: Action::Add,
            reason: None,
            replaces: None,
        }
    }

    pub fn replace(source: PathBuf, destination: PathBuf, replaces: Option<PathBuf>) -> Self {
        Self {
            source_path: source,
            destination_path: destination,
            action: Action::Replace,
            reason: None,
            replaces,
        }
    }

    pub fn skip(source: PathBuf, destination: PathBuf, reason: &str) -> Self {
        Self {
            source_path: source,
            destination_path: destination,
            action: Action::Skip,
            reason: Some(reason.to_string()),
            replaces: None,
        }
    }

    /// Same operation forced through as a REPLACE.
    fn forced(&self) -> Self {
        Self {
            action: Action::Replace,
            ..self.clone()
        }
    }
}

/// A dry-run plan partitioned by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
    pub new_files: Vec<MovePlanOperation>,
    pub upgrades: Vec<MovePlanOperation>,
    pub downgrades: Vec<MovePlanOperation>,
    pub same_quality: Vec<MovePlanOperation>,
    pub collisions: Vec<MovePlanOperation>,
    pub mode: MoveMode,
}

impl MovePlan {
    /// Operations the executor should run, in plan order.
    ///
    /// Downgrades and duplicates are included only in [`MoveMode::Force`].
    pub fn executable(&self) -> Vec<MovePlanOperation> {
        let mut ops: Vec<MovePlanOperation> = self
            .new_files
            .iter()
            .chain(self.upgrades.iter())
            .cloned()
            .collect();

        if self.mode == MoveMode::Force {
            ops.extend(
                self.downgrades
                    .iter()
                    .chain(self.same_quality.iter())
                    .map(MovePlanOperation::forced),
            );
        }

        ops
    }

    pub fn len(&self) -> usize {
        self.new_files.len()
            + self.upgrades.len()
            + self.downgrades.len()
            + self.same_quality.len()
            + self.collisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build a move plan for renamed files against a live library snapshot.
///
/// A file's current location is its proposed path when the rename has
/// already been applied, otherwise its original path.
pub fn plan_move(
    renamed: &[RenamePreview],
    library_root: &Path,
    snapshot: &[RemoteTrack],
    mode: MoveMode,
) -> Result<MovePlan> {
    if library_root.as_os_str().is_empty() {
        return Err(Error::invalid_input("a library root is required for a move plan"));
    }

    tracing::info!(
        files = renamed.len(),
        snapshot = snapshot.len(),
        root = %library_root.display(),
        "Building move plan"
    );

    let index = RemoteIndex::new(snapshot);

    // Existence checks are the only I/O; run them in parallel.
    let located: Vec<(PathBuf, PathBuf, bool)> = renamed
        .par_iter()
        .map(|preview| {
            let source = if preview.proposed_path.exists() {
                preview.proposed_path.clone()
            } else {
                preview.original_path.clone()
            };
            let ext = file_extension(&source).unwrap_or_else(|| "mp3".to_string());
            let destination = render_path(library_root, &preview.metadata, &ext);
            let exists = destination.exists();
            (source, destination, exists)
        })
        .collect();

    let mut entries: Vec<(Bucket, MovePlanOperation)> = Vec::with_capacity(renamed.len());

    for (preview, (source, destination, exists)) in renamed.iter().zip(located) {
        let Some(existing) = index.find(&preview.metadata) else {
            entries.push(if exists {
                (
                    Bucket::Collision,
                    MovePlanOperation::skip(source, destination, "destination already exists"),
                )
            } else {
                (Bucket::NewFile, MovePlanOperation::add(source, destination))
            });
            continue;
        };

        let replaces = existing
            .file_path
            .clone()
            .or_else(|| exists.then(|| destination.clone()));

        entries.push(match quality::compare(&preview.metadata, &existing.descriptor) {
            QualityComparison::ABetter => (
                Bucket::Upgrade,
                MovePlanOperation::replace(source, destination, replaces),
            ),
            QualityComparison::BBetter => {
                let mut op = MovePlanOperation::skip(source, destination, "quality downgrade");
                op.replaces = replaces;
                (Bucket::Downgrade, op)
            }
            QualityComparison::SameQuality => {
                let mut op = MovePlanOperation::skip(source, destination, "same quality");
                op.replaces = replaces;
                (Bucket::SameQuality, op)
            }
        });
    }

    resolve_claims(&mut entries, renamed, mode);

    let mut plan = MovePlan {
        mode,
        ..Default::default()
    };
    for (bucket, op) in entries {
        match bucket {
            Bucket::NewFile => plan.new_files.push(op),
            Bucket::Upgrade => plan.upgrades.push(op),
            Bucket::Downgrade => plan.downgrades.push(op),
            Bucket::SameQuality => plan.same_quality.push(op),
            Bucket::Collision => plan.collisions.push(op),
        }
    }

    tracing::info!(
        new_files = plan.new_files.len(),
        upgrades = plan.upgrades.len(),
        downgrades = plan.downgrades.len(),
        same_quality = plan.same_quality.len(),
        collisions = plan.collisions.len(),
        "Move plan built"
    );

    Ok(plan)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    NewFile,
    Upgrade,
    Downgrade,
    SameQuality,
    Collision,
}

impl Bucket {
    fn executable_in(self, mode: MoveMode) -> bool {
        match self {
            Bucket::NewFile | Bucket::Upgrade => true,
            Bucket::Downgrade | Bucket::SameQuality => mode == MoveMode::Force,
            Bucket::Collision => false,
        }
    }
}

/// Give each destination and each replaced file to one operation only.
///
/// Executable operations claim their destination and, for REPLACE, the file
/// they delete. Claims go out best quality first (ties keep plan order);
/// an operation that finds one of its paths already claimed becomes a
/// collision.
fn resolve_claims(entries: &mut [(Bucket, MovePlanOperation)], renamed: &[RenamePreview], mode: MoveMode) {
    let mut order: Vec<usize> = (0..entries.len())
        .filter(|&i| entries[i].0.executable_in(mode))
        .collect();
    order.sort_by_key(|&i| std::cmp::Reverse(QualityRank::of(&renamed[i].metadata)));

    let mut claimed: HashSet<PathBuf> = HashSet::new();
    for i in order {
        let (bucket, op) = &mut entries[i];
        let paths: Vec<&PathBuf> = std::iter::once(&op.destination_path)
            .chain(op.replaces.iter())
            .collect();

        if paths.iter().any(|p| claimed.contains(*p)) {
            tracing::debug!(
                file = %op.source_path.display(),
                to = %op.destination_path.display(),
                "Destination already claimed by a better file in this batch"
            );
            *bucket = Bucket::Collision;
            *op = MovePlanOperation::skip(
                op.source_path.clone(),
                op.destination_path.clone(),
                DUPLICATE_IN_BATCH,
            );
        } else {
            claimed.extend(paths.into_iter().cloned());
        }
    }
}
