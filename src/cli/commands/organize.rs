//! Rename, move and rollback commands.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::{Context, required_path};
use crate::organizer::{
    self, ExecutionSummary, Executor, MoveMode, MovePlan, MovePlanOperation, OperationStatus,
    RenamePreview, RollbackJournal,
};
use crate::progress::{CancelFlag, NoProgress, ProgressEvent};

/// Preview renames for matched tracks
pub fn cmd_preview(ctx: &Context, base: Option<&Path>) -> anyhow::Result<()> {
    let mut session = ctx.load_session()?;
    if session.match_results.is_empty() {
        anyhow::bail!("No match results in the session; run `match` first");
    }

    let base = match required_path(base, ctx.config.library.base_path.as_ref(), "base path") {
        Ok(base) => base,
        Err(e) => session.scan_root.clone().ok_or(e)?,
    };
    let report = organizer::preview_rename(&session.match_results, &base)?;

    println!("Rename preview under {:?}", base);
    println!("Template: {}\n", organizer::PATH_TEMPLATE);
    print_previews("Auto-approve", &report.auto_approve);
    print_previews("Review", &report.review);

    println!("\nPreview Summary");
    println!("===============");
    println!("  ✓ Auto-approve: {}", report.summary.auto_approve);
    println!("  ? Review:       {}", report.summary.review);
    println!("  ✎ Manual:       {}", report.summary.manual);
    println!("  - Skipped:      {}", report.summary.skipped);
    println!("  Paths changing: {}", report.summary.changed);

    session.set_previews(report);
    ctx.save_session(&mut session)?;
    Ok(())
}

fn print_previews(label: &str, previews: &[RenamePreview]) {
    let changed: Vec<_> = previews.iter().filter(|p| p.changed).collect();
    if changed.is_empty() {
        return;
    }
    println!("{}:", label);
    for preview in changed.iter().take(25) {
        println!(
            "  [{:>3}] {} -> {}",
            preview.confidence,
            preview.original_path.display(),
            preview.proposed_path.display()
        );
    }
    if changed.len() > 25 {
        println!("  ... and {} more", changed.len() - 25);
    }
}

/// Apply the previewed renames
pub fn cmd_rename(ctx: &Context, dry_run: bool) -> anyhow::Result<()> {
    let session = ctx.load_session()?;
    let previews = session
        .previews
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("No rename preview in the session; run `preview` first"))?;

    let operations = previews.operations();
    if operations.is_empty() {
        println!("Nothing to rename.");
        return Ok(());
    }

    let summary = run_batch(ctx, &operations, dry_run)?;
    print_execution("Rename", &summary);
    Ok(())
}

/// Build a move plan into the live library
pub fn cmd_plan(ctx: &Context, library_root: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let mut session = ctx.load_session()?;
    let plan = build_plan(ctx, &session, library_root, force)?;

    print_plan(&plan);

    session.set_plan(plan);
    ctx.save_session(&mut session)?;
    Ok(())
}

/// Move renamed files into the live library
pub fn cmd_move(
    ctx: &Context,
    library_root: Option<&Path>,
    force: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut session = ctx.load_session()?;

    // Existence checks go stale, so the plan is rebuilt right before moving.
    let plan = build_plan(ctx, &session, library_root, force)?;
    print_plan(&plan);

    let operations = plan.executable();
    session.set_plan(plan);
    ctx.save_session(&mut session)?;

    if operations.is_empty() {
        println!("\nNothing to move.");
        return Ok(());
    }

    let summary = run_batch(ctx, &operations, dry_run)?;
    print_execution("Move", &summary);
    Ok(())
}

/// Undo the last rename or move batch
pub fn cmd_rollback(ctx: &Context) -> anyhow::Result<()> {
    let journal_path = ctx.journal_path()?;
    let executor = Executor::with_journal(RollbackJournal::load(&journal_path)?);

    let summary = executor.rollback(&mut NoProgress);
    if summary.no_journal {
        println!("Nothing to roll back.");
        return Ok(());
    }

    match executor.journal() {
        Some(remaining) if !remaining.is_empty() => remaining.save(&journal_path)?,
        _ => RollbackJournal::clear(&journal_path)?,
    }

    println!("Rollback Summary");
    println!("================");
    println!("  ✓ Restored:            {}", summary.restored);
    println!("  ✗ Failed:              {}", summary.failed);
    println!("  Permanently deleted:   {}", summary.permanently_deleted);

    for path in &summary.lost_files {
        println!("    lost: {}", path.display());
    }
    for error in summary.errors.iter().take(10) {
        println!("    {}", error);
    }
    if summary.failed > 0 {
        println!("\nFailed entries were kept; run `rollback` again after fixing them.");
    }
    Ok(())
}

// ============================================================================
// Shared helpers
// ============================================================================

fn build_plan(
    ctx: &Context,
    session: &crate::session::Session,
    library_root: Option<&Path>,
    force: bool,
) -> anyhow::Result<MovePlan> {
    let previews = session
        .previews
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("No rename preview in the session; run `preview` first"))?;
    if session.remote_snapshot.is_empty() {
        tracing::warn!("Live library snapshot is empty; every file will plan as new");
    }

    let root: PathBuf = required_path(
        library_root,
        ctx.config.library.library_root.as_ref(),
        "library root",
    )?;
    let mode = if force { MoveMode::Force } else { MoveMode::Safe };
    let renamed: Vec<RenamePreview> = previews.renamed().cloned().collect();

    Ok(organizer::plan_move(
        &renamed,
        &root,
        &session.remote_snapshot,
        mode,
    )?)
}

/// Execute operations and persist the journal of a real run.
fn run_batch(
    ctx: &Context,
    operations: &[MovePlanOperation],
    dry_run: bool,
) -> anyhow::Result<ExecutionSummary> {
    let journal_path = ctx.journal_path()?;
    let executor = Executor::with_journal(RollbackJournal::load(&journal_path)?);

    if dry_run {
        println!("\n[DRY RUN MODE - No files will be moved]");
    }

    let mut progress = |event: ProgressEvent| match event {
        ProgressEvent::Executed {
            processed,
            total,
            succeeded,
            failed,
            ..
        } => {
            print!("\r  {}/{} ({} ok, {} failed)", processed, total, succeeded, failed);
            let _ = std::io::stdout().flush();
        }
        ProgressEvent::Error { message } => eprintln!("✗ {}", message),
        _ => {}
    };
    let summary = executor.execute(operations, dry_run, &mut progress, &CancelFlag::new());
    println!();

    if let Some(reason) = &summary.refused {
        anyhow::bail!("Batch refused, no files were touched: {}", reason);
    }

    if !dry_run
        && summary.batch_id.is_some()
        && let Some(journal) = executor.journal()
    {
        journal.save(&journal_path)?;
    }

    Ok(summary)
}

fn print_plan(plan: &MovePlan) {
    println!("Move Plan ({:?} mode)", plan.mode);
    println!("=========");
    println!("  + New files:     {}", plan.new_files.len());
    println!("  ↑ Upgrades:      {}", plan.upgrades.len());
    println!("  ↓ Downgrades:    {}", plan.downgrades.len());
    println!("  = Same quality:  {}", plan.same_quality.len());
    println!("  ✗ Collisions:    {}", plan.collisions.len());

    for op in plan.collisions.iter().take(10) {
        println!(
            "    {} -> {} ({})",
            op.source_path.display(),
            op.destination_path.display(),
            op.reason.as_deref().unwrap_or("collision")
        );
    }
}

fn print_execution(label: &str, summary: &ExecutionSummary) {
    for outcome in &summary.outcomes {
        let op = &outcome.operation;
        match outcome.status {
            OperationStatus::Applied => println!(
                "✓ {} {} -> {}",
                op.action.as_str(),
                op.source_path.display(),
                op.destination_path.display()
            ),
            OperationStatus::WouldApply => println!(
                "WOULD {} {} -> {}",
                op.action.as_str(),
                op.source_path.display(),
                op.destination_path.display()
            ),
            OperationStatus::Failed => eprintln!(
                "✗ {} {}: {}",
                op.action.as_str(),
                op.source_path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
            OperationStatus::Skipped => {}
        }
    }

    println!("\n{} Summary", label);
    println!("{}", "=".repeat(label.len() + 8));
    println!("  ✓ Succeeded: {}", summary.succeeded);
    println!("  ✗ Failed:    {}", summary.failed);
    println!("  - Skipped:   {}", summary.skipped);
    if let Some(batch) = &summary.batch_id {
        println!("  Journal batch: {} (`rollback` undoes it)", batch);
    }
}
