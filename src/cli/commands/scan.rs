//! Local scanning command.

use std::path::Path;
use tokio::runtime::Runtime;

use super::Context;
use crate::scanner;

/// Scan a directory and store its tracks in the session
pub fn cmd_scan(rt: &Runtime, ctx: &Context, path: &Path) -> anyhow::Result<()> {
    println!("Scanning directory: {:?}", path);

    let outcome = rt.block_on(scanner::scan_tracks(path))?;

    let mut session = ctx.load_session()?;
    session.set_local_tracks(path.to_path_buf(), outcome.tracks.clone());
    ctx.save_session(&mut session)?;

    println!("\nScan complete.");
    println!("  ✓ Tracks:     {}", outcome.tracks.len());
    println!("  ✗ Unreadable: {}", outcome.errors.len());

    for err in outcome.errors.iter().take(10) {
        println!("    {} - {}", err.path.display(), err.message);
    }
    if outcome.errors.len() > 10 {
        println!("    ... and {} more", outcome.errors.len() - 10);
    }

    println!("\nSession saved to {:?}", ctx.session_path);
    Ok(())
}
