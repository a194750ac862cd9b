//! Live library comparison command.

use anyhow::Context as _;
use std::path::Path;
use tokio::runtime::Runtime;

use super::Context;
use crate::compare::{self, ConflictCategory, LibraryComparator};
use crate::plex::PlexClient;
use crate::progress::{CancelFlag, NoProgress};

/// Compare scanned tracks against the Plex library
pub fn cmd_compare(
    rt: &Runtime,
    ctx: &Context,
    section: Option<&str>,
    plex_url: Option<&str>,
    token: Option<&str>,
    csv: Option<&Path>,
) -> anyhow::Result<()> {
    let mut session = ctx.load_session()?;
    if session.local_tracks.is_empty() {
        anyhow::bail!("No scanned tracks in the session; run `scan` first");
    }

    let url = plex_url.unwrap_or(&ctx.config.plex.url);
    let token = token
        .or(ctx.config.plex.token.as_deref())
        .context("No Plex token; pass --token, set PLEX_TOKEN or [plex] token")?;
    let client = PlexClient::new(url, token)?;

    let snapshot = rt.block_on(async {
        let section_id = match section.or(ctx.config.plex.section_id.as_deref()) {
            Some(id) => id.to_string(),
            None => {
                let sections = client.music_sections().await?;
                let (id, title) = sections
                    .into_iter()
                    .next()
                    .context("Plex server has no music library")?;
                println!("Using music library \"{}\" (section {})", title, id);
                id
            }
        };
        println!("Fetching tracks from {} ...", url);
        anyhow::Ok(client.fetch_tracks(&section_id).await?)
    })?;

    let comparator = LibraryComparator::with_near_miss_threshold(ctx.config.matching.near_miss_threshold);
    let report = comparator.compare(
        &session.local_tracks,
        &snapshot,
        &mut NoProgress,
        &CancelFlag::new(),
    );

    session.set_remote_snapshot(snapshot);
    ctx.save_session(&mut session)?;

    println!("\nComparison Summary");
    println!("==================");
    println!("  Live library tracks:     {}", session.remote_snapshot.len());
    println!("  Offline tracks:          {}", report.total);
    println!("  ✓ Safe to add:           {}", report.counts.safe_to_add);
    println!("  ↑ Quality upgrades:      {}", report.counts.quality_upgrade);
    println!("  ↓ Quality downgrades:    {}", report.counts.quality_downgrade);
    println!("  = Same-quality duplicates: {}", report.counts.same_quality_duplicate);

    let upgrades: Vec<_> = report.conflicts_in(ConflictCategory::QualityUpgrade).collect();
    if !upgrades.is_empty() {
        println!("\nUpgrades:");
        for record in upgrades.iter().take(20) {
            println!("  {}", record.local.display_name());
        }
        if upgrades.len() > 20 {
            println!("  ... and {} more", upgrades.len() - 20);
        }
    }

    if let Some(path) = csv {
        compare::export_csv(&report, path)?;
        println!("\n✓ Conflict report written to {:?}", path);
    }

    Ok(())
}
