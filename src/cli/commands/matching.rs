//! Auto-match command.

use std::io::Write;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use super::Context;
use crate::enrichment::MusicBrainzClient;
use crate::matching::{AutoMatcher, MatchCategory};
use crate::progress::{CancelFlag, ChannelSink, ProgressEvent};

/// Auto-match scanned tracks against MusicBrainz
pub fn cmd_match(rt: &Runtime, ctx: &Context) -> anyhow::Result<()> {
    let mut session = ctx.load_session()?;
    if session.local_tracks.is_empty() {
        anyhow::bail!("No scanned tracks in the session; run `scan` first");
    }

    let mb = &ctx.config.musicbrainz;
    let client = MusicBrainzClient::with_base_url(mb.base_url.clone(), mb.request_interval())?;
    let matcher = AutoMatcher::with_thresholds(client, ctx.config.matching.thresholds());

    println!(
        "Matching {} tracks against MusicBrainz (Ctrl-C to stop)...",
        session.local_tracks.len()
    );

    let batch = rt.block_on(async {
        let cancel = CancelFlag::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    ProgressEvent::Progress {
                        processed, total, ..
                    } => {
                        print!("\r  {}/{}", processed, total);
                        let _ = std::io::stdout().flush();
                    }
                    ProgressEvent::Error { message } => eprintln!("\n✗ {}", message),
                    _ => {}
                }
            }
        });

        let mut sink = ChannelSink(tx);
        let batch = matcher
            .match_batch(&session.local_tracks, &mut sink, &cancel)
            .await;
        // Closing the channel lets the printer drain and stop
        drop(sink);
        if let Err(e) = printer.await {
            tracing::warn!("Progress printer stopped: {}", e);
        }
        batch
    });
    println!();

    let cancelled = batch.cancelled();
    let processed = batch.stats.processed;
    let total = batch.stats.total;

    println!("\nMatch Summary");
    println!("=============");
    println!("  ✓ Auto-approve: {}", batch.count(MatchCategory::AutoApprove));
    println!("  ? Review:       {}", batch.count(MatchCategory::Review));
    println!("  ✎ Manual:       {}", batch.count(MatchCategory::Manual));
    println!("  - No match:     {}", batch.count(MatchCategory::NoMatch));
    println!("  - Skipped:      {}", batch.count(MatchCategory::Skipped));
    println!("  ✗ Errors:       {}", batch.count(MatchCategory::Error));

    for result in batch
        .results
        .iter()
        .filter(|r| r.category == MatchCategory::Error)
        .take(10)
    {
        println!(
            "    {} - {}",
            result.original.display_name(),
            result.reason.as_deref().unwrap_or("unknown error")
        );
    }

    if cancelled {
        println!(
            "\nCancelled after {} of {} tracks; partial results kept.",
            processed, total
        );
    }

    session.set_match_results(batch.results);
    ctx.save_session(&mut session)?;
    println!("\nSession saved to {:?}", ctx.session_path);
    Ok(())
}
