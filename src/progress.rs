//! Typed progress reporting and cancellation for batch stages.
//!
//! Every batch (compare, match, execute, rollback) reports through a
//! [`ProgressSink`]. Hosts pick the transport: a closure, a tokio channel via
//! [`ChannelSink`], or [`NoProgress`] when nobody is listening.
//!
//! Cancellation is cooperative. A stage checks its [`CancelFlag`] between
//! items, never in the middle of one.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Event emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// One more item finished
    Progress {
        processed: usize,
        total: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_file: Option<String>,
        /// Percentage 0-100
        progress: u8,
    },
    /// One more file operation finished, with running outcome counts
    Executed {
        processed: usize,
        total: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_file: Option<String>,
        progress: u8,
        succeeded: usize,
        failed: usize,
    },
    /// The batch finished (possibly cancelled)
    Complete { stats: BatchStats },
    /// The batch could not run at all
    Error { message: String },
}

/// Aggregate counters attached to the terminal event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub processed: usize,
    pub total: usize,
    /// Per-category counts, keyed by category name
    pub counts: BTreeMap<String, usize>,
    pub cancelled: bool,
}

impl BatchStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Count one item in `category`.
    pub fn record(&mut self, category: &str) {
        *self.counts.entry(category.to_string()).or_default() += 1;
    }

    pub fn count(&self, category: &str) -> usize {
        self.counts.get(category).copied().unwrap_or(0)
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed)
    }
}

/// Receiver of progress events.
pub trait ProgressSink {
    fn emit(&mut self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressEvent),
{
    fn emit(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&mut self, _event: ProgressEvent) {}
}

/// Forwards events into an unbounded tokio channel.
///
/// A dropped receiver is not an error; the batch keeps running.
#[derive(Debug, Clone)]
pub struct ChannelSink(pub mpsc::UnboundedSender<ProgressEvent>);

impl ProgressSink for ChannelSink {
    fn emit(&mut self, event: ProgressEvent) {
        let _ = self.0.send(event);
    }
}

/// Shared flag a host sets to stop a running batch between items.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Percentage of `processed` over `total`, 100 for an empty batch.
pub fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((processed.min(total) * 100) / total) as u8
}

/// Build a progress event for the item just finished.
pub fn progress_event(processed: usize, total: usize, current_file: Option<String>) -> ProgressEvent {
    ProgressEvent::Progress {
        processed,
        total,
        current_file,
        progress: percent(processed, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 4), 0);
        assert_eq!(percent(1, 4), 25);
        assert_eq!(percent(4, 4), 100);
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(9, 4), 100);
    }

    #[test]
    fn test_closure_sink_collects_events() {
        let mut events = Vec::new();
        {
            let mut sink = |e: ProgressEvent| events.push(e);
            sink.emit(progress_event(1, 2, Some("a.mp3".to_string())));
        }
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            ProgressEvent::Progress { processed: 1, total: 2, progress: 50, .. }
        ));
    }

    #[tokio::test]
    async fn test_channel_sink_survives_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut sink = ChannelSink(tx);
        sink.emit(ProgressEvent::Error {
            message: "nobody listening".to_string(),
        });
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!flag.is_cancelled());
        other.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_stats_record_and_remaining() {
        let mut stats = BatchStats::new(3);
        stats.record("review");
        stats.record("review");
        stats.processed = 2;
        assert_eq!(stats.count("review"), 2);
        assert_eq!(stats.count("manual"), 0);
        assert_eq!(stats.remaining(), 1);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(progress_event(1, 4, None)).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["progress"], 25);
        assert!(json.get("current_file").is_none());
    }
}
