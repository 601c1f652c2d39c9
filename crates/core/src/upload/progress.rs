//! Progress aggregation
//!
//! Only the coordinating task mutates the aggregator; observers read
//! snapshots from a `watch` channel. The channel closes when the aggregator
//! is dropped, which happens when the upload ends.

use mgsdb_domain::{UploadPhase, UploadProgress};
use tokio::sync::watch;

/// Running total of acknowledged bytes for one upload
#[derive(Debug)]
pub struct ProgressAggregator {
    snapshot: UploadProgress,
    sender: watch::Sender<UploadProgress>,
}

impl ProgressAggregator {
    /// Create an aggregator and the receiver observers subscribe through.
    pub fn channel(total_bytes: u64, total_parts: u32) -> (Self, watch::Receiver<UploadProgress>) {
        let snapshot = UploadProgress::new(total_bytes, total_parts);
        let (sender, receiver) = watch::channel(snapshot);
        (Self { snapshot, sender }, receiver)
    }

    /// Publish into an existing channel, resetting it for this upload.
    pub fn with_sender(
        sender: watch::Sender<UploadProgress>,
        total_bytes: u64,
        total_parts: u32,
    ) -> Self {
        let aggregator = Self { snapshot: UploadProgress::new(total_bytes, total_parts), sender };
        aggregator.publish();
        aggregator
    }

    pub fn snapshot(&self) -> UploadProgress {
        self.snapshot
    }

    /// Record one acknowledged part of `bytes` length.
    pub fn advance(&mut self, bytes: u64) {
        let progress = &mut self.snapshot;
        progress.bytes_done = (progress.bytes_done + bytes).min(progress.total_bytes);
        progress.parts_done = (progress.parts_done + 1).min(progress.total_parts);
        progress.percent = percent(progress.bytes_done, progress.total_bytes);
        self.publish();
    }

    /// Record body bytes sent but not yet acknowledged.
    ///
    /// Never lowers the byte count and keeps the percentage below 100, which
    /// only an acknowledgement may reach.
    pub fn report_sent(&mut self, bytes: u64) {
        let progress = &mut self.snapshot;
        let bytes = bytes.min(progress.total_bytes);
        if bytes <= progress.bytes_done {
            return;
        }
        progress.bytes_done = bytes;
        progress.percent = percent(bytes, progress.total_bytes).min(99);
        self.publish();
    }

    /// Move to `phase`; `Completed` also pins the counters to their totals.
    pub fn set_phase(&mut self, phase: UploadPhase) {
        if self.snapshot.phase.is_terminal() {
            return;
        }
        self.snapshot.phase = phase;
        if phase == UploadPhase::Completed {
            self.snapshot.bytes_done = self.snapshot.total_bytes;
            self.snapshot.parts_done = self.snapshot.total_parts;
            self.snapshot.percent = 100;
        }
        self.publish();
    }

    fn publish(&self) {
        // No receivers left is fine; progress is advisory.
        let _ = self.sender.send(self.snapshot);
    }
}

/// Rounded percentage that only reaches 100 once `done == total`.
pub fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return if done == 0 { 0 } else { 100 };
    }
    if done >= total {
        return 100;
    }
    let rounded = (u128::from(done) * 100 + u128::from(total) / 2) / u128::from(total);
    u8::try_from(rounded.min(99)).unwrap_or(99)
}
