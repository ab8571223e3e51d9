//! Counters published by the reconciliation loop.

use serde::Serialize;

use crate::domain::foundation::Timestamp;

/// Result of one poll iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Records returned by the device.
    pub pulled: usize,
    /// Events dispatched (fee lookup and print attempted).
    pub dispatched: usize,
    /// Events skipped because their key was already recorded.
    pub duplicates: usize,
    /// Events skipped because they occurred outside the dedup window.
    pub stale: usize,
    /// Records that could not be normalized.
    pub malformed: usize,
    /// Whether the device could not be polled this iteration.
    pub poll_failed: bool,
}

/// Cumulative view of the loop, readable by the HTTP façade.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoopSnapshot {
    pub device_connected: bool,
    pub iterations: u64,
    pub processed: u64,
    pub duplicates_skipped: u64,
    pub stale_skipped: u64,
    pub malformed: u64,
    pub approvals: u64,
    pub denials: u64,
    pub print_failures: u64,
    pub notify_failures: u64,
    pub poll_failures: u64,
    pub reconnects: u64,
    pub ledger_size: usize,
    pub last_poll_at: Option<Timestamp>,
}

impl LoopSnapshot {
    pub(super) fn absorb(&mut self, batch: &BatchSummary) {
        self.iterations += 1;
        self.processed += batch.dispatched as u64;
        self.duplicates_skipped += batch.duplicates as u64;
        self.stale_skipped += batch.stale as u64;
        self.malformed += batch.malformed as u64;
        if batch.poll_failed {
            self.poll_failures += 1;
        }
    }
}
