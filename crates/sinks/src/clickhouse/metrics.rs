//! ClickHouse sink metrics
//!
//! Atomic counters for tracking sink throughput and health.

use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// Metrics
// =============================================================================

/// Metrics for the ClickHouse sink
#[derive(Debug, Default)]
pub struct ClickHouseMetrics {
    /// Transactions received from upstream
    pub batches_received: AtomicU64,

    /// Acks delivered upstream
    pub acks_sent: AtomicU64,

    /// Rows executed against the open statement
    pub rows_written: AtomicU64,

    /// Rows that could not be decoded or executed
    pub rows_failed: AtomicU64,

    /// Messages that were not a JSON object
    pub decode_errors: AtomicU64,

    /// Successful commits
    pub commits: AtomicU64,

    /// Rows made durable by successful commits
    pub rows_committed: AtomicU64,

    /// Failed commits
    pub commit_errors: AtomicU64,

    /// Failed begin/prepare attempts
    pub open_errors: AtomicU64,
}

impl ClickHouseMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            batches_received: AtomicU64::new(0),
            acks_sent: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            rows_failed: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            commits: AtomicU64::new(0),
            rows_committed: AtomicU64::new(0),
            commit_errors: AtomicU64::new(0),
            open_errors: AtomicU64::new(0),
        }
    }

    /// Record a transaction received
    #[inline]
    pub fn record_batch_received(&self) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an ack delivered
    #[inline]
    pub fn record_ack_sent(&self) {
        self.acks_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a row executed
    #[inline]
    pub fn record_row_written(&self) {
        self.rows_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed row
    #[inline]
    pub fn record_row_failed(&self) {
        self.rows_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a decode error
    #[inline]
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful commit of `rows` rows
    #[inline]
    pub fn record_commit(&self, rows: u64) {
        self.commits.fetch_add(1, Ordering::Relaxed);
        self.rows_committed.fetch_add(rows, Ordering::Relaxed);
    }

    /// Record a failed commit
    #[inline]
    pub fn record_commit_error(&self) {
        self.commit_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed begin/prepare
    #[inline]
    pub fn record_open_error(&self) {
        self.open_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_received: self.batches_received.load(Ordering::Relaxed),
            acks_sent: self.acks_sent.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            rows_failed: self.rows_failed.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            rows_committed: self.rows_committed.load(Ordering::Relaxed),
            commit_errors: self.commit_errors.load(Ordering::Relaxed),
            open_errors: self.open_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_received: u64,
    pub acks_sent: u64,
    pub rows_written: u64,
    pub rows_failed: u64,
    pub decode_errors: u64,
    pub commits: u64,
    pub rows_committed: u64,
    pub commit_errors: u64,
    pub open_errors: u64,
}
