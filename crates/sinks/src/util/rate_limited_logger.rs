//! Rate-limited error logging
//!
//! A table with a bad column type fails every row; logging each one would
//! flood the log. [`RateLimitedLogger`] emits at most one line per interval
//! and reports how many errors were folded into it.
//!
//! ```ignore
//! let logger = RateLimitedLogger::new("clickhouse", Duration::from_secs(10));
//! for row in rows {
//!     if let Err(e) = write(row) {
//!         logger.error("failed to write row", &e);
//!     }
//! }
//! ```

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Default interval between log lines
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Payload bytes included in a log line
pub const MAX_PAYLOAD_LOG_LENGTH: usize = 256;

/// Logger that emits at most one error line per interval
pub struct RateLimitedLogger {
    /// Label attached to every line (usually the sink name)
    label: String,
    interval: Duration,
    last_logged: Mutex<Option<Instant>>,
    /// Errors since the last emitted line
    pending: AtomicU64,
    total: AtomicU64,
}

impl RateLimitedLogger {
    /// Create a logger with the given label and interval
    pub fn new(label: impl Into<String>, interval: Duration) -> Self {
        Self {
            label: label.into(),
            interval,
            last_logged: Mutex::new(None),
            pending: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Count an error; returns how many errors the emitted line covers, or
    /// `None` if the line is suppressed
    fn admit(&self) -> Option<u64> {
        self.pending.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);

        let now = Instant::now();
        {
            let mut last = self.last_logged.lock();
            if last.is_some_and(|at| now.duration_since(at) < self.interval) {
                return None;
            }
            *last = Some(now);
        }
        Some(self.pending.swap(0, Ordering::Relaxed))
    }

    /// Record an error, logging it unless suppressed
    ///
    /// Returns true if a line was emitted.
    pub fn error(&self, message: &str, error: &dyn Display) -> bool {
        let Some(covered) = self.admit() else {
            return false;
        };
        tracing::error!(
            sink = %self.label,
            error = %error,
            suppressed = covered.saturating_sub(1),
            total_errors = self.total_error_count(),
            "{message}"
        );
        true
    }

    /// Record an error together with the offending payload (truncated)
    pub fn error_with_payload(&self, message: &str, error: &dyn Display, payload: &[u8]) -> bool {
        let Some(covered) = self.admit() else {
            return false;
        };
        tracing::error!(
            sink = %self.label,
            error = %error,
            payload = %truncate_payload(payload),
            suppressed = covered.saturating_sub(1),
            total_errors = self.total_error_count(),
            "{message}"
        );
        true
    }

    /// Errors recorded since the last emitted line
    pub fn pending_error_count(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// Errors recorded in total
    pub fn total_error_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// The configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Lossy UTF-8 view of at most [`MAX_PAYLOAD_LOG_LENGTH`] bytes
pub fn truncate_payload(payload: &[u8]) -> String {
    if payload.len() <= MAX_PAYLOAD_LOG_LENGTH {
        return String::from_utf8_lossy(payload).into_owned();
    }
    format!(
        "{}... ({} bytes)",
        String::from_utf8_lossy(&payload[..MAX_PAYLOAD_LOG_LENGTH]),
        payload.len()
    )
}
