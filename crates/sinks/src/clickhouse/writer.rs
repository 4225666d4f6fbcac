//! Batch writer
//!
//! Owns the connection and the one open transaction + prepared statement pair.
//! Rows are executed into the open transaction; [`BatchWriter::maybe_flush`]
//! commits it when the batch is full or old enough, then opens the next one.
//!
//! Flush timing follows record creation time, not the wall clock, so replaying
//! the same input produces the same transaction boundaries.
//!
//! ```text
//! open() -> write_row()* -> maybe_flush(ts) --due--> commit, close stmt, open()
//!                                 |
//!                              not due
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::column::Param;
use crate::driver::{Connection, DriverError, Statement, Transaction};

use super::metrics::ClickHouseMetrics;

// =============================================================================
// Flush policy
// =============================================================================

/// When an open transaction is committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPolicy {
    /// Flush once this many rows are pending
    pub batch_size: usize,
    /// Flush once a record is newer than the last commit by more than this
    pub batch_time: Duration,
}

impl FlushPolicy {
    /// Create a flush policy
    pub const fn new(batch_size: usize, batch_time: Duration) -> Self {
        Self {
            batch_size,
            batch_time,
        }
    }

    /// Whether a flush is due
    pub fn is_due(&self, pending_rows: usize, last_commit: DateTime<Utc>, record_ts: DateTime<Utc>) -> bool {
        if pending_rows >= self.batch_size {
            return true;
        }
        let span = TimeDelta::from_std(self.batch_time).unwrap_or(TimeDelta::MAX);
        last_commit
            .checked_add_signed(span)
            .is_some_and(|deadline| deadline < record_ts)
    }
}

/// Result of [`BatchWriter::maybe_flush`]
#[derive(Debug)]
pub enum FlushOutcome {
    /// No trigger fired
    NotDue,
    /// The transaction was committed and a new one opened
    Committed { rows: usize },
    /// A flush ran but the commit or the re-open failed
    ///
    /// The writer has no open transaction until the next successful open.
    Degraded { rows: usize, error: DriverError },
}

impl FlushOutcome {
    /// Whether a flush was attempted
    pub fn flushed(&self) -> bool {
        !matches!(self, Self::NotDue)
    }
}

// =============================================================================
// Writer
// =============================================================================

struct OpenBatch {
    transaction: Box<dyn Transaction>,
    statement: Box<dyn Statement>,
}

async fn begin_batch(connection: &dyn Connection, query: &str) -> Result<OpenBatch, DriverError> {
    let mut transaction = connection.begin().await?;
    let statement = transaction.prepare(query).await?;
    Ok(OpenBatch {
        transaction,
        statement,
    })
}

/// Batching transaction manager
pub struct BatchWriter {
    connection: Arc<dyn Connection>,
    query: String,
    policy: FlushPolicy,
    current: Option<OpenBatch>,
    pending_rows: usize,
    last_commit: Option<DateTime<Utc>>,
    closed: bool,
    metrics: Arc<ClickHouseMetrics>,
}

impl BatchWriter {
    /// Create a writer; call [`open`](Self::open) before writing rows
    pub fn new(
        connection: Arc<dyn Connection>,
        query: impl Into<String>,
        policy: FlushPolicy,
        metrics: Arc<ClickHouseMetrics>,
    ) -> Self {
        Self {
            connection,
            query: query.into(),
            policy,
            current: None,
            pending_rows: 0,
            last_commit: None,
            closed: false,
            metrics,
        }
    }

    /// Begin a transaction and prepare the insert template
    ///
    /// No-op if a transaction is already open.
    pub async fn open(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::ConnectionClosed);
        }
        if self.current.is_some() {
            return Ok(());
        }

        match begin_batch(self.connection.as_ref(), &self.query).await {
            Ok(batch) => {
                self.current = Some(batch);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_open_error();
                Err(e)
            }
        }
    }

    /// Execute one row in the open transaction
    ///
    /// Re-opens first if a previous flush left no transaction open. Failures are
    /// returned as-is; nothing is rolled back or retried.
    pub async fn write_row(&mut self, args: &[Param]) -> Result<(), DriverError> {
        self.open().await?;

        let Some(batch) = self.current.as_mut() else {
            return Err(DriverError::backend("no open transaction"));
        };
        batch.statement.execute(args).await?;
        self.pending_rows += 1;
        Ok(())
    }

    /// Commit if the batch is full or `record_ts` is past the batch time
    pub async fn maybe_flush(&mut self, record_ts: DateTime<Utc>) -> FlushOutcome {
        let last_commit = *self.last_commit.get_or_insert(record_ts);
        if self.closed || !self.policy.is_due(self.pending_rows, last_commit, record_ts) {
            return FlushOutcome::NotDue;
        }

        let rows = self.pending_rows;
        let mut first_error = self.commit_current().await.err();

        self.pending_rows = 0;
        self.last_commit = Some(record_ts);

        if let Err(e) = self.open().await {
            first_error.get_or_insert(e);
        }

        match first_error {
            None => FlushOutcome::Committed { rows },
            Some(error) => FlushOutcome::Degraded { rows, error },
        }
    }

    /// Commit pending rows, close the statement and the connection
    ///
    /// Runs once; later calls return `Ok(())`.
    pub async fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut first_error = self.commit_current().await.err();
        self.pending_rows = 0;

        if let Err(e) = self.connection.close().await {
            first_error.get_or_insert(e);
        }

        match first_error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    async fn commit_current(&mut self) -> Result<(), DriverError> {
        let Some(OpenBatch {
            transaction,
            statement,
        }) = self.current.take()
        else {
            return Ok(());
        };

        let rows = self.pending_rows as u64;
        let result = transaction.commit().await;
        match &result {
            Ok(()) => self.metrics.record_commit(rows),
            Err(e) => {
                self.metrics.record_commit_error();
                tracing::error!(rows, error = %e, "commit failed, rows lost");
            }
        }

        if let Err(e) = statement.close().await {
            tracing::warn!(error = %e, "failed to close statement");
        }
        result
    }

    /// Rows executed since the last commit
    pub fn pending_rows(&self) -> usize {
        self.pending_rows
    }

    /// Record timestamp of the last commit (seeded by the first record)
    pub fn last_commit(&self) -> Option<DateTime<Utc>> {
        self.last_commit
    }

    /// Whether a transaction is open
    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Whether [`close`](Self::close) has run
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The flush policy
    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;
