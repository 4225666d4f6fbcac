//! ClickHouse sink
//!
//! One spawned task owns the [`BatchWriter`]. It receives transactions from
//! upstream, writes every message as a row, lets the writer flush on its size
//! and time triggers, and answers each transaction with exactly one [`Ack`].
//!
//! ```text
//! recv ──> decode ──> extract ──> write_row ──> maybe_flush ──┐
//!  ^                                                           │ (per message)
//!  └──────────────── ack (races shutdown) <────────────────────┘
//! ```
//!
//! Receiving and acknowledging both race the shutdown token, so a stalled
//! upstream never blocks shutdown. Teardown (final commit, statement and
//! connection close) runs once, in the task, after the loop exits.

use std::sync::Arc;
use std::time::Duration;

use sluice_protocol::{Ack, Message, Transaction};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::column::{ColumnSpec, ConversionRegistry};
use crate::driver::Connection;
use crate::util::RateLimitedLogger;

use super::config::ClickHouseConfig;
use super::connection::ClickHouseConnection;
use super::error::ClickHouseSinkError;
use super::metrics::{ClickHouseMetrics, MetricsSnapshot};
use super::writer::{BatchWriter, FlushOutcome};

/// Default sink name used in logs
pub const DEFAULT_SINK_NAME: &str = "clickhouse";

// =============================================================================
// Sink
// =============================================================================

/// ClickHouse sink, ready to consume a transaction stream
pub struct ClickHouseSink {
    name: String,
    config: ClickHouseConfig,
    columns: Vec<ColumnSpec>,
    connection: Arc<dyn Connection>,
    metrics: Arc<ClickHouseMetrics>,
}

impl ClickHouseSink {
    /// Connect to ClickHouse and verify the server answers
    pub async fn connect(config: ClickHouseConfig) -> Result<Self, ClickHouseSinkError> {
        let connection = ClickHouseConnection::open(&config.connection_string)?;
        tracing::info!(dsn = %connection.dsn(), "connecting to clickhouse");
        connection.ping().await?;
        Self::with_connection(config, Arc::new(connection))
    }

    /// Build a sink on an existing connection
    pub fn with_connection(
        config: ClickHouseConfig,
        connection: Arc<dyn Connection>,
    ) -> Result<Self, ClickHouseSinkError> {
        config.validate()?;
        let columns = ColumnSpec::parse_all(&config.columns, ConversionRegistry::standard());

        Ok(Self {
            name: DEFAULT_SINK_NAME.into(),
            config,
            columns,
            connection,
            metrics: Arc::new(ClickHouseMetrics::new()),
        })
    }

    /// Set the name used in logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed column specifications, in placeholder order
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Shared metrics
    pub fn metrics(&self) -> Arc<ClickHouseMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Open the first transaction and start consuming
    ///
    /// Fails if the first transaction cannot be opened; afterwards all
    /// failures are handled inside the task.
    pub async fn consume(
        self,
        receiver: mpsc::Receiver<Transaction>,
    ) -> Result<SinkHandle, ClickHouseSinkError> {
        let mut writer = BatchWriter::new(
            Arc::clone(&self.connection),
            self.config.query.clone(),
            self.config.flush_policy(),
            Arc::clone(&self.metrics),
        );
        writer.open().await?;

        let shutdown = CancellationToken::new();
        let closed = CancellationToken::new();

        let task = IngestTask {
            row_errors: RateLimitedLogger::new(self.name.clone(), self.config.row_error_log_interval),
            name: self.name.clone(),
            receiver,
            writer,
            columns: self.columns,
            metrics: Arc::clone(&self.metrics),
            shutdown: shutdown.clone(),
        };

        tracing::info!(
            sink = %self.name,
            columns = task.columns.len(),
            batch_size = self.config.batch_size,
            batch_time = ?self.config.batch_time,
            "clickhouse sink consuming"
        );

        // Cancelled when the task finishes, even by panic
        let closed_guard = closed.clone().drop_guard();
        tokio::spawn(async move {
            let _closed = closed_guard;
            task.run().await
        });

        Ok(SinkHandle {
            name: Arc::from(self.name),
            shutdown,
            closed,
            connection: self.connection,
            metrics: self.metrics,
        })
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Control handle for a running sink
#[derive(Clone)]
pub struct SinkHandle {
    name: Arc<str>,
    shutdown: CancellationToken,
    closed: CancellationToken,
    connection: Arc<dyn Connection>,
    metrics: Arc<ClickHouseMetrics>,
}

impl SinkHandle {
    /// Request shutdown without waiting; safe to call any number of times
    pub fn close_async(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::info!(sink = %self.name, "close requested");
        }
        self.shutdown.cancel();
    }

    /// Wait until teardown has finished
    pub async fn wait_for_close(&self, timeout: Duration) -> Result<(), ClickHouseSinkError> {
        tokio::time::timeout(timeout, self.closed.cancelled())
            .await
            .map_err(|_| ClickHouseSinkError::ShutdownTimeout(timeout))
    }

    /// Request shutdown and wait for teardown
    pub async fn close(&self, timeout: Duration) -> Result<(), ClickHouseSinkError> {
        self.close_async();
        self.wait_for_close(timeout).await
    }

    /// Whether teardown has finished
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Whether the database answers a ping
    pub async fn is_connected(&self) -> bool {
        match self.connection.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(sink = %self.name, error = %e, "clickhouse ping failed");
                false
            }
        }
    }

    /// Current metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Sink name
    pub fn name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// Ingest task
// =============================================================================

struct IngestTask {
    name: String,
    receiver: mpsc::Receiver<Transaction>,
    writer: BatchWriter,
    columns: Vec<ColumnSpec>,
    metrics: Arc<ClickHouseMetrics>,
    shutdown: CancellationToken,
    row_errors: RateLimitedLogger,
}

impl IngestTask {
    async fn run(mut self) -> MetricsSnapshot {
        loop {
            let transaction = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!(sink = %self.name, "shutdown requested");
                    break;
                }
                next = self.receiver.recv() => match next {
                    Some(transaction) => transaction,
                    None => {
                        tracing::info!(sink = %self.name, "upstream closed");
                        break;
                    }
                },
            };

            self.metrics.record_batch_received();
            let (messages, response) = transaction.into_parts();
            let ack = self.process(&messages).await;

            tokio::select! {
                biased;
                sent = response.send(ack) => match sent {
                    Ok(()) => self.metrics.record_ack_sent(),
                    Err(_) => tracing::debug!(sink = %self.name, "ack receiver dropped"),
                },
                _ = self.shutdown.cancelled() => {
                    tracing::info!(sink = %self.name, "shutdown requested while acknowledging");
                    break;
                }
            }
        }

        self.teardown().await
    }

    async fn process(&mut self, messages: &[Message]) -> Ack {
        let mut ack = Ack::default();

        for message in messages {
            match self.write_message(message).await {
                Ok(()) => {
                    ack.rows_written += 1;
                    self.metrics.record_row_written();
                }
                Err(e) => {
                    ack.rows_failed += 1;
                    self.metrics.record_row_failed();
                    if matches!(e, ClickHouseSinkError::Decode(_)) {
                        self.row_errors
                            .error_with_payload("failed to decode message", &e, message.payload());
                    } else {
                        self.row_errors.error("failed to write row", &e);
                    }
                }
            }

            match self.writer.maybe_flush(message.created_at()).await {
                FlushOutcome::NotDue => {}
                FlushOutcome::Committed { rows } => {
                    tracing::info!(sink = %self.name, rows, "committed batch");
                }
                FlushOutcome::Degraded { rows, error } => {
                    tracing::error!(
                        sink = %self.name,
                        rows,
                        error = %error,
                        "flush failed, next row will retry opening a transaction"
                    );
                }
            }
        }

        ack
    }

    async fn write_message(&mut self, message: &Message) -> Result<(), ClickHouseSinkError> {
        let record = message.structured().inspect_err(|_| {
            self.metrics.record_decode_error();
        })?;
        let args = ColumnSpec::extract_all(&self.columns, &record);
        self.writer.write_row(&args).await?;
        Ok(())
    }

    async fn teardown(mut self) -> MetricsSnapshot {
        let pending = self.writer.pending_rows();
        match self.writer.close().await {
            Ok(()) => tracing::info!(sink = %self.name, rows = pending, "final commit done"),
            Err(e) => tracing::error!(sink = %self.name, rows = pending, error = %e, "teardown failed"),
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            sink = %self.name,
            batches_received = snapshot.batches_received,
            rows_written = snapshot.rows_written,
            rows_failed = snapshot.rows_failed,
            commits = snapshot.commits,
            commit_errors = snapshot.commit_errors,
            "clickhouse sink stopped"
        );
        snapshot
    }
}

#[cfg(test)]
#[path = "sink_test.rs"]
mod sink_test;
