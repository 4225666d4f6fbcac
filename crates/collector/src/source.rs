//! Line source
//!
//! Reads newline-delimited JSON and groups lines into transactions of up to
//! `batch_size` messages. A partial group is sent once its first line has
//! waited `linger`, or at end of input. Each message is stamped with the time
//! it was read.
//!
//! Transactions are sent one at a time: the next group is only dispatched
//! after the sink acknowledged the previous one.

use std::time::Duration;

use anyhow::{Context, Result};
use sluice_config::StdinSourceConfig;
use sluice_protocol::{Message, Transaction};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Counters reported when the source stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub lines_read: u64,
    pub transactions: u64,
    pub rows_written: u64,
    pub rows_failed: u64,
}

/// Reads JSON lines and forwards them as transactions
pub struct LineSource<R> {
    reader: R,
    batch_size: usize,
    linger: Duration,
    stats: SourceStats,
}

impl<R: AsyncBufRead + Unpin> LineSource<R> {
    /// Create a source over `reader`
    pub fn new(reader: R, config: &StdinSourceConfig) -> Self {
        Self {
            reader,
            batch_size: config.batch_size.max(1),
            linger: config.linger,
            stats: SourceStats::default(),
        }
    }

    /// Run until end of input, shutdown, or the sink going away
    pub async fn run(
        mut self,
        sink: mpsc::Sender<Transaction>,
        shutdown: CancellationToken,
    ) -> Result<SourceStats> {
        let mut lines = (&mut self.reader).lines();
        let mut pending: Vec<Message> = Vec::with_capacity(self.batch_size);
        let mut deadline = Instant::now();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(dropped = pending.len(), "source stopping on shutdown");
                    break;
                }
                _ = tokio::time::sleep_until(deadline), if !pending.is_empty() => {
                    let messages = std::mem::take(&mut pending);
                    if !dispatch(&mut self.stats, messages, &sink, &shutdown).await {
                        break;
                    }
                }
                line = lines.next_line() => {
                    match line.context("failed to read input")? {
                        Some(line) if line.trim().is_empty() => {}
                        Some(line) => {
                            self.stats.lines_read += 1;
                            if pending.is_empty() {
                                deadline = Instant::now() + self.linger;
                            }
                            pending.push(Message::new(line));
                            if pending.len() >= self.batch_size {
                                let messages = std::mem::take(&mut pending);
                                if !dispatch(&mut self.stats, messages, &sink, &shutdown).await {
                                    break;
                                }
                            }
                        }
                        None => {
                            if !pending.is_empty() {
                                let messages = std::mem::take(&mut pending);
                                dispatch(&mut self.stats, messages, &sink, &shutdown).await;
                            }
                            info!(lines = self.stats.lines_read, "end of input");
                            break;
                        }
                    }
                }
            }
        }

        Ok(self.stats)
    }
}

/// Send one transaction and wait for its ack; false if the source should stop
async fn dispatch(
    stats: &mut SourceStats,
    messages: Vec<Message>,
    sink: &mpsc::Sender<Transaction>,
    shutdown: &CancellationToken,
) -> bool {
    let count = messages.len();
    let (transaction, mut ack) = Transaction::with_ack_channel(messages);

    tokio::select! {
        sent = sink.send(transaction) => {
            if sent.is_err() {
                warn!(messages = count, "sink stopped, dropping transaction");
                return false;
            }
        }
        _ = shutdown.cancelled() => return false,
    }
    stats.transactions += 1;

    tokio::select! {
        ack = ack.recv() => match ack {
            Some(ack) => {
                stats.rows_written += ack.rows_written;
                stats.rows_failed += ack.rows_failed;
                if ack.is_complete() {
                    debug!(rows = ack.rows_written, "transaction acknowledged");
                } else {
                    warn!(
                        rows_written = ack.rows_written,
                        rows_failed = ack.rows_failed,
                        "transaction partially written"
                    );
                }
                true
            }
            None => {
                warn!(messages = count, "transaction dropped without ack");
                true
            }
        },
        _ = shutdown.cancelled() => false,
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod source_test;
