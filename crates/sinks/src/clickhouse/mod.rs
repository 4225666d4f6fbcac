//! ClickHouse Sink - batched transactional inserts
//!
//! Writes each message as one row of a user-supplied insert template. Column
//! values are extracted from the message's JSON object by [`ColumnSpec`]s and
//! bound positionally to the template's `?` placeholders.
//!
//! # Features
//!
//! - **Explicit transactions**: one open transaction + prepared statement at a time
//! - **Size and time flushes**: commit after `batch_size` rows, or once a
//!   record is more than `batch_time` newer than the last commit
//! - **Forward-only**: failed rows are counted and skipped, never retried
//! - **One ack per transaction**: with written and failed row counts
//! - **Run-once shutdown**: final commit and connection close exactly once
//!
//! # Connection strings
//!
//! | Scheme | Transport | Default port |
//! |--------|-----------|--------------|
//! | `http://` | HTTP | 80 |
//! | `https://` | HTTPS | 443 |
//! | `clickhouse://` | HTTP | 8123 |
//!
//! [`ColumnSpec`]: crate::column::ColumnSpec

mod config;
mod connection;
mod error;
mod metrics;
mod sink;
mod writer;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export public API
pub use config::{
    ClickHouseConfig, DEFAULT_BATCH_SIZE, DEFAULT_BATCH_TIME, DEFAULT_CONNECTION_STRING,
    DEFAULT_ROW_ERROR_LOG_INTERVAL,
};
pub use connection::{
    ClickHouseConnection, ClickHouseStatement, ClickHouseTransaction, DEFAULT_HTTP_PORT, Dsn,
};
pub use error::ClickHouseSinkError;
pub use metrics::{ClickHouseMetrics, MetricsSnapshot};
pub use sink::{ClickHouseSink, DEFAULT_SINK_NAME, SinkHandle};
pub use writer::{BatchWriter, FlushOutcome, FlushPolicy};
