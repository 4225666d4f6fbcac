//! Sluice - Sinks
//!
//! The ClickHouse sink: turns a stream of JSON messages into typed positional
//! parameters and writes them in explicitly managed, batched transactions.
//!
//! # Architecture
//!
//! ```text
//! [Transaction] --mpsc--> [Ingest Task] --> [ColumnSpec::apply] --> [BatchWriter] --> [Connection]
//!       ^                                                                 |
//!       +--------------------------- Ack ---------------------------------+
//! ```
//!
//! The writer only sees the driver traits in [`driver`], so the batching and
//! flush logic is independent of the wire protocol used to reach ClickHouse.
//!
//! # Example
//!
//! ```ignore
//! use sluice_sinks::clickhouse::{ClickHouseConfig, ClickHouseSink};
//! use tokio::sync::mpsc;
//!
//! let config = ClickHouseConfig::default()
//!     .with_query("INSERT INTO events (id, ts) VALUES (?, ?)")
//!     .with_columns(["id$stringToInt32", "ts$unixToDateOrNow"]);
//!
//! let (tx, rx) = mpsc::channel(1000);
//! let sink = ClickHouseSink::connect(config).await?;
//! let handle = sink.consume(rx).await?;
//!
//! // ... send transactions on `tx` ...
//!
//! handle.close_async();
//! handle.wait_for_close(Duration::from_secs(10)).await?;
//! ```

// =============================================================================
// Building blocks
// =============================================================================

/// Field interpolation engine (column mini-language and conversions)
pub mod column;

/// Database driver seam (connection, transaction, statement traits)
pub mod driver;

// =============================================================================
// Sink implementations
// =============================================================================

/// ClickHouse sink - batched transactional inserts
pub mod clickhouse;

// =============================================================================
// Shared utilities
// =============================================================================

/// Shared utilities (rate-limited logging)
pub mod util;
