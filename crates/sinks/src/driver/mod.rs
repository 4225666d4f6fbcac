//! Database driver seam
//!
//! The batch writer talks to the database only through these traits:
//!
//! ```text
//! Connection --begin--> Transaction --prepare--> Statement --execute--> (row)
//!                           |                        |
//!                        commit                    close
//! ```
//!
//! A transaction owns everything executed through its statements until
//! `commit`. Dropping a transaction without committing discards its rows.

mod template;

pub use template::{InsertTemplate, PLACEHOLDER};

use async_trait::async_trait;

use crate::column::Param;

// =============================================================================
// Errors
// =============================================================================

/// Errors raised by a driver
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// ClickHouse client error
    #[error("clickhouse error: {0}")]
    ClickHouse(#[from] clickhouse::error::Error),

    /// Connection string could not be understood
    #[error("invalid connection string: {0}")]
    InvalidDsn(String),

    /// Insert template could not be prepared
    #[error("invalid insert template: {0}")]
    InvalidTemplate(String),

    /// Execute called with the wrong number of parameters
    #[error("statement expects {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    /// Connection used after close
    #[error("connection is closed")]
    ConnectionClosed,

    /// Backend-specific failure
    #[error("{0}")]
    Backend(String),
}

impl DriverError {
    /// Create an invalid connection string error
    pub fn invalid_dsn(msg: impl Into<String>) -> Self {
        Self::InvalidDsn(msg.into())
    }

    /// Create an invalid template error
    pub fn invalid_template(msg: impl Into<String>) -> Self {
        Self::InvalidTemplate(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

// =============================================================================
// Traits
// =============================================================================

/// A database connection
#[async_trait]
pub trait Connection: Send + Sync {
    /// Round-trip to the server
    async fn ping(&self) -> Result<(), DriverError>;

    /// Start a new transaction
    async fn begin(&self) -> Result<Box<dyn Transaction>, DriverError>;

    /// Release the connection; later calls fail with `ConnectionClosed`
    async fn close(&self) -> Result<(), DriverError>;
}

/// An open transaction
#[async_trait]
pub trait Transaction: Send {
    /// Prepare a statement bound to this transaction
    async fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement>, DriverError>;

    /// Make every row executed in this transaction durable
    async fn commit(self: Box<Self>) -> Result<(), DriverError>;
}

/// A prepared statement
#[async_trait]
pub trait Statement: Send {
    /// Execute with positional parameters
    async fn execute(&mut self, args: &[Param]) -> Result<(), DriverError>;

    /// Release the statement
    async fn close(self: Box<Self>) -> Result<(), DriverError>;
}
