//! ClickHouse sink errors

use std::time::Duration;

use sluice_protocol::ProtocolError;

use crate::driver::DriverError;

/// Errors from the ClickHouse sink
#[derive(Debug, thiserror::Error)]
pub enum ClickHouseSinkError {
    /// Driver error (connect, begin, prepare, execute, commit)
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// Message payload is not a JSON object
    #[error("failed to decode message: {0}")]
    Decode(#[from] ProtocolError),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Column list does not match the insert template
    #[error("insert template has {placeholders} placeholders but {columns} columns are configured")]
    ColumnMismatch { placeholders: usize, columns: usize },

    /// Teardown did not finish in time
    #[error("sink did not shut down within {0:?}")]
    ShutdownTimeout(Duration),
}

impl ClickHouseSinkError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
