//! Source configuration
//!
//! The collector reads line-delimited JSON from stdin and groups lines into
//! transactions before handing them to the sink.

use std::time::Duration;

use serde::Deserialize;

/// Stdin source configuration
///
/// # Example
///
/// ```toml
/// [source]
/// batch_size = 100
/// linger = "1s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StdinSourceConfig {
    /// Maximum messages per transaction
    /// Default: 100
    pub batch_size: usize,

    /// Send a partial transaction when no new line arrives within this window
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub linger: Duration,
}

impl Default for StdinSourceConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            linger: Duration::from_secs(1),
        }
    }
}
