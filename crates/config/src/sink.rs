//! Sink configuration
//!
//! Settings for the ClickHouse sink: where to connect, what to insert, how
//! to map message fields onto insert placeholders, and when to commit.

use std::time::Duration;

use serde::Deserialize;

/// ClickHouse sink configuration
///
/// # Example
///
/// ```toml
/// [sink]
/// connection_string = "http://default:@localhost:8123/analytics"
/// query = "INSERT INTO events (ts, name, count) VALUES (?, ?, ?)"
/// columns = ["ts$unixToDateOrNow", "name", "count$stringToInt32"]
/// batch_size = 500
/// batch_time = "3s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClickHouseSinkConfig {
    /// Driver connection string
    /// Default: "http://localhost:8123"
    pub connection_string: String,

    /// Insert template with one `?` placeholder per column
    /// Required
    pub query: String,

    /// Column specs, one per placeholder, in placeholder order
    /// (`field`, `field$conversion`, `field$conversion$arg...`)
    /// Required
    pub columns: Vec<String>,

    /// Rows per transaction before a commit is forced
    /// Default: 500
    pub batch_size: usize,

    /// Record-time window after which a commit is forced
    /// Default: 3000ms
    #[serde(with = "humantime_serde")]
    pub batch_time: Duration,

    /// Minimum interval between row error log lines
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub row_error_log_interval: Duration,
}

impl Default for ClickHouseSinkConfig {
    fn default() -> Self {
        Self {
            connection_string: "http://localhost:8123".into(),
            query: String::new(),
            columns: Vec::new(),
            batch_size: 500,
            batch_time: Duration::from_millis(3000),
            row_error_log_interval: Duration::from_secs(10),
        }
    }
}
