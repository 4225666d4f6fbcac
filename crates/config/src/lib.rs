//! Sluice Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Only the sink's insert query and columns are required.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use sluice_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str(
//!     "[sink]\nquery = \"INSERT INTO t (a) VALUES (?)\"\ncolumns = [\"a\"]",
//! )
//! .unwrap();
//! assert_eq!(config.sink.batch_size, 500);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [global]
//! queue_size = 1000
//! shutdown_timeout = "10s"
//!
//! [log]
//! level = "info"
//! format = "console"
//!
//! [source]
//! batch_size = 100
//! linger = "1s"
//!
//! [sink]
//! connection_string = "http://default:@localhost:8123/analytics"
//! query = "INSERT INTO events (ts, name, count) VALUES (?, ?, ?)"
//! columns = ["ts$unixToDateOrNow", "name", "count$stringToInt32"]
//! batch_size = 500
//! batch_time = "3s"
//! ```

mod error;
mod global;
mod logging;
mod sink;
mod source;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use global::GlobalConfig;
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use sink::ClickHouseSinkConfig;
pub use source::StdinSourceConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults, but validation requires
/// the sink's `query` and `columns` to be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global settings (queue sizes, shutdown timeout)
    pub global: GlobalConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Line-delimited JSON input read from stdin
    pub source: StdinSourceConfig,

    /// ClickHouse sink
    pub sink: ClickHouseSinkConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
