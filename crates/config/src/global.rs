//! Global configuration settings
//!
//! These settings apply across components and provide sensible defaults.

use std::time::Duration;

use serde::Deserialize;

/// Global configuration that applies to all components
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Capacity of the transaction channel between source and sink
    /// Default: 1000
    pub queue_size: usize,

    /// How long to wait for the sink to commit and close on shutdown
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            queue_size: 1000,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GlobalConfig::default();
        assert_eq!(config.queue_size, 1000);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: GlobalConfig = toml::from_str("shutdown_timeout = \"2s\"").unwrap();
        assert_eq!(config.queue_size, 1000);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(2));
    }
}
