//! CLI subcommands

pub mod check;
pub mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sluice_config::{ClickHouseSinkConfig, Config};
use sluice_sinks::clickhouse::ClickHouseConfig;
use tracing::info;

/// Config files tried, in order, when `--config` is not given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/sluice.toml", "sluice.toml"];

/// Load the configuration from `path`, or from the first default path found
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Config::from_file(path).context("failed to load configuration");
    }

    for candidate in DEFAULT_CONFIG_PATHS.map(PathBuf::from) {
        if candidate.exists() {
            info!(config = %candidate.display(), "using config file");
            return Config::from_file(&candidate).context("failed to load configuration");
        }
    }

    anyhow::bail!(
        "no config file found (tried {}); pass one with --config",
        DEFAULT_CONFIG_PATHS.join(", ")
    )
}

/// Build the sink configuration from the `[sink]` section
pub(crate) fn clickhouse_config(sink: &ClickHouseSinkConfig) -> ClickHouseConfig {
    ClickHouseConfig::default()
        .with_connection_string(&sink.connection_string)
        .with_query(&sink.query)
        .with_columns(sink.columns.iter().cloned())
        .with_batch_size(sink.batch_size)
        .with_batch_time(sink.batch_time)
        .with_row_error_log_interval(sink.row_error_log_interval)
}
