//! Configuration validation
//!
//! Checks that required fields are present and numeric settings are usable.
//! Column specs themselves are parsed (leniently) by the sink; the insert
//! template is checked against the column count when the sink is built.

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_global(config)?;
    validate_source(config)?;
    validate_sink(config)?;
    Ok(())
}

fn validate_global(config: &Config) -> Result<()> {
    if config.global.queue_size == 0 {
        return Err(ConfigError::invalid_value(
            "global",
            "queue_size",
            "must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_source(config: &Config) -> Result<()> {
    if config.source.batch_size == 0 {
        return Err(ConfigError::invalid_value(
            "source",
            "batch_size",
            "must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_sink(config: &Config) -> Result<()> {
    let sink = &config.sink;

    if sink.connection_string.trim().is_empty() {
        return Err(ConfigError::missing_field("sink", "connection_string"));
    }

    if sink.query.trim().is_empty() {
        return Err(ConfigError::missing_field("sink", "query"));
    }

    if sink.columns.is_empty() {
        return Err(ConfigError::missing_field("sink", "columns"));
    }

    if let Some(pos) = sink.columns.iter().position(|c| c.trim().is_empty()) {
        return Err(ConfigError::invalid_value(
            "sink",
            "columns",
            format!("column {} has an empty field path", pos),
        ));
    }

    if sink.batch_size == 0 {
        return Err(ConfigError::invalid_value(
            "sink",
            "batch_size",
            "must be greater than 0",
        ));
    }

    if sink.batch_time.is_zero() {
        return Err(ConfigError::invalid_value(
            "sink",
            "batch_time",
            "must be greater than 0",
        ));
    }

    Ok(())
}
