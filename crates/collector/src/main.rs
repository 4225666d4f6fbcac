//! Sluice - stream JSON lines into ClickHouse
//!
//! # Usage
//!
//! ```bash
//! # Read JSON lines from stdin and insert them (default)
//! producer | sluice --config configs/sluice.toml
//!
//! # Validate a config, its insert template and column specs
//! sluice check --config configs/sluice.toml
//! ```

mod cmd;
mod source;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sluice_config::{Config, LogConfig, LogFormat, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Sluice - stream JSON lines into ClickHouse
#[derive(Parser, Debug)]
#[command(name = "sluice")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SLUICE_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read JSON lines from stdin and write them to ClickHouse
    Serve(cmd::serve::ServeArgs),

    /// Validate configuration without connecting
    Check(cmd::check::CheckArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Serve(mut args)) => {
            args.config = cli.config;
            init_logging_from(cli.log_level.as_deref(), args.config.as_deref())?;
            cmd::serve::run(args).await
        }
        Some(Command::Check(mut args)) => {
            args.config = cli.config;
            // Check prints its report to stdout; only warnings go to the log
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), &LogConfig::default())?;
            cmd::check::run(args)
        }
        // No subcommand = serve (default behavior)
        None => {
            init_logging_from(cli.log_level.as_deref(), cli.config.as_deref())?;
            let args = cmd::serve::ServeArgs { config: cli.config };
            cmd::serve::run(args).await
        }
    }
}

/// Initialize logging from the CLI flag and the config file's `[log]` section
fn init_logging_from(cli_level: Option<&str>, config_path: Option<&Path>) -> Result<()> {
    let log_config = config_path
        .filter(|path| path.exists())
        .and_then(|path| Config::from_file(path).ok())
        .map(|config| config.log)
        .unwrap_or_default();
    let level = resolve_log_level(cli_level, &log_config);
    init_logging(&level, &log_config)
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, log_config: &LogConfig) -> String {
    match cli_level {
        Some(level) => level.to_string(),
        None => log_config.level.as_str().to_string(),
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, log_config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let (writer, ansi) = match &log_config.output {
        LogOutput::Stdout => (BoxMakeWriter::new(std::io::stdout), true),
        LogOutput::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path}"))?;
            (BoxMakeWriter::new(Arc::new(file)), false)
        }
    };

    let layer = match log_config.format {
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    };

    tracing_subscriber::registry().with(layer).with(filter).init();

    Ok(())
}
