//! Serve command - stream stdin into ClickHouse

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use sluice_sinks::clickhouse::{ClickHouseSink, SinkHandle};
use tokio::io::BufReader;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::source::{LineSource, SourceStats};

/// Serve command arguments
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Set from the global `--config` flag
    #[arg(skip)]
    pub config: Option<PathBuf>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config_path = args
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(default)".to_string());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path,
        "sluice starting"
    );

    let config = super::load_config(args.config.as_deref())?;
    let shutdown_timeout = config.global.shutdown_timeout;

    let sink = ClickHouseSink::connect(super::clickhouse_config(&config.sink))
        .await
        .context("failed to connect to clickhouse")?;

    let (tx, rx) = mpsc::channel(config.global.queue_size);
    let handle = sink
        .consume(rx)
        .await
        .context("failed to start clickhouse sink")?;

    let shutdown = CancellationToken::new();
    let source = LineSource::new(BufReader::new(tokio::io::stdin()), &config.source);
    let mut source_task = tokio::spawn(source.run(tx, shutdown.clone()));

    info!(
        queue_size = config.global.queue_size,
        source_batch_size = config.source.batch_size,
        "sluice running"
    );

    let source_finished = tokio::select! {
        _ = wait_for_shutdown() => {
            info!("shutdown signal received, stopping...");
            false
        }
        result = &mut source_task => {
            log_source_result(result);
            true
        }
    };

    shutdown.cancel();
    if !source_finished {
        match tokio::time::timeout(shutdown_timeout, source_task).await {
            Ok(result) => log_source_result(result),
            Err(_) => warn!("source did not stop within timeout, continuing shutdown"),
        }
    }

    close_sink(&handle, shutdown_timeout).await
}

async fn close_sink(handle: &SinkHandle, timeout: Duration) -> Result<()> {
    info!("waiting for sink to flush...");
    handle.close_async();
    handle
        .wait_for_close(timeout)
        .await
        .context("clickhouse sink did not shut down cleanly")?;

    let metrics = handle.metrics();
    info!(
        rows_written = metrics.rows_written,
        rows_failed = metrics.rows_failed,
        rows_committed = metrics.rows_committed,
        commits = metrics.commits,
        commit_errors = metrics.commit_errors,
        "sluice stopped"
    );
    Ok(())
}

fn log_source_result(result: Result<Result<SourceStats>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(stats)) => info!(
            lines = stats.lines_read,
            transactions = stats.transactions,
            rows_written = stats.rows_written,
            rows_failed = stats.rows_failed,
            "source finished"
        ),
        Ok(Err(e)) => error!(error = %e, "source failed"),
        Err(e) => warn!(error = %e, "source task panicked"),
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
