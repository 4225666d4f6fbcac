//! Check command - validate a config and preview column extraction
//!
//! Parses the insert template and column specs exactly as the sink would,
//! without connecting. With `--sample`, applies the columns to one JSON
//! record and prints the bound parameters.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sluice_protocol::Record;
use sluice_sinks::clickhouse::{ClickHouseConfig, Dsn};
use sluice_sinks::column::{ColumnSpec, ConversionRegistry, DELIMITER};

/// Check command arguments
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Set from the global `--config` flag
    #[arg(skip)]
    pub config: Option<PathBuf>,

    /// JSON object to run through the column specs
    #[arg(long)]
    pub sample: Option<String>,
}

/// Run the check command
pub fn run(args: CheckArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let sink = super::clickhouse_config(&config.sink);
    print!("{}", report(&sink, args.sample.as_deref())?);
    Ok(())
}

/// Render the check report for a sink configuration
fn report(config: &ClickHouseConfig, sample: Option<&str>) -> Result<String> {
    let template = config.validate().context("invalid sink configuration")?;
    let dsn = Dsn::parse(&config.connection_string).context("invalid connection string")?;

    let registry = ConversionRegistry::standard();
    let columns = ColumnSpec::parse_all(&config.columns, registry);

    let mut out = String::new();
    let _ = writeln!(out, "connection:   {}", dsn.redacted());
    let _ = writeln!(out, "placeholders: {}", template.placeholders());
    let _ = writeln!(
        out,
        "batching:     {} rows / {:?}",
        config.batch_size, config.batch_time
    );
    let _ = writeln!(out, "columns:");

    for (i, (raw, column)) in config.columns.iter().zip(&columns).enumerate() {
        let _ = write!(out, "  {:>2}  {:<32} {}", i + 1, raw, column.path());
        match raw.split(DELIMITER).nth(1) {
            Some(name) if !registry.contains(name) => {
                let _ = write!(out, "  (unknown conversion {name:?}, passed through)");
            }
            _ => {
                let _ = write!(out, "  {}", column.conversion());
                if !column.args().is_empty() {
                    let _ = write!(out, " {:?}", column.args());
                }
            }
        }
        out.push('\n');
    }

    if let Some(sample) = sample {
        let record: Record =
            serde_json::from_str(sample).context("sample must be a JSON object")?;
        let _ = writeln!(out, "sample:");
        for (column, param) in columns.iter().zip(ColumnSpec::extract_all(&columns, &record)) {
            let _ = writeln!(
                out,
                "  {:<24} {:<10} {}",
                column.path(),
                param.type_name(),
                param
            );
        }
    }

    Ok(out)
}
