//! Field interpolation engine
//!
//! Each insert column is described by a small mini-language string:
//!
//! ```text
//! <path>                                   raw value, passed through
//! <path>$<conversion>                      converted value
//! <path>$<conversion>$<arg1>$<arg2>...     converted value, with arguments
//! ```
//!
//! `path` is a top-level key of the decoded JSON record. An unknown conversion
//! name falls back to passthrough (its arguments are dropped), and a missing
//! field yields `NULL`. Building and applying a [`ColumnSpec`] never fails.
//!
//! ```ignore
//! let registry = ConversionRegistry::standard();
//! let spec = ColumnSpec::parse("ts$stringToDateOrNow$%Y-%m-%d", registry);
//! let param = spec.apply(&record);
//! ```

mod conversion;
mod param;

pub use conversion::{Conversion, ConversionRegistry, DEFAULT_TIMESTAMP_FORMAT, parse_timestamp};
pub use param::Param;

use std::fmt;

use sluice_protocol::Record;

/// Separator between path, conversion and arguments
pub const DELIMITER: char = '$';

/// Immutable description of how to extract and convert one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    path: String,
    conversion: Conversion,
    args: Vec<String>,
}

impl ColumnSpec {
    /// Parse a column specification
    pub fn parse(spec: &str, registry: &ConversionRegistry) -> Self {
        let mut parts = spec.split(DELIMITER);
        let path = parts.next().unwrap_or_default().to_string();

        let Some(name) = parts.next() else {
            return Self::bypass(path);
        };

        match registry.get(name) {
            Some(conversion) => Self {
                path,
                conversion,
                args: parts.map(str::to_string).collect(),
            },
            None => {
                tracing::warn!(
                    column = %spec,
                    conversion = %name,
                    "unknown conversion, passing field through"
                );
                Self::bypass(path)
            }
        }
    }

    /// Parse a list of column specifications, preserving order
    pub fn parse_all<I, S>(specs: I, registry: &ConversionRegistry) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        specs
            .into_iter()
            .map(|spec| Self::parse(spec.as_ref(), registry))
            .collect()
    }

    fn bypass(path: String) -> Self {
        Self {
            path,
            conversion: Conversion::Bypass,
            args: Vec::new(),
        }
    }

    /// Record key this column reads
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Conversion applied to the field
    pub fn conversion(&self) -> Conversion {
        self.conversion
    }

    /// Extra conversion arguments
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Extract and convert this column from a record
    pub fn apply(&self, record: &Record) -> Param {
        match record.get(&self.path) {
            Some(raw) => self.conversion.apply(raw, &self.args),
            None => Param::Null,
        }
    }

    /// Build the positional argument list for one record
    pub fn extract_all(columns: &[ColumnSpec], record: &Record) -> Vec<Param> {
        columns.iter().map(|column| column.apply(record)).collect()
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if self.conversion != Conversion::Bypass || !self.args.is_empty() {
            write!(f, "{DELIMITER}{}", self.conversion)?;
        }
        for arg in &self.args {
            write!(f, "{DELIMITER}{arg}")?;
        }
        Ok(())
    }
}


#[cfg(test)]
#[path = "conversion_test.rs"]
mod conversion_test;
