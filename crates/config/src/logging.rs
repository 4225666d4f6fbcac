//! Logging configuration
//!
//! The `[log]` section. Logs go to stderr unless configured otherwise: stdin
//! carries the input stream and stdout is kept for `sluice check` reports.

use serde::Deserialize;

/// Verbosity of the collector's own logs
///
/// The sink logs commits at `info`, every flush decision at `debug`, and
/// row failures (rate limited) at `error`.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    /// Flushes, statement lifecycle, source grouping
    Debug,
    /// Startup, commits, shutdown summary
    #[default]
    Info,
    /// Failed pings, statements that would not close
    Warn,
    /// Row, commit and teardown failures
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Line format of emitted log events
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    /// One JSON object per event, for log shippers
    Json,
}

/// Where log events are written
///
/// `"stdout"` and `"stderr"` select a stream; any other string is a file path
/// opened in append mode.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
    #[serde(untagged)]
    File(String),
}

/// `[log]` section
///
/// ```toml
/// [log]
/// level = "debug"              # overridden by --log-level
/// format = "json"
/// output = "/var/log/sluice.log"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default: info
    pub level: LogLevel,

    /// Default: console
    pub format: LogFormat,

    /// Default: stderr
    pub output: LogOutput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_stdout_free() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Console);
        assert_eq!(config.output, LogOutput::Stderr);
    }

    #[test]
    fn test_json_to_file() {
        let toml = r#"
level = "warn"
format = "json"
output = "/var/log/sluice.log"
"#;
        let config: LogConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::File("/var/log/sluice.log".into()));
    }

    #[test]
    fn test_stream_names_are_not_paths() {
        let config: LogConfig = toml::from_str("output = \"stdout\"").unwrap();
        assert_eq!(config.output, LogOutput::Stdout);
    }

    #[test]
    fn test_level_directives_round_trip() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            let config: LogConfig =
                toml::from_str(&format!("level = \"{}\"", level.as_str())).unwrap();
            assert_eq!(config.level, level);
        }
    }

    #[test]
    fn test_unknown_level_rejected() {
        assert!(toml::from_str::<LogConfig>("level = \"verbose\"").is_err());
    }
}
