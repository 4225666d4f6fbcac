//! Field conversions
//!
//! A [`Conversion`] turns a raw JSON field value into a typed [`Param`].
//! Conversions never fail: bad input resolves to a sentinel (zero for numeric
//! targets, the current time for timestamps) and the row is still written.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use serde_json::Value;

use super::Param;

/// Default layout for `stringToDateOrNow` (e.g. `2023-11-14T22:13:20.000Z`)
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

// =============================================================================
// Conversion
// =============================================================================

/// The closed set of column conversions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    /// Passthrough, the raw value unmodified
    Bypass,
    /// Decimal string to `Int32`, zero on failure
    StringToInt32,
    /// Integer epoch seconds to a timestamp, now on failure
    UnixToDateOrNow,
    /// Formatted string to a timestamp, now on failure
    StringToDateOrNow,
    FloatToInt8,
    FloatToInt32,
    FloatToInt64,
    FloatToUInt8,
    FloatToUInt32,
    FloatToUInt64,
}

impl Conversion {
    /// Every conversion, in registry order
    pub const ALL: [Conversion; 10] = [
        Self::Bypass,
        Self::StringToInt32,
        Self::UnixToDateOrNow,
        Self::StringToDateOrNow,
        Self::FloatToInt8,
        Self::FloatToInt32,
        Self::FloatToInt64,
        Self::FloatToUInt8,
        Self::FloatToUInt32,
        Self::FloatToUInt64,
    ];

    /// Name used in the column mini-language
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bypass => "bypass",
            Self::StringToInt32 => "stringToInt32",
            Self::UnixToDateOrNow => "unixToDateOrNow",
            Self::StringToDateOrNow => "stringToDateOrNow",
            Self::FloatToInt8 => "floatToInt8",
            Self::FloatToInt32 => "floatToInt32",
            Self::FloatToInt64 => "floatToInt64",
            Self::FloatToUInt8 => "floatToUInt8",
            Self::FloatToUInt32 => "floatToUInt32",
            Self::FloatToUInt64 => "floatToUInt64",
        }
    }

    /// Convert a raw field value
    ///
    /// `args` are the extra mini-language arguments; only `stringToDateOrNow`
    /// reads them (the first one overrides the timestamp layout).
    pub fn apply(&self, raw: &Value, args: &[String]) -> Param {
        match self {
            Self::Bypass => Param::Json(raw.clone()),
            Self::StringToInt32 => string_to_int32(raw),
            Self::UnixToDateOrNow => Param::Timestamp(unix_to_date_or_now(raw)),
            Self::StringToDateOrNow => {
                let format = args.first().map_or(DEFAULT_TIMESTAMP_FORMAT, String::as_str);
                Param::Timestamp(string_to_date_or_now(raw, format))
            }
            Self::FloatToInt8 => Param::Int8(number(raw).map_or(0, |f| f as i8)),
            Self::FloatToInt32 => Param::Int32(number(raw).map_or(0, |f| f as i32)),
            Self::FloatToInt64 => Param::Int64(number(raw).map_or(0, |f| f as i64)),
            Self::FloatToUInt8 => Param::UInt8(number(raw).map_or(0, |f| f as u8)),
            Self::FloatToUInt32 => Param::UInt32(number(raw).map_or(0, |f| f as u32)),
            Self::FloatToUInt64 => Param::UInt64(number(raw).map_or(0, |f| f as u64)),
        }
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Out-of-range input ("3000000000") is a parse failure like any other
fn string_to_int32(raw: &Value) -> Param {
    let parsed = raw.as_str().and_then(|s| s.parse::<i32>().ok());
    Param::Int32(parsed.unwrap_or(0))
}

fn unix_to_date_or_now(raw: &Value) -> DateTime<Utc> {
    raw.as_i64()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(now)
}

fn string_to_date_or_now(raw: &Value, format: &str) -> DateTime<Utc> {
    raw.as_str()
        .and_then(|s| parse_timestamp(s, format))
        .unwrap_or_else(now)
}

// Whole seconds, so the fallback binds as an integer that `DateTime` columns accept
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Parse `s` with a strftime layout
///
/// Layouts with an offset (`%z`, `%:z`) yield that instant; layouts without one
/// are read as UTC. Date-only layouts resolve to midnight.
pub fn parse_timestamp(s: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_str(s, format) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// Narrowing casts accept any JSON number; `as` saturates and maps NaN to zero.
fn number(raw: &Value) -> Option<f64> {
    raw.as_f64()
}

// =============================================================================
// Registry
// =============================================================================

static STANDARD: LazyLock<ConversionRegistry> = LazyLock::new(ConversionRegistry::new);

/// Immutable name -> conversion table
#[derive(Debug, Clone)]
pub struct ConversionRegistry {
    by_name: HashMap<&'static str, Conversion>,
}

impl ConversionRegistry {
    /// Build a registry holding every built-in conversion
    pub fn new() -> Self {
        Self {
            by_name: Conversion::ALL.iter().map(|c| (c.name(), *c)).collect(),
        }
    }

    /// Shared registry built once per process
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Look up a conversion by its mini-language name (case-sensitive)
    pub fn get(&self, name: &str) -> Option<Conversion> {
        self.by_name.get(name).copied()
    }

    /// Whether `name` is a known conversion
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Known conversion names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered conversions
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
