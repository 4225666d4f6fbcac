//! Positional query parameters
//!
//! A [`Param`] is the typed value a conversion produces for one column. It is
//! bound positionally to the `?` placeholders of the insert template.
//!
//! Timestamps bind as Unix epoch values so the stored instant never depends on
//! the server or column timezone: whole seconds as an integer (`1700000000`),
//! sub-second instants as a quoted decimal with milliseconds
//! (`'1700000000.042'`), which `DateTime64` columns read as epoch time.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A converted, dynamically typed positional parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// SQL NULL (missing field)
    Null,
    Bool(bool),
    Int8(i8),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt32(u32),
    UInt64(u64),
    Float64(f64),
    String(String),
    /// UTC instant
    Timestamp(DateTime<Utc>),
    /// Raw JSON value passed through unmodified
    Json(Value),
}

impl Param {
    /// Whether this parameter binds as NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Json(Value::Null))
    }

    /// Short type name, used in logs
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int8(_) => "int8",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::UInt8(_) => "uint8",
            Self::UInt32(_) => "uint32",
            Self::UInt64(_) => "uint64",
            Self::Float64(_) => "float64",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Json(_) => "json",
        }
    }

    /// The timestamp value, if this is a `Timestamp`
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

/// Epoch milliseconds as a decimal string of seconds, e.g. `1700000000.042`
fn epoch_decimal(millis: i64) -> String {
    let sign = if millis < 0 { "-" } else { "" };
    let abs = millis.unsigned_abs();
    format!("{sign}{}.{:03}", abs / 1000, abs % 1000)
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    let millis = ts.timestamp_millis();
    if millis % 1000 == 0 {
        serializer.serialize_i64(ts.timestamp())
    } else {
        serializer.serialize_str(&epoch_decimal(millis))
    }
}

impl Serialize for Param {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int8(v) => serializer.serialize_i8(*v),
            Self::Int32(v) => serializer.serialize_i32(*v),
            Self::Int64(v) => serializer.serialize_i64(*v),
            Self::UInt8(v) => serializer.serialize_u8(*v),
            Self::UInt32(v) => serializer.serialize_u32(*v),
            Self::UInt64(v) => serializer.serialize_u64(*v),
            Self::Float64(v) => serializer.serialize_f64(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::Timestamp(ts) => serialize_timestamp(ts, serializer),
            Self::Json(value) => serialize_json(value, serializer),
        }
    }
}

// Scalars bind as themselves; objects and arrays bind as their JSON text so
// they can land in String or JSON columns.
fn serialize_json<S: Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Value::Null => serializer.serialize_none(),
        Value::Bool(v) => serializer.serialize_bool(*v),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                serializer.serialize_i64(v)
            } else if let Some(v) = n.as_u64() {
                serializer.serialize_u64(v)
            } else {
                serializer.serialize_f64(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => serializer.serialize_str(s),
        Value::Array(_) | Value::Object(_) => serializer.serialize_str(&value.to_string()),
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Json(value) => write!(f, "{value}"),
        }
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<u64> for Param {
    fn from(v: u64) -> Self {
        Self::UInt64(v)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<DateTime<Utc>> for Param {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}
