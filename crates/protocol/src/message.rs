//! Message - One structured record flowing through the pipeline
//!
//! A message is an opaque payload (normally a JSON object) plus the time it
//! was created upstream. Sinks never consult the wall clock for batching
//! decisions; they use `created_at`.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Structured view of a message: field name to dynamically typed value
pub type Record = Map<String, Value>;

/// A single message with its creation timestamp
///
/// Cloning is O(1): the payload is reference-counted.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Raw payload bytes
    payload: Bytes,

    /// When the message was created upstream
    created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self::with_created_at(payload, Utc::now())
    }

    /// Create a message with an explicit creation timestamp
    pub fn with_created_at(payload: impl Into<Bytes>, created_at: DateTime<Utc>) -> Self {
        Self {
            payload: payload.into(),
            created_at,
        }
    }

    /// Create a message by serializing a JSON value
    pub fn from_json(value: &Value, created_at: DateTime<Utc>) -> Self {
        // Serializing a `Value` into a Vec cannot fail
        let payload = serde_json::to_vec(value).unwrap_or_default();
        Self::with_created_at(payload, created_at)
    }

    /// Get the raw payload
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the creation timestamp
    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Payload size in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Decode the payload as a JSON object
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid JSON, or is valid JSON
    /// but not an object.
    pub fn structured(&self) -> Result<Record, ProtocolError> {
        match serde_json::from_slice::<Value>(&self.payload)? {
            Value::Object(map) => Ok(map),
            other => Err(ProtocolError::not_an_object(&other)),
        }
    }
}
