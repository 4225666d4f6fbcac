//! Protocol error types
//!
//! Errors that can occur when decoding message payloads.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload is not valid JSON
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Payload is valid JSON but not an object
    #[error("payload is not a JSON object: got {0}")]
    NotAnObject(&'static str),
}

impl ProtocolError {
    /// Create a not-an-object error from the offending value
    pub fn not_an_object(value: &serde_json::Value) -> Self {
        let kind = match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "bool",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::Object(_) => "object",
        };
        Self::NotAnObject(kind)
    }
}
