//! Tests for ProtocolError

use crate::ProtocolError;
use serde_json::json;

#[test]
fn test_not_an_object_names_the_kind() {
    let err = ProtocolError::not_an_object(&json!([1, 2, 3]));
    assert!(matches!(err, ProtocolError::NotAnObject("array")));
    assert!(err.to_string().contains("array"));

    let err = ProtocolError::not_an_object(&json!("text"));
    assert!(err.to_string().contains("string"));
}

#[test]
fn test_invalid_json_from_serde() {
    let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err = ProtocolError::from(source);
    assert!(err.to_string().starts_with("invalid JSON payload"));
}
