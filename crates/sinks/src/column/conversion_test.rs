//! Tests for field conversions

use chrono::{DateTime, TimeDelta, TimeZone, Timelike, Utc};
use serde_json::json;

use super::*;

fn no_args() -> Vec<String> {
    Vec::new()
}

/// Assert a timestamp is "now" (within a generous window)
fn assert_is_now(param: Param) {
    let ts = param.as_timestamp().expect("expected a timestamp");
    let drift = (Utc::now() - ts).abs();
    assert!(drift < TimeDelta::seconds(5), "expected now, got {ts}");
}

// =============================================================================
// Registry
// =============================================================================

#[test]
fn test_registry_has_every_conversion() {
    let registry = ConversionRegistry::standard();
    assert_eq!(registry.len(), Conversion::ALL.len());
    for conversion in Conversion::ALL {
        assert_eq!(registry.get(conversion.name()), Some(conversion));
    }
}

#[test]
fn test_registry_names() {
    let names = ConversionRegistry::new().names();
    assert!(names.contains(&"stringToInt32"));
    assert!(names.contains(&"unixToDateOrNow"));
    assert!(names.contains(&"stringToDateOrNow"));
    assert!(names.contains(&"floatToUInt64"));
    assert!(!names.contains(&"toRoman"));
}

#[test]
fn test_registry_unknown_name() {
    assert_eq!(ConversionRegistry::standard().get("toRoman"), None);
    assert!(!ConversionRegistry::standard().contains(""));
}

// =============================================================================
// stringToInt32
// =============================================================================

#[test]
fn test_string_to_int32() {
    let c = Conversion::StringToInt32;
    assert_eq!(c.apply(&json!("42"), &no_args()), Param::Int32(42));
    assert_eq!(c.apply(&json!("-7"), &no_args()), Param::Int32(-7));
}

#[test]
fn test_string_to_int32_failure_is_zero() {
    let c = Conversion::StringToInt32;
    assert_eq!(c.apply(&json!("abc"), &no_args()), Param::Int32(0));
    assert_eq!(c.apply(&json!("4.2"), &no_args()), Param::Int32(0));
    assert_eq!(c.apply(&json!("99999999999"), &no_args()), Param::Int32(0));
    assert_eq!(c.apply(&json!(""), &no_args()), Param::Int32(0));
}

#[test]
fn test_string_to_int32_out_of_range_is_zero() {
    let c = Conversion::StringToInt32;
    assert_eq!(c.apply(&json!("3000000000"), &no_args()), Param::Int32(0));
    assert_eq!(c.apply(&json!("-2147483649"), &no_args()), Param::Int32(0));
    assert_eq!(c.apply(&json!("2147483647"), &no_args()), Param::Int32(i32::MAX));
    assert_eq!(c.apply(&json!("-2147483648"), &no_args()), Param::Int32(i32::MIN));
}

#[test]
fn test_string_to_int32_non_string_is_zero() {
    let c = Conversion::StringToInt32;
    assert_eq!(c.apply(&json!(42), &no_args()), Param::Int32(0));
    assert_eq!(c.apply(&json!(null), &no_args()), Param::Int32(0));
}

// =============================================================================
// unixToDateOrNow
// =============================================================================

#[test]
fn test_unix_to_date() {
    let expected = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
    assert_eq!(
        Conversion::UnixToDateOrNow.apply(&json!(1_700_000_000), &no_args()),
        Param::Timestamp(expected)
    );
}

#[test]
fn test_unix_to_date_epoch_zero() {
    assert_eq!(
        Conversion::UnixToDateOrNow.apply(&json!(0), &no_args()),
        Param::Timestamp(DateTime::from_timestamp(0, 0).unwrap())
    );
}

#[test]
fn test_unix_to_date_non_integer_is_now() {
    let c = Conversion::UnixToDateOrNow;
    assert_is_now(c.apply(&json!("not-a-number"), &no_args()));
    assert_is_now(c.apply(&json!("1700000000"), &no_args()));
    assert_is_now(c.apply(&json!(1.5), &no_args()));
    assert_is_now(c.apply(&json!(null), &no_args()));
}

// =============================================================================
// stringToDateOrNow
// =============================================================================

#[test]
fn test_string_to_date_default_format() {
    let expected = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
        + TimeDelta::milliseconds(123);
    assert_eq!(
        Conversion::StringToDateOrNow.apply(&json!("2023-11-14T22:13:20.123Z"), &no_args()),
        Param::Timestamp(expected)
    );
}

#[test]
fn test_string_to_date_custom_format() {
    let args = vec!["%d/%m/%Y %H:%M".to_string()];
    let expected = Utc.with_ymd_and_hms(2024, 2, 29, 8, 30, 0).unwrap();
    assert_eq!(
        Conversion::StringToDateOrNow.apply(&json!("29/02/2024 08:30"), &args),
        Param::Timestamp(expected)
    );
}

#[test]
fn test_string_to_date_date_only_format() {
    let args = vec!["%Y-%m-%d".to_string()];
    let expected = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    assert_eq!(
        Conversion::StringToDateOrNow.apply(&json!("2024-01-02"), &args),
        Param::Timestamp(expected)
    );
}

#[test]
fn test_string_to_date_format_with_offset() {
    let args = vec!["%Y-%m-%d %H:%M:%S %z".to_string()];
    let expected = Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap();
    assert_eq!(
        Conversion::StringToDateOrNow.apply(&json!("2024-01-02 03:00:00 +0200"), &args),
        Param::Timestamp(expected)
    );
}

#[test]
fn test_now_fallback_is_whole_seconds() {
    let ts = Conversion::UnixToDateOrNow
        .apply(&json!("not-a-number"), &no_args())
        .as_timestamp()
        .unwrap();
    assert_eq!(ts.nanosecond(), 0);

    let ts = Conversion::StringToDateOrNow
        .apply(&json!("yesterday"), &no_args())
        .as_timestamp()
        .unwrap();
    assert_eq!(ts.nanosecond(), 0);
}

#[test]
fn test_string_to_date_failure_is_now() {
    let c = Conversion::StringToDateOrNow;
    assert_is_now(c.apply(&json!("yesterday"), &no_args()));
    assert_is_now(c.apply(&json!(1_700_000_000), &no_args()));
    assert_is_now(c.apply(&json!("2023-11-14 22:13:20"), &no_args()));
}

// =============================================================================
// Narrowing casts
// =============================================================================

#[test]
fn test_float_casts_truncate() {
    let value = json!(42.9);
    assert_eq!(Conversion::FloatToInt8.apply(&value, &no_args()), Param::Int8(42));
    assert_eq!(Conversion::FloatToInt32.apply(&value, &no_args()), Param::Int32(42));
    assert_eq!(Conversion::FloatToInt64.apply(&value, &no_args()), Param::Int64(42));
    assert_eq!(Conversion::FloatToUInt8.apply(&value, &no_args()), Param::UInt8(42));
    assert_eq!(Conversion::FloatToUInt32.apply(&value, &no_args()), Param::UInt32(42));
    assert_eq!(Conversion::FloatToUInt64.apply(&value, &no_args()), Param::UInt64(42));
}

#[test]
fn test_float_casts_accept_integers() {
    assert_eq!(
        Conversion::FloatToUInt32.apply(&json!(7), &no_args()),
        Param::UInt32(7)
    );
}

#[test]
fn test_float_casts_saturate() {
    assert_eq!(
        Conversion::FloatToUInt8.apply(&json!(300.0), &no_args()),
        Param::UInt8(u8::MAX)
    );
    assert_eq!(
        Conversion::FloatToUInt32.apply(&json!(-1.0), &no_args()),
        Param::UInt32(0)
    );
    assert_eq!(
        Conversion::FloatToInt8.apply(&json!(-1000), &no_args()),
        Param::Int8(i8::MIN)
    );
}

#[test]
fn test_float_casts_non_numeric_is_zero() {
    for value in [json!("12"), json!(null), json!(true), json!([1])] {
        assert_eq!(Conversion::FloatToInt32.apply(&value, &no_args()), Param::Int32(0));
        assert_eq!(Conversion::FloatToUInt64.apply(&value, &no_args()), Param::UInt64(0));
    }
}

// =============================================================================
// bypass
// =============================================================================

#[test]
fn test_bypass_returns_raw_value() {
    for value in [json!("x"), json!(1.25), json!(null), json!({"a": [1, 2]})] {
        assert_eq!(
            Conversion::Bypass.apply(&value, &no_args()),
            Param::Json(value.clone())
        );
    }
}

#[test]
fn test_parse_timestamp_rejects_garbage() {
    assert_eq!(parse_timestamp("nope", DEFAULT_TIMESTAMP_FORMAT), None);
}
