//! Lenient conversions from untyped YAML values into section value kinds.
//!
//! Hand-edited files drift: a toggle written as `true`, a timeout written as
//! `10.0`, a version written as `"2"`.  These helpers accept the obvious
//! spellings and return `None` for anything else so the caller can decide
//! whether a mismatch is a warning (merge) or an error (update).

use serde_yaml::Value;

use super::document::SettingValue;

/// Accepts booleans and the integers `0` / `1`.
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

/// Accepts any integer, integral floats, and booleans (as 0/1).
///
/// Range checking against `{0, 1}` is left to validation so that an
/// out-of-domain toggle is reported rather than dropped.
pub fn as_toggle(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(i64::from(*b)),
        other => as_integer(other),
    }
}

/// Accepts integers and floats with no fractional part.
pub fn as_integer(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    n.as_f64().and_then(integral)
}

/// Accepts any number.
pub fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Accepts integers, floats, and strings.
pub fn as_setting(value: &Value) -> Option<SettingValue> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(SettingValue::Integer(i)),
            None => n.as_f64().map(SettingValue::Float),
        },
        Value::String(s) => Some(SettingValue::Text(s.clone())),
        _ => None,
    }
}

/// Accepts non-negative integers and numeric strings.
pub fn as_version(value: &Value) -> Option<u32> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        other => as_integer(other).and_then(|i| u32::try_from(i).ok()),
    }
}

/// Short type name used in warning messages.
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn integral(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
