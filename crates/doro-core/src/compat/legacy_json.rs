//! Parsers for the legacy flat JSON settings files.
//!
//! Both files are a single JSON object of `name -> value`:
//!
//! ```json
//! { "ShopCash": 1, "AwardMail": true }
//! { "UserGroup": "Free", "InterceptionBoss": 3 }
//! ```
//!
//! A file that is not a JSON object is an error.  An individual entry with an
//! unusable value is left out and named in [`Parsed::rejected`]; the other
//! entries are still used.

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::domain::coerce;
use crate::domain::document::SettingValue;

/// Why a legacy file could not be used at all.
#[derive(Debug, Error)]
pub enum LegacyParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("top-level value is not a JSON object")]
    NotAnObject,
}

/// Entries accepted from one file plus the keys that were rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub entries: IndexMap<String, T>,
    pub rejected: Vec<String>,
}

/// Parses the legacy toggles file.
///
/// Accepts the same values as a toggle in the backing file: integers,
/// booleans (as 0 / 1), and floats with no fractional part.
///
/// # Errors
///
/// Returns [`LegacyParseError`] when `text` is not a JSON object.
pub fn parse_toggles(text: &str) -> Result<Parsed<i64>, LegacyParseError> {
    parse_object(text, |value| {
        serde_yaml::to_value(value)
            .ok()
            .as_ref()
            .and_then(coerce::as_toggle)
    })
}

/// Parses the legacy numeric settings file.
///
/// Integers, floats, and strings are accepted.
///
/// # Errors
///
/// Returns [`LegacyParseError`] when `text` is not a JSON object.
pub fn parse_numeric_settings(text: &str) -> Result<Parsed<SettingValue>, LegacyParseError> {
    parse_object(text, |value| match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(SettingValue::Integer(i)),
            None => n.as_f64().map(SettingValue::Float),
        },
        Value::String(s) => Some(SettingValue::Text(s.clone())),
        _ => None,
    })
}

fn parse_object<T>(
    text: &str,
    convert: impl Fn(&Value) -> Option<T>,
) -> Result<Parsed<T>, LegacyParseError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(object) = value else {
        return Err(LegacyParseError::NotAnObject);
    };

    let mut parsed = Parsed {
        entries: IndexMap::new(),
        rejected: Vec::new(),
    };
    for (key, value) in &object {
        match convert(value) {
            Some(converted) => {
                parsed.entries.insert(key.clone(), converted);
            }
            None => parsed.rejected.push(key.clone()),
        }
    }
    Ok(parsed)
}
