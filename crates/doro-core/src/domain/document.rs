//! The configuration document and its dynamic accessors.
//!
//! # Shape
//!
//! ```yaml
//! meta:
//!   version: 2
//! vision:
//!   default_confidence: 0.8
//!   default_timeout: 10
//!   default_interval: 0.5
//! tasks:
//!   test_task: true
//! toggles:
//!   ShopCash: 1
//! numeric_settings:
//!   UserGroup: Free
//!   InterceptionBoss: 1
//! task_runner:            # any other top-level key is kept verbatim
//!   break_on_failure: false
//! ```
//!
//! `tasks`, `toggles`, and `numeric_settings` are open-ended maps: new keys
//! need no code change.  They are insertion-ordered so that a document keeps
//! the order a human wrote it in, and so that `tasks` order is run order.
//!
//! Fixed sections (`meta`, `vision`) also carry an `extra` map so that keys a
//! newer build added survive a round trip through an older one.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use super::coerce;
use super::fields::{self, Section};

/// Keys a fixed section does not declare, preserved verbatim.
pub type Extra = IndexMap<String, Value>;

/// Error returned when a value cannot be stored at a section/key.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DocumentError {
    /// The value's type does not fit the section's value kind.
    #[error("{section}.{key}: expected {expected}, got {found}")]
    TypeMismatch {
        section: String,
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// `meta.version` may only stay equal or grow.
    #[error("meta.version cannot move backwards from {current} to {requested}")]
    VersionRegression { current: u32, requested: u32 },

    /// An open-ended top-level key exists but does not hold a mapping.
    #[error("section `{section}` holds a {found}, not a mapping")]
    NotAMapping {
        section: String,
        found: &'static str,
    },
}

/// A `numeric_settings` value: integer, float, or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl SettingValue {
    pub fn to_value(&self) -> Value {
        match self {
            SettingValue::Integer(i) => Value::Number((*i).into()),
            SettingValue::Float(f) => Value::Number((*f).into()),
            SettingValue::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Integer(i) => write!(f, "{i}"),
            SettingValue::Float(v) => f.write_str(&format_float(*v)),
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

/// Renders a float so that integral values keep a trailing `.0`.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// The `meta` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Schema revision of this document.  Never decreases.
    pub version: u32,
    #[serde(flatten)]
    pub extra: Extra,
}

/// The `vision` section: defaults handed to the template matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionSettings {
    /// Match confidence threshold in `[0, 1]`.
    pub default_confidence: f64,
    /// Seconds to wait for a template before giving up.
    pub default_timeout: i64,
    /// Seconds between match attempts.
    pub default_interval: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl VisionSettings {
    /// Reads a fixed field as `f64` for range checks.
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            fields::DEFAULT_CONFIDENCE => Some(self.default_confidence),
            fields::DEFAULT_TIMEOUT => Some(self.default_timeout as f64),
            fields::DEFAULT_INTERVAL => Some(self.default_interval),
            _ => None,
        }
    }
}

/// The whole configuration.
///
/// Mutated only by the store; subscribers receive it behind a shared
/// reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub meta: Meta,
    pub vision: VisionSettings,
    /// Task name -> enabled.
    pub tasks: IndexMap<String, bool>,
    /// Toggle name -> 0 / 1.
    pub toggles: IndexMap<String, i64>,
    pub numeric_settings: IndexMap<String, SettingValue>,
    /// Top-level keys with no built-in shape, kept verbatim.
    #[serde(flatten)]
    pub extra: Extra,
}

impl ConfigDocument {
    /// Looks up a value by section/key path.
    ///
    /// An empty path returns the whole document.  Returns `None` when any
    /// segment is absent, when an intermediate value is not a mapping, or when
    /// the value found is null.
    pub fn get(&self, path: &[&str]) -> Option<Value> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self.to_value());
        };
        let root = self.section_value(first)?;
        let mut current = &root;
        for segment in rest {
            current = current.as_mapping()?.get(*segment)?;
        }
        if current.is_null() {
            return None;
        }
        Some(current.clone())
    }

    /// Like [`get`](Self::get) but falls back to `default`.
    pub fn get_or(&self, path: &[&str], default: Value) -> Value {
        self.get(path).unwrap_or(default)
    }

    /// Stores `value` at `section.key`, creating open-ended sections on demand.
    ///
    /// Values for known sections are coerced to the section's value kind.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the value cannot be coerced, when
    /// `meta.version` would decrease, or when an open-ended top-level key holds
    /// something other than a mapping.  The document is unchanged on error.
    pub fn set(&mut self, section: &str, key: &str, value: Value) -> Result<(), DocumentError> {
        let mismatch = |expected: &'static str, value: &Value| DocumentError::TypeMismatch {
            section: section.to_string(),
            key: key.to_string(),
            expected,
            found: coerce::describe(value),
        };

        match Section::from_name(section) {
            Some(Section::Meta) => {
                if key != "version" {
                    self.meta.extra.insert(key.to_string(), value);
                    return Ok(());
                }
                let requested = coerce::as_version(&value)
                    .ok_or_else(|| mismatch("non-negative integer", &value))?;
                if requested < self.meta.version {
                    return Err(DocumentError::VersionRegression {
                        current: self.meta.version,
                        requested,
                    });
                }
                self.meta.version = requested;
            }
            Some(Section::Vision) => match key {
                fields::DEFAULT_CONFIDENCE => {
                    self.vision.default_confidence =
                        coerce::as_float(&value).ok_or_else(|| mismatch("number", &value))?;
                }
                fields::DEFAULT_TIMEOUT => {
                    self.vision.default_timeout =
                        coerce::as_integer(&value).ok_or_else(|| mismatch("integer", &value))?;
                }
                fields::DEFAULT_INTERVAL => {
                    self.vision.default_interval =
                        coerce::as_float(&value).ok_or_else(|| mismatch("number", &value))?;
                }
                _ => {
                    self.vision.extra.insert(key.to_string(), value);
                }
            },
            Some(Section::Tasks) => {
                let enabled = coerce::as_bool(&value).ok_or_else(|| mismatch("boolean", &value))?;
                self.tasks.insert(key.to_string(), enabled);
            }
            Some(Section::Toggles) => {
                let toggle =
                    coerce::as_toggle(&value).ok_or_else(|| mismatch("integer 0 or 1", &value))?;
                self.toggles.insert(key.to_string(), toggle);
            }
            Some(Section::NumericSettings) => {
                let setting = coerce::as_setting(&value)
                    .ok_or_else(|| mismatch("integer, float or string", &value))?;
                self.numeric_settings.insert(key.to_string(), setting);
            }
            None => {
                let slot = self
                    .extra
                    .entry(section.to_string())
                    .or_insert_with(|| Value::Mapping(Mapping::new()));
                match slot {
                    Value::Mapping(map) => {
                        map.insert(Value::String(key.to_string()), value);
                    }
                    other => {
                        return Err(DocumentError::NotAMapping {
                            section: section.to_string(),
                            found: coerce::describe(other),
                        })
                    }
                }
            }
        }
        Ok(())
    }

    /// Renders one top-level entry as an untyped value.
    pub fn section_value(&self, name: &str) -> Option<Value> {
        let value = match Section::from_name(name) {
            Some(Section::Meta) => {
                let mut map = Mapping::new();
                map.insert("version".into(), Value::Number(self.meta.version.into()));
                extend(&mut map, &self.meta.extra);
                Value::Mapping(map)
            }
            Some(Section::Vision) => {
                let mut map = Mapping::new();
                map.insert(
                    fields::DEFAULT_CONFIDENCE.into(),
                    Value::Number(self.vision.default_confidence.into()),
                );
                map.insert(
                    fields::DEFAULT_TIMEOUT.into(),
                    Value::Number(self.vision.default_timeout.into()),
                );
                map.insert(
                    fields::DEFAULT_INTERVAL.into(),
                    Value::Number(self.vision.default_interval.into()),
                );
                extend(&mut map, &self.vision.extra);
                Value::Mapping(map)
            }
            Some(Section::Tasks) => Value::Mapping(
                self.tasks
                    .iter()
                    .map(|(k, v)| (Value::String(k.clone()), Value::Bool(*v)))
                    .collect(),
            ),
            Some(Section::Toggles) => Value::Mapping(
                self.toggles
                    .iter()
                    .map(|(k, v)| (Value::String(k.clone()), Value::Number((*v).into())))
                    .collect(),
            ),
            Some(Section::NumericSettings) => Value::Mapping(
                self.numeric_settings
                    .iter()
                    .map(|(k, v)| (Value::String(k.clone()), v.to_value()))
                    .collect(),
            ),
            None => return self.extra.get(name).cloned(),
        };
        Some(value)
    }

    /// Renders the whole document as an untyped mapping.
    pub fn to_value(&self) -> Value {
        let mut map = Mapping::new();
        for section in Section::ALL {
            if let Some(value) = self.section_value(section.name()) {
                map.insert(section.name().into(), value);
            }
        }
        extend(&mut map, &self.extra);
        Value::Mapping(map)
    }

    /// Names of enabled tasks, in document order.
    pub fn enabled_tasks(&self) -> impl Iterator<Item = &str> {
        self.tasks
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
    }
}

fn extend(map: &mut Mapping, extra: &Extra) {
    for (k, v) in extra {
        map.insert(Value::String(k.clone()), v.clone());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
