//! Per-key overlay of a persisted (untyped) mapping onto a typed document.
//!
//! Merge rules:
//!
//! - A known section in the file overrides only the keys it names; every key
//!   it leaves out keeps whatever the target document already had (defaults,
//!   or legacy values layered on top of them).
//! - A known section whose value is not a mapping is ignored with a warning,
//!   so a committed document always has every section.
//! - An unknown top-level key has no default shape, so its value replaces
//!   whatever was there wholesale.
//! - A single value that does not fit its section (say, a toggle of `"abc"`)
//!   is skipped with a warning; the rest of the file still applies.
//! - `meta.version` is taken from the file.  A file that does not declare a
//!   usable version predates versioning and is treated as
//!   [`LEGACY_SCHEMA_VERSION`].  A declared version below that is raised to
//!   it with a warning, so the migration walk always has a starting step.

use std::fmt;

use serde_yaml::{Mapping, Value};

use super::coerce;
use super::document::{ConfigDocument, DocumentError};
use super::fields::{Section, LEGACY_SCHEMA_VERSION};

/// A persisted value that was skipped during the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeWarning {
    pub section: String,
    pub key: Option<String>,
    pub message: String,
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}.{}: {}", self.section, key, self.message),
            None => write!(f, "{}: {}", self.section, self.message),
        }
    }
}

impl MergeWarning {
    fn new(section: &str, key: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            section: section.to_string(),
            key: key.map(str::to_string),
            message: message.into(),
        }
    }

    fn from_document_error(section: &str, key: &str, err: &DocumentError) -> Self {
        let message = match err {
            DocumentError::TypeMismatch {
                expected, found, ..
            } => format!("expected {expected}, got {found}; keeping previous value"),
            other => other.to_string(),
        };
        Self::new(section, Some(key), message)
    }
}

/// Overlays a persisted file's top-level mapping onto `doc`.
///
/// Returns one warning per skipped entry.  `doc` is left at the file's
/// declared schema version.
pub fn overlay_persisted(doc: &mut ConfigDocument, raw: &Mapping) -> Vec<MergeWarning> {
    let mut warnings = Vec::new();

    for (name, value) in raw {
        let Some(name) = name.as_str() else {
            warnings.push(MergeWarning::new(
                "<root>",
                None,
                format!("skipping non-string key of type {}", coerce::describe(name)),
            ));
            continue;
        };

        let Some(section) = Section::from_name(name) else {
            doc.extra.insert(name.to_string(), value.clone());
            continue;
        };

        match value {
            Value::Mapping(entries) => overlay_section(doc, section, entries, &mut warnings),
            // `tasks:` with nothing under it.
            Value::Null => {}
            other => warnings.push(MergeWarning::new(
                name,
                None,
                format!(
                    "expected a mapping, got {}; keeping previous values",
                    coerce::describe(other)
                ),
            )),
        }
    }

    doc.meta.version = match raw.get("meta").and_then(Value::as_mapping) {
        Some(meta) => match meta.get("version") {
            Some(version) => match coerce::as_version(version) {
                Some(declared) if declared >= LEGACY_SCHEMA_VERSION => declared,
                Some(declared) => {
                    warnings.push(MergeWarning::new(
                        "meta",
                        Some("version"),
                        format!(
                            "version {declared} predates the oldest schema; assuming {LEGACY_SCHEMA_VERSION}"
                        ),
                    ));
                    LEGACY_SCHEMA_VERSION
                }
                None => {
                    warnings.push(MergeWarning::new(
                        "meta",
                        Some("version"),
                        format!(
                            "not a version number ({}); assuming {LEGACY_SCHEMA_VERSION}",
                            coerce::describe(version)
                        ),
                    ));
                    LEGACY_SCHEMA_VERSION
                }
            },
            None => LEGACY_SCHEMA_VERSION,
        },
        None => LEGACY_SCHEMA_VERSION,
    };

    warnings
}

fn overlay_section(
    doc: &mut ConfigDocument,
    section: Section,
    entries: &Mapping,
    warnings: &mut Vec<MergeWarning>,
) {
    for (key, value) in entries {
        let Some(key) = key.as_str() else {
            warnings.push(MergeWarning::new(
                section.name(),
                None,
                format!("skipping non-string key of type {}", coerce::describe(key)),
            ));
            continue;
        };
        if section == Section::Meta && key == "version" {
            continue;
        }
        if let Err(err) = doc.set(section.name(), key, value.clone()) {
            warnings.push(MergeWarning::from_document_error(section.name(), key, &err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::defaults::defaults;
    use crate::domain::document::SettingValue;

    fn mapping(s: &str) -> Mapping {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_partial_section_overrides_only_named_keys() {
        // Arrange
        let mut doc = defaults();
        let raw = mapping("toggles:\n  ShopCash: 0\n");

        // Act
        let warnings = overlay_persisted(&mut doc, &raw);

        // Assert
        assert!(warnings.is_empty());
        assert_eq!(doc.toggles["ShopCash"], 0);
        let expected = defaults();
        for (key, value) in &expected.toggles {
            if key != "ShopCash" {
                assert_eq!(doc.toggles[key], *value, "toggle {key} changed");
            }
        }
    }

    #[test]
    fn test_unknown_top_level_key_replaces_wholesale() {
        let mut doc = defaults();
        doc.extra
            .insert("task_runner".to_string(), serde_yaml::from_str("{a: 1, b: 2}").unwrap());

        overlay_persisted(&mut doc, &mapping("task_runner:\n  break_on_failure: true\n"));

        let runner = doc.get(&["task_runner"]).unwrap();
        let runner = runner.as_mapping().unwrap();
        assert_eq!(runner.len(), 1);
        assert_eq!(runner.get("break_on_failure"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_bad_value_is_skipped_and_rest_still_applies() {
        let mut doc = defaults();
        let raw = mapping("toggles:\n  ShopCash: abc\n  ShopGeneral: 0\n");

        let warnings = overlay_persisted(&mut doc, &raw);

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].key.as_deref(), Some("ShopCash"));
        assert_eq!(doc.toggles["ShopCash"], 1);
        assert_eq!(doc.toggles["ShopGeneral"], 0);
    }

    #[test]
    fn test_known_section_holding_scalar_keeps_defaults() {
        let mut doc = defaults();

        let warnings = overlay_persisted(&mut doc, &mapping("vision: 5\n"));

        assert_eq!(warnings.len(), 1);
        assert_eq!(doc.vision, defaults().vision);
    }

    #[test]
    fn test_missing_version_is_treated_as_legacy() {
        let mut doc = defaults();
        overlay_persisted(&mut doc, &mapping("tasks:\n  test_task: false\n"));
        assert_eq!(doc.meta.version, LEGACY_SCHEMA_VERSION);
    }

    #[test]
    fn test_non_numeric_version_is_treated_as_legacy_with_warning() {
        let mut doc = defaults();

        let warnings = overlay_persisted(&mut doc, &mapping("meta:\n  version: latest\n"));

        assert_eq!(doc.meta.version, LEGACY_SCHEMA_VERSION);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_version_below_oldest_schema_is_raised_with_warning() {
        // Arrange
        let mut doc = defaults();

        // Act
        let warnings = overlay_persisted(&mut doc, &mapping("meta:\n  version: 0\n"));

        // Assert
        assert_eq!(doc.meta.version, LEGACY_SCHEMA_VERSION);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].key.as_deref(), Some("version"));
    }

    #[test]
    fn test_declared_version_is_kept_even_if_higher() {
        let mut doc = defaults();
        overlay_persisted(&mut doc, &mapping("meta:\n  version: 7\n  written_by: doro 3\n"));
        assert_eq!(doc.meta.version, 7);
        assert_eq!(
            doc.meta.extra.get("written_by"),
            Some(&Value::String("doro 3".to_string()))
        );
    }

    #[test]
    fn test_empty_section_is_not_an_error() {
        let mut doc = defaults();
        let warnings = overlay_persisted(&mut doc, &mapping("tasks:\nmeta:\n  version: 2\n"));
        assert!(warnings.is_empty());
        assert_eq!(doc.tasks, defaults().tasks);
    }

    #[test]
    fn test_numeric_settings_keep_value_kind() {
        let mut doc = defaults();
        overlay_persisted(
            &mut doc,
            &mapping("numeric_settings:\n  UserLevel: 120\n  Ratio: 0.75\n  UserGroup: Plus\n"),
        );
        assert_eq!(doc.numeric_settings["UserLevel"], SettingValue::Integer(120));
        assert_eq!(doc.numeric_settings["Ratio"], SettingValue::Float(0.75));
        assert_eq!(
            doc.numeric_settings["UserGroup"],
            SettingValue::Text("Plus".to_string())
        );
    }
}
