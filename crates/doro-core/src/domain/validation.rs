//! Range checks over a document.
//!
//! Validation is advisory.  The store logs every issue and carries on: a
//! single out-of-range toggle must never keep the rest of the configuration
//! from loading.

use thiserror::Error;

use super::document::ConfigDocument;
use super::fields::{TOGGLE_DOMAIN, VISION_FIELDS};

/// A value outside its declared range.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationIssue {
    /// A fixed `vision` field is outside its bounds.
    #[error("vision.{field} = {value} is outside {}", describe_bounds(*.minimum, *.maximum))]
    OutOfRange {
        field: &'static str,
        value: f64,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },

    /// A toggle holds something other than 0 or 1.
    #[error("toggles.{key} = {value} is not 0 or 1")]
    ToggleOutOfDomain { key: String, value: i64 },
}

/// Reports every out-of-range value in `doc` without modifying it.
pub fn validate(doc: &ConfigDocument) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for range in &VISION_FIELDS {
        let Some(value) = doc.vision.field(range.name) else {
            continue;
        };
        if !range.contains(value) {
            issues.push(ValidationIssue::OutOfRange {
                field: range.name,
                value,
                minimum: range.minimum,
                maximum: range.maximum,
            });
        }
    }

    issues.extend(
        doc.toggles
            .iter()
            .filter(|(_, value)| !TOGGLE_DOMAIN.contains(*value))
            .map(|(key, value)| ValidationIssue::ToggleOutOfDomain {
                key: key.clone(),
                value: *value,
            }),
    );

    issues
}

fn describe_bounds(minimum: Option<f64>, maximum: Option<f64>) -> String {
    match (minimum, maximum) {
        (Some(min), Some(max)) => format!("[{min}, {max}]"),
        (Some(min), None) => format!(">= {min}"),
        (None, Some(max)) => format!("<= {max}"),
        (None, None) => "any value".to_string(),
    }
}
