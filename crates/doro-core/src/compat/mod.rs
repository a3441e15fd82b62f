//! Compatibility with the older flat settings formats.
//!
//! - **Import** – two optional JSON objects, one of toggles and one of numeric
//!   settings, written by earlier releases.  [`legacy_json`] parses them; the
//!   file reading lives in `doro-config` and reports what it did through an
//!   [`ImportReport`] instead of silently swallowing failures.
//! - **Export** – [`ini::render_ini`] writes `toggles` and `numeric_settings`
//!   as `key=value` lines for external tools.  Export is lossy and one-way.
//!
//! Precedence on load is: defaults < legacy import < persisted file.

pub mod ini;
pub mod legacy_json;

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::domain::document::{ConfigDocument, SettingValue};

/// Why a legacy file contributed nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The file does not exist.
    Missing,
    /// The file exists but could not be read (permissions, not a file, ...).
    Unreadable(String),
    /// The file was read but is not a JSON object.
    Unparseable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Missing => f.write_str("not present"),
            SkipReason::Unreadable(e) => write!(f, "unreadable: {e}"),
            SkipReason::Unparseable(e) => write!(f, "unparseable: {e}"),
        }
    }
}

/// A legacy file that was not imported.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of an import attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Files that were read and parsed.
    pub files_imported: usize,
    /// Keys contributed across all imported files.
    pub contributed_keys: usize,
    /// Entries inside imported files whose value had the wrong type.
    pub rejected_keys: Vec<String>,
    pub skipped: Vec<SkippedFile>,
}

/// Values read from the legacy files, ready to layer under the persisted file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyImport {
    pub toggles: IndexMap<String, i64>,
    pub numeric_settings: IndexMap<String, SettingValue>,
    pub report: ImportReport,
}

impl LegacyImport {
    /// Returns `true` when no legacy key was found.
    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty() && self.numeric_settings.is_empty()
    }

    /// Overlays the imported keys onto `doc`'s `toggles` and `numeric_settings`.
    pub fn apply_to(&self, doc: &mut ConfigDocument) {
        doc.toggles
            .extend(self.toggles.iter().map(|(k, v)| (k.clone(), *v)));
        doc.numeric_settings.extend(
            self.numeric_settings
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }
}
