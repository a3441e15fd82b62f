//! Legacy settings files: import on load, INI export after save.
//!
//! Older releases kept two flat JSON objects next to the executable, one for
//! toggles and one for numeric settings.  They are still honoured as a merge
//! layer between defaults and the backing file, but never written.  The INI
//! export is the other direction: a flat view for external tools.
//!
//! Neither direction can fail a load.  Import turns every problem into a
//! [`SkippedFile`] in the [`ImportReport`]; export errors are returned so the
//! store can log them, and the store never propagates them.

use std::fs;
use std::path::{Path, PathBuf};

use doro_core::compat::legacy_json::{self, LegacyParseError};
use doro_core::compat::ini;
use doro_core::{ConfigDocument, ImportReport, LegacyImport, SkipReason, SkippedFile};
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::StoreOptions;
use crate::infrastructure::storage::file::write_atomically;
use crate::infrastructure::storage::RepositoryError;

/// Error writing the INI export.
#[derive(Debug, Error)]
#[error("failed to write legacy export: {0}")]
pub struct LegacyExportError(#[from] pub RepositoryError);

/// Import/export seam used by the store.
#[cfg_attr(test, mockall::automock)]
pub trait LegacySettings: Send + Sync {
    /// Reads whatever legacy files are present.  Never fails.
    fn import(&self) -> LegacyImport;

    /// Writes the flat export of `doc`.
    ///
    /// # Errors
    ///
    /// Returns [`LegacyExportError`] if the export file cannot be written.
    fn export(&self, doc: &ConfigDocument) -> Result<(), LegacyExportError>;
}

/// File-backed [`LegacySettings`].
#[derive(Debug, Clone)]
pub struct LegacyFiles {
    toggles_path: PathBuf,
    numeric_path: PathBuf,
    export_path: PathBuf,
}

impl LegacyFiles {
    pub fn new(
        toggles_path: impl Into<PathBuf>,
        numeric_path: impl Into<PathBuf>,
        export_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            toggles_path: toggles_path.into(),
            numeric_path: numeric_path.into(),
            export_path: export_path.into(),
        }
    }

    pub fn from_options(options: &StoreOptions) -> Self {
        Self::new(
            &options.legacy_toggles_path,
            &options.legacy_numeric_path,
            &options.export_path,
        )
    }
}

impl LegacySettings for LegacyFiles {
    fn import(&self) -> LegacyImport {
        let mut report = ImportReport::default();
        let toggles = import_file(
            &self.toggles_path,
            "toggles",
            legacy_json::parse_toggles,
            &mut report,
        );
        let numeric_settings = import_file(
            &self.numeric_path,
            "numeric_settings",
            legacy_json::parse_numeric_settings,
            &mut report,
        );
        LegacyImport {
            toggles,
            numeric_settings,
            report,
        }
    }

    fn export(&self, doc: &ConfigDocument) -> Result<(), LegacyExportError> {
        write_atomically(&self.export_path, ini::render_ini(doc).as_bytes())?;
        debug!("exported legacy settings to {}", self.export_path.display());
        Ok(())
    }
}

/// Reads one legacy file, recording the outcome in `report`.
fn import_file<T>(
    path: &Path,
    section: &str,
    parse: fn(&str) -> Result<legacy_json::Parsed<T>, LegacyParseError>,
    report: &mut ImportReport,
) -> IndexMap<String, T> {
    let skip = |report: &mut ImportReport, reason: SkipReason| {
        report.skipped.push(SkippedFile {
            path: path.to_path_buf(),
            reason,
        });
        IndexMap::new()
    };

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no legacy {section} file at {}", path.display());
            return skip(report, SkipReason::Missing);
        }
        Err(e) => {
            warn!("ignoring unreadable legacy {section} file {}: {e}", path.display());
            return skip(report, SkipReason::Unreadable(e.to_string()));
        }
    };

    let parsed = match parse(&text) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("ignoring unparseable legacy {section} file {}: {e}", path.display());
            return skip(report, SkipReason::Unparseable(e.to_string()));
        }
    };

    for key in &parsed.rejected {
        warn!("legacy {section} entry `{key}` in {} has an unusable value; skipped", path.display());
    }
    report.files_imported += 1;
    report.contributed_keys += parsed.entries.len();
    report
        .rejected_keys
        .extend(parsed.rejected.iter().map(|key| format!("{section}.{key}")));
    debug!(
        "imported {} legacy {section} keys from {}",
        parsed.entries.len(),
        path.display()
    );
    parsed.entries
}

// ── Tests ─────────────────────────────────────────────────────────────────────
