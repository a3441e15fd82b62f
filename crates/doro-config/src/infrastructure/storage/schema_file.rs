//! Writes the JSON schema artifact for editors and external tooling.
//!
//! Generated on demand only.  The store never reads it back.

use std::path::Path;

use doro_core::generate_schema;
use tracing::info;

use super::file::write_atomically;
use super::RepositoryError;

/// Writes [`generate_schema`] as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns [`RepositoryError::Io`] if the file cannot be written.
pub fn write_schema(path: &Path) -> Result<(), RepositoryError> {
    let mut text =
        serde_json::to_string_pretty(&generate_schema()).map_err(|e| RepositoryError::Serialize {
            format: "JSON",
            message: e.to_string(),
        })?;
    text.push('\n');
    write_atomically(path, text.as_bytes())?;
    info!("wrote config schema to {}", path.display());
    Ok(())
}
