//! Storage infrastructure: backing file persistence.
//!
//! The store talks to the backing file only through [`ConfigRepository`], so
//! unit tests can swap in [`mock::MockRepository`] and never touch the disk.
//!
//! - **`file`** – [`file::FileRepository`], YAML or TOML chosen by extension,
//!   with write-to-temp-then-rename replacement.
//! - **`mock`** – in-memory repository with failure injection.
//! - **`schema_file`** – writes the generated JSON schema artifact.

pub mod file;
pub mod mock;
pub mod schema_file;

use std::path::{Path, PathBuf};

use doro_core::ConfigDocument;
use serde_yaml::Mapping;
use thiserror::Error;

/// Error type for backing file operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file content is not valid YAML / TOML.
    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// The file parsed, but its top level is not a mapping.
    #[error("top level of {} is a {found}, expected a mapping", .path.display())]
    NotAMapping { path: PathBuf, found: &'static str },

    /// The document could not be rendered in the file's format.
    #[error("failed to serialize config as {format}: {message}")]
    Serialize {
        format: &'static str,
        message: String,
    },
}

impl RepositoryError {
    /// Returns `true` when the file was read but its content is unusable.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            RepositoryError::Parse { .. } | RepositoryError::NotAMapping { .. }
        )
    }
}

/// Persistence seam for the configuration document.
pub trait ConfigRepository: Send + Sync {
    /// Reads the persisted top-level mapping.
    ///
    /// Returns `Ok(None)` when nothing is persisted yet.  An empty file reads
    /// as an empty mapping.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Io`] when an existing file cannot be read,
    /// [`RepositoryError::Parse`] / [`RepositoryError::NotAMapping`] when its
    /// content is unusable.
    fn read(&self) -> Result<Option<Mapping>, RepositoryError>;

    /// Replaces the persisted document with `doc`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Io`] or [`RepositoryError::Serialize`].
    fn write(&self, doc: &ConfigDocument) -> Result<(), RepositoryError>;

    /// Where the document lives, for log messages and the watcher.
    fn location(&self) -> &Path;
}
