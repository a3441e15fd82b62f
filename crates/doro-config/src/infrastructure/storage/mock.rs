//! In-memory repository for unit testing.
//!
//! Lets store tests control exactly what "the file" contains and make reads
//! or writes fail, without a real file system.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use doro_core::ConfigDocument;
use serde_yaml::{Mapping, Value};

use super::{ConfigRepository, RepositoryError};

/// What the next `read` should do.
#[derive(Debug, Clone)]
enum Stored {
    Absent,
    Present(Mapping),
    Unparseable(String),
    Unreadable,
}

/// A mock implementation of [`ConfigRepository`] backed by memory.
pub struct MockRepository {
    path: PathBuf,
    stored: Mutex<Stored>,
    fail_writes: Mutex<bool>,
    writes: Mutex<Vec<ConfigDocument>>,
}

impl MockRepository {
    /// Creates a repository with nothing persisted.
    pub fn new() -> Self {
        Self {
            path: PathBuf::from("mock://config.yaml"),
            stored: Mutex::new(Stored::Absent),
            fail_writes: Mutex::new(false),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Creates a repository whose file contains `yaml`.
    ///
    /// Panics if `yaml` is not a YAML mapping.
    pub fn with_yaml(yaml: &str) -> Self {
        let repo = Self::new();
        let map: Mapping = serde_yaml::from_str(yaml).expect("mock content must be a YAML mapping");
        *repo.stored.lock().expect("lock poisoned") = Stored::Present(map);
        repo
    }

    /// Makes the next reads fail with a parse error.
    pub fn set_unparseable(&self, message: &str) {
        *self.stored.lock().expect("lock poisoned") = Stored::Unparseable(message.to_string());
    }

    /// Makes the next reads fail with an I/O error.
    pub fn set_unreadable(&self) {
        *self.stored.lock().expect("lock poisoned") = Stored::Unreadable;
    }

    /// Makes subsequent writes fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().expect("lock poisoned") = fail;
    }

    /// Every document successfully written, oldest first.
    pub fn writes(&self) -> Vec<ConfigDocument> {
        self.writes.lock().expect("lock poisoned").clone()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.lock().expect("lock poisoned").len()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRepository for MockRepository {
    fn read(&self) -> Result<Option<Mapping>, RepositoryError> {
        match &*self.stored.lock().expect("lock poisoned") {
            Stored::Absent => Ok(None),
            Stored::Present(map) => Ok(Some(map.clone())),
            Stored::Unparseable(message) => Err(RepositoryError::Parse {
                path: self.path.clone(),
                message: message.clone(),
            }),
            Stored::Unreadable => Err(RepositoryError::Io {
                path: self.path.clone(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            }),
        }
    }

    fn write(&self, doc: &ConfigDocument) -> Result<(), RepositoryError> {
        if *self.fail_writes.lock().expect("lock poisoned") {
            return Err(RepositoryError::Io {
                path: self.path.clone(),
                source: std::io::Error::other("disk full"),
            });
        }

        let rendered = serde_yaml::to_value(doc).map_err(|e| RepositoryError::Serialize {
            format: "YAML",
            message: e.to_string(),
        })?;
        if let Value::Mapping(map) = rendered {
            *self.stored.lock().expect("lock poisoned") = Stored::Present(map);
        }
        self.writes.lock().expect("lock poisoned").push(doc.clone());
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doro_core::defaults;

    #[test]
    fn test_mock_repository_starts_empty() {
        let repo = MockRepository::new();
        assert!(repo.read().expect("read").is_none());
        assert_eq!(repo.write_count(), 0);
    }

    #[test]
    fn test_mock_repository_reads_back_what_was_written() {
        // Arrange
        let repo = MockRepository::new();
        let doc = defaults();

        // Act
        repo.write(&doc).expect("write");
        let map = repo.read().expect("read").expect("present");

        // Assert
        assert!(map.contains_key("toggles"));
        assert_eq!(repo.writes(), vec![doc]);
    }

    #[test]
    fn test_mock_repository_injected_failures() {
        let repo = MockRepository::with_yaml("toggles:\n  ShopCash: 0\n");

        repo.set_unparseable("bad");
        assert!(repo.read().unwrap_err().is_parse());

        repo.set_unreadable();
        assert!(matches!(repo.read().unwrap_err(), RepositoryError::Io { .. }));

        repo.fail_writes(true);
        assert!(repo.write(&defaults()).is_err());
        assert_eq!(repo.write_count(), 0);
    }
}
