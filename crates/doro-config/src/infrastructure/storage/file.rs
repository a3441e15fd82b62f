//! File-backed [`ConfigRepository`].
//!
//! The format is picked once from the path: `*.toml` is TOML, anything else is
//! YAML.  Both are read into the same untyped mapping so the lenient merge in
//! `doro-core` does not care which one was used.
//!
//! ```yaml
//! meta:
//!   version: 2
//! toggles:
//!   ShopCash: 0
//! ```
//!
//! # Writes
//!
//! A save renders the whole document into a sibling temp file and renames it
//! over the target.  A reader (or the watcher) therefore sees either the old
//! file or the new one, never a half-written one.

use std::fs;
use std::path::{Path, PathBuf};

use doro_core::domain::coerce;
use doro_core::ConfigDocument;
use serde_yaml::{Mapping, Value};
use tracing::debug;
use uuid::Uuid;

use super::{ConfigRepository, RepositoryError};

/// On-disk syntax of the backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Chooses the format from `path`'s extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Yaml,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DocumentFormat::Yaml => "YAML",
            DocumentFormat::Toml => "TOML",
        }
    }
}

/// Reads and writes the configuration document at a fixed path.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
    format: DocumentFormat,
}

impl FileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = DocumentFormat::from_path(&path);
        Self { path, format }
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    fn parse(&self, text: &str) -> Result<Mapping, RepositoryError> {
        if text.trim().is_empty() {
            return Ok(Mapping::new());
        }

        let parse_error = |message: String| RepositoryError::Parse {
            path: self.path.clone(),
            message,
        };

        let value = match self.format {
            DocumentFormat::Yaml => {
                serde_yaml::from_str::<Value>(text).map_err(|e| parse_error(e.to_string()))?
            }
            DocumentFormat::Toml => {
                let table: toml::Table =
                    toml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
                serde_yaml::to_value(table).map_err(|e| parse_error(e.to_string()))?
            }
        };

        match value {
            Value::Mapping(map) => Ok(map),
            // A YAML file holding only comments.
            Value::Null => Ok(Mapping::new()),
            other => Err(RepositoryError::NotAMapping {
                path: self.path.clone(),
                found: coerce::describe(&other),
            }),
        }
    }

    fn render(&self, doc: &ConfigDocument) -> Result<String, RepositoryError> {
        let serialize_error = |message: String| RepositoryError::Serialize {
            format: self.format.name(),
            message,
        };
        match self.format {
            DocumentFormat::Yaml => {
                serde_yaml::to_string(doc).map_err(|e| serialize_error(e.to_string()))
            }
            DocumentFormat::Toml => {
                toml::to_string_pretty(doc).map_err(|e| serialize_error(e.to_string()))
            }
        }
    }
}

impl ConfigRepository for FileRepository {
    fn read(&self) -> Result<Option<Mapping>, RepositoryError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => self.parse(&text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepositoryError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn write(&self, doc: &ConfigDocument) -> Result<(), RepositoryError> {
        let text = self.render(doc)?;
        write_atomically(&self.path, text.as_bytes())?;
        debug!("wrote {} config to {}", self.format.name(), self.path.display());
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Replaces `path` with `contents` via a temp file in the same directory.
///
/// Creates the parent directory if it does not exist.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), RepositoryError> {
    // Ensure directory exists before writing.
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| RepositoryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

    fs::write(&tmp, contents).map_err(|source| RepositoryError::Io {
        path: tmp.clone(),
        source,
    })?;

    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(RepositoryError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use doro_core::defaults;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("doro_file_repo_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    // ── format selection ──────────────────────────────────────────────────────

    #[test]
    fn test_format_from_path_uses_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.toml")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.TOML")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.yaml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("config")), DocumentFormat::Yaml);
    }

    // ── read ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_read_missing_file_returns_none() {
        let repo = FileRepository::new(temp_dir().join("config.yaml"));
        assert!(repo.read().expect("read").is_none());
    }

    #[test]
    fn test_read_empty_file_is_empty_mapping() {
        // Arrange
        let path = temp_dir().join("config.yaml");
        fs::write(&path, "# nothing yet\n").expect("write");

        // Act
        let map = FileRepository::new(&path).read().expect("read");

        // Assert
        assert_eq!(map, Some(Mapping::new()));
    }

    #[test]
    fn test_read_malformed_yaml_is_parse_error() {
        let path = temp_dir().join("config.yaml");
        fs::write(&path, "toggles: [unclosed\n").expect("write");

        let err = FileRepository::new(&path).read().unwrap_err();

        assert!(matches!(err, RepositoryError::Parse { .. }));
    }

    #[test]
    fn test_read_scalar_top_level_is_not_a_mapping() {
        let path = temp_dir().join("config.yaml");
        fs::write(&path, "just a string\n").expect("write");

        let err = FileRepository::new(&path).read().unwrap_err();

        assert!(matches!(err, RepositoryError::NotAMapping { found: "string", .. }));
    }

    #[test]
    fn test_read_directory_is_io_error() {
        let dir = temp_dir();

        let err = FileRepository::new(&dir).read().unwrap_err();

        assert!(matches!(err, RepositoryError::Io { .. }));
    }

    #[test]
    fn test_toml_read_keeps_task_order_from_the_file() {
        // Arrange
        let path = temp_dir().join("config.toml");
        fs::write(
            &path,
            "[tasks]\nzeta_task = true\nmid_task = false\nalpha_task = true\n",
        )
        .expect("write");

        // Act
        let map = FileRepository::new(&path).read().expect("read").expect("present");

        // Assert
        let Some(Value::Mapping(tasks)) = map.get("tasks") else {
            panic!("tasks section missing: {map:?}");
        };
        let order: Vec<&str> = tasks.keys().filter_map(Value::as_str).collect();
        assert_eq!(order, vec!["zeta_task", "mid_task", "alpha_task"]);
    }

    // ── write ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_write_creates_parent_directories() {
        let path = temp_dir().join("nested").join("deeper").join("config.yaml");
        let repo = FileRepository::new(&path);

        repo.write(&defaults()).expect("write");

        assert!(path.exists());
    }

    #[test]
    fn test_write_leaves_no_temp_files_behind() {
        let dir = temp_dir();
        let repo = FileRepository::new(dir.join("config.yaml"));

        repo.write(&defaults()).expect("first write");
        repo.write(&defaults()).expect("second write");

        let names: Vec<_> = fs::read_dir(&dir)
            .expect("read dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("config.yaml")]);
    }

    #[test]
    fn test_yaml_write_then_read_keeps_every_section() {
        let repo = FileRepository::new(temp_dir().join("config.yaml"));
        let doc = defaults();

        repo.write(&doc).expect("write");
        let map = repo.read().expect("read").expect("present");

        for section in doro_core::Section::ALL {
            assert!(map.contains_key(section.name()), "missing {section}");
        }
    }

    #[test]
    fn test_toml_write_then_read_round_trips_values() {
        // Arrange
        let repo = FileRepository::new(temp_dir().join("config.toml"));
        let mut doc = defaults();
        doc.set("task_runner", "break_on_failure", Value::Bool(true))
            .expect("set");

        // Act
        repo.write(&doc).expect("write");
        let map = repo.read().expect("read").expect("present");
        let mut restored = defaults();
        let warnings = doro_core::overlay_persisted(&mut restored, &map);

        // Assert
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(restored, doc);
    }
}
