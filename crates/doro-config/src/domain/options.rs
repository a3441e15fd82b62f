//! Where the store keeps its files and how the watcher polls.
//!
//! # Example
//!
//! ```rust
//! use doro_config::domain::StoreOptions;
//!
//! let opts = StoreOptions::rooted_at("/srv/dorobot");
//! assert!(opts.config_path.ends_with("config.yaml"));
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_LEGACY_TOGGLES_FILE: &str = "settings.json";
pub const DEFAULT_LEGACY_NUMERIC_FILE: &str = "numeric_settings.json";
pub const DEFAULT_EXPORT_FILE: &str = "settings.ini";
pub const DEFAULT_SCHEMA_FILE: &str = "config.schema.json";

/// File locations used by a [`ConfigStore`](crate::ConfigStore).
///
/// | Field                 | Default                 |
/// |-----------------------|-------------------------|
/// | config_path           | `config.yaml`           |
/// | legacy_toggles_path   | `settings.json`         |
/// | legacy_numeric_path   | `numeric_settings.json` |
/// | export_path           | `settings.ini`          |
/// | schema_path           | `config.schema.json`    |
///
/// Relative paths resolve against the process working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// The backing file.  A `.toml` extension selects TOML, anything else YAML.
    pub config_path: PathBuf,
    /// Legacy toggles JSON, read on every load if present.
    pub legacy_toggles_path: PathBuf,
    /// Legacy numeric settings JSON, read on every load if present.
    pub legacy_numeric_path: PathBuf,
    /// INI file rewritten after every successful save.
    pub export_path: PathBuf,
    /// Destination of the on-demand schema artifact.
    pub schema_path: PathBuf,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            legacy_toggles_path: PathBuf::from(DEFAULT_LEGACY_TOGGLES_FILE),
            legacy_numeric_path: PathBuf::from(DEFAULT_LEGACY_NUMERIC_FILE),
            export_path: PathBuf::from(DEFAULT_EXPORT_FILE),
            schema_path: PathBuf::from(DEFAULT_SCHEMA_FILE),
        }
    }
}

impl StoreOptions {
    /// Places every default file name inside `dir`.
    pub fn rooted_at(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            config_path: dir.join(DEFAULT_CONFIG_FILE),
            legacy_toggles_path: dir.join(DEFAULT_LEGACY_TOGGLES_FILE),
            legacy_numeric_path: dir.join(DEFAULT_LEGACY_NUMERIC_FILE),
            export_path: dir.join(DEFAULT_EXPORT_FILE),
            schema_path: dir.join(DEFAULT_SCHEMA_FILE),
        }
    }
}

/// Polling settings for a [`PollingWatcher`](crate::PollingWatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Delay between modification-time checks.
    pub interval: Duration,
    /// How long `stop` waits for the poll thread before giving up on it.
    pub stop_grace: Duration,
}

impl Default for WatchOptions {
    /// | Field      | Default   |
    /// |------------|-----------|
    /// | interval   | 1 second  |
    /// | stop_grace | 2 seconds |
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            stop_grace: Duration::from_secs(2),
        }
    }
}
