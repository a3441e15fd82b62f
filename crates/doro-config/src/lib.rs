//! doro-config library crate.
//!
//! Owns DoroBot's live configuration: loads it from disk, keeps one committed
//! copy in memory, persists every change, and tells interested components when
//! it changes.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! [doro-config]
//!   ├── domain/           StoreOptions, WatchOptions (plain settings structs)
//!   ├── application/      ConfigStore, subscriber list, ConfigReader consumers
//!   └── infrastructure/
//!         ├── storage/    Backing file (YAML or TOML), schema artifact
//!         ├── legacy/     Legacy JSON import, INI export
//!         └── watch/      Polling file watcher, hot-reload wiring
//!         ↕
//! [doro-core]             Document model, defaults, merge, migrations, schema
//! ```
//!
//! # Data flow
//!
//! ```text
//! PollingWatcher ──tick──▶ ConfigStore::load
//!                            defaults < legacy import < persisted file
//!                            └─ migrations ─▶ commit ─▶ subscribers
//! ```

/// Domain layer: settings for the store and the watcher.
pub mod domain;

/// Application layer: the store and its consumers.
pub mod application;

/// Infrastructure layer: file system adapters.
pub mod infrastructure;

pub use application::config_store::{
    ConfigStore, ConfigStoreBuilder, LoadError, LoadReport, SaveError, UpdateError,
};
pub use application::consumers::{
    ConfigReader, TaskPlan, TaskRunSummary, VisionDefaults, VisionSnapshot,
};
pub use application::subscribers::{SubscriberFailure, SubscriberId};
pub use domain::{StoreOptions, WatchOptions};
pub use infrastructure::watch::{HotReload, PollingWatcher, StopOutcome, WatchError, WatcherState};
