//! Application layer for doro-config.
//!
//! - **`config_store`** – The single owner of the live configuration.  Runs
//!   the load pipeline (defaults, legacy import, backing file, migrations),
//!   persists updates, and notifies subscribers in commit order.
//!
//! - **`subscribers`** – Callback registry with per-callback failure
//!   isolation.  Shared by the store and the file watcher.
//!
//! - **`consumers`** – The read-only [`consumers::ConfigReader`] capability
//!   that task components depend on, plus the two in-tree consumers.

pub mod config_store;
pub mod consumers;
pub mod subscribers;
