//! Detects edits to the backing file and reloads the store.
//!
//! - **`polling`** – [`PollingWatcher`], a background thread that compares the
//!   file's modification time on a fixed interval.  No platform file-event
//!   APIs are used, so it behaves the same everywhere, including network
//!   drives.
//! - **`hot_reload`** – [`HotReload`], a watcher whose callback reloads a
//!   [`ConfigStore`](crate::ConfigStore).

pub mod hot_reload;
pub mod polling;

pub use hot_reload::HotReload;
pub use polling::{PollingWatcher, StopOutcome, WatchError, WatcherState};
