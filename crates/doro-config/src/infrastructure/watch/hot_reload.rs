//! Reloads a [`ConfigStore`] whenever its backing file changes.

use std::sync::Arc;

use tracing::{info, warn};

use super::polling::{PollingWatcher, StopOutcome, WatchError, WatcherState};
use crate::application::config_store::ConfigStore;
use crate::domain::WatchOptions;

/// A [`PollingWatcher`] on the store's backing file whose callback calls
/// [`ConfigStore::load`].
///
/// The watcher holds only a weak reference to the store, so dropping the
/// last `Arc<ConfigStore>` turns further ticks into no-ops.  A failed reload
/// is logged; the store has already committed its fallback document.
pub struct HotReload {
    watcher: PollingWatcher,
}

impl HotReload {
    pub fn new(store: &Arc<ConfigStore>, options: WatchOptions) -> Self {
        let watcher = PollingWatcher::new(store.location(), options);
        let weak = Arc::downgrade(store);
        watcher.subscribe("hot-reload", move |path| {
            let Some(store) = weak.upgrade() else {
                return Ok(());
            };
            match store.load() {
                Ok(report) => info!(
                    "reloaded {} (version {}, {} warning(s))",
                    path.display(),
                    report.version,
                    report.merge_warnings.len() + report.validation.len()
                ),
                Err(e) => warn!("hot reload of {}: {e}", path.display()),
            }
            Ok(())
        });
        Self { watcher }
    }

    /// Starts polling.  No-op if already running.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Spawn`] if the poll thread cannot be created.
    pub fn start(&self) -> Result<(), WatchError> {
        self.watcher.start()
    }

    pub fn stop(&self) -> StopOutcome {
        self.watcher.stop()
    }

    pub fn state(&self) -> WatcherState {
        self.watcher.state()
    }

    /// The underlying watcher, for registering extra change callbacks.
    pub fn watcher(&self) -> &PollingWatcher {
        &self.watcher
    }
}
