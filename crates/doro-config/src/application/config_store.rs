//! The configuration store: the single owner of the live document.
//!
//! # Load pipeline
//!
//! ```text
//! defaults()
//!   └─ legacy import          (toggles / numeric_settings only)
//!        └─ backing file      (per-key overlay; unknown top-level keys replace)
//!             └─ migrations   (up to the target schema version)
//!                  └─ validate (advisory, logged)
//!                       └─ commit ─▶ notify subscribers
//! ```
//!
//! A backing file that exists but cannot be read or parsed does not abort the
//! load: the store commits defaults plus legacy values, notifies subscribers,
//! and then reports the failure as a [`LoadError`].  The process keeps running
//! on a complete document either way.
//!
//! # Concurrency
//!
//! - Readers (`get`, `snapshot`) take a short read lock on an
//!   `Arc<ConfigDocument>` and never see a half-merged document.
//! - Writers (`load`, `update`, `save`) serialize on a commit mutex.  The
//!   commit mutex stays held while subscribers are notified, so notifications
//!   arrive in commit order.  A callback may call `get` but must not call
//!   `load` or `update` on the same store.
//! - Concurrent writers are last-committed-wins.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use doro_core::{
    defaults, migration, overlay_persisted, validate, ConfigDocument, DocumentError,
    ImportReport, MergeWarning, MigrationRegistry, ValidationIssue, CURRENT_SCHEMA_VERSION,
};
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::subscribers::{SubscriberFailure, SubscriberId, SubscriberList};
use crate::domain::StoreOptions;
use crate::infrastructure::legacy::{LegacyFiles, LegacySettings};
use crate::infrastructure::storage::file::FileRepository;
use crate::infrastructure::storage::{ConfigRepository, RepositoryError};

// ── Errors ────────────────────────────────────────────────────────────────────

/// The backing file could not be used.  Defaults and legacy values were
/// committed instead.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file exists but could not be read.
    #[error("config file unreadable, fell back to defaults: {0}")]
    Read(#[source] RepositoryError),

    /// The file was read but is not a valid document.
    #[error("config file malformed, fell back to defaults: {0}")]
    Parse(#[source] RepositoryError),
}

/// The document could not be written to the backing file.
#[derive(Debug, Error)]
#[error("failed to save configuration: {0}")]
pub struct SaveError(#[from] pub RepositoryError);

/// An update was rejected or could not be persisted.  The committed document
/// is unchanged in both cases.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("rejected update: {0}")]
    Invalid(#[from] DocumentError),

    #[error(transparent)]
    Save(#[from] SaveError),
}

// ── Load report ───────────────────────────────────────────────────────────────

/// What a successful [`ConfigStore::load`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Schema version of the committed document.
    pub version: u32,
    /// Version the document had before migrations, if any ran.
    pub migrated_from: Option<u32>,
    /// `true` if a backing file was found and merged.
    pub file_found: bool,
    pub merge_warnings: Vec<MergeWarning>,
    pub validation: Vec<ValidationIssue>,
    pub legacy: ImportReport,
    pub subscriber_failures: Vec<SubscriberFailure>,
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// Owns the committed [`ConfigDocument`] and mediates every read and write.
pub struct ConfigStore {
    repository: Arc<dyn ConfigRepository>,
    legacy: Arc<dyn LegacySettings>,
    migrations: Arc<RwLock<MigrationRegistry>>,
    target_version: u32,
    current: RwLock<Arc<ConfigDocument>>,
    commit: Mutex<()>,
    subscribers: SubscriberList<ConfigDocument>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("location", &self.repository.location())
            .field("target_version", &self.target_version)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Builder for [`ConfigStore`].
pub struct ConfigStoreBuilder {
    repository: Arc<dyn ConfigRepository>,
    legacy: Arc<dyn LegacySettings>,
    migrations: Option<Arc<RwLock<MigrationRegistry>>>,
    target_version: u32,
}

impl ConfigStoreBuilder {
    /// Uses `registry` instead of the process-wide migration registry.
    pub fn migrations(mut self, registry: MigrationRegistry) -> Self {
        self.migrations = Some(Arc::new(RwLock::new(registry)));
        self
    }

    /// Upgrades loaded documents to `version` instead of
    /// [`CURRENT_SCHEMA_VERSION`].
    pub fn target_version(mut self, version: u32) -> Self {
        self.target_version = version;
        self
    }

    pub fn build(self) -> ConfigStore {
        ConfigStore {
            repository: self.repository,
            legacy: self.legacy,
            migrations: self.migrations.unwrap_or_else(migration::global),
            target_version: self.target_version,
            current: RwLock::new(Arc::new(defaults())),
            commit: Mutex::new(()),
            subscribers: SubscriberList::new(),
        }
    }
}

impl ConfigStore {
    /// Starts building a store over the given seams.
    pub fn builder(
        repository: Arc<dyn ConfigRepository>,
        legacy: Arc<dyn LegacySettings>,
    ) -> ConfigStoreBuilder {
        ConfigStoreBuilder {
            repository,
            legacy,
            migrations: None,
            target_version: CURRENT_SCHEMA_VERSION,
        }
    }

    /// Creates a file-backed store.  Holds defaults until [`load`](Self::load)
    /// is called.
    pub fn open(options: &StoreOptions) -> Self {
        Self::builder(
            Arc::new(FileRepository::new(&options.config_path)),
            Arc::new(LegacyFiles::from_options(options)),
        )
        .build()
    }

    /// Where the backing document lives.
    pub fn location(&self) -> &std::path::Path {
        self.repository.location()
    }

    // ── Load ──────────────────────────────────────────────────────────────────

    /// Rebuilds the document from defaults, legacy files, and the backing file,
    /// migrates it, commits it, and notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the backing file exists but is unusable.  The
    /// fallback document has already been committed and announced by then.
    pub fn load(&self) -> Result<LoadReport, LoadError> {
        let _commit = self.lock_commit();

        let mut doc = defaults();
        let legacy = self.legacy.import();
        legacy.apply_to(&mut doc);

        let mut report = LoadReport {
            legacy: legacy.report,
            ..LoadReport::default()
        };

        let failure = match self.repository.read() {
            Ok(Some(raw)) => {
                report.file_found = true;
                report.merge_warnings = overlay_persisted(&mut doc, &raw);
                for warning in &report.merge_warnings {
                    warn!("config {}: {warning}", self.location().display());
                }
                None
            }
            Ok(None) => {
                debug!(
                    "no config file at {}; using defaults",
                    self.location().display()
                );
                None
            }
            Err(e) => {
                warn!("{e}; using defaults and legacy settings");
                Some(e)
            }
        };

        let before = doc.meta.version;
        doc = self
            .migrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade(doc, self.target_version);
        if doc.meta.version != before {
            report.migrated_from = Some(before);
        }
        report.version = doc.meta.version;

        report.validation = validate(&doc);
        for issue in &report.validation {
            warn!("config validation: {issue}");
        }

        report.subscriber_failures = self.commit_and_notify(doc);
        info!(
            "config loaded (version {}, {} legacy keys)",
            report.version, report.legacy.contributed_keys
        );

        match failure {
            None => Ok(report),
            Some(e) if e.is_parse() => Err(LoadError::Parse(e)),
            Some(e) => Err(LoadError::Read(e)),
        }
    }

    // ── Save ──────────────────────────────────────────────────────────────────

    /// Writes the committed document to the backing file, then refreshes the
    /// legacy export.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if the backing file cannot be written.  A failed
    /// export is logged and does not fail the save.
    pub fn save(&self) -> Result<(), SaveError> {
        let _commit = self.lock_commit();
        self.persist(&self.snapshot())
    }

    fn persist(&self, doc: &ConfigDocument) -> Result<(), SaveError> {
        self.repository.write(doc)?;
        if let Err(e) = self.legacy.export(doc) {
            warn!("{e}");
        }
        Ok(())
    }

    // ── Read ──────────────────────────────────────────────────────────────────

    /// The committed document.  Later commits do not affect the returned value.
    pub fn snapshot(&self) -> Arc<ConfigDocument> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Looks up a value by section/key path.  `None` if any segment is absent.
    pub fn get(&self, path: &[&str]) -> Option<Value> {
        self.snapshot().get(path)
    }

    /// Like [`get`](Self::get) but falls back to `default`.
    pub fn get_or(&self, path: &[&str], default: Value) -> Value {
        self.snapshot().get_or(path, default)
    }

    // ── Update ────────────────────────────────────────────────────────────────

    /// Sets `section.key` to `value`, persists, commits, and notifies.
    ///
    /// The section is created if it does not exist.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Invalid`] if the value does not fit the section;
    /// [`UpdateError::Save`] if it could not be written.  Either way the
    /// committed document and the subscribers are left untouched.
    pub fn update(
        &self,
        section: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), UpdateError> {
        let _commit = self.lock_commit();

        let mut next = ConfigDocument::clone(&self.snapshot());
        next.set(section, key, value.into())?;
        for issue in validate(&next) {
            warn!("config validation: {issue}");
        }

        self.persist(&next)?;
        debug!("config updated: {section}.{key}");
        self.commit_and_notify(next);
        Ok(())
    }

    // ── Subscribe ─────────────────────────────────────────────────────────────

    /// Registers `callback` for every successful load or update.
    ///
    /// The callback receives the committed document.  Returning `Err` or
    /// panicking is logged and does not affect other subscribers.
    pub fn subscribe<F>(&self, name: impl Into<String>, callback: F) -> SubscriberId
    where
        F: Fn(&ConfigDocument) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribers.add(name, Arc::new(callback))
    }

    /// Removes a subscriber.  Returns `false` if `id` is unknown.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.subscribers.remove(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn subscribers(&self) -> &SubscriberList<ConfigDocument> {
        &self.subscribers
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn lock_commit(&self) -> MutexGuard<'_, ()> {
        self.commit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swaps in `doc` and notifies.  Caller must hold the commit lock.
    fn commit_and_notify(&self, doc: ConfigDocument) -> Vec<SubscriberFailure> {
        let doc = Arc::new(doc);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&doc);
        self.subscribers.notify(&doc)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
