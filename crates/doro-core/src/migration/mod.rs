//! Versioned schema migrations.
//!
//! A migration is a pure function that takes a document at schema version
//! `n` and returns it reshaped for version `n + 1`.  Migrations are kept in a
//! [`MigrationRegistry`] indexed by their `from_version`, and
//! [`MigrationRegistry::upgrade`] walks them one step at a time.
//!
//! # Upgrade loop
//!
//! ```text
//! current = doc.meta.version
//! while current < target:
//!     transform = registry[current]   -- absent? stop here (saturation point)
//!     doc = transform(doc)
//!     current += 1; doc.meta.version = current
//! ```
//!
//! Stopping early is not an error: a document may stay below the target when
//! no path exists.  The version is never lowered, and running `upgrade` again
//! with the same target is a no-op.
//!
//! # Registration
//!
//! Registering a second transform for the same `from_version` replaces the
//! first (last writer wins).  Migrations are expected to be registered once at
//! startup, so this is logged rather than rejected.
//!
//! A process-wide registry ([`global`]) is pre-loaded with the built-in
//! migrations; stores use it unless they are handed their own registry.

pub mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::domain::document::ConfigDocument;
use crate::domain::fields::CURRENT_SCHEMA_VERSION;

/// A pure document transform from one schema version to the next.
pub type MigrationFn = Arc<dyn Fn(ConfigDocument) -> ConfigDocument + Send + Sync>;

/// Version-indexed set of migrations.
#[derive(Clone, Default)]
pub struct MigrationRegistry {
    transforms: BTreeMap<u32, MigrationFn>,
}

impl fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field("from_versions", &self.transforms.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MigrationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in migrations.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        builtin::register_builtin(&mut registry);
        registry
    }

    /// Registers `transform` as the step from `from_version` to `from_version + 1`.
    ///
    /// Replaces any transform already registered for `from_version`.
    pub fn register<F>(&mut self, from_version: u32, transform: F)
    where
        F: Fn(ConfigDocument) -> ConfigDocument + Send + Sync + 'static,
    {
        if self
            .transforms
            .insert(from_version, Arc::new(transform))
            .is_some()
        {
            warn!("migration from version {from_version} registered twice; keeping the latest");
        }
    }

    /// Returns `true` if a step from `from_version` exists.
    pub fn contains(&self, from_version: u32) -> bool {
        self.transforms.contains_key(&from_version)
    }

    /// Number of registered steps.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Upgrades `doc` towards `target_version`, one registered step at a time.
    ///
    /// Stops at the first version with no registered step.
    pub fn upgrade(&self, mut doc: ConfigDocument, target_version: u32) -> ConfigDocument {
        let start = doc.meta.version;
        let mut current = start;

        while current < target_version {
            let Some(transform) = self.transforms.get(&current) else {
                debug!(
                    "no migration registered from version {current}; stopping below target {target_version}"
                );
                break;
            };
            doc = transform(doc);
            current += 1;
            doc.meta.version = current;
        }

        if current != start {
            debug!("migrated document from version {start} to {current}");
        }
        doc
    }

    /// Upgrades `doc` towards [`CURRENT_SCHEMA_VERSION`].
    pub fn upgrade_to_current(&self, doc: ConfigDocument) -> ConfigDocument {
        self.upgrade(doc, CURRENT_SCHEMA_VERSION)
    }
}

static GLOBAL: OnceLock<Arc<RwLock<MigrationRegistry>>> = OnceLock::new();

/// The process-wide registry, created with the built-in migrations on first use.
pub fn global() -> Arc<RwLock<MigrationRegistry>> {
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(RwLock::new(MigrationRegistry::with_builtin()))))
}

/// Registers a migration in the process-wide registry.
///
/// Last writer wins for a repeated `from_version`.
pub fn register_migration<F>(from_version: u32, transform: F)
where
    F: Fn(ConfigDocument) -> ConfigDocument + Send + Sync + 'static,
{
    global()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(from_version, transform);
}
