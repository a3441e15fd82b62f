//! # doro-core
//!
//! Shared configuration model for DoroBot: the sectioned configuration
//! document, its built-in defaults, the lenient per-key merge used when
//! loading, validation, the versioned migration engine, legacy format codecs,
//! and the JSON-schema reflector.
//!
//! This crate performs no file or network I/O.  Everything here is a pure
//! function of its inputs, so the store in `doro-config` can call it while
//! holding its commit lock and tests can exercise it without a file system.
//!
//! # Architecture overview
//!
//! - **`domain`** – The [`ConfigDocument`] and the tables that describe its
//!   shape ([`domain::fields`]).  Defaults, merge, and validation are all
//!   driven from those tables so they cannot drift apart.
//!
//! - **`migration`** – A registry of `from_version -> transform` functions and
//!   the best-effort [`MigrationRegistry::upgrade`] loop.
//!
//! - **`compat`** – Codecs for the older flat settings files: the legacy JSON
//!   toggles / numeric files (import) and the INI export read by external tools.
//!
//! - **`schema`** – Generates a JSON-schema style description of the document
//!   for editors and external tooling.

pub mod compat;
pub mod domain;
pub mod migration;
pub mod schema;

pub use compat::{ImportReport, LegacyImport, SkipReason, SkippedFile};
pub use domain::defaults::defaults;
pub use domain::document::{ConfigDocument, DocumentError, Meta, SettingValue, VisionSettings};
pub use domain::fields::{Section, CURRENT_SCHEMA_VERSION, LEGACY_SCHEMA_VERSION};
pub use domain::merge::{overlay_persisted, MergeWarning};
pub use domain::validation::{validate, ValidationIssue};
pub use migration::{MigrationFn, MigrationRegistry};
pub use schema::generate_schema;
