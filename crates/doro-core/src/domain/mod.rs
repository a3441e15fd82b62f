//! Domain entities for the configuration subsystem.
//!
//! This module contains pure logic with no infrastructure dependencies.  The
//! document type lives in [`document`]; everything that needs to know the
//! document's *shape* (which sections exist, which vision fields are numeric
//! and what their ranges are, which values a toggle may take) reads it from
//! [`fields`].
//!
//! Code in outer layers (the store, the file repository, the watcher) depends
//! on the domain, but the domain never depends on them.

pub mod coerce;
pub mod defaults;
pub mod document;
pub mod fields;
pub mod merge;
pub mod validation;
