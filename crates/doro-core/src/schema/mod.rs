//! Machine-readable description of the document shape.
//!
//! The output is a JSON-schema (draft-07) object built from the same tables
//! that drive defaults and validation, so it cannot drift from them.  It is
//! for external tooling only; nothing in the store reads it back.

mod reflect;

pub use reflect::{generate_schema, SCHEMA_DIALECT, SCHEMA_TITLE};
