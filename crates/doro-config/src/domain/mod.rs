//! Domain layer for doro-config.
//!
//! Plain settings structs with defaults.  Nothing here touches the file
//! system or reads the environment; the binary fills these in from CLI flags.

pub mod options;

pub use options::{StoreOptions, WatchOptions};
