//! Infrastructure layer for doro-config.
//!
//! Contains the file-system adapters: the backing file repository, the legacy
//! settings import/export, and the polling watcher.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain`, and
//! `doro_core`.  Nothing in `doro_core` may depend on it.

pub mod legacy;
pub mod storage;
pub mod watch;
