//! Migrations shipped with this build.

use crate::domain::document::ConfigDocument;
use crate::domain::fields::KNOWN_TASKS;

use super::MigrationRegistry;

/// Registers every built-in step.
pub fn register_builtin(registry: &mut MigrationRegistry) {
    registry.register(1, register_known_tasks);
}

/// v1 -> v2: list every known task in `tasks`.
///
/// Version 1 files only carried the tasks a user had touched.  Absent tasks are
/// added as disabled; tasks already present, including ones this build does
/// not know, keep their value and position.
pub fn register_known_tasks(mut doc: ConfigDocument) -> ConfigDocument {
    for name in KNOWN_TASKS {
        doc.tasks.entry(name.to_string()).or_insert(false);
    }
    doc
}
