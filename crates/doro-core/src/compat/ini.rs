//! Flat INI export of toggles and numeric settings.
//!
//! ```ini
//! [Toggles]
//! ShopCash=1
//!
//! [Numbers]
//! UserGroup=Free
//! ```
//!
//! Toggles are written strictly as 0 or 1 (any non-zero value becomes 1).
//! `vision`, `tasks`, and extra sections are not exported.

use std::fmt::Write;

use crate::domain::document::ConfigDocument;

pub const TOGGLES_SECTION: &str = "Toggles";
pub const NUMBERS_SECTION: &str = "Numbers";

/// Renders the export artifact for `doc`.
pub fn render_ini(doc: &ConfigDocument) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "[{TOGGLES_SECTION}]");
    for (key, value) in &doc.toggles {
        let _ = writeln!(out, "{key}={}", i64::from(*value != 0));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[{NUMBERS_SECTION}]");
    for (key, value) in &doc.numeric_settings {
        let _ = writeln!(out, "{key}={value}");
    }

    out
}
