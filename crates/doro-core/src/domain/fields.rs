//! Shape of the configuration document.
//!
//! These tables are the single description of the schema.  Defaults,
//! validation, lenient merging, and schema reflection all read from here.

/// Schema revision written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Revision assumed for a persisted document that carries no `meta.version`.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// Values a toggle may hold.
pub const TOGGLE_DOMAIN: [i64; 2] = [0, 1];

/// Task names known to this build, in run order.
///
/// The `tasks` section is open-ended; names outside this list are kept but
/// have no built-in implementation.
pub const KNOWN_TASKS: [&str; 10] = [
    "test_task",
    "login_task",
    "shop_task",
    "arena_task",
    "tower_task",
    "simulation_task",
    "interception_task",
    "event_task",
    "reward_task",
    "cleanup_task",
];

/// A named top-level section of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Meta,
    Vision,
    Tasks,
    Toggles,
    NumericSettings,
}

impl Section {
    /// Every section, in the order they are written to disk.
    pub const ALL: [Section; 5] = [
        Section::Meta,
        Section::Vision,
        Section::Tasks,
        Section::Toggles,
        Section::NumericSettings,
    ];

    /// The key used for this section in the backing file.
    pub fn name(self) -> &'static str {
        match self {
            Section::Meta => "meta",
            Section::Vision => "vision",
            Section::Tasks => "tasks",
            Section::Toggles => "toggles",
            Section::NumericSettings => "numeric_settings",
        }
    }

    /// Resolves a top-level key to a known section.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Value kind of a fixed numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Whole number (JSON-schema `integer`).
    Integer,
    /// Any real number (JSON-schema `number`).
    Number,
}

impl FieldKind {
    pub fn json_type(self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
        }
    }
}

/// Descriptor of one fixed field in the `vision` section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Inclusive lower bound, if any.
    pub minimum: Option<f64>,
    /// Inclusive upper bound, if any.
    pub maximum: Option<f64>,
}

impl FieldSpec {
    /// Returns `true` when `value` lies within the declared bounds.
    ///
    /// NaN is never in range.
    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        self.minimum.map_or(true, |min| value >= min) && self.maximum.map_or(true, |max| value <= max)
    }
}

pub const DEFAULT_CONFIDENCE: &str = "default_confidence";
pub const DEFAULT_TIMEOUT: &str = "default_timeout";
pub const DEFAULT_INTERVAL: &str = "default_interval";

/// Fixed fields of the `vision` section.
pub const VISION_FIELDS: [FieldSpec; 3] = [
    FieldSpec {
        name: DEFAULT_CONFIDENCE,
        kind: FieldKind::Number,
        minimum: Some(0.0),
        maximum: Some(1.0),
    },
    FieldSpec {
        name: DEFAULT_TIMEOUT,
        kind: FieldKind::Integer,
        minimum: Some(0.0),
        maximum: None,
    },
    FieldSpec {
        name: DEFAULT_INTERVAL,
        kind: FieldKind::Number,
        minimum: Some(0.0),
        maximum: None,
    },
];

/// Looks up a vision field descriptor by key.
pub fn vision_field(name: &str) -> Option<&'static FieldSpec> {
    VISION_FIELDS.iter().find(|f| f.name == name)
}
