//! Read-only configuration access for task components.
//!
//! Components never hold the store itself.  They depend on [`ConfigReader`],
//! which offers exactly two things: look a value up, and be told when the
//! document changes.  Neither allows mutation.
//!
//! Two consumers live here because the bot runtime needs them directly:
//!
//! - [`VisionDefaults`] keeps the template-matching defaults current across
//!   hot reloads.
//! - [`TaskPlan`] turns `tasks` and `task_runner` into an ordered run list.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use doro_core::domain::coerce;
use doro_core::domain::defaults::{
    DEFAULT_CONFIDENCE, DEFAULT_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS,
};
use doro_core::domain::fields;
use doro_core::{ConfigDocument, Section};
use serde_yaml::Value;
use tracing::{info, warn};

use crate::application::config_store::ConfigStore;
use crate::application::subscribers::{Callback, SubscriberId};

/// The capability task components are given.
pub trait ConfigReader: Send + Sync {
    /// Looks up a value by section/key path.
    fn get(&self, path: &[&str]) -> Option<Value>;

    /// Registers a callback for every committed change.
    fn subscribe(&self, name: &str, callback: Callback<ConfigDocument>) -> SubscriberId;

    /// Removes a callback registered with [`subscribe`](Self::subscribe).
    fn unsubscribe(&self, id: SubscriberId) -> bool;
}

impl ConfigReader for ConfigStore {
    fn get(&self, path: &[&str]) -> Option<Value> {
        ConfigStore::get(self, path)
    }

    fn subscribe(&self, name: &str, callback: Callback<ConfigDocument>) -> SubscriberId {
        self.subscribers().add(name, callback)
    }

    fn unsubscribe(&self, id: SubscriberId) -> bool {
        ConfigStore::unsubscribe(self, id)
    }
}

// ── VisionDefaults ────────────────────────────────────────────────────────────

/// Template-matching defaults as the vision component consumes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionSnapshot {
    pub confidence: f64,
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for VisionSnapshot {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS.unsigned_abs()),
            interval: Duration::from_secs_f64(DEFAULT_INTERVAL_SECS),
        }
    }
}

impl VisionSnapshot {
    /// Reads the `vision` section.  Out-of-range values fall back to the
    /// built-in default for that field.
    fn from_document(doc: &ConfigDocument) -> Self {
        Self::from_fields(
            Some(doc.vision.default_confidence),
            Some(doc.vision.default_timeout),
            Some(doc.vision.default_interval),
        )
    }

    fn from_reader(reader: &dyn ConfigReader) -> Self {
        let field = |name: &str| reader.get(&[Section::Vision.name(), name]);
        Self::from_fields(
            field(fields::DEFAULT_CONFIDENCE).as_ref().and_then(coerce::as_float),
            field(fields::DEFAULT_TIMEOUT).as_ref().and_then(coerce::as_integer),
            field(fields::DEFAULT_INTERVAL).as_ref().and_then(coerce::as_float),
        )
    }

    fn from_fields(confidence: Option<f64>, timeout: Option<i64>, interval: Option<f64>) -> Self {
        let fallback = Self::default();
        Self {
            confidence: confidence
                .filter(|c| (0.0..=1.0).contains(c))
                .unwrap_or(fallback.confidence),
            timeout: timeout
                .and_then(|t| u64::try_from(t).ok())
                .map_or(fallback.timeout, Duration::from_secs),
            interval: interval
                .and_then(|i| Duration::try_from_secs_f64(i).ok())
                .unwrap_or(fallback.interval),
        }
    }
}

/// Vision defaults that follow the live configuration.
///
/// Reads the current values on attach, then refreshes on every notification.
pub struct VisionDefaults {
    current: Arc<RwLock<VisionSnapshot>>,
    subscription: SubscriberId,
}

impl VisionDefaults {
    /// Reads the current values from `reader` and subscribes for changes.
    pub fn attach(reader: &dyn ConfigReader) -> Self {
        let current = Arc::new(RwLock::new(VisionSnapshot::from_reader(reader)));
        let target = Arc::clone(&current);
        let subscription = reader.subscribe(
            "vision-defaults",
            Arc::new(move |doc: &ConfigDocument| -> anyhow::Result<()> {
                let next = VisionSnapshot::from_document(doc);
                let mut slot = target.write().unwrap_or_else(PoisonError::into_inner);
                if *slot != next {
                    info!(
                        "vision defaults updated: confidence {} -> {}",
                        slot.confidence, next.confidence
                    );
                    *slot = next;
                }
                Ok(())
            }),
        );
        Self {
            current,
            subscription,
        }
    }

    pub fn current(&self) -> VisionSnapshot {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn confidence(&self) -> f64 {
        self.current().confidence
    }

    /// The subscription to pass to [`ConfigReader::unsubscribe`] on teardown.
    pub fn subscription(&self) -> SubscriberId {
        self.subscription
    }
}

// ── TaskPlan ──────────────────────────────────────────────────────────────────

pub const TASK_RUNNER_SECTION: &str = "task_runner";
pub const BREAK_ON_FAILURE: &str = "break_on_failure";

/// Ordered list of enabled tasks and how to react to a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPlan {
    /// Enabled task names, in document order.
    pub tasks: Vec<String>,
    /// Stop at the first failed task instead of continuing.
    pub break_on_failure: bool,
}

/// Outcome of [`TaskPlan::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRunSummary {
    pub succeeded: Vec<String>,
    /// `(task, reason)` for every task that returned `false` or `Err`.
    pub failed: Vec<(String, String)>,
    /// Tasks never started because an earlier one failed.
    pub skipped: Vec<String>,
}

impl TaskPlan {
    /// Builds the plan from whatever `reader` currently holds.
    pub fn from_reader(reader: &dyn ConfigReader) -> Self {
        let tasks = match reader.get(&[Section::Tasks.name()]) {
            Some(Value::Mapping(map)) => map
                .iter()
                .filter(|(_, enabled)| coerce::as_bool(enabled).unwrap_or(false))
                .filter_map(|(name, _)| name.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        let break_on_failure = reader
            .get(&[TASK_RUNNER_SECTION, BREAK_ON_FAILURE])
            .as_ref()
            .and_then(coerce::as_bool)
            .unwrap_or(false);
        Self {
            tasks,
            break_on_failure,
        }
    }

    /// Runs every task in order through `run_task`.
    ///
    /// `run_task` returns `Ok(true)` on success, `Ok(false)` or `Err` on
    /// failure.  With `break_on_failure` set, the first failure stops the run.
    pub fn run<F>(&self, mut run_task: F) -> TaskRunSummary
    where
        F: FnMut(&str) -> anyhow::Result<bool>,
    {
        let mut summary = TaskRunSummary::default();
        let mut remaining = self.tasks.iter();

        for name in remaining.by_ref() {
            info!("running task {name}");
            let reason = match run_task(name) {
                Ok(true) => {
                    summary.succeeded.push(name.clone());
                    continue;
                }
                Ok(false) => "task reported failure".to_string(),
                Err(e) => format!("{e:#}"),
            };
            warn!("task {name} failed: {reason}");
            summary.failed.push((name.clone(), reason));
            if self.break_on_failure {
                break;
            }
        }

        summary.skipped.extend(remaining.cloned());
        if !summary.skipped.is_empty() {
            warn!(
                "stopped after failure; skipped {} task(s)",
                summary.skipped.len()
            );
        }
        summary
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
