//! Subscriber registry with per-callback failure isolation.
//!
//! A callback fails either by returning `Err` or by panicking.  Both are
//! caught at the notification boundary, logged with the subscriber's id and
//! name, and reported back to the notifier; the remaining callbacks still run.
//!
//! The list is copied before any callback runs, so a callback may subscribe or
//! unsubscribe (itself included) without deadlocking.  Such changes apply from
//! the next notification on.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};
use uuid::Uuid;

/// A registered callback receiving `&T` on every notification.
pub type Callback<T> = Arc<dyn Fn(&T) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A callback that failed during one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberFailure {
    pub id: SubscriberId,
    pub name: String,
    pub message: String,
    /// `true` if the callback panicked rather than returning `Err`.
    pub panicked: bool,
}

impl fmt::Display for SubscriberFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let how = if self.panicked { "panicked" } else { "failed" };
        write!(f, "subscriber `{}` ({}) {how}: {}", self.name, self.id, self.message)
    }
}

struct Entry<T: ?Sized> {
    id: SubscriberId,
    name: Arc<str>,
    callback: Callback<T>,
}

impl<T: ?Sized> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Ordered set of callbacks.  Registration order is invocation order.
pub struct SubscriberList<T: ?Sized> {
    entries: Mutex<Vec<Entry<T>>>,
}

impl<T: ?Sized> Default for SubscriberList<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for SubscriberList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberList")
            .field("len", &self.len())
            .finish()
    }
}

impl<T: ?Sized> SubscriberList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` under a human-readable `name` used in logs.
    pub fn add(&self, name: impl Into<String>, callback: Callback<T>) -> SubscriberId {
        let id = SubscriberId::new();
        let name: String = name.into();
        debug!("subscriber `{name}` registered as {id}");
        self.lock().push(Entry {
            id,
            name: name.into(),
            callback,
        });
        id
    }

    /// Removes a callback.  Returns `false` if `id` was not registered.
    pub fn remove(&self, id: SubscriberId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        before != entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Invokes every callback with `value` and returns the ones that failed.
    pub fn notify(&self, value: &T) -> Vec<SubscriberFailure> {
        let entries: Vec<Entry<T>> = self.lock().clone();

        entries
            .iter()
            .filter_map(|entry| {
                let (message, panicked) = invoke_isolated(|| (entry.callback)(value)).err()?;
                let failure = SubscriberFailure {
                    id: entry.id,
                    name: entry.name.to_string(),
                    message,
                    panicked,
                };
                warn!("{failure}");
                Some(failure)
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs `f`, turning both `Err` and a panic into `Err((message, panicked))`.
pub fn invoke_isolated<F>(f: F) -> Result<(), (String, bool)>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err((format!("{e:#}"), false)),
        Err(payload) => Err((panic_message(payload.as_ref()), true)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
