//! Modification-time polling watcher.
//!
//! # State machine
//!
//! ```text
//!            start()                 stop()
//! Stopped ───────────▶ Running ───────────▶ Stopped
//!    ▲ start() again: no-op │
//!    └──────────────────────┘
//! ```
//!
//! On `start` the current modification time (or "absent") becomes the
//! baseline.  Each tick re-reads it; when the file exists and its time differs
//! from the last one seen, the baseline moves and every callback runs on the
//! poll thread.  A file that has always been absent fires nothing.
//!
//! A failed stat (file briefly missing during an atomic replace, permission
//! race) is logged at debug level and retried on the next tick.  The baseline
//! is kept, so a file that disappears and comes back unchanged fires nothing.
//!
//! # Stopping
//!
//! `stop` signals the thread and waits up to the configured grace period.
//! When the thread finishes in time ([`StopOutcome::Joined`]) no callback can
//! fire afterwards.  If a callback is still running when the grace period
//! expires, `stop` returns [`StopOutcome::TimedOut`] and the thread exits on
//! its own once that callback returns.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::subscribers::{SubscriberId, SubscriberList};
use crate::domain::WatchOptions;

/// Error type for watcher operations.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The OS refused to create the poll thread.
    #[error("failed to spawn watcher thread: {0}")]
    Spawn(#[source] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Stopped,
    Running,
}

/// How a [`PollingWatcher::stop`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The poll thread exited within the grace period.
    Joined,
    /// The grace period expired first; the thread was detached.
    TimedOut,
    /// The watcher was not running.
    NotRunning,
}

struct PollThread {
    stop_tx: mpsc::Sender<()>,
    done_rx: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
}

/// Polls one file's modification time and notifies callbacks on change.
pub struct PollingWatcher {
    path: PathBuf,
    options: WatchOptions,
    callbacks: Arc<SubscriberList<Path>>,
    thread: Mutex<Option<PollThread>>,
}

impl std::fmt::Debug for PollingWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingWatcher")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("state", &self.state())
            .finish()
    }
}

impl PollingWatcher {
    /// Creates a stopped watcher for `path`.
    pub fn new(path: impl Into<PathBuf>, options: WatchOptions) -> Self {
        Self {
            path: path.into(),
            options,
            callbacks: Arc::new(SubscriberList::new()),
            thread: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registers `callback`, invoked with the watched path on every change.
    ///
    /// Callbacks added while running take effect from the next tick.
    pub fn subscribe<F>(&self, name: impl Into<String>, callback: F) -> SubscriberId
    where
        F: Fn(&Path) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks.add(name, Arc::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.callbacks.remove(id)
    }

    pub fn state(&self) -> WatcherState {
        match &*self.lock_thread() {
            Some(thread) if !thread.handle.is_finished() => WatcherState::Running,
            _ => WatcherState::Stopped,
        }
    }

    /// Captures the baseline and starts polling.  No-op if already running.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Spawn`] if the poll thread cannot be created.
    pub fn start(&self) -> Result<(), WatchError> {
        let mut slot = self.lock_thread();
        if slot.is_some() {
            debug!("watcher for {} already running", self.path.display());
            return Ok(());
        }

        let baseline = modified_time(&self.path).ok();
        let (stop_tx, stop_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let poll = PollLoop {
            path: self.path.clone(),
            interval: self.options.interval,
            last_seen: baseline,
            callbacks: Arc::clone(&self.callbacks),
        };

        let handle = std::thread::Builder::new()
            .name("doro-config-watch".to_string())
            .spawn(move || {
                poll.run(stop_rx);
                let _ = done_tx.send(());
            })
            .map_err(WatchError::Spawn)?;

        info!(
            "watching {} every {:?}",
            self.path.display(),
            self.options.interval
        );
        *slot = Some(PollThread {
            stop_tx,
            done_rx,
            handle,
        });
        Ok(())
    }

    /// Signals the poll thread and waits up to the grace period for it.
    pub fn stop(&self) -> StopOutcome {
        let Some(thread) = self.lock_thread().take() else {
            return StopOutcome::NotRunning;
        };

        // The thread may already have exited; a closed channel is fine.
        let _ = thread.stop_tx.send(());

        match thread.done_rx.recv_timeout(self.options.stop_grace) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = thread.handle.join();
                info!("stopped watching {}", self.path.display());
                StopOutcome::Joined
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "watcher for {} did not stop within {:?}; detaching",
                    self.path.display(),
                    self.options.stop_grace
                );
                StopOutcome::TimedOut
            }
        }
    }

    fn lock_thread(&self) -> MutexGuard<'_, Option<PollThread>> {
        self.thread.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PollingWatcher {
    fn drop(&mut self) {
        // Dropping the stop sender ends the loop at its next wait.
        self.lock_thread().take();
    }
}

/// State owned by the poll thread.
struct PollLoop {
    path: PathBuf,
    interval: Duration,
    last_seen: Option<SystemTime>,
    callbacks: Arc<SubscriberList<Path>>,
}

impl PollLoop {
    fn run(mut self, stop_rx: mpsc::Receiver<()>) {
        loop {
            match stop_rx.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => self.tick(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("poll loop for {} exited", self.path.display());
    }

    fn tick(&mut self) {
        let modified = match modified_time(&self.path) {
            Ok(modified) => modified,
            Err(e) => {
                debug!("stat of {} failed, retrying next tick: {e}", self.path.display());
                return;
            }
        };
        if self.last_seen == Some(modified) {
            return;
        }

        self.last_seen = Some(modified);
        debug!("{} changed; notifying {} callback(s)", self.path.display(), self.callbacks.len());
        self.callbacks.notify(&self.path);
    }
}

fn modified_time(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;
    use uuid::Uuid;

    fn fast() -> WatchOptions {
        WatchOptions {
            interval: Duration::from_millis(20),
            stop_grace: Duration::from_secs(2),
        }
    }

    fn temp_file() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("doro_watch_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir.join("config.yaml")
    }

    /// Replaces `path` in one rename so a tick never sees a half-written file.
    fn replace(path: &Path, contents: &str) {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, contents).expect("write temp");
        fs::rename(&tmp, path).expect("rename into place");
    }

    fn counter(watcher: &PollingWatcher) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&hits);
        watcher.subscribe("counter", move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        hits
    }

    fn wait_for(hits: &AtomicUsize, expected: usize, within: Duration) -> bool {
        let deadline = Instant::now() + within;
        while Instant::now() < deadline {
            if hits.load(Ordering::SeqCst) >= expected {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        hits.load(Ordering::SeqCst) >= expected
    }

    #[test]
    fn test_start_and_stop_transition_state() {
        // Arrange
        let watcher = PollingWatcher::new(temp_file(), fast());
        assert_eq!(watcher.state(), WatcherState::Stopped);

        // Act
        watcher.start().expect("start");
        let running = watcher.state();
        let outcome = watcher.stop();

        // Assert
        assert_eq!(running, WatcherState::Running);
        assert_eq!(outcome, StopOutcome::Joined);
        assert_eq!(watcher.state(), WatcherState::Stopped);
    }

    #[test]
    fn test_second_start_is_noop_and_stop_twice_is_not_running() {
        let watcher = PollingWatcher::new(temp_file(), fast());

        watcher.start().expect("start");
        watcher.start().expect("second start");

        assert_eq!(watcher.stop(), StopOutcome::Joined);
        assert_eq!(watcher.stop(), StopOutcome::NotRunning);
    }

    #[test]
    fn test_absent_file_never_fires() {
        let watcher = PollingWatcher::new(temp_file(), fast());
        let hits = counter(&watcher);

        watcher.start().expect("start");
        std::thread::sleep(Duration::from_millis(150));
        watcher.stop();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_file_appearing_fires_once() {
        let path = temp_file();
        let watcher = PollingWatcher::new(&path, fast());
        let hits = counter(&watcher);
        watcher.start().expect("start");

        replace(&path, "toggles: {}\n");

        assert!(wait_for(&hits, 1, Duration::from_secs(2)));
        std::thread::sleep(Duration::from_millis(100));
        watcher.stop();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unchanged_file_does_not_fire() {
        let path = temp_file();
        fs::write(&path, "toggles: {}\n").expect("write");
        let watcher = PollingWatcher::new(&path, fast());
        let hits = counter(&watcher);

        watcher.start().expect("start");
        std::thread::sleep(Duration::from_millis(150));
        watcher.stop();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_times_out_on_slow_callback() {
        let path = temp_file();
        let watcher = PollingWatcher::new(
            &path,
            WatchOptions {
                interval: Duration::from_millis(10),
                stop_grace: Duration::from_millis(50),
            },
        );
        let entered = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&entered);
        watcher.subscribe("slow", move |_| {
            flag.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(500));
            Ok(())
        });
        watcher.start().expect("start");
        replace(&path, "x: 1\n");
        assert!(wait_for(&entered, 1, Duration::from_secs(2)));

        let outcome = watcher.stop();

        assert_eq!(outcome, StopOutcome::TimedOut);
    }

    #[test]
    fn test_failing_callback_keeps_watcher_alive() {
        let path = temp_file();
        let watcher = PollingWatcher::new(&path, fast());
        watcher.subscribe("broken", |_| anyhow::bail!("reload exploded"));
        let hits = counter(&watcher);
        watcher.start().expect("start");

        replace(&path, "a: 1\n");
        assert!(wait_for(&hits, 1, Duration::from_secs(2)));

        assert_eq!(watcher.state(), WatcherState::Running);
        watcher.stop();
    }
}
