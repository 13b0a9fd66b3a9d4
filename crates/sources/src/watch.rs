//! Directory watch subscription
//!
//! Wraps a `notify` watcher on the log directory. Every filesystem event
//! wakes the tailer through a `tokio::sync::Notify`; removal events also flip
//! the removal flag of tracked data files.
//!
//! `Notify::notify_one` stores a permit when nobody is waiting, so an event
//! that fires between "no data" and the start of `wait` is not lost.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::Result;

/// Outcome of waiting for directory activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A filesystem event arrived
    Signalled,
    /// The timeout elapsed without events
    TimedOut,
    /// The cancellation token fired
    Cancelled,
}

type GoneFlags = Arc<Mutex<HashMap<PathBuf, Arc<AtomicBool>>>>;

/// Live subscription to changes in one directory
pub struct DirWatch {
    _watcher: RecommendedWatcher,
    wake: Arc<Notify>,
    gone: GoneFlags,
}

impl DirWatch {
    /// Start watching `dir` (non-recursive)
    pub fn new(dir: &Path) -> Result<Self> {
        let wake = Arc::new(Notify::new());
        let gone: GoneFlags = Arc::new(Mutex::new(HashMap::new()));

        let handler_wake = Arc::clone(&wake);
        let handler_gone = Arc::clone(&gone);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if is_removal(&event.kind) {
                        let flags = handler_gone.lock();
                        for path in &event.paths {
                            if let Some(flag) = flags.get(path) {
                                flag.store(true, Ordering::Release);
                            }
                        }
                    }
                }
                Err(e) => warn!(error = %e, "filesystem watch error"),
            }
            handler_wake.notify_one();
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        debug!(dir = %dir.display(), "watching log directory");

        Ok(Self {
            _watcher: watcher,
            wake,
            gone,
        })
    }

    /// Removal flag for `path`, reset to false
    pub fn track(&self, path: &Path) -> Arc<AtomicBool> {
        let mut flags = self.gone.lock();
        let flag = flags
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(AtomicBool::new(false)));
        flag.store(false, Ordering::Release);
        Arc::clone(flag)
    }

    /// Stop tracking removal of `path`
    pub fn untrack(&self, path: &Path) {
        self.gone.lock().remove(path);
    }

    /// Wait for an event, the timeout, or cancellation, whichever comes first
    pub async fn wait(&self, timeout: Duration, cancel: &CancellationToken) -> WaitOutcome {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => WaitOutcome::Cancelled,
            _ = self.wake.notified() => WaitOutcome::Signalled,
            _ = tokio::time::sleep(timeout) => WaitOutcome::TimedOut,
        }
    }
}

fn is_removal(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Remove(_)
            | EventKind::Modify(ModifyKind::Name(RenameMode::From | RenameMode::Both))
    )
}

/// Wait without a watch: only the timeout or cancellation can end it
pub async fn wait_timeout(timeout: Duration, cancel: &CancellationToken) -> WaitOutcome {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => WaitOutcome::Cancelled,
        _ = tokio::time::sleep(timeout) => WaitOutcome::TimedOut,
    }
}
