//! In-flight request accounting behind the global loading indicator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::trace;

struct LoadingState {
    active: AtomicUsize,
    signal: watch::Sender<bool>,
}

impl LoadingState {
    /// Recompute the signal from the counter. Runs under the channel lock
    /// so the last writer always publishes the latest count.
    fn publish(&self) {
        self.signal.send_if_modified(|loading| {
            let now = self.active.load(Ordering::SeqCst) > 0;
            let changed = *loading != now;
            *loading = now;
            changed
        });
    }
}

/// Counts requests between dispatch and settlement. Clones share the count.
#[derive(Clone)]
pub struct LoadingTracker {
    state: Arc<LoadingState>,
}

impl Default for LoadingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingTracker {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            state: Arc::new(LoadingState {
                active: AtomicUsize::new(0),
                signal,
            }),
        }
    }

    /// Mark a request as started. The slot is released when the guard drops,
    /// whether the request succeeded, failed or was abandoned.
    pub fn begin(&self) -> LoadingGuard {
        let active = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(active, "Request started");
        self.state.publish();
        LoadingGuard {
            state: Arc::clone(&self.state),
        }
    }

    pub fn is_loading(&self) -> bool {
        *self.state.signal.borrow()
    }

    pub fn active_requests(&self) -> usize {
        self.state.active.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.signal.subscribe()
    }
}

#[must_use = "the request counts as finished as soon as the guard is dropped"]
pub struct LoadingGuard {
    state: Arc<LoadingState>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let active = self.state.active.fetch_sub(1, Ordering::SeqCst) - 1;
        trace!(active, "Request settled");
        self.state.publish();
    }
}
