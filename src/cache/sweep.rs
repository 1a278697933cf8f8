//! Background sweep of expired cache entries.
//!
//! The sweep runs on a Tokio interval and stops when its [`SweepHandle`]
//! signals cancellation over a `watch` channel. [`SweepHandle::shutdown`]
//! joins the task and is a no-op on every call after the first.

use crate::cache::memory::ValidationCache;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Handle to a running sweep task.
///
/// Dropping the handle signals cancellation without waiting for the task.
#[derive(Debug)]
pub struct SweepHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SweepHandle {
    /// Spawn a sweep of `cache` every `period` on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(cache: Arc<ValidationCache>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(sweep_loop(cache, period, shutdown_rx));

        Self {
            shutdown_tx,
            task: Mutex::new(Some(task)),
        }
    }

    /// Stop the sweep and wait for it to finish.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);

        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(action = "sweep_shutdown", error = %e, "Cache sweep task ended abnormally");
            }
        }
    }

    /// Whether the sweep task is still running.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn sweep_loop(
    cache: Arc<ValidationCache>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; nothing can have expired yet.
    ticker.tick().await;

    tracing::info!(
        action = "sweep_start",
        interval_secs = period.as_secs(),
        "Cache sweep task started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                // A dropped sender also means shutdown.
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let removed = cache.purge_expired();
                if removed > 0 {
                    tracing::debug!(action = "sweep", removed, "Swept expired validation cache entries");
                }
            }
        }
    }

    tracing::info!(action = "sweep_stop", "Cache sweep task stopped");
}
