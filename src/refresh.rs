//! Token refresh scheduling.
//!
//! At most one refresh timer is outstanding at any time; scheduling a new one
//! replaces (aborts) the previous one. The facade arms a timer on every
//! successful token acquisition for the moment the token expires.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Owns the single outstanding refresh timer.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot timer running `task` after `delay`, replacing any
    /// previously scheduled timer.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!("Scheduling token refresh in {:?}", delay);

        // The deadline is fixed here, not at the spawned task's first poll.
        let sleep = tokio::time::sleep(delay);
        let handle = tokio::spawn(async move {
            sleep.await;
            task.await;
        });

        let mut slot = self.handle.lock().expect("scheduler lock poisoned");
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Cancel the outstanding timer, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.handle.lock().expect("scheduler lock poisoned").take() {
            handle.abort();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Time remaining until `expires_on`, clamped to zero so an already-expired
/// token fires the refresh immediately instead of never.
pub fn delay_until(expires_on: DateTime<Utc>) -> Duration {
    (expires_on - Utc::now()).to_std().unwrap_or(Duration::ZERO)
}
