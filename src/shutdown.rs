//! Cooperative cancellation for the sync engine.
//!
//! A single [`ShutdownCoordinator`] is shared by the rate limiter, the HTTP
//! retry loop, the reconciler and the scheduler. Blocking steps race their
//! wait against [`ShutdownCoordinator::wait_for_shutdown`]; the reconciler
//! polls [`ShutdownCoordinator::is_shutdown_requested`] between records.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Shared handle to a shutdown coordinator.
pub type SharedShutdown = Arc<ShutdownCoordinator>;

/// Coordinates graceful shutdown across async tasks.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    is_shutdown: AtomicBool,
    notify: Notify,
}

/// Returned when a wait was cut short by a shutdown request
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled by shutdown request")]
pub struct Cancelled;

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self {
            is_shutdown: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Create a new shared coordinator wrapped in [`Arc`].
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::new())
    }

    /// Request shutdown. Notifies all registered waiters exactly once.
    pub fn request_shutdown(&self) {
        if !self.is_shutdown.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested. Returns immediately if already set.
    pub async fn wait_for_shutdown(&self) {
        // Register before checking the flag so a request between the two
        // cannot be missed.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_shutdown_requested() {
            return;
        }
        notified.await;
    }

    /// Sleep for `duration` unless shutdown is requested first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        self.run_until_shutdown(tokio::time::sleep(duration)).await
    }

    /// Drive `fut` to completion unless shutdown is requested first.
    pub async fn run_until_shutdown<F>(&self, fut: F) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        if self.is_shutdown_requested() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.wait_for_shutdown() => Err(Cancelled),
            out = fut => Ok(out),
        }
    }
}
