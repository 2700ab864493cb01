//! Synchronization core
//!
//! - [`rate_limit`] - per-endpoint request spacing
//! - [`cache`] - TTL-bounded memoization of query results
//! - [`reconcile`] - create-or-update by natural key
//! - [`engine`] - one sync cycle, end to end
//! - [`scheduler`] - runs the cycle on an interval

use async_trait::async_trait;

pub mod cache;
pub mod engine;
pub mod rate_limit;
pub mod reconcile;
pub mod scheduler;

pub use cache::ResponseCache;
pub use engine::{SyncEngine, SyncOutcome, SyncSummary};
pub use rate_limit::{RateLimitError, RateLimiter};
pub use reconcile::{ReconcileReport, Reconciler};
pub use scheduler::{IntervalScheduler, SchedulerError};

use crate::fetcher::FetcherError;
use crate::store::StoreError;

/// Errors from setting up or driving synchronization
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Building or calling the API client failed
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// Opening or writing the repository failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Scheduler lifecycle misuse
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Work run by [`IntervalScheduler`] on every tick
#[async_trait]
pub trait SyncJob: Send + Sync {
    /// Run one cycle to completion
    async fn run(&self) -> SyncOutcome;
}
