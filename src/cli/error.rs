//! CLI error types and conversions

use crate::fetcher::FetcherError;
use crate::store::StoreError;
use crate::sync::{SchedulerError, SyncError};

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Store error
    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    /// Sync setup error
    #[error("{0}")]
    SyncError(#[from] SyncError),

    /// Scheduler error
    #[error("scheduler error: {0}")]
    SchedulerError(#[from] SchedulerError),

    /// No credentials were given
    #[error("FRC API credentials not configured (set FRC_API_USERNAME and FRC_API_AUTH_KEY, or FRC_API_TOKEN)")]
    NotConfigured,

    /// The sync cycle did not complete
    #[error("sync failed: {0}")]
    SyncFailed(String),

    /// The connection probe failed
    #[error("connection validation failed: {0}")]
    ValidationFailed(String),

    /// Writing output failed
    #[error("output error: {0}")]
    OutputError(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
