//! Remote FRC Events API access
//!
//! - [`frc_http`] - authenticated HTTP transport with timeouts and retry
//! - [`frc_endpoints`] - URL paths and rate-limit keys
//! - [`dto`] - JSON transport types
//! - [`mapper`] - DTO to domain mapping
//! - [`failure`] - failure classification for logs and metrics
//! - [`frc_api`] - the fail-soft adapter used by the sync engine

use crate::{Event, Ranking, Team};
use async_trait::async_trait;

pub mod dto;
pub mod failure;
pub mod frc_api;
pub mod frc_endpoints;
pub mod frc_http;
pub mod mapper;

pub use failure::FailureKind;
pub use frc_api::{EventQuery, FrcApiClient};

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// The API answered 404
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-success HTTP status other than 404 and 429
    #[error("HTTP error {status}: {message}")]
    HttpError {
        /// Response status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The API answered 429
    #[error("rate limit exceeded")]
    RateLimited,

    /// Connection, DNS or timeout failure
    #[error("network error: {0}")]
    NetworkError(String),

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    ParseError(String),

    /// Request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No credentials configured
    #[error("FRC API credentials not configured")]
    NotConfigured,

    /// Shutdown requested while waiting
    #[error("cancelled")]
    Cancelled,
}

impl From<crate::shutdown::Cancelled> for FetcherError {
    fn from(_: crate::shutdown::Cancelled) -> Self {
        FetcherError::Cancelled
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Source of competition data consumed by the sync engine.
///
/// Implementations absorb expected failures (not found, HTTP errors,
/// network errors, bad bodies) into empty results. The only error a caller
/// should see is [`FetcherError::Cancelled`], which means shutdown was
/// requested and the caller should stop.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Whether credentials are present. Unconfigured sources return empty
    /// results without touching the network.
    fn is_configured(&self) -> bool;

    /// All events for a season
    async fn fetch_events(&self, season_year: i32) -> FetcherResult<Vec<Event>>;

    /// Events a team is registered for in a season
    async fn fetch_team_events(&self, team_number: u32, season_year: i32) -> FetcherResult<Vec<Event>>;

    /// A single event, `None` when unknown or unreachable
    async fn fetch_event(&self, event_code: &str, season_year: i32) -> FetcherResult<Option<Event>>;

    /// Qualification rankings for one event
    async fn fetch_rankings(&self, event_code: &str, season_year: i32) -> FetcherResult<Vec<Ranking>>;

    /// A single team, `None` when unknown or unreachable
    async fn fetch_team(&self, team_number: u32) -> FetcherResult<Option<Team>>;

    /// Probe the API with the configured credentials
    async fn validate_connection(&self) -> bool;
}
