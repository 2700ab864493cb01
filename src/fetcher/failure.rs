//! Failure classification for absorbed fetch errors.
//!
//! Every failure the adapter turns into an empty result is tagged with a
//! [`FailureKind`] so log lines and metrics can tell "no data" apart from
//! "fetch failed", and so the retry loop knows what is worth retrying.

use super::FetcherError;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;

/// Initial retry backoff
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Backoff cap
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Exponential backoff: 1s, 2s, 4s, ... capped at 30s
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(retry_count));
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}

/// `Retry-After` in seconds, if the server sent a usable one
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs).min(Duration::from_millis(MAX_BACKOFF_MS)))
}

/// Log severity for an absorbed failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected or caller-side problem
    Warning,
    /// Remote or transport problem
    Error,
}

/// Classification of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 404
    NotFound,
    /// 401/403
    AuthFailed(u16),
    /// Other 4xx except 429
    ClientError(u16),
    /// 429
    RateLimited,
    /// 5xx
    ServerError(u16),
    /// Connection refused, DNS, timeout
    Transport,
    /// Undecodable body
    Parse,
    /// Request could not be built
    InvalidRequest,
}

impl FailureKind {
    /// Classify an error. `None` for cancellation and missing configuration,
    /// which are not fetch failures.
    pub fn of(err: &FetcherError) -> Option<Self> {
        match err {
            FetcherError::NotFound(_) => Some(Self::NotFound),
            FetcherError::HttpError { status, .. } => Some(Self::from_status(*status)),
            FetcherError::RateLimited => Some(Self::RateLimited),
            FetcherError::NetworkError(_) => Some(Self::Transport),
            FetcherError::ParseError(_) => Some(Self::Parse),
            FetcherError::InvalidRequest(_) => Some(Self::InvalidRequest),
            FetcherError::NotConfigured | FetcherError::Cancelled => None,
        }
    }

    /// Classify a non-success status code
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            401 | 403 => Self::AuthFailed(status),
            429 => Self::RateLimited,
            s if s >= 500 => Self::ServerError(s),
            s => Self::ClientError(s),
        }
    }

    /// Stable label used as the `failure` log field and metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AuthFailed(_) => "auth_failed",
            Self::ClientError(_) => "client_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError(_) => "server_error",
            Self::Transport => "transport",
            Self::Parse => "parse",
            Self::InvalidRequest => "invalid_request",
        }
    }

    /// HTTP status behind the failure, if there was a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound => Some(404),
            Self::RateLimited => Some(429),
            Self::AuthFailed(s) | Self::ClientError(s) | Self::ServerError(s) => Some(*s),
            Self::Transport | Self::Parse | Self::InvalidRequest => None,
        }
    }

    /// Not-found and caller-side errors are warnings; remote and transport
    /// failures are errors.
    pub fn severity(&self) -> Severity {
        match self {
            Self::NotFound
            | Self::AuthFailed(_)
            | Self::ClientError(_)
            | Self::RateLimited
            | Self::InvalidRequest => Severity::Warning,
            Self::ServerError(_) | Self::Transport | Self::Parse => Severity::Error,
        }
    }

    /// Whether another attempt might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::ServerError(_) | Self::Transport)
    }

    /// Operator hint logged with auth failures and exhausted retries
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NotFound => "Check the season, event code or team number",
            Self::AuthFailed(_) => "Verify FRC_API_USERNAME and FRC_API_AUTH_KEY",
            Self::ClientError(_) | Self::InvalidRequest => "Review the request parameters",
            Self::RateLimited => "Lower FRC_API_REQUESTS_PER_MINUTE",
            Self::ServerError(_) => "The FRC API may be degraded, the next sync will retry",
            Self::Transport => "Check network connectivity and DNS resolution",
            Self::Parse => "The API response format may have changed",
        }
    }
}

/// Describe a reqwest transport error for logs
pub fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timeout: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

/// Classify a status code returned by reqwest
pub fn classify_status(status: StatusCode) -> FailureKind {
    FailureKind::from_status(status.as_u16())
}
