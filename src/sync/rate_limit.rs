//! Per-endpoint request spacing
//!
//! Each endpoint key remembers when it was last used. `acquire` waits until
//! at least `min_interval` has passed since that instant, then records the
//! new one. Keys are independent: waiting on `"events"` never delays
//! `"rankings-CASJ"`.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::SyncConfig;
use crate::fetcher::frc_endpoints::family_of;
use crate::fetcher::FetcherError;
use crate::metrics;
use crate::shutdown::SharedShutdown;

/// Rate limiter errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    /// Shutdown was requested while waiting for a slot
    #[error("rate limit wait cancelled by shutdown")]
    Cancelled,
}

impl From<RateLimitError> for FetcherError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::Cancelled => FetcherError::Cancelled,
        }
    }
}

type Slot = Arc<Mutex<Option<Instant>>>;

/// Minimum-interval rate limiter keyed by endpoint
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: DashMap<String, Slot>,
    shutdown: SharedShutdown,
}

impl RateLimiter {
    /// Limiter that spaces calls on one key by `min_interval`
    pub fn new(min_interval: Duration, shutdown: SharedShutdown) -> Self {
        Self {
            min_interval,
            last_request: DashMap::new(),
            shutdown,
        }
    }

    /// Limiter allowing `requests_per_minute` calls per key.
    /// Zero falls back to the default quota.
    pub fn per_minute(requests_per_minute: u32, shutdown: SharedShutdown) -> Self {
        let rpm = if requests_per_minute == 0 {
            crate::config::DEFAULT_REQUESTS_PER_MINUTE
        } else {
            requests_per_minute
        };
        Self::new(Duration::from_millis(60_000 / u64::from(rpm)), shutdown)
    }

    /// Limiter using the configured quota
    pub fn from_config(config: &SyncConfig, shutdown: SharedShutdown) -> Self {
        Self::new(config.min_request_interval(), shutdown)
    }

    /// Configured spacing between two calls on one key
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Number of keys seen so far
    pub fn tracked_endpoints(&self) -> usize {
        self.last_request.len()
    }

    /// Wait for a slot on `endpoint_key` and claim it.
    ///
    /// The first call on a key returns immediately. The per-key lock is held
    /// across the wait, so concurrent callers on one key queue up and are
    /// each spaced by `min_interval`.
    ///
    /// Returns how long the caller waited.
    pub async fn acquire(&self, endpoint_key: &str) -> Result<Duration, RateLimitError> {
        // Clone the slot out so no DashMap shard guard is held across an await.
        let slot = self
            .last_request
            .entry(endpoint_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        let mut last = self
            .shutdown
            .run_until_shutdown(slot.lock())
            .await
            .map_err(|_| RateLimitError::Cancelled)?;

        let started = Instant::now();
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > started {
                debug!(
                    endpoint = endpoint_key,
                    wait_ms = (ready_at - started).as_millis() as u64,
                    "Rate limiting FRC API request"
                );
                self.shutdown
                    .run_until_shutdown(tokio::time::sleep_until(ready_at))
                    .await
                    .map_err(|_| RateLimitError::Cancelled)?;
            }
        }

        let now = Instant::now();
        *last = Some(now);
        let waited = now.saturating_duration_since(started);
        metrics::record_rate_limit_wait(family_of(endpoint_key), waited);
        Ok(waited)
    }
}
