//! Authenticated HTTP transport for the FRC Events API
//!
//! One `reqwest::Client` per adapter, built with the fixed JSON headers,
//! the `Authorization` header and explicit timeouts so no request can hang
//! a sync cycle. Transient failures (429, 5xx, transport) are retried with
//! exponential backoff. Every attempt, retries included, first claims a
//! slot from the [`RateLimiter`], so a retry never lands closer than the
//! minimum interval to the previous call on the same endpoint. Sends,
//! limiter waits and backoff sleeps all give way to shutdown.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::failure::{calculate_backoff, classify_status, describe_transport_error, parse_retry_after};
use super::frc_endpoints::Endpoint;
use super::{FetcherError, FetcherResult};
use crate::config::SyncConfig;
use crate::metrics::HttpRequestMetrics;
use crate::shutdown::SharedShutdown;
use crate::sync::rate_limit::RateLimiter;

/// Time allowed to establish a TCP connection
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Longest response body excerpt kept in error messages
const MAX_ERROR_BODY_CHARS: usize = 200;

/// HTTP client for the FRC Events API
#[derive(Debug, Clone)]
pub struct FrcHttpClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    rate_limiter: Arc<RateLimiter>,
    shutdown: SharedShutdown,
}

impl FrcHttpClient {
    /// Build a client from `config`.
    ///
    /// The `Authorization` header is only attached when credentials are
    /// configured, and is marked sensitive so it never shows up in debug
    /// output.
    pub fn new(
        config: &SyncConfig,
        shutdown: SharedShutdown,
        rate_limiter: Arc<RateLimiter>,
    ) -> FetcherResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(credentials) = config.credentials() {
            let mut value = HeaderValue::from_str(&credentials.authorization_header())
                .map_err(|e| FetcherError::InvalidRequest(format!("invalid credentials: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| FetcherError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.normalized_base_url().to_string(),
            max_retries: config.max_retries,
            rate_limiter,
            shutdown,
        })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The limiter every attempt waits on
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// GET `endpoint` and deserialize the JSON body.
    ///
    /// Each attempt waits for a slot on `endpoint.key`; metrics are labelled
    /// with `endpoint.family`.
    ///
    /// # Errors
    ///
    /// - [`FetcherError::NotFound`] on 404, never retried
    /// - [`FetcherError::HttpError`] on other 4xx, or 5xx after retries
    /// - [`FetcherError::RateLimited`] on 429 after retries
    /// - [`FetcherError::NetworkError`] on transport failure after retries
    /// - [`FetcherError::ParseError`] when the body does not decode as `T`
    /// - [`FetcherError::Cancelled`] when shutdown interrupts a limiter wait, send or backoff
    pub async fn get<T>(&self, endpoint: &Endpoint) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint.path);
        let key = endpoint.key.as_str();
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            self.rate_limiter.acquire(key).await?;

            let metrics = HttpRequestMetrics::start(endpoint.family);
            debug!(
                correlation_id = metrics.correlation_id(),
                endpoint = key,
                %url,
                attempt = attempt + 1,
                "Sending FRC API request"
            );

            let response = match self
                .shutdown
                .run_until_shutdown(self.client.get(&url).send())
                .await?
            {
                Ok(response) => response,
                Err(e) => {
                    metrics.record_network_error();
                    let message = describe_transport_error(&e);
                    warn!(
                        endpoint = key,
                        attempt = attempt + 1,
                        max_attempts = self.max_retries + 1,
                        error = %message,
                        "Network error calling FRC API"
                    );
                    last_error = Some(FetcherError::NetworkError(message));
                    if attempt < self.max_retries {
                        self.backoff(attempt, None).await?;
                        continue;
                    }
                    break;
                }
            };

            let status = response.status();
            metrics.record_status(status.as_u16());

            if status.is_success() {
                let body = self
                    .shutdown
                    .run_until_shutdown(response.bytes())
                    .await?
                    .map_err(|e| FetcherError::NetworkError(describe_transport_error(&e)))?;
                return serde_json::from_slice::<T>(&body).map_err(|e| {
                    FetcherError::ParseError(format!("failed to decode {key} response: {e}"))
                });
            }

            let kind = classify_status(status);

            if status.as_u16() == 404 {
                return Err(FetcherError::NotFound(endpoint.path.clone()));
            }

            if status.as_u16() == 429 {
                let retry_after = parse_retry_after(response.headers());
                warn!(
                    endpoint = key,
                    attempt = attempt + 1,
                    max_attempts = self.max_retries + 1,
                    retry_after_secs = retry_after.map(|d| d.as_secs()),
                    "FRC API rate limit exceeded (429)"
                );
                last_error = Some(FetcherError::RateLimited);
                if attempt < self.max_retries {
                    self.backoff(attempt, retry_after).await?;
                    continue;
                }
                break;
            }

            let message = self.error_body(response).await?;
            if kind.is_retryable() {
                warn!(
                    endpoint = key,
                    status = status.as_u16(),
                    attempt = attempt + 1,
                    max_attempts = self.max_retries + 1,
                    "FRC API server error"
                );
                last_error = Some(FetcherError::HttpError {
                    status: status.as_u16(),
                    message,
                });
                if attempt < self.max_retries {
                    self.backoff(attempt, None).await?;
                    continue;
                }
                break;
            }

            return Err(FetcherError::HttpError {
                status: status.as_u16(),
                message,
            });
        }

        Err(last_error
            .unwrap_or_else(|| FetcherError::NetworkError("all retries exhausted".to_string())))
    }

    async fn backoff(&self, attempt: u32, hint: Option<Duration>) -> FetcherResult<()> {
        let base = calculate_backoff(attempt);
        let delay = hint.map_or(base, |h| h.max(base));
        debug!(delay_ms = delay.as_millis() as u64, "Retrying FRC API request after backoff");
        self.shutdown.sleep(delay).await?;
        Ok(())
    }

    async fn error_body(&self, response: reqwest::Response) -> FetcherResult<String> {
        let status = response.status();
        let text = self
            .shutdown
            .run_until_shutdown(response.text())
            .await?
            .unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Ok(status.canonical_reason().unwrap_or("no reason").to_string());
        }
        Ok(text.chars().take(MAX_ERROR_BODY_CHARS).collect())
    }
}
