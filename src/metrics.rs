//! Observability metrics for the sync engine
//!
//! Counters and histograms for API requests, absorbed fetch failures,
//! reconciliation outcomes and sync cycles.
//!
//! ## Architecture
//!
//! - Uses the `metrics` facade, so recording is a no-op until an exporter is installed
//! - [`init_metrics`] installs a Prometheus scrape endpoint (e.g. `:9090/metrics`)
//! - Initialization is idempotent

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

static METRICS_INITIALIZED: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(false));

static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Install the Prometheus exporter listening on `addr`.
///
/// Safe to call more than once; later calls do nothing.
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut initialized = METRICS_INITIALIZED.lock().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "frc_http_requests_total",
        Unit::Count,
        "HTTP requests sent to the FRC Events API"
    );
    describe_histogram!(
        "frc_http_request_duration_seconds",
        Unit::Seconds,
        "FRC Events API request duration"
    );
    describe_counter!(
        "frc_fetch_failures_total",
        Unit::Count,
        "Fetch failures absorbed into empty results"
    );
    describe_histogram!(
        "rate_limit_wait_seconds",
        Unit::Seconds,
        "Time spent waiting on the per-endpoint rate limiter"
    );
    describe_counter!(
        "events_reconciled_total",
        Unit::Count,
        "Events created, updated or failed during reconciliation"
    );
    describe_counter!("sync_cycles_total", Unit::Count, "Sync cycles by outcome");
    describe_histogram!(
        "sync_cycle_duration_seconds",
        Unit::Seconds,
        "Wall-clock duration of a sync cycle"
    );

    *initialized = true;
    info!(%addr, "Metrics system initialized");
    Ok(())
}

/// Whether [`init_metrics`] has succeeded
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.lock().await
}

/// New correlation ID for tying request log lines together
pub fn next_correlation_id() -> String {
    let n = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("frc-{n:08x}")
}

/// Timing and labels for one HTTP request.
///
/// The `endpoint` label is the endpoint family (`events`, `team_events`,
/// `event`, `rankings`, `team`), never a per-query key.
#[derive(Debug)]
pub struct HttpRequestMetrics {
    endpoint: &'static str,
    start_time: Instant,
    correlation_id: String,
}

impl HttpRequestMetrics {
    /// Start timing a request to the `endpoint` family
    pub fn start(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            start_time: Instant::now(),
            correlation_id: next_correlation_id(),
        }
    }

    /// Correlation ID for this request
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Record a response with `status_code`
    pub fn record_status(&self, status_code: u16) {
        self.record(status_code.to_string());
    }

    /// Record a request that never got a response
    pub fn record_network_error(&self) {
        self.record("network_error".to_string());
    }

    fn record(&self, status: String) {
        let duration = self.start_time.elapsed();
        counter!(
            "frc_http_requests_total",
            "endpoint" => self.endpoint,
            "status" => status.clone(),
        )
        .increment(1);
        histogram!(
            "frc_http_request_duration_seconds",
            "endpoint" => self.endpoint,
        )
        .record(duration.as_secs_f64());

        debug!(
            correlation_id = %self.correlation_id,
            endpoint = self.endpoint,
            status = %status,
            duration_ms = duration.as_millis() as u64,
            "FRC API request finished"
        );
    }
}

/// Count a failure absorbed into an empty result
pub fn record_fetch_failure(kind: &'static str) {
    counter!("frc_fetch_failures_total", "kind" => kind).increment(1);
}

/// Record time spent in the rate limiter, labelled by endpoint family
pub fn record_rate_limit_wait(family: &'static str, waited: Duration) {
    histogram!("rate_limit_wait_seconds", "endpoint" => family).record(waited.as_secs_f64());
}

/// Count one reconciliation outcome (`created`, `updated`, `failed`)
pub fn record_reconciled(outcome: &'static str, count: u64) {
    if count > 0 {
        counter!("events_reconciled_total", "outcome" => outcome).increment(count);
    }
}

/// Count a sync cycle and record its duration
pub fn record_sync_cycle(outcome: &'static str, duration: Duration) {
    counter!("sync_cycles_total", "outcome" => outcome).increment(1);
    histogram!("sync_cycle_duration_seconds").record(duration.as_secs_f64());
}
