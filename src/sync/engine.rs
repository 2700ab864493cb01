//! Sync orchestrator
//!
//! One cycle pulls the default team's events (when a team is configured),
//! reconciles them, then pulls and reconciles every event of the season.
//! Cycles never overlap: a second caller while one is running gets
//! [`SyncOutcome::AlreadyRunning`] immediately. Failures inside a cycle are
//! isolated per query and a panic is caught and logged, so a cycle can
//! never take the scheduler down with it.

use async_trait::async_trait;
use futures_util::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::reconcile::{ReconcileReport, Reconciler};
use super::{SyncError, SyncJob};
use crate::clock::{SharedClock, SystemClock};
use crate::config::SyncConfig;
use crate::fetcher::{EventQuery, EventSource, FetcherError, FetcherResult, FrcApiClient};
use crate::metrics;
use crate::shutdown::{SharedShutdown, ShutdownCoordinator};
use crate::store::SharedRepository;
use crate::{Event, Ranking, Team};

/// What one cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Season synchronized
    pub season_year: i32,
    /// Events returned by the API across all queries
    pub fetched: usize,
    /// Queries that ended in an unexpected error
    pub failed_queries: usize,
    /// Reconciliation counts across all queries
    pub report: ReconcileReport,
    /// Wall-clock duration of the cycle
    pub duration: Duration,
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "season {}: fetched {} events, {} in {:.1}s",
            self.season_year,
            self.fetched,
            self.report,
            self.duration.as_secs_f64()
        )
    }
}

/// Result of [`SyncEngine::sync_all`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Sync is switched off
    Disabled,
    /// No API credentials
    NotConfigured,
    /// Another cycle holds the lock
    AlreadyRunning,
    /// Shutdown ended the cycle early
    Cancelled(SyncSummary),
    /// The cycle ran to the end
    Completed(SyncSummary),
    /// The cycle panicked
    Failed(String),
}

impl SyncOutcome {
    /// Metric and log label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::NotConfigured => "not_configured",
            Self::AlreadyRunning => "already_running",
            Self::Cancelled(_) => "cancelled",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
        }
    }

    /// Summary of a cycle that actually ran
    pub fn summary(&self) -> Option<&SyncSummary> {
        match self {
            Self::Cancelled(summary) | Self::Completed(summary) => Some(summary),
            _ => None,
        }
    }

    /// Whether the cycle ran to the end
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("sync disabled"),
            Self::NotConfigured => f.write_str("FRC API credentials not configured"),
            Self::AlreadyRunning => f.write_str("a sync is already in progress"),
            Self::Cancelled(summary) => write!(f, "cancelled after {summary}"),
            Self::Completed(summary) => write!(f, "completed {summary}"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Orchestrates fetch and reconcile cycles
pub struct SyncEngine {
    config: SyncConfig,
    source: Arc<dyn EventSource>,
    reconciler: Reconciler,
    shutdown: SharedShutdown,
    cycle_lock: Mutex<()>,
}

impl SyncEngine {
    /// Engine over explicit collaborators
    pub fn new(
        config: SyncConfig,
        source: Arc<dyn EventSource>,
        repository: SharedRepository,
        clock: SharedClock,
        shutdown: SharedShutdown,
    ) -> Self {
        Self {
            config,
            source,
            reconciler: Reconciler::new(repository, clock, shutdown.clone()),
            shutdown,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Engine talking to the FRC Events API, with the system clock and its
    /// own shutdown coordinator
    pub fn from_config(config: SyncConfig, repository: SharedRepository) -> Result<Self, SyncError> {
        Self::from_config_with(
            config,
            repository,
            Arc::new(SystemClock),
            ShutdownCoordinator::shared(),
        )
    }

    /// Engine talking to the FRC Events API with the given clock and
    /// shutdown coordinator
    pub fn from_config_with(
        config: SyncConfig,
        repository: SharedRepository,
        clock: SharedClock,
        shutdown: SharedShutdown,
    ) -> Result<Self, SyncError> {
        let source = Arc::new(FrcApiClient::new(&config, shutdown.clone())?);
        Ok(Self::new(config, source, repository, clock, shutdown))
    }

    /// Active configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Shutdown coordinator shared with the limiter, reconciler and scheduler
    pub fn shutdown(&self) -> &SharedShutdown {
        &self.shutdown
    }

    /// Whether a cycle currently holds the lock
    pub fn is_syncing(&self) -> bool {
        self.cycle_lock.try_lock().is_err()
    }

    /// Run one sync cycle.
    ///
    /// Never returns an error: disabled and unconfigured states are no-ops,
    /// fetch failures are absorbed per query, and panics are caught.
    pub async fn sync_all(&self) -> SyncOutcome {
        if !self.config.sync_enabled {
            debug!("FRC sync disabled, skipping cycle");
            return SyncOutcome::Disabled;
        }
        if !self.source.is_configured() {
            info!("FRC API not configured, skipping sync");
            return SyncOutcome::NotConfigured;
        }
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            info!("FRC sync already in progress, skipping this trigger");
            return SyncOutcome::AlreadyRunning;
        };

        let season = self.config.season_year;
        info!(season, default_team = self.config.default_team, "Starting FRC data sync");
        let started = Instant::now();
        let mut summary = SyncSummary {
            season_year: season,
            ..SyncSummary::default()
        };

        let result = AssertUnwindSafe(self.run_cycle(&mut summary))
            .catch_unwind()
            .await;
        summary.duration = started.elapsed();

        let outcome = match result {
            Ok(Ok(())) if !summary.report.interrupted => SyncOutcome::Completed(summary),
            Ok(_) => SyncOutcome::Cancelled(summary),
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(season, reason = %reason, "FRC sync cycle panicked");
                SyncOutcome::Failed(reason)
            }
        };

        metrics::record_sync_cycle(outcome.label(), started.elapsed());
        match outcome.summary() {
            Some(s) => info!(
                outcome = outcome.label(),
                season,
                fetched = s.fetched,
                created = s.report.created,
                updated = s.report.updated,
                failed = s.report.failed,
                failed_queries = s.failed_queries,
                duration_ms = s.duration.as_millis() as u64,
                "FRC data sync finished"
            ),
            None => warn!(outcome = outcome.label(), season, "FRC data sync did not finish"),
        }
        outcome
    }

    async fn run_cycle(&self, summary: &mut SyncSummary) -> Result<(), FetcherError> {
        let season = self.config.season_year;
        if self.config.has_default_team() {
            let query = EventQuery::Team {
                team: self.config.default_team,
                season,
            };
            self.sync_query(query, summary).await?;
            if summary.report.interrupted {
                return Ok(());
            }
        }
        self.sync_query(EventQuery::Season(season), summary).await
    }

    async fn sync_query(&self, query: EventQuery, summary: &mut SyncSummary) -> Result<(), FetcherError> {
        let fetched = match query {
            EventQuery::Season(season) => self.source.fetch_events(season).await,
            EventQuery::Team { team, season } => self.source.fetch_team_events(team, season).await,
        };

        let events: Vec<Event> = match fetched {
            Ok(events) => events,
            Err(FetcherError::Cancelled) => {
                info!(%query, "FRC sync cancelled while fetching");
                return Err(FetcherError::Cancelled);
            }
            Err(e) => {
                error!(%query, error = %e, "Unexpected error fetching events, continuing");
                summary.failed_queries += 1;
                return Ok(());
            }
        };

        summary.fetched += events.len();
        if events.is_empty() {
            debug!(%query, "No events to reconcile");
            return Ok(());
        }

        let report = self.reconciler.reconcile(events).await;
        info!(
            %query,
            created = report.created,
            updated = report.updated,
            failed = report.failed,
            "Reconciled events"
        );
        summary.report.merge(&report);
        Ok(())
    }

    /// One event in the configured season, fetched without touching the
    /// repository
    pub async fn event(&self, event_code: &str) -> FetcherResult<Option<Event>> {
        self.source.fetch_event(event_code, self.config.season_year).await
    }

    /// Rankings for `event_code` in the configured season
    pub async fn event_rankings(&self, event_code: &str) -> FetcherResult<Vec<Ranking>> {
        self.source
            .fetch_rankings(event_code, self.config.season_year)
            .await
    }

    /// The configured default team, `None` when unset or unavailable
    pub async fn default_team(&self) -> FetcherResult<Option<Team>> {
        if !self.config.has_default_team() {
            return Ok(None);
        }
        self.source.fetch_team(self.config.default_team).await
    }

    /// A team by number
    pub async fn team(&self, team_number: u32) -> FetcherResult<Option<Team>> {
        self.source.fetch_team(team_number).await
    }

    /// Events for the configured season, or one team's events, without
    /// touching the repository
    pub async fn preview_events(&self, team_number: Option<u32>) -> FetcherResult<Vec<Event>> {
        let season = self.config.season_year;
        match team_number {
            Some(team) => self.source.fetch_team_events(team, season).await,
            None => self.source.fetch_events(season).await,
        }
    }

    /// Probe the API with the configured credentials
    pub async fn validate_connection(&self) -> bool {
        self.source.validate_connection().await
    }
}

#[async_trait]
impl SyncJob for SyncEngine {
    async fn run(&self) -> SyncOutcome {
        self.sync_all().await
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
