//! Fail-soft FRC Events API adapter
//!
//! Wraps [`FrcHttpClient`] (which waits on the per-endpoint [`RateLimiter`]
//! before every attempt) with the [`ResponseCache`] for event listings and
//! DTO mapping. Every expected
//! failure is logged, counted and turned into an empty result, so callers
//! only ever see [`FetcherError::Cancelled`].

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::dto::{EventResponse, RankingResponse, SingleEventResponse, TeamResponse};
use super::failure::{FailureKind, Severity};
use super::frc_endpoints::{self as endpoints, Endpoint};
use super::frc_http::FrcHttpClient;
use super::mapper::FrcMapper;
use super::{EventSource, FetcherError, FetcherResult};
use crate::config::SyncConfig;
use crate::metrics;
use crate::shutdown::SharedShutdown;
use crate::sync::cache::ResponseCache;
use crate::sync::rate_limit::RateLimiter;
use crate::{Event, Ranking, Team};

/// Cache key for event listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventQuery {
    /// All events in a season
    Season(i32),
    /// One team's events in a season
    Team {
        /// Team number
        team: u32,
        /// Season year
        season: i32,
    },
}

impl fmt::Display for EventQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Season(season) => write!(f, "season {season}"),
            Self::Team { team, season } => write!(f, "team {team} season {season}"),
        }
    }
}

/// FRC Events API client used by the sync engine
pub struct FrcApiClient {
    http: FrcHttpClient,
    cache: ResponseCache<EventQuery, Vec<Event>>,
    configured: bool,
    probe_season: i32,
}

impl FrcApiClient {
    /// Build an adapter from `config`
    pub fn new(config: &SyncConfig, shutdown: SharedShutdown) -> FetcherResult<Self> {
        let rate_limiter = Arc::new(RateLimiter::from_config(config, shutdown.clone()));
        Self::with_rate_limiter(config, shutdown, rate_limiter)
    }

    /// Build an adapter that shares `rate_limiter` with other clients
    pub fn with_rate_limiter(
        config: &SyncConfig,
        shutdown: SharedShutdown,
        rate_limiter: Arc<RateLimiter>,
    ) -> FetcherResult<Self> {
        if !config.is_configured() {
            warn!("FRC API credentials not configured, API calls will return empty results");
        }
        Ok(Self {
            http: FrcHttpClient::new(config, shutdown, rate_limiter)?,
            cache: ResponseCache::new(config.cache_ttl()),
            configured: config.is_configured(),
            probe_season: config.season_year,
        })
    }

    /// The shared rate limiter
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        self.http.rate_limiter()
    }

    /// The event listing cache
    pub fn cache(&self) -> &ResponseCache<EventQuery, Vec<Event>> {
        &self.cache
    }

    async fn load_events(&self, query: EventQuery) -> FetcherResult<Vec<Event>> {
        let (endpoint, season) = match query {
            EventQuery::Season(season) => (Endpoint::season_events(season), season),
            EventQuery::Team { team, season } => (Endpoint::team_events(team, season), season),
        };

        let response: EventResponse = self.http.get(&endpoint).await?;

        let events: Vec<Event> = response
            .into_events()
            .into_iter()
            .filter_map(|dto| {
                if dto.code.as_deref().map_or(true, |c| c.trim().is_empty()) {
                    warn!(season, name = ?dto.name, "Skipping event without a code");
                    return None;
                }
                Some(FrcMapper::map_event(&dto, season))
            })
            .collect();

        info!(%query, count = events.len(), "Fetched events from FRC API");
        Ok(events)
    }

    async fn load_event(&self, event_code: &str, season_year: i32) -> FetcherResult<Option<Event>> {
        let endpoint = Endpoint::event(event_code, season_year)?;
        let code = event_code.trim().to_ascii_uppercase();

        let response: SingleEventResponse = self.http.get(&endpoint).await?;
        let event = response.into_event().map(|mut dto| {
            // The path already names the event; trust it over a missing code.
            if dto.code.as_deref().map_or(true, |c| c.trim().is_empty()) {
                dto.code = Some(code.clone());
            }
            FrcMapper::map_event(&dto, season_year)
        });
        info!(event_code = %code, season = season_year, found = event.is_some(), "Fetched event from FRC API");
        Ok(event)
    }

    async fn load_rankings(&self, event_code: &str, season_year: i32) -> FetcherResult<Vec<Ranking>> {
        let endpoint = Endpoint::rankings(event_code, season_year)?;
        let code = event_code.trim().to_ascii_uppercase();

        let response: RankingResponse = self.http.get(&endpoint).await?;

        let rankings: Vec<Ranking> = response
            .into_rankings()
            .iter()
            .map(|dto| FrcMapper::map_ranking(dto, &code, season_year))
            .collect();
        info!(event_code = %code, season = season_year, count = rankings.len(), "Fetched rankings from FRC API");
        Ok(rankings)
    }

    async fn load_team(&self, team_number: u32) -> FetcherResult<Option<Team>> {
        let response: TeamResponse = self.http.get(&Endpoint::team(team_number)).await?;
        Ok(response
            .into_team()
            .map(|dto| FrcMapper::map_team(&dto, team_number)))
    }

    /// Turn an expected failure into `empty`, logging and counting it.
    /// Cancellation is passed through.
    fn absorb<T>(&self, endpoint: &str, result: FetcherResult<T>, empty: T) -> FetcherResult<T> {
        let err = match result {
            Ok(value) => return Ok(value),
            Err(FetcherError::Cancelled) => return Err(FetcherError::Cancelled),
            Err(err) => err,
        };

        let Some(kind) = FailureKind::of(&err) else {
            debug!(endpoint, error = %err, "FRC API call skipped");
            return Ok(empty);
        };

        metrics::record_fetch_failure(kind.as_str());
        match (kind, kind.severity()) {
            (FailureKind::NotFound, _) => warn!(
                endpoint,
                failure = kind.as_str(),
                status = kind.status(),
                "FRC API resource not found"
            ),
            (_, Severity::Warning) => warn!(
                endpoint,
                failure = kind.as_str(),
                status = kind.status(),
                error = %err,
                suggestion = kind.suggestion(),
                "FRC API request failed"
            ),
            (_, Severity::Error) => error!(
                endpoint,
                failure = kind.as_str(),
                status = kind.status(),
                error = %err,
                suggestion = kind.suggestion(),
                "FRC API request failed"
            ),
        }
        Ok(empty)
    }
}

#[async_trait]
impl EventSource for FrcApiClient {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch_events(&self, season_year: i32) -> FetcherResult<Vec<Event>> {
        if !self.configured {
            debug!(season = season_year, "FRC API not configured, skipping event fetch");
            return Ok(Vec::new());
        }
        let query = EventQuery::Season(season_year);
        let result = self
            .cache
            .get_or_try_fetch(query, || self.load_events(query))
            .await;
        self.absorb(endpoints::EVENTS_KEY, result, Vec::new())
    }

    async fn fetch_team_events(&self, team_number: u32, season_year: i32) -> FetcherResult<Vec<Event>> {
        if !self.configured {
            debug!(team = team_number, season = season_year, "FRC API not configured, skipping team event fetch");
            return Ok(Vec::new());
        }
        let query = EventQuery::Team {
            team: team_number,
            season: season_year,
        };
        let result = self
            .cache
            .get_or_try_fetch(query, || self.load_events(query))
            .await;
        self.absorb(&endpoints::team_events_key(team_number), result, Vec::new())
    }

    async fn fetch_event(&self, event_code: &str, season_year: i32) -> FetcherResult<Option<Event>> {
        if !self.configured {
            debug!(event_code, season = season_year, "FRC API not configured, skipping event fetch");
            return Ok(None);
        }
        let result = self.load_event(event_code, season_year).await;
        self.absorb(&endpoints::event_key(event_code), result, None)
    }

    async fn fetch_rankings(&self, event_code: &str, season_year: i32) -> FetcherResult<Vec<Ranking>> {
        if !self.configured {
            debug!(event_code, season = season_year, "FRC API not configured, skipping rankings fetch");
            return Ok(Vec::new());
        }
        let result = self.load_rankings(event_code, season_year).await;
        self.absorb(&endpoints::rankings_key(event_code), result, Vec::new())
    }

    async fn fetch_team(&self, team_number: u32) -> FetcherResult<Option<Team>> {
        if !self.configured {
            debug!(team = team_number, "FRC API not configured, skipping team fetch");
            return Ok(None);
        }
        let result = self.load_team(team_number).await;
        self.absorb(&endpoints::team_key(team_number), result, None)
    }

    async fn validate_connection(&self) -> bool {
        if !self.configured {
            warn!("Cannot validate FRC API connection: credentials not configured");
            return false;
        }
        let result = self
            .http
            .get::<EventResponse>(&Endpoint::season_events(self.probe_season))
            .await;
        match result {
            Ok(_) => {
                info!(base_url = self.http.base_url(), "FRC API connection validated");
                true
            }
            Err(err) => {
                let failure = FailureKind::of(&err).map(|k| k.as_str());
                error!(
                    base_url = self.http.base_url(),
                    failure,
                    error = %err,
                    "FRC API connection validation failed"
                );
                false
            }
        }
    }
}
