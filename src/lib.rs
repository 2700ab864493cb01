//! # FRC Event Sync Library
//!
//! Keeps a local store of FRC competition events in step with the official
//! FRC Events API. The library pulls events, rankings and team descriptors,
//! spaces its requests to respect the API quota, caches query results, and
//! reconciles fetched events into a repository by natural key.
//!
//! ## Features
//!
//! - **Rate Limiting**: per-endpoint minimum spacing between requests
//! - **Caching**: TTL-bounded memoization of season and team queries
//! - **Reconciliation**: create-or-update by `(event_code, season_year)` with
//!   per-record failure isolation
//! - **Scheduling**: a background interval scheduler with a clean stop
//! - **Fail-soft fetching**: HTTP and network failures become empty results
//!   plus a structured log event, never a crash
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use frc_event_sync::config::SyncConfig;
//! use frc_event_sync::store::memory::InMemoryEventRepository;
//! use frc_event_sync::sync::SyncEngine;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::default()
//!     .with_credentials("user", "auth-key")
//!     .with_default_team(254);
//!
//! let repository = Arc::new(InMemoryEventRepository::new());
//! let engine = SyncEngine::from_config(config, repository)?;
//!
//! let outcome = engine.sync_all().await;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - Connection, quota and scheduling settings
//! - [`fetcher`] - HTTP adapter, DTOs and DTO-to-domain mapping
//! - [`sync`] - Rate limiter, response cache, reconciler, orchestrator, scheduler
//! - [`store`] - Event repository contract and implementations
//! - [`shutdown`] - Cooperative cancellation shared by every blocking step
//!
//! ## Data Types
//!
//! - [`Event`] - One competition event for one season
//! - [`EventType`] - Competition level of an event
//! - [`Ranking`] - One team's standing at one event
//! - [`Team`] - Team descriptor

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CLI command implementations
pub mod cli;

/// Time source injected into the reconciler
pub mod clock;

/// Engine configuration
pub mod config;

/// Remote API access
pub mod fetcher;

/// Prometheus metrics
pub mod metrics;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Event persistence
pub mod store;

/// Synchronization engine
pub mod sync;

/// Competition level of an FRC event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    /// Regional event
    Regional,
    /// District qualifying event
    District,
    /// District championship (including divisions)
    DistrictChampionship,
    /// FIRST Championship (including divisions)
    Championship,
    /// Off-season event
    OffSeason,
    /// Scrimmage, and anything the API labels in a way we don't recognize
    #[default]
    Scrimmage,
}

impl EventType {
    /// Map an API event type label onto the fixed vocabulary.
    ///
    /// Matching ignores case and any spaces, hyphens or underscores, so
    /// `"District Championship"`, `"district_championship"` and
    /// `"DistrictChampionship"` are the same label. Unknown labels map to
    /// [`EventType::Scrimmage`].
    pub fn from_api_label(label: &str) -> Self {
        let normalized: String = label
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "regional" => Self::Regional,
            "district" | "districtevent" => Self::District,
            "districtchampionship"
            | "dcmp"
            | "districtchampionshipwithlevels"
            | "districtchampionshipdivision" => Self::DistrictChampionship,
            "championship" | "cmp" | "championshipdivision" | "championshipsubdivision" => {
                Self::Championship
            }
            "offseason" | "offseasonwithazuresync" => Self::OffSeason,
            _ => Self::Scrimmage,
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Regional => "Regional",
            Self::District => "District",
            Self::DistrictChampionship => "District Championship",
            Self::Championship => "Championship",
            Self::OffSeason => "Off-Season",
            Self::Scrimmage => "Scrimmage",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Natural key of a stored event
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    /// API event code (e.g. "CASJ")
    pub event_code: String,
    /// Season the event belongs to
    pub season_year: i32,
}

impl EventKey {
    /// Create a key
    pub fn new(event_code: impl Into<String>, season_year: i32) -> Self {
        Self {
            event_code: event_code.into(),
            season_year,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.season_year, self.event_code)
    }
}

/// One competition event for one season
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Repository-assigned identifier, absent until first saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// API event code
    pub event_code: String,
    /// Season year
    pub season_year: i32,
    /// Event name
    pub name: String,
    /// Competition level
    #[serde(default)]
    pub event_type: EventType,
    /// First day of the event
    pub start_date: Option<NaiveDate>,
    /// Last day of the event
    pub end_date: Option<NaiveDate>,
    /// Free-text street address
    pub location: Option<String>,
    /// Venue name
    pub venue: Option<String>,
    /// City
    pub city: Option<String>,
    /// State or province
    pub state_province: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Event website
    pub website: Option<String>,
    /// Live stream URL
    pub live_stream_url: Option<String>,
    /// When team registration opens
    pub registration_open: Option<NaiveDateTime>,
    /// When team registration closes
    pub registration_close: Option<NaiveDateTime>,
    /// Number of registered teams
    #[serde(default)]
    pub team_count: u32,
    /// Official FIRST event
    pub official: bool,
    /// Publicly listed event
    pub public: bool,
    /// Last time this record was refreshed from the API
    pub last_synced: Option<DateTime<Utc>>,
}

impl Event {
    /// Create an event with only its identity set.
    ///
    /// The type defaults to scrimmage and the event is marked official and
    /// public, which is what the API listing implies for published events.
    pub fn new(event_code: impl Into<String>, season_year: i32, name: impl Into<String>) -> Self {
        Self {
            id: None,
            event_code: event_code.into(),
            season_year,
            name: name.into(),
            event_type: EventType::default(),
            start_date: None,
            end_date: None,
            location: None,
            venue: None,
            city: None,
            state_province: None,
            country: None,
            website: None,
            live_stream_url: None,
            registration_open: None,
            registration_close: None,
            team_count: 0,
            official: true,
            public: true,
            last_synced: None,
        }
    }

    /// Natural key of this event
    pub fn natural_key(&self) -> EventKey {
        EventKey::new(self.event_code.clone(), self.season_year)
    }

    /// Overwrite every mutable attribute with the values from a fresh fetch.
    ///
    /// Identity (`id`, `event_code`, `season_year`) is left untouched.
    pub fn apply_sync(&mut self, fresh: &Event, synced_at: DateTime<Utc>) {
        self.name = fresh.name.clone();
        self.event_type = fresh.event_type;
        self.start_date = fresh.start_date;
        self.end_date = fresh.end_date;
        self.location = fresh.location.clone();
        self.venue = fresh.venue.clone();
        self.city = fresh.city.clone();
        self.state_province = fresh.state_province.clone();
        self.country = fresh.country.clone();
        self.website = fresh.website.clone();
        self.live_stream_url = fresh.live_stream_url.clone();
        self.registration_open = fresh.registration_open;
        self.registration_close = fresh.registration_close;
        self.team_count = fresh.team_count;
        self.official = fresh.official;
        self.public = fresh.public;
        self.last_synced = Some(synced_at);
    }

    /// Validate the identity fields
    pub fn validate(&self) -> Result<(), String> {
        if self.event_code.trim().is_empty() {
            return Err("event_code must not be empty".to_string());
        }
        if self.season_year < 1992 {
            return Err(format!("season_year {} predates FRC", self.season_year));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(format!(
                    "end_date ({end}) must not be before start_date ({start})"
                ));
            }
        }
        Ok(())
    }

    /// Event starts after `today`
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.start_date.is_some_and(|start| start > today)
    }

    /// `today` falls within the event's dates
    pub fn is_active(&self, today: NaiveDate) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start <= today && today <= end,
            _ => false,
        }
    }

    /// Event ended before `today`
    pub fn is_completed(&self, today: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| end < today)
    }

    /// Length of the event in days, counting both ends. Zero when a date is missing.
    pub fn duration_days(&self) -> i64 {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => (end - start).num_days() + 1,
            _ => 0,
        }
    }

    /// Days from `today` until the start date, negative once started
    pub fn days_until_start(&self, today: NaiveDate) -> Option<i64> {
        self.start_date.map(|start| (start - today).num_days())
    }

    /// Registration window contains `now`
    pub fn is_registration_open(&self, now: NaiveDateTime) -> bool {
        match (self.registration_open, self.registration_close) {
            (Some(open), Some(close)) => open <= now && now <= close,
            _ => false,
        }
    }

    /// Name with city and state, e.g. "Silicon Valley Regional - San Jose, CA"
    pub fn full_display_name(&self) -> String {
        let mut name = self.name.clone();
        if let Some(city) = self.city.as_deref().filter(|c| !c.is_empty()) {
            name.push_str(" - ");
            name.push_str(city);
            if let Some(state) = self.state_province.as_deref().filter(|s| !s.is_empty()) {
                name.push_str(", ");
                name.push_str(state);
            }
        }
        name
    }
}

/// One team's standing at one event, as of the last fetch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ranking {
    /// Team number
    pub team_number: u32,
    /// Event the ranking belongs to
    pub event_code: String,
    /// Season year
    pub season_year: i32,
    /// Qualification rank (1 is best)
    pub rank: u32,
    /// Qualification wins
    pub wins: u32,
    /// Qualification losses
    pub losses: u32,
    /// Qualification ties
    pub ties: u32,
    /// Ranking score, when the API reports one
    pub ranking_points: Option<Decimal>,
}

impl Ranking {
    /// Matches played, derived from the record. Saturates on absurd
    /// counts from the API.
    pub fn matches_played(&self) -> u32 {
        self.wins.saturating_add(self.losses).saturating_add(self.ties)
    }
}

/// Team descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    /// Team number
    pub team_number: u32,
    /// Full (sponsor) name
    pub name_full: Option<String>,
    /// Short name
    pub name_short: Option<String>,
    /// City
    pub city: Option<String>,
    /// State or province
    pub state_province: Option<String>,
    /// Country
    pub country: Option<String>,
    /// First season
    pub rookie_year: Option<i32>,
    /// Team website
    pub website: Option<String>,
    /// Current robot name
    pub robot_name: Option<String>,
}

impl Team {
    /// Short name if present, otherwise "Team N"
    pub fn display_name(&self) -> String {
        self.name_short
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Team {}", self.team_number))
    }
}
