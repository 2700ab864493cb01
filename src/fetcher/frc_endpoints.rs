//! FRC Events API v3 paths and rate-limit keys
//!
//! Paths are relative to the configured base URL (e.g.
//! `https://frc-api.firstinspires.org/v3.0`). Rate-limit keys are one per
//! logical query so unrelated queries never wait on each other. Metrics use
//! the endpoint family instead, so label cardinality stays fixed no matter
//! how many teams or events are queried.

use super::{FetcherError, FetcherResult};

/// Rate-limit key for the season event listing
pub const EVENTS_KEY: &str = "events";

/// Endpoint families used as metric labels
pub mod family {
    /// `/{season}/events`
    pub const EVENTS: &str = "events";
    /// `/{season}/teams/{team}/events`
    pub const TEAM_EVENTS: &str = "team_events";
    /// `/{season}/events/{eventCode}`
    pub const EVENT: &str = "event";
    /// `/{season}/rankings/{eventCode}`
    pub const RANKINGS: &str = "rankings";
    /// `/teams/{team}`
    pub const TEAM: &str = "team";
    /// Keys outside the known set
    pub const OTHER: &str = "other";
}

/// One request target: where it goes, which limiter slot it waits on, and
/// which family it is counted under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Path relative to the base URL
    pub path: String,
    /// Rate-limit key
    pub key: String,
    /// Metrics label
    pub family: &'static str,
}

impl Endpoint {
    /// Season event listing
    pub fn season_events(season_year: i32) -> Self {
        Self {
            path: season_events_path(season_year),
            key: EVENTS_KEY.to_string(),
            family: family::EVENTS,
        }
    }

    /// One team's events in a season
    pub fn team_events(team_number: u32, season_year: i32) -> Self {
        Self {
            path: team_events_path(team_number, season_year),
            key: team_events_key(team_number),
            family: family::TEAM_EVENTS,
        }
    }

    /// A single event
    pub fn event(event_code: &str, season_year: i32) -> FetcherResult<Self> {
        Ok(Self {
            path: event_path(event_code, season_year)?,
            key: event_key(event_code),
            family: family::EVENT,
        })
    }

    /// Qualification rankings for one event
    pub fn rankings(event_code: &str, season_year: i32) -> FetcherResult<Self> {
        Ok(Self {
            path: rankings_path(event_code, season_year)?,
            key: rankings_key(event_code),
            family: family::RANKINGS,
        })
    }

    /// A single team
    pub fn team(team_number: u32) -> Self {
        Self {
            path: team_path(team_number),
            key: team_key(team_number),
            family: family::TEAM,
        }
    }
}

/// `/{season}/events`
pub fn season_events_path(season_year: i32) -> String {
    format!("/{season_year}/events")
}

/// `/{season}/teams/{team}/events`
pub fn team_events_path(team_number: u32, season_year: i32) -> String {
    format!("/{season_year}/teams/{team_number}/events")
}

/// `/{season}/events/{eventCode}`
pub fn event_path(event_code: &str, season_year: i32) -> FetcherResult<String> {
    let code = validate_event_code(event_code)?.to_ascii_uppercase();
    Ok(format!("/{season_year}/events/{code}"))
}

/// `/{season}/rankings/{eventCode}`
pub fn rankings_path(event_code: &str, season_year: i32) -> FetcherResult<String> {
    let code = validate_event_code(event_code)?.to_ascii_uppercase();
    Ok(format!("/{season_year}/rankings/{code}"))
}

/// `/teams/{team}`
pub fn team_path(team_number: u32) -> String {
    format!("/teams/{team_number}")
}

/// `team-events-<team>`
pub fn team_events_key(team_number: u32) -> String {
    format!("team-events-{team_number}")
}

/// `event-<eventCode>`
pub fn event_key(event_code: &str) -> String {
    format!("event-{}", event_code.trim().to_ascii_uppercase())
}

/// `rankings-<eventCode>`
pub fn rankings_key(event_code: &str) -> String {
    format!("rankings-{}", event_code.trim().to_ascii_uppercase())
}

/// `team-<team>`
pub fn team_key(team_number: u32) -> String {
    format!("team-{team_number}")
}

/// Endpoint family a rate-limit key belongs to
pub fn family_of(key: &str) -> &'static str {
    if key == EVENTS_KEY {
        family::EVENTS
    } else if key.starts_with("team-events-") {
        family::TEAM_EVENTS
    } else if key.starts_with("team-") {
        family::TEAM
    } else if key.starts_with("event-") {
        family::EVENT
    } else if key.starts_with("rankings-") {
        family::RANKINGS
    } else {
        family::OTHER
    }
}

/// Event codes are short alphanumeric identifiers. Anything else would
/// change the request path, so it is rejected before any I/O.
pub fn validate_event_code(event_code: &str) -> FetcherResult<&str> {
    let code = event_code.trim();
    if code.is_empty() || code.len() > 32 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(FetcherError::InvalidRequest(format!(
            "invalid event code: {event_code:?}"
        )));
    }
    Ok(code)
}
