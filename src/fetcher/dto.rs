//! FRC Events API transport types
//!
//! Every field is optional: the API omits or nulls fields freely and a
//! missing or mistyped value must never fail the whole listing. A field of
//! the wrong type decodes as `None`; a list entry that is not an object is
//! dropped on its own. Unknown fields are ignored. Field names mirror the
//! API's JSON keys.

#![allow(missing_docs)]

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Decode a field, turning a value of the wrong type into `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Decode a list of strings, keeping only the string entries
fn lenient_strings<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// Decode a list of records, dropping entries that do not decode
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if decoded.len() < total {
        warn!(
            skipped = total - decoded.len(),
            total, "Skipping malformed records in FRC API response"
        );
    }
    Ok(Some(decoded))
}

/// Body of `/{season}/events` and `/{season}/teams/{team}/events`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventResponse {
    /// Event listing; absent or null means no events
    #[serde(rename = "Events", default, deserialize_with = "lenient_items")]
    pub events: Option<Vec<EventDto>>,
}

impl EventResponse {
    /// Events in the body, empty when the array is absent
    pub fn into_events(self) -> Vec<EventDto> {
        self.events.unwrap_or_default()
    }
}

/// Body of `/{season}/events/{eventCode}`.
///
/// Served either as an `Events` listing with one entry or as the bare event
/// object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SingleEventResponse {
    /// `{"Events": [...]}`
    Listing {
        #[serde(rename = "Events", deserialize_with = "lenient_items")]
        events: Option<Vec<EventDto>>,
    },
    /// Bare event object
    Single(EventDto),
}

impl SingleEventResponse {
    /// The first event in the body
    pub fn into_event(self) -> Option<EventDto> {
        match self {
            SingleEventResponse::Listing { events } => events.unwrap_or_default().into_iter().next(),
            SingleEventResponse::Single(event) => Some(event),
        }
    }
}

/// One event as returned by the API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    #[serde(default, deserialize_with = "lenient")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub date_start: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub date_end: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub venue: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub city: Option<String>,
    #[serde(alias = "stateProv", default, deserialize_with = "lenient")]
    pub stateprov: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub webcasts: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub live_stream_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub reg_open: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub reg_close: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub team_count: Option<i64>,
}

/// Body of `/{season}/rankings/{eventCode}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankingResponse {
    /// Ranking rows; absent or null means no rankings
    #[serde(rename = "Rankings", default, deserialize_with = "lenient_items")]
    pub rankings: Option<Vec<RankingDto>>,
}

impl RankingResponse {
    /// Rows in the body, empty when the array is absent
    pub fn into_rankings(self) -> Vec<RankingDto> {
        self.rankings.unwrap_or_default()
    }
}

/// One team's qualification standing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingDto {
    #[serde(default, deserialize_with = "lenient")]
    pub team_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub rank: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub wins: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub losses: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub ties: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub ranking_points: Option<f64>,
    /// Older seasons report ranking points only as the first sort key
    #[serde(default, deserialize_with = "lenient")]
    pub sort_order1: Option<f64>,
}

/// Body of `/teams/{team}`.
///
/// The API serves either the bare team object or a `teams` listing with a
/// single entry, depending on version.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TeamResponse {
    /// `{"teams": [...]}`
    Listing {
        #[serde(alias = "Teams", deserialize_with = "lenient_items")]
        teams: Option<Vec<TeamDto>>,
    },
    /// Bare team object
    Single(TeamDto),
}

impl TeamResponse {
    /// The first team in the body
    pub fn into_team(self) -> Option<TeamDto> {
        match self {
            TeamResponse::Listing { teams } => teams.unwrap_or_default().into_iter().next(),
            TeamResponse::Single(team) => Some(team),
        }
    }
}

/// One team descriptor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDto {
    #[serde(default, deserialize_with = "lenient")]
    pub team_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub name_full: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name_short: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub city: Option<String>,
    #[serde(alias = "stateprov", default, deserialize_with = "lenient")]
    pub state_prov: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub rookie_year: Option<i32>,
    #[serde(default, deserialize_with = "lenient")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub robot_name: Option<String>,
}
