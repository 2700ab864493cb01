//! DTO to domain mapping
//!
//! Pure functions: the same DTO always maps to the same value, and nothing
//! here reads the clock. Unparsable dates and blank strings become `None`
//! rather than failing the record.

use super::dto::{EventDto, RankingDto, TeamDto};
use crate::{Event, EventType, Ranking, Team};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Maps FRC API transport types onto domain types
pub struct FrcMapper;

impl FrcMapper {
    /// Map one event DTO for `season_year`.
    ///
    /// `last_synced` is left unset; the reconciler stamps it. The name falls
    /// back to the event code when the API sends none.
    pub fn map_event(dto: &EventDto, season_year: i32) -> Event {
        let code = non_blank(&dto.code).unwrap_or_default();
        let name = non_blank(&dto.name).unwrap_or_else(|| code.clone());

        let mut event = Event::new(code, season_year, name);
        event.event_type = dto
            .event_type
            .as_deref()
            .map(EventType::from_api_label)
            .unwrap_or_default();
        event.start_date = dto.date_start.as_deref().and_then(Self::parse_date);
        event.end_date = dto.date_end.as_deref().and_then(Self::parse_date);
        event.location = non_blank(&dto.address);
        event.venue = non_blank(&dto.venue);
        event.city = non_blank(&dto.city);
        event.state_province = non_blank(&dto.stateprov);
        event.country = non_blank(&dto.country);
        event.website = non_blank(&dto.website);
        event.live_stream_url = non_blank(&dto.live_stream_url).or_else(|| {
            dto.webcasts
                .as_ref()
                .and_then(|urls| urls.iter().find(|u| !u.trim().is_empty()))
                .map(|u| u.trim().to_string())
        });
        event.registration_open = dto.reg_open.as_deref().and_then(Self::parse_date_time);
        event.registration_close = dto.reg_close.as_deref().and_then(Self::parse_date_time);
        event.team_count = dto
            .team_count
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);
        event
    }

    /// Map one ranking row for `event_code` in `season_year`.
    ///
    /// Absent counters become 0. Ranking points fall back to the first sort
    /// key and are `None` when neither is a finite number.
    pub fn map_ranking(dto: &RankingDto, event_code: &str, season_year: i32) -> Ranking {
        Ranking {
            team_number: dto.team_number.unwrap_or(0),
            event_code: event_code.to_string(),
            season_year,
            rank: dto.rank.unwrap_or(0),
            wins: dto.wins.unwrap_or(0),
            losses: dto.losses.unwrap_or(0),
            ties: dto.ties.unwrap_or(0),
            ranking_points: dto
                .ranking_points
                .or(dto.sort_order1)
                .and_then(Self::to_decimal),
        }
    }

    /// Map a team DTO. `requested` is used when the body omits the number.
    pub fn map_team(dto: &TeamDto, requested: u32) -> Team {
        Team {
            team_number: dto.team_number.unwrap_or(requested),
            name_full: non_blank(&dto.name_full),
            name_short: non_blank(&dto.name_short),
            city: non_blank(&dto.city),
            state_province: non_blank(&dto.state_prov),
            country: non_blank(&dto.country),
            rookie_year: dto.rookie_year,
            website: non_blank(&dto.website),
            robot_name: non_blank(&dto.robot_name),
        }
    }

    /// Parse a calendar date.
    ///
    /// Accepts `YYYY-MM-DD` or a date-time, in which case the date part is
    /// taken as written.
    pub fn parse_date(value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        let date_part = value.split(['T', ' ']).next()?;
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }

    /// Parse a timestamp.
    ///
    /// Accepts RFC 3339 (converted to UTC), naive `YYYY-MM-DDTHH:MM:SS[.fff]`
    /// with `T` or a space, or a bare date taken as midnight.
    pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.naive_utc());
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
                return Some(dt);
            }
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    fn to_decimal(value: f64) -> Option<Decimal> {
        if !value.is_finite() {
            return None;
        }
        Decimal::from_f64(value)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
