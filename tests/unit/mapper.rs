//! Unit tests for DTO decoding and mapping

use frc_event_sync::fetcher::dto::{EventResponse, RankingResponse, TeamResponse};
use frc_event_sync::fetcher::mapper::FrcMapper;
use frc_event_sync::EventType;

fn events(body: &str) -> Vec<frc_event_sync::Event> {
    let response: EventResponse = serde_json::from_str(body).unwrap();
    response
        .into_events()
        .iter()
        .map(|dto| FrcMapper::map_event(dto, 2025))
        .collect()
}

#[test]
fn test_full_event_is_mapped() {
    let mapped = events(
        r#"{"Events": [{
            "code": "CASJ",
            "name": "Silicon Valley Regional",
            "type": "Regional",
            "dateStart": "2025-03-26T00:00:00",
            "dateEnd": "2025-03-29T23:59:59",
            "address": "1 Washington Sq",
            "venue": "SJSU Event Center",
            "city": "San Jose",
            "stateprov": "CA",
            "country": "USA",
            "website": "https://www.firstinspires.org",
            "webcasts": [],
            "teamCount": 60
        }]}"#,
    );
    let event = &mapped[0];
    assert_eq!(event.event_code, "CASJ");
    assert_eq!(event.season_year, 2025);
    assert_eq!(event.event_type, EventType::Regional);
    assert_eq!(event.start_date.unwrap().to_string(), "2025-03-26");
    assert_eq!(event.end_date.unwrap().to_string(), "2025-03-29");
    assert_eq!(event.duration_days(), 4);
    assert_eq!(event.location.as_deref(), Some("1 Washington Sq"));
    assert_eq!(event.live_stream_url, None);
    assert_eq!(event.team_count, 60);
    assert!(event.id.is_none());
    assert!(event.last_synced.is_none());
}

#[test]
fn test_sparse_event_gets_defaults() {
    let mapped = events(r#"{"Events": [{"code": "XYZ999"}]}"#);
    let event = &mapped[0];
    assert_eq!(event.name, "XYZ999");
    assert_eq!(event.event_type, EventType::Scrimmage);
    assert_eq!(event.start_date, None);
    assert_eq!(event.team_count, 0);
    assert!(event.official);
}

#[test]
fn test_bad_values_do_not_fail_the_record() {
    let mapped = events(
        r#"{"Events": [{
            "code": "BAD1",
            "name": "  ",
            "type": "SomethingNew",
            "dateStart": "next spring",
            "teamCount": -3,
            "city": ""
        }]}"#,
    );
    let event = &mapped[0];
    assert_eq!(event.name, "BAD1");
    assert_eq!(event.event_type, EventType::Scrimmage);
    assert_eq!(event.start_date, None);
    assert_eq!(event.team_count, 0);
    assert_eq!(event.city, None);
}

#[test]
fn test_missing_events_array_is_empty() {
    assert!(events("{}").is_empty());
    assert!(events(r#"{"Events": null}"#).is_empty());
}

#[test]
fn test_explicit_stream_url_beats_webcasts() {
    let mapped = events(
        r#"{"Events": [{
            "code": "CASJ",
            "liveStreamUrl": "https://example.org/live",
            "webcasts": ["https://www.twitch.tv/firstinspires"]
        }]}"#,
    );
    assert_eq!(mapped[0].live_stream_url.as_deref(), Some("https://example.org/live"));
}

#[test]
fn test_ranking_rows() {
    let response: RankingResponse = serde_json::from_str(
        r#"{"Rankings": [
            {"rank": 1, "teamNumber": 254, "wins": 11, "losses": 0, "ties": 1, "sortOrder1": 3.5},
            {"rank": 2, "teamNumber": 1678}
        ]}"#,
    )
    .unwrap();
    let rankings: Vec<_> = response
        .into_rankings()
        .iter()
        .map(|dto| FrcMapper::map_ranking(dto, "CASJ", 2025))
        .collect();

    assert_eq!(rankings[0].matches_played(), 12);
    assert_eq!(rankings[0].ranking_points.unwrap().to_string(), "3.5");
    assert_eq!(rankings[1].wins, 0);
    assert_eq!(rankings[1].ranking_points, None);
    assert!(rankings.iter().all(|r| r.event_code == "CASJ" && r.season_year == 2025));
}

#[test]
fn test_team_body_shapes() {
    let listing: TeamResponse =
        serde_json::from_str(r#"{"teams": [{"teamNumber": 1678, "nameShort": "Citrus Circuits"}]}"#).unwrap();
    let team = FrcMapper::map_team(&listing.into_team().unwrap(), 1678);
    assert_eq!(team.display_name(), "Citrus Circuits");

    let single: TeamResponse = serde_json::from_str(r#"{"nameFull": "Sponsor Name", "stateProv": "CA"}"#).unwrap();
    let team = FrcMapper::map_team(&single.into_team().unwrap(), 254);
    assert_eq!(team.team_number, 254);
    assert_eq!(team.display_name(), "Team 254");
    assert_eq!(team.state_province.as_deref(), Some("CA"));

    let empty: TeamResponse = serde_json::from_str(r#"{"teams": []}"#).unwrap();
    assert!(empty.into_team().is_none());
}
