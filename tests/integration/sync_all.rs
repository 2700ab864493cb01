//! Sync cycle behavior against scripted sources and repositories

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use frc_event_sync::config::SyncConfig;
use frc_event_sync::fetcher::FetcherError;
use frc_event_sync::shutdown::ShutdownCoordinator;
use frc_event_sync::store::{EventRepository, InMemoryEventRepository};
use frc_event_sync::sync::{SyncEngine, SyncOutcome};
use frc_event_sync::{Event, EventType};

use crate::support::{event, fixed_clock, sync_time, Behavior, FailingRepository, FakeSource};

fn configured() -> SyncConfig {
    SyncConfig::default().with_credentials("user", "key")
}

fn engine(config: SyncConfig, source: Arc<FakeSource>, repo: Arc<dyn EventRepository>) -> SyncEngine {
    SyncEngine::new(config, source, repo, fixed_clock(), ShutdownCoordinator::shared())
}

#[tokio::test]
async fn sync_is_idempotent() {
    let source = Arc::new(FakeSource::new(vec![
        event("CASJ", "Silicon Valley Regional"),
        event("TXHOU", "Houston"),
    ]));
    let repo = Arc::new(InMemoryEventRepository::new());
    let engine = engine(configured(), source, repo.clone());

    let first = engine.sync_all().await;
    let first = first.summary().unwrap().clone();
    assert_eq!(first.report.created, 2);
    let after_first = repo.find_all().await.unwrap();

    let second = engine.sync_all().await;
    let second = second.summary().unwrap();
    assert_eq!(second.report.created, 0);
    assert_eq!(second.report.updated, 2);

    let after_second = repo.find_all().await.unwrap();
    assert_eq!(after_first, after_second);
    assert_eq!(repo.count().await.unwrap(), 2);
}

#[tokio::test]
async fn existing_event_is_updated_in_place() {
    let mut stale = Event::new("ABC123", 2025, "Old Name");
    stale.event_type = EventType::Scrimmage;
    stale.venue = Some("Old Venue".to_string());
    stale.official = false;
    let repo = Arc::new(InMemoryEventRepository::with_events([stale]));
    let original_id = repo.find_by_natural_key("ABC123", 2025).await.unwrap().unwrap().id;

    let mut fresh = event("ABC123", "New Name");
    fresh.event_type = EventType::Regional;
    fresh.venue = None;
    fresh.live_stream_url = Some("https://www.twitch.tv/firstinspires".to_string());
    let source = Arc::new(FakeSource::new(vec![fresh]));

    let outcome = engine(configured(), source, repo.clone()).sync_all().await;
    assert_eq!(outcome.summary().unwrap().report.updated, 1);

    let stored = repo.find_by_natural_key("ABC123", 2025).await.unwrap().unwrap();
    assert_eq!(stored.id, original_id);
    assert_eq!(stored.name, "New Name");
    assert_eq!(stored.event_type, EventType::Regional);
    assert_eq!(stored.venue, None);
    assert_eq!(stored.team_count, 40);
    assert!(stored.official);
    assert_eq!(
        stored.live_stream_url.as_deref(),
        Some("https://www.twitch.tv/firstinspires")
    );
    assert_eq!(stored.last_synced, Some(sync_time()));
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_event_is_created() {
    let repo = Arc::new(InMemoryEventRepository::new());
    let source = Arc::new(FakeSource::new(vec![event("XYZ999", "Brand New Event")]));

    let outcome = engine(configured(), source, repo.clone()).sync_all().await;
    assert_eq!(outcome.summary().unwrap().report.created, 1);

    let stored = repo.find_by_natural_key("XYZ999", 2025).await.unwrap().unwrap();
    assert!(stored.id.is_some());
    assert_eq!(stored.name, "Brand New Event");
    assert_eq!(stored.last_synced, Some(sync_time()));
}

#[tokio::test]
async fn one_failed_save_does_not_abort_the_batch() {
    let repo = Arc::new(FailingRepository::failing_on(vec![2]));
    let source = Arc::new(FakeSource::new(vec![
        event("AAA", "First"),
        event("BBB", "Second"),
        event("CCC", "Third"),
    ]));

    let outcome = engine(configured(), source, repo.clone()).sync_all().await;
    assert!(outcome.is_completed());
    let report = outcome.summary().unwrap().report;
    assert_eq!(report.created, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(repo.save_attempts(), 3);

    assert!(repo.find_by_natural_key("AAA", 2025).await.unwrap().is_some());
    assert!(repo.find_by_natural_key("BBB", 2025).await.unwrap().is_none());
    assert!(repo.find_by_natural_key("CCC", 2025).await.unwrap().is_some());
}

#[tokio::test]
async fn disabled_sync_does_nothing() {
    let source = Arc::new(FakeSource::new(vec![event("CASJ", "Silicon Valley")]));
    let repo = Arc::new(InMemoryEventRepository::new());
    let engine = engine(configured().with_sync_enabled(false), source.clone(), repo.clone());

    assert_eq!(engine.sync_all().await, SyncOutcome::Disabled);
    assert!(source.calls().is_empty());
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_credentials_do_nothing() {
    let source = Arc::new(FakeSource::unconfigured());
    let repo = Arc::new(InMemoryEventRepository::new());
    let engine = engine(SyncConfig::default(), source.clone(), repo.clone());

    assert_eq!(engine.sync_all().await, SyncOutcome::NotConfigured);
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn team_events_are_reconciled_before_season_events() {
    let mut team_version = event("CASJ", "Silicon Valley (team listing)");
    team_version.team_count = 12;
    let source = Arc::new(
        FakeSource::new(vec![event("CASJ", "Silicon Valley Regional"), event("TXHOU", "Houston")])
            .with_team_events(vec![team_version]),
    );
    let repo = Arc::new(InMemoryEventRepository::new());
    let engine = engine(configured().with_default_team(254), source.clone(), repo.clone());

    let outcome = engine.sync_all().await;
    assert_eq!(source.calls(), vec!["team-events:254:2025", "events:2025"]);

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.report.created, 2);
    assert_eq!(summary.report.updated, 1);

    // The season listing ran last, so its values win.
    let stored = repo.find_by_natural_key("CASJ", 2025).await.unwrap().unwrap();
    assert_eq!(stored.name, "Silicon Valley Regional");
    assert_eq!(stored.team_count, 40);
}

#[tokio::test]
async fn no_default_team_skips_team_query() {
    let source = Arc::new(FakeSource::new(vec![]));
    let repo = Arc::new(InMemoryEventRepository::new());
    engine(configured(), source.clone(), repo).sync_all().await;
    assert_eq!(source.calls(), vec!["events:2025"]);
}

#[tokio::test]
async fn overlapping_trigger_is_skipped() {
    let gate = Arc::new(Notify::new());
    let source = Arc::new(FakeSource::new(vec![event("CASJ", "Silicon Valley")]).gated(gate.clone()));
    let entered = source.entered();
    let repo = Arc::new(InMemoryEventRepository::new());
    let engine = Arc::new(engine(configured(), source.clone(), repo.clone()));

    let first = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.sync_all().await })
    };
    entered.notified().await;
    assert!(engine.is_syncing());

    assert_eq!(engine.sync_all().await, SyncOutcome::AlreadyRunning);

    gate.notify_one();
    let outcome = tokio::time::timeout(Duration::from_secs(5), first)
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.is_completed());
    assert_eq!(source.calls().len(), 1);
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn failed_team_query_does_not_block_season_query() {
    let source = Arc::new(
        FakeSource::new(vec![event("CASJ", "Silicon Valley")])
            .with_team_behavior(Behavior::Fail(|| FetcherError::NetworkError("boom".to_string()))),
    );
    let repo = Arc::new(InMemoryEventRepository::new());
    let outcome = engine(configured().with_default_team(254), source, repo.clone())
        .sync_all()
        .await;

    let summary = outcome.summary().unwrap();
    assert!(outcome.is_completed());
    assert_eq!(summary.failed_queries, 1);
    assert_eq!(summary.report.created, 1);
}

#[tokio::test]
async fn cancellation_ends_the_cycle() {
    let source = Arc::new(
        FakeSource::new(vec![event("CASJ", "Silicon Valley")])
            .with_team_behavior(Behavior::Fail(|| FetcherError::Cancelled)),
    );
    let repo = Arc::new(InMemoryEventRepository::new());
    let outcome = engine(configured().with_default_team(254), source.clone(), repo.clone())
        .sync_all()
        .await;

    assert!(matches!(outcome, SyncOutcome::Cancelled(_)));
    assert_eq!(source.calls(), vec!["team-events:254:2025"]);
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn panic_is_contained_and_next_cycle_runs() {
    let source = Arc::new(FakeSource::new(vec![]).with_season_behavior(Behavior::Panic));
    let repo = Arc::new(InMemoryEventRepository::new());
    let engine = engine(configured(), source.clone(), repo.clone());

    match engine.sync_all().await {
        SyncOutcome::Failed(reason) => assert!(reason.contains("fake source exploded")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(!engine.is_syncing());

    source.set_season_events(vec![event("CASJ", "Silicon Valley")]);
    assert!(engine.sync_all().await.is_completed());
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn read_through_operations_use_configured_season() {
    let source = Arc::new(FakeSource::new(vec![]));
    let repo = Arc::new(InMemoryEventRepository::new());
    let engine = engine(configured().with_season(2024).with_default_team(1678), source.clone(), repo);

    assert!(engine.event("CASJ").await.unwrap().is_none());
    assert!(engine.event_rankings("CASJ").await.unwrap().is_empty());
    assert!(engine.default_team().await.unwrap().is_none());
    assert!(engine.validate_connection().await);
    assert_eq!(
        source.calls(),
        vec!["event:CASJ:2024", "rankings:CASJ:2024", "team:1678"]
    );
}
