//! Unit tests for configuration parsing

use clap::Parser;
use std::time::Duration;

use frc_event_sync::cli::Cli;
use frc_event_sync::config::{SyncConfig, DEFAULT_BASE_URL};

#[test]
fn test_defaults() {
    let config = SyncConfig::default();
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.season_year, 2025);
    assert!(config.sync_enabled);
    assert!(!config.is_configured());
    assert!(!config.has_default_team());
    assert_eq!(config.auto_sync_interval(), Duration::from_secs(3600));
    assert_eq!(config.cache_ttl(), Duration::from_secs(1800));
}

#[test]
fn test_flags_override_defaults() {
    let cli = Cli::try_parse_from([
        "frc-sync",
        "--base-url",
        "http://localhost:8080/v3.0/",
        "--requests-per-minute",
        "-1",
        "--auto-sync-interval",
        "600",
        "--cache-ttl",
        "0",
        "--sync-enabled",
        "false",
        "--request-timeout",
        "5",
        "sync",
    ])
    .unwrap();
    let config = cli.config;

    assert_eq!(config.normalized_base_url(), "http://localhost:8080/v3.0");
    assert_eq!(config.min_request_interval(), Duration::from_secs(3));
    assert_eq!(config.auto_sync_interval(), Duration::from_secs(600));
    assert_eq!(config.cache_ttl(), Duration::ZERO);
    assert!(!config.sync_enabled);
    assert_eq!(config.request_timeout(), Duration::from_secs(5));
}

#[test]
fn test_zero_interval_is_clamped() {
    let config = SyncConfig::default().with_auto_sync_interval_secs(0);
    assert_eq!(config.auto_sync_interval(), Duration::from_secs(1));
}

#[test]
fn test_credentials_prefer_username_and_key() {
    let config = SyncConfig::default()
        .with_token("dG9rZW4=")
        .with_credentials("user", "key");
    let header = config.credentials().unwrap().authorization_header();
    assert_eq!(header, "Basic dXNlcjprZXk=");
}

#[test]
fn test_debug_never_prints_token() {
    let config = SyncConfig::default().with_token("very-secret-token");
    assert!(!format!("{config:?}").contains("very-secret-token"));
    let creds = config.credentials().unwrap();
    assert!(!format!("{creds:?}").contains("very-secret-token"));
}
