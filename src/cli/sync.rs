//! `sync` and `run` commands

use serde_json::json;
use std::sync::Arc;
use tracing::info;

use super::{Cli, CliError, OutputFormat};
use crate::shutdown::SharedShutdown;
use crate::store::{EventRepository, JsonFileEventRepository};
use crate::sync::{IntervalScheduler, SyncOutcome};

/// Run one cycle against the `--store` file and print what it did
pub async fn execute_sync(cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
    let engine = cli.persistent_engine(shutdown).await?;
    let outcome = engine.sync_all().await;
    print_outcome(&outcome, cli.output_format)?;

    match outcome {
        SyncOutcome::Completed(_) | SyncOutcome::Cancelled(_) | SyncOutcome::AlreadyRunning => Ok(()),
        SyncOutcome::Disabled => {
            info!("Sync is disabled (FRC_SYNC_ENABLED=false), nothing to do");
            Ok(())
        }
        SyncOutcome::NotConfigured => Err(CliError::NotConfigured),
        SyncOutcome::Failed(reason) => Err(CliError::SyncFailed(reason)),
    }
}

/// Sync on the configured interval until shutdown is requested
pub async fn execute_run(cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
    let repository = Arc::new(JsonFileEventRepository::open(&cli.store).await?);
    let engine = Arc::new(cli.engine_with(repository.clone(), shutdown.clone())?);
    let interval = cli.config.auto_sync_interval();
    let scheduler = IntervalScheduler::new(engine, interval, shutdown.clone());
    scheduler.start()?;

    info!(
        interval_secs = interval.as_secs(),
        store = %cli.store.display(),
        "Sync scheduler running, press Ctrl+C to stop"
    );
    shutdown.wait_for_shutdown().await;
    scheduler.stop().await;

    let stored = repository.count().await?;
    match cli.output_format {
        OutputFormat::Human => println!("Stopped. {stored} events stored in {}", cli.store.display()),
        OutputFormat::Json => Cli::print_json(&json!({
            "stopped": true,
            "stored_events": stored,
            "store": cli.store.display().to_string(),
        }))?,
    }
    Ok(())
}

fn print_outcome(outcome: &SyncOutcome, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Human => {
            println!("{outcome}");
            Ok(())
        }
        OutputFormat::Json => {
            let mut value = json!({ "outcome": outcome.label() });
            if let Some(summary) = outcome.summary() {
                value["season"] = json!(summary.season_year);
                value["fetched"] = json!(summary.fetched);
                value["created"] = json!(summary.report.created);
                value["updated"] = json!(summary.report.updated);
                value["failed"] = json!(summary.report.failed);
                value["failed_queries"] = json!(summary.failed_queries);
                value["duration_ms"] = json!(summary.duration.as_millis() as u64);
            }
            if let SyncOutcome::Failed(reason) = outcome {
                value["reason"] = json!(reason);
            }
            Cli::print_json(&value)
        }
    }
}
