//! `frc-sync` command line interface

use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::clock::SystemClock;
use crate::config::SyncConfig;
use crate::shutdown::SharedShutdown;
use crate::store::{InMemoryEventRepository, JsonFileEventRepository, SharedRepository};
use crate::sync::SyncEngine;

pub mod error;
pub mod query;
pub mod sync;
pub mod validate;

pub use error::CliError;
pub use query::{EventArgs, EventsArgs, RankingsArgs, TeamArgs};

/// Default JSON store location
pub const DEFAULT_STORE_PATH: &str = "frc-events.json";

/// Keep a local store of FRC competition events in sync with the FRC Events API
#[derive(Parser, Debug)]
#[command(name = "frc-sync", version, about, long_about = None)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// API, quota and scheduling settings
    #[command(flatten)]
    pub config: SyncConfig,

    /// JSON file the synchronized events are stored in
    #[arg(long, global = true, env = "FRC_STORE_PATH", default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    /// Output format (json or human)
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub output_format: OutputFormat,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long, global = true, env = "FRC_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one sync cycle and print the summary
    Sync,

    /// Sync on the configured interval until Ctrl+C
    Run,

    /// Check that the API accepts the configured credentials
    Validate,

    /// Fetch and print events without storing them
    Events(EventsArgs),

    /// Fetch and print one event
    Event(EventArgs),

    /// Fetch and print qualification rankings for an event
    Rankings(RankingsArgs),

    /// Fetch and print a team
    Team(TeamArgs),
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

impl Cli {
    /// Execute the selected command
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<(), CliError> {
        if let Some(addr) = self.metrics_addr {
            crate::metrics::init_metrics(addr)
                .await
                .map_err(|e| CliError::ConfigurationError(e.to_string()))?;
        }

        match &self.command {
            Commands::Sync => sync::execute_sync(self, shutdown).await,
            Commands::Run => sync::execute_run(self, shutdown).await,
            Commands::Validate => validate::execute(self, shutdown).await,
            Commands::Events(args) => args.execute(self, shutdown).await,
            Commands::Event(args) => args.execute(self, shutdown).await,
            Commands::Rankings(args) => args.execute(self, shutdown).await,
            Commands::Team(args) => args.execute(self, shutdown).await,
        }
    }

    /// Engine persisting to the `--store` file
    pub async fn persistent_engine(&self, shutdown: SharedShutdown) -> Result<SyncEngine, CliError> {
        let repository: SharedRepository = Arc::new(JsonFileEventRepository::open(&self.store).await?);
        self.engine_with(repository, shutdown)
    }

    /// Engine for read-only commands; nothing is persisted
    pub fn read_only_engine(&self, shutdown: SharedShutdown) -> Result<SyncEngine, CliError> {
        self.engine_with(Arc::new(InMemoryEventRepository::new()), shutdown)
    }

    /// Engine over `repository` using the parsed configuration
    pub fn engine_with(&self, repository: SharedRepository, shutdown: SharedShutdown) -> Result<SyncEngine, CliError> {
        if !self.config.is_configured() {
            return Err(CliError::NotConfigured);
        }
        Ok(SyncEngine::from_config_with(
            self.config.clone(),
            repository,
            Arc::new(SystemClock),
            shutdown,
        )?)
    }

    /// Print `value` as pretty JSON
    pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| CliError::OutputError(format!("failed to serialize output: {e}")))?;
        println!("{json}");
        Ok(())
    }
}
