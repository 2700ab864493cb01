//! Read-only commands: `events`, `event`, `rankings`, `team`
//!
//! These fetch straight from the API and print; nothing is written to the
//! store.

use clap::Args;
use tracing::info;

use super::{Cli, CliError, OutputFormat};
use crate::shutdown::SharedShutdown;

/// `events` arguments
#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Only events this team is registered for
    #[arg(long)]
    pub team: Option<u32>,
}

impl EventsArgs {
    /// Fetch and print events for the configured season
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let engine = cli.read_only_engine(shutdown)?;
        let mut events = engine.preview_events(self.team).await?;
        events.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.event_code.cmp(&b.event_code)));
        info!(count = events.len(), team = self.team, "Fetched events");

        match cli.output_format {
            OutputFormat::Json => Cli::print_json(&events),
            OutputFormat::Human => {
                println!("Found {} events for season {}:\n", events.len(), cli.config.season_year);
                for event in &events {
                    let dates = match (event.start_date, event.end_date) {
                        (Some(start), Some(end)) => format!("{start} to {end}"),
                        (Some(start), None) => start.to_string(),
                        _ => "dates TBA".to_string(),
                    };
                    println!(
                        "{:<10} | {:<21} | {} | {}",
                        event.event_code,
                        event.event_type.display_name(),
                        dates,
                        event.full_display_name()
                    );
                }
                Ok(())
            }
        }
    }
}

/// `event` arguments
#[derive(Args, Debug)]
pub struct EventArgs {
    /// Event code (e.g. CASJ)
    pub event_code: String,
}

impl EventArgs {
    /// Fetch and print one event in the configured season
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let engine = cli.read_only_engine(shutdown)?;
        let event = engine.event(&self.event_code).await?;

        match (cli.output_format, event) {
            (OutputFormat::Json, event) => Cli::print_json(&event),
            (OutputFormat::Human, None) => {
                println!("Event {} not found in season {}", self.event_code, cli.config.season_year);
                Ok(())
            }
            (OutputFormat::Human, Some(event)) => {
                println!("{} {}: {}", event.season_year, event.event_code, event.name);
                println!("  Type: {}", event.event_type.display_name());
                if let (Some(start), Some(end)) = (event.start_date, event.end_date) {
                    println!("  Dates: {start} to {end}");
                }
                if let Some(venue) = &event.venue {
                    println!("  Venue: {venue}");
                }
                if event.team_count > 0 {
                    println!("  Teams: {}", event.team_count);
                }
                if let Some(stream) = &event.live_stream_url {
                    println!("  Stream: {stream}");
                }
                Ok(())
            }
        }
    }
}

/// `rankings` arguments
#[derive(Args, Debug)]
pub struct RankingsArgs {
    /// Event code (e.g. CASJ)
    pub event_code: String,
}

impl RankingsArgs {
    /// Fetch and print the event's qualification rankings
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let engine = cli.read_only_engine(shutdown)?;
        let mut rankings = engine.event_rankings(&self.event_code).await?;
        rankings.sort_by_key(|r| r.rank);

        match cli.output_format {
            OutputFormat::Json => Cli::print_json(&rankings),
            OutputFormat::Human => {
                if rankings.is_empty() {
                    println!("No rankings for {} in season {}", self.event_code, cli.config.season_year);
                    return Ok(());
                }
                println!("{:>4}  {:>6}  {:>8}  {:>6}", "Rank", "Team", "W-L-T", "RP");
                for ranking in &rankings {
                    let points = ranking
                        .ranking_points
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:>4}  {:>6}  {:>8}  {:>6}",
                        ranking.rank,
                        ranking.team_number,
                        format!("{}-{}-{}", ranking.wins, ranking.losses, ranking.ties),
                        points
                    );
                }
                Ok(())
            }
        }
    }
}

/// `team` arguments
#[derive(Args, Debug)]
pub struct TeamArgs {
    /// Team number
    pub number: u32,
}

impl TeamArgs {
    /// Fetch and print one team
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let engine = cli.read_only_engine(shutdown)?;
        let team = engine.team(self.number).await?;

        match (cli.output_format, team) {
            (OutputFormat::Json, team) => Cli::print_json(&team),
            (OutputFormat::Human, None) => {
                println!("Team {} not found", self.number);
                Ok(())
            }
            (OutputFormat::Human, Some(team)) => {
                println!("Team {}: {}", team.team_number, team.display_name());
                if let Some(full) = &team.name_full {
                    println!("  Name: {full}");
                }
                let place: Vec<&str> = [&team.city, &team.state_province, &team.country]
                    .into_iter()
                    .filter_map(|s| s.as_deref())
                    .collect();
                if !place.is_empty() {
                    println!("  From: {}", place.join(", "));
                }
                if let Some(year) = team.rookie_year {
                    println!("  Rookie year: {year}");
                }
                if let Some(robot) = &team.robot_name {
                    println!("  Robot: {robot}");
                }
                if let Some(website) = &team.website {
                    println!("  Website: {website}");
                }
                Ok(())
            }
        }
    }
}
