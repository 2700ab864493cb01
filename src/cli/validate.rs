//! `validate` command

use serde_json::json;

use super::{Cli, CliError, OutputFormat};
use crate::shutdown::SharedShutdown;

/// Probe the API with the configured credentials. Fails when the probe
/// fails so scripts can check the exit status.
pub async fn execute(cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
    let engine = cli.read_only_engine(shutdown)?;
    let base_url = cli.config.normalized_base_url();
    let ok = engine.validate_connection().await;

    match cli.output_format {
        OutputFormat::Json => Cli::print_json(&json!({
            "base_url": base_url,
            "season": cli.config.season_year,
            "valid": ok,
        }))?,
        OutputFormat::Human if ok => println!("Connection to {base_url} OK"),
        OutputFormat::Human => eprintln!("Connection to {base_url} failed"),
    }

    if ok {
        Ok(())
    } else {
        Err(CliError::ValidationFailed(format!(
            "{base_url} rejected the request or was unreachable"
        )))
    }
}
