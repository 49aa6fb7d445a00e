//! Support Search CLI
//!
//! Entry point for reindexing, index management and ad hoc searches.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use support_search::cli::{Cli, Command};
use support_search::commands::execute;
use support_search::{telemetry, Dependencies, Settings};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env().context("Failed to read settings")?;
    if let Some(url) = cli.opensearch_url.clone() {
        settings.engine.url = url;
    }
    if let Some(prefix) = cli.index_prefix.clone() {
        settings.index_prefix = prefix;
    }
    telemetry::init(settings.log_format)?;

    info!(command = ?cli.command, "Starting support-search");

    let deps = Dependencies::new(settings)
        .await
        .context("Failed to initialize dependencies")?;
    if !matches!(cli.command, Command::Health) {
        deps.verify_engine().await?;
    }

    let output = execute(cli.command, &deps).await.map_err(|e| {
        error!(error = %e, "Command failed");
        e
    })?;
    println!("{}", serde_json::to_string_pretty(&output.body)?);

    Ok(if output.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
