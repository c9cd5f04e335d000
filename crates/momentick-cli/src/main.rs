mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    let (mut config, source) = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    config.validate()?;

    init_tracing(&config.log.level);
    match &source {
        Some(path) => tracing::debug!(path = %path.display(), "config loaded"),
        None => tracing::debug!("no config file found; using defaults"),
    }

    commands::run(&cli, config).await
}

/// Logs go to stderr so table and JSON output stay clean on stdout.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
