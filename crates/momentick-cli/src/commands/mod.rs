mod baseline;
mod history;
mod resolve;
mod universe;
mod watch;

use std::io::{self, Write};
use std::sync::Arc;

use momentick_core::{
    find_index, CircuitBreakerConfig, IndexSpec, MomentumEngine, QuoteGateway, ReqwestHttpClient,
    StaticGateway, StaticUniverse, UniverseLoader, WorkbookUniverse, YahooGateway,
};

use crate::cli::{Cli, Command, OutputFormat};
use crate::config::AppConfig;
use crate::error::CliError;
use crate::output::{self, Report};

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub config: AppConfig,
    pub mock: bool,
    pub format: OutputFormat,
    pub pretty: bool,
}

impl Context {
    pub fn new(cli: &Cli, config: AppConfig) -> Self {
        Self {
            config,
            mock: cli.mock,
            format: cli.format,
            pretty: cli.pretty,
        }
    }

    pub fn gateway(&self) -> Arc<dyn QuoteGateway> {
        let engine_config = &self.config.engine;
        let gateway: Arc<dyn QuoteGateway> = if self.mock {
            Arc::new(StaticGateway::synthetic())
        } else {
            Arc::new(
                YahooGateway::new(Arc::new(ReqwestHttpClient::new()))
                    .with_circuit_breaker(CircuitBreakerConfig::from_engine(engine_config))
                    .with_request_timeout_ms(engine_config.fetch_timeout_ms),
            )
        };
        tracing::debug!(gateway = gateway.name(), "gateway selected");
        gateway
    }

    pub fn engine(&self) -> Result<MomentumEngine, CliError> {
        Ok(MomentumEngine::new(self.gateway(), self.config.engine.clone())?)
    }

    pub fn loader(&self) -> Result<Arc<dyn UniverseLoader>, CliError> {
        if self.mock {
            return Ok(Arc::new(StaticUniverse::demo()));
        }
        match &self.config.universe.workbook {
            Some(path) => Ok(Arc::new(WorkbookUniverse::new(path.clone()))),
            None => Err(CliError::MissingUniverse),
        }
    }

    pub fn index(&self, name: &str) -> Result<IndexSpec, CliError> {
        Ok(find_index(&self.config.universe.indices, name)?.clone())
    }

    pub fn emit(&self, report: &Report<'_>) -> Result<(), CliError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        output::render(report, self.format, self.pretty, &mut out)?;
        out.flush()?;
        Ok(())
    }
}

pub async fn run(cli: &Cli, config: AppConfig) -> Result<(), CliError> {
    let context = Context::new(cli, config);
    match &cli.command {
        Command::Universe(args) => universe::run(args, &context),
        Command::Resolve(args) => resolve::run(args, &context),
        Command::Baseline(args) => baseline::run(args, &context).await,
        Command::Watch(args) => watch::run(args, &context).await,
        Command::History(args) => history::run(args, &context).await,
    }
}
