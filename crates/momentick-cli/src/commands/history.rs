use momentick_core::{load_price_history, SymbolFamily};

use crate::cli::HistoryArgs;
use crate::error::CliError;
use crate::output::Report;

use super::Context;

pub async fn run(args: &HistoryArgs, context: &Context) -> Result<(), CliError> {
    let symbol = SymbolFamily::from(args.family).resolve(args.code.trim())?;
    let gateway = context.gateway();
    let history = load_price_history(
        gateway.as_ref(),
        symbol,
        context.config.engine.fetch_deadline(),
    )
    .await?;
    if history.is_empty() {
        tracing::warn!(symbol = %history.symbol, "no sessions returned");
    }
    context.emit(&Report::History(&history))
}
