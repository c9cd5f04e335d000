use std::time::Duration;

use momentick_core::PresentationFrame;

use crate::cli::WatchArgs;
use crate::error::CliError;
use crate::output::Report;

use super::Context;

/// Baseline once, then refresh intraday every `interval_secs` until
/// `cycles` refreshes ran or Ctrl-C arrives.
pub async fn run(args: &WatchArgs, context: &Context) -> Result<(), CliError> {
    let spec = context.index(&args.index)?;
    let engine = context.engine()?;
    let loader = context.loader()?;

    let baseline = engine.load_universe_baseline(loader.as_ref(), &spec).await?;
    context.emit(&Report::Frames(&[PresentationFrame::from_set(&baseline)]))?;

    let interval = Duration::from_secs(args.interval_secs);
    for cycle in 1..=args.cycles {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(index = %spec.name, cycle, "interrupted; stopping watch");
                return Ok(());
            }
        }

        let refreshed = engine.refresh_intraday(&spec.name).await?;
        tracing::debug!(index = %spec.name, cycle, cycles = args.cycles, "intraday cycle finished");
        context.emit(&Report::Frames(&[PresentationFrame::from_set(&refreshed)]))?;
    }
    Ok(())
}
