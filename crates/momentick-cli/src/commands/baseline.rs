use std::sync::Arc;

use momentick_core::{EngineError, IndexSnapshotSet, IndexSpec, PresentationFrame};
use tokio::task::JoinSet;

use crate::cli::BaselineArgs;
use crate::error::CliError;
use crate::output::Report;

use super::Context;

/// Loads every requested index in parallel and prints one frame per index
/// that succeeded, in request order.
pub async fn run(args: &BaselineArgs, context: &Context) -> Result<(), CliError> {
    let specs: Vec<IndexSpec> = if args.indices.is_empty() {
        context.config.universe.indices.clone()
    } else {
        args.indices
            .iter()
            .map(|name| context.index(name))
            .collect::<Result<_, _>>()?
    };

    let engine = context.engine()?;
    let loader = context.loader()?;

    let mut tasks = JoinSet::new();
    for (slot, spec) in specs.iter().cloned().enumerate() {
        let engine = engine.clone();
        let loader = Arc::clone(&loader);
        tasks.spawn(async move {
            let result = engine.load_universe_baseline(loader.as_ref(), &spec).await;
            (slot, result)
        });
    }

    let mut results: Vec<Option<Result<Arc<IndexSnapshotSet>, EngineError>>> =
        (0..specs.len()).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, result)) => results[slot] = Some(result),
            Err(error) => tracing::error!(%error, "baseline task failed"),
        }
    }

    let mut frames = Vec::with_capacity(specs.len());
    let mut first_error = None;
    for (spec, result) in specs.iter().zip(results) {
        match result {
            Some(Ok(set)) => frames.push(PresentationFrame::from_set(&set)),
            Some(Err(error)) => {
                tracing::error!(index = %spec.name, %error, "baseline failed");
                first_error.get_or_insert(error);
            }
            None => {}
        }
    }

    context.emit(&Report::Frames(&frames))?;
    match first_error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
