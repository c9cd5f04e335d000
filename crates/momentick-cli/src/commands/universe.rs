use crate::cli::UniverseArgs;
use crate::error::CliError;
use crate::output::Report;

use super::Context;

pub fn run(args: &UniverseArgs, context: &Context) -> Result<(), CliError> {
    let Some(name) = &args.index else {
        return context.emit(&Report::Indices(&context.config.universe.indices));
    };

    let spec = context.index(name)?;
    let constituents = context.loader()?.load_universe(&spec.name)?;
    context.emit(&Report::Universe {
        index: &spec.name,
        constituents: &constituents,
    })
}
