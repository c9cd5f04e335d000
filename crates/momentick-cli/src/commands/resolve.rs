use momentick_core::{SymbolFamily, ValidationError};

use crate::cli::ResolveArgs;
use crate::error::CliError;
use crate::output::{Report, Resolution};

use super::Context;

/// Prints every resolution, then fails with the first rejected code.
pub fn run(args: &ResolveArgs, context: &Context) -> Result<(), CliError> {
    let family = SymbolFamily::from(args.family);
    let mut first_error: Option<ValidationError> = None;

    let resolutions: Vec<Resolution> = args
        .codes
        .iter()
        .map(|code| match family.resolve(code.trim()) {
            Ok(symbol) => Resolution {
                code: code.clone(),
                symbol: Some(symbol.to_string()),
                error: None,
            },
            Err(error) => {
                let message = error.to_string();
                first_error.get_or_insert(error);
                Resolution {
                    code: code.clone(),
                    symbol: None,
                    error: Some(message),
                }
            }
        })
        .collect();

    context.emit(&Report::Resolutions(&resolutions))?;
    match first_error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
