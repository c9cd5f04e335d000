use thiserror::Error;

use crate::domain::SymbolFamily;
use crate::universe::UniverseError;

/// Validation and contract errors exposed by `momentick-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid {family} symbol code '{code}': {reason}")]
    InvalidSymbol {
        family: SymbolFamily,
        code: String,
        reason: &'static str,
    },
    #[error("invalid symbol family '{value}', expected one of numeric, alphabetic")]
    InvalidFamily { value: String },

    #[error("constituent code cannot be empty")]
    EmptyCode,
    #[error("constituent weight must be a positive finite number, got {value}")]
    InvalidWeight { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("unix timestamp {seconds} is outside the representable range")]
    TimestampOutOfRange { seconds: i64 },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
}

/// Errors surfaced by the engine's batch operations.
///
/// Per-constituent failures never appear here; they are folded into the
/// snapshot status of the affected row.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("index '{index}' has no baseline; run a baseline load first")]
    BaselineNotReady { index: String },

    #[error(transparent)]
    Universe(#[from] UniverseError),
}

impl EngineError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BaselineNotReady { .. } => "engine.baseline_not_ready",
            Self::Universe(_) => "engine.universe",
        }
    }
}
