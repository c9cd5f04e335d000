use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Market suffix appended to numeric-family codes.
pub const NUMERIC_MARKET_SUFFIX: &str = ".HK";

const NUMERIC_CODE_WIDTH: usize = 4;

/// Exchange family an index's constituent codes belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolFamily {
    /// Numeric exchange codes, zero-padded to four digits plus a market suffix.
    Numeric,
    /// Alphabetic tickers, used unchanged.
    Alphabetic,
}

impl SymbolFamily {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Alphabetic => "alphabetic",
        }
    }

    /// Resolves a raw constituent code into the gateway symbol.
    ///
    /// Pure and offline: a malformed code is rejected here, before any
    /// network access is attempted.
    pub fn resolve(self, code: &str) -> Result<Symbol, ValidationError> {
        let reject = |reason: &'static str| ValidationError::InvalidSymbol {
            family: self,
            code: code.to_owned(),
            reason,
        };

        if code.is_empty() {
            return Err(reject("code is empty"));
        }

        match self {
            Self::Numeric => {
                if !code.chars().all(|ch| ch.is_ascii_digit()) {
                    return Err(reject("numeric code must contain only digits"));
                }
                if code.len() > NUMERIC_CODE_WIDTH {
                    return Err(reject("numeric code exceeds 4 digits"));
                }
                Ok(Symbol(format!(
                    "{code:0>width$}{NUMERIC_MARKET_SUFFIX}",
                    width = NUMERIC_CODE_WIDTH
                )))
            }
            Self::Alphabetic => {
                if !code.chars().all(|ch| ch.is_ascii_alphabetic()) {
                    return Err(reject("alphabetic code must contain only letters"));
                }
                Ok(Symbol(code.to_owned()))
            }
        }
    }
}

impl Display for SymbolFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolFamily {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "numeric" => Ok(Self::Numeric),
            "alphabetic" => Ok(Self::Alphabetic),
            other => Err(ValidationError::InvalidFamily {
                value: other.to_owned(),
            }),
        }
    }
}

/// Quote gateway symbol produced by [`SymbolFamily::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}
