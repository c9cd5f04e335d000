//! # Domain Models
//!
//! Canonical domain types for the momentum engine.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConstituentRecord`] | Index constituent: code, display name, weight |
//! | [`DailyBar`] | One trading session: date, open, close, volume |
//! | [`SymbolFamily`] | Numeric-code vs alphabetic-ticker exchange family |
//! | [`Symbol`] | Gateway symbol produced by symbol resolution |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! All types validate their invariants at construction time:
//!
//! ```rust
//! use momentick_core::{ConstituentRecord, SymbolFamily, ValidationError};
//!
//! let record = ConstituentRecord::new("5", "HSBC Holdings", 8.2).unwrap();
//! let symbol = SymbolFamily::Numeric.resolve(record.code()).unwrap();
//! assert_eq!(symbol.as_str(), "0005.HK");
//!
//! let err = SymbolFamily::Alphabetic.resolve("A1PL").unwrap_err();
//! assert!(matches!(err, ValidationError::InvalidSymbol { .. }));
//! ```

mod models;
mod symbol;
mod timestamp;

pub use models::{ConstituentRecord, DailyBar};
pub use symbol::{Symbol, SymbolFamily, NUMERIC_MARKET_SUFFIX};
pub use timestamp::UtcDateTime;
