//! Quote gateway trait and request/error types.
//!
//! The engine depends only on this contract; adapters under
//! [`crate::adapters`] implement it.
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | [`fetch_history`](QuoteGateway::fetch_history) | [`HistoryRequest`] | daily bars, oldest first |
//! | [`fetch_latest`](QuoteGateway::fetch_latest) | [`Symbol`] | most recent bar, if any |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{DailyBar, Symbol};

/// Boxed future returned by gateway operations.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Gateway-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    Unavailable,
    Timeout,
    InvalidRequest,
    Internal,
}

/// Structured gateway error.
///
/// The engine never propagates these out of a batch: they downgrade the
/// affected row only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    kind: GatewayErrorKind,
    message: String,
    retryable: bool,
}

impl GatewayError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: GatewayErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: GatewayErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: GatewayErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: GatewayErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> GatewayErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            GatewayErrorKind::Unavailable => "gateway.unavailable",
            GatewayErrorKind::Timeout => "gateway.timeout",
            GatewayErrorKind::InvalidRequest => "gateway.invalid_request",
            GatewayErrorKind::Internal => "gateway.internal",
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for GatewayError {}

/// Request for a daily history window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub min_bars: usize,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, min_bars: usize) -> Result<Self, GatewayError> {
        if min_bars == 0 {
            return Err(GatewayError::invalid_request(
                "history request must ask for at least one bar",
            ));
        }
        Ok(Self { symbol, min_bars })
    }
}

/// Quote gateway contract.
///
/// Implementations must be `Send + Sync`; the engine shares one gateway
/// across all concurrent per-constituent fetches.
pub trait QuoteGateway: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fetches daily bars ordered by date, oldest first.
    ///
    /// A short or empty result is not an error; the caller decides whether
    /// the history is sufficient.
    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> GatewayFuture<'a, Vec<DailyBar>>;

    /// Fetches the single most recent bar, `None` if the gateway has none.
    fn fetch_latest<'a>(&'a self, symbol: &'a Symbol) -> GatewayFuture<'a, Option<DailyBar>>;
}
