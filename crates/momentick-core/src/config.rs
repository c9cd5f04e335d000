//! Engine configuration.
//!
//! Every field has a default so a partial JSON document is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::MIN_HISTORY_BARS;

/// Slack between a gateway's own request timeout and the engine's deadline.
pub const FETCH_DEADLINE_GRACE: Duration = Duration::from_millis(250);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value for '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Tuning knobs for the momentum engine and its gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bars requested for a baseline pass.
    pub history_bars: usize,
    /// Maximum in-flight gateway fetches per batch.
    pub max_concurrency: usize,
    /// Per-fetch timeout in milliseconds.
    pub fetch_timeout_ms: u64,
    /// Rate budget window in seconds.
    pub quota_window_secs: u64,
    /// Gateway calls allowed per window.
    pub quota_limit: u32,
    /// Consecutive transport failures before the circuit opens.
    pub circuit_failure_threshold: u32,
    /// Seconds the circuit stays open before a trial request is allowed.
    pub circuit_open_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_bars: MIN_HISTORY_BARS,
            max_concurrency: 8,
            fetch_timeout_ms: 10_000,
            quota_window_secs: 60,
            quota_limit: 120,
            circuit_failure_threshold: 5,
            circuit_open_secs: 30,
        }
    }
}

impl EngineConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Outer bound the engine puts on one gateway call. It sits past
    /// `fetch_timeout` so a gateway enforcing its own request timeout
    /// always finishes the call first.
    pub fn fetch_deadline(&self) -> Duration {
        self.fetch_timeout() + FETCH_DEADLINE_GRACE
    }

    pub fn quota_window(&self) -> Duration {
        Duration::from_secs(self.quota_window_secs)
    }

    pub fn circuit_open_timeout(&self) -> Duration {
        Duration::from_secs(self.circuit_open_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_bars < MIN_HISTORY_BARS {
            return Err(ConfigError::Invalid {
                field: "history_bars",
                reason: format!("must be at least {MIN_HISTORY_BARS}"),
            });
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrency",
                reason: String::from("must be greater than zero"),
            });
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "fetch_timeout_ms",
                reason: String::from("must be greater than zero"),
            });
        }
        if self.quota_window_secs == 0 || self.quota_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "quota",
                reason: String::from("window and limit must be greater than zero"),
            });
        }
        if self.circuit_failure_threshold == 0 {
            return Err(ConfigError::Invalid {
                field: "circuit_failure_threshold",
                reason: String::from("must be greater than zero"),
            });
        }
        Ok(())
    }
}
