use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;

/// Circuit state guarding a gateway's upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Failure threshold and open timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::from_engine(&EngineConfig::default())
    }
}

impl CircuitBreakerConfig {
    pub fn from_engine(config: &EngineConfig) -> Self {
        Self {
            failure_threshold: config.circuit_failure_threshold.max(1),
            open_timeout: config.circuit_open_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed,
    Open { since: Instant },
    HalfOpen,
}

#[derive(Debug)]
struct Tracker {
    phase: Phase,
    failures: u32,
}

/// Thread-safe circuit breaker shared by every fetch of one gateway.
///
/// While open, calls fail fast instead of each waiting out its own timeout
/// against an upstream that is already down.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    tracker: Mutex<Tracker>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            tracker: Mutex::new(Tracker {
                phase: Phase::Closed,
                failures: 0,
            }),
        }
    }

    /// Whether a call may go upstream. An open circuit past its timeout
    /// moves to half-open and lets trial requests through.
    pub fn allow_request(&self) -> bool {
        let mut tracker = self.tracker();
        let phase = tracker.phase;
        match phase {
            Phase::Closed | Phase::HalfOpen => true,
            Phase::Open { since } if since.elapsed() >= self.config.open_timeout => {
                tracing::debug!("gateway circuit half-open; allowing trial request");
                tracker.phase = Phase::HalfOpen;
                true
            }
            Phase::Open { .. } => false,
        }
    }

    pub fn record_success(&self) {
        let mut tracker = self.tracker();
        if !matches!(tracker.phase, Phase::Closed) {
            tracing::info!("gateway circuit closed after successful trial request");
        }
        tracker.phase = Phase::Closed;
        tracker.failures = 0;
    }

    pub fn record_failure(&self) {
        let mut tracker = self.tracker();
        tracker.failures = tracker.failures.saturating_add(1);

        let trips = match tracker.phase {
            Phase::HalfOpen => true,
            Phase::Closed => tracker.failures >= self.config.failure_threshold,
            Phase::Open { .. } => false,
        };
        if trips {
            tracing::warn!(
                consecutive_failures = tracker.failures,
                open_timeout_ms = self.config.open_timeout.as_millis() as u64,
                "gateway circuit opened"
            );
            tracker.phase = Phase::Open {
                since: Instant::now(),
            };
        }
    }

    pub fn state(&self) -> CircuitState {
        match self.tracker().phase {
            Phase::Closed => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen => CircuitState::HalfOpen,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.tracker().failures
    }

    fn tracker(&self) -> std::sync::MutexGuard<'_, Tracker> {
        self.tracker
            .lock()
            .expect("circuit breaker lock is not poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            open_timeout: Duration::from_millis(10),
        });

        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.allow_request());
    }

    #[test]
    fn failed_trial_reopens_and_successful_trial_closes() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            open_timeout: Duration::from_millis(1),
        });

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(2));
        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(2));
        assert!(breaker.allow_request());
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[test]
    fn takes_thresholds_from_engine_config() {
        let config = CircuitBreakerConfig::from_engine(&EngineConfig {
            circuit_failure_threshold: 7,
            circuit_open_secs: 2,
            ..EngineConfig::default()
        });
        assert_eq!(config.failure_threshold, 7);
        assert_eq!(config.open_timeout, Duration::from_secs(2));
    }
}
