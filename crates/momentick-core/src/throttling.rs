use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::config::EngineConfig;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared rate budget for gateway calls.
///
/// The engine waits on [`RateGate::acquire`] before each fetch, so a batch
/// larger than the quota is paced rather than rejected.
#[derive(Clone)]
pub struct RateGate {
    limiter: Arc<DirectRateLimiter>,
    quota_limit: u32,
    quota_window: Duration,
}

impl RateGate {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                quota_window,
                quota_limit,
            ))),
            quota_limit: quota_limit.max(1),
            quota_window,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.quota_window(), config.quota_limit)
    }

    /// Waits until one unit of budget is available.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Takes budget without waiting; `false` when the budget is exhausted.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub fn quota_limit(&self) -> u32 {
        self.quota_limit
    }

    pub fn quota_window(&self) -> Duration {
        self.quota_window
    }
}

impl std::fmt::Debug for RateGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGate")
            .field("quota_limit", &self.quota_limit)
            .field("quota_window", &self.quota_window)
            .finish()
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let safe_limit = quota_limit.max(1);
    let burst = NonZeroU32::new(safe_limit).expect("safe limit must be non-zero");

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(burst)
}
