use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::gateway::{GatewayError, GatewayFuture, HistoryRequest, QuoteGateway};
use crate::{DailyBar, Symbol, UtcDateTime};

#[derive(Debug, Clone, Default)]
struct SymbolScript {
    history: Option<Result<Vec<DailyBar>, GatewayError>>,
    latest: Option<Result<Option<DailyBar>, GatewayError>>,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct CallCounters {
    history: AtomicUsize,
    latest: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    per_symbol: Mutex<HashMap<String, usize>>,
}

/// Deterministic in-memory gateway for offline runs and tests.
///
/// Responses are scripted per gateway symbol (`"0005.HK"`, `"AAPL"`).
/// Unscripted symbols return an empty history and no latest bar, unless a
/// synthetic fallback is enabled. Scripts can be changed between calls,
/// and every call is counted.
#[derive(Debug, Clone, Default)]
pub struct StaticGateway {
    scripts: Arc<Mutex<HashMap<String, SymbolScript>>>,
    counters: Arc<CallCounters>,
    synthetic: bool,
}

impl StaticGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway that invents a stable series for any unscripted symbol.
    pub fn synthetic() -> Self {
        Self {
            synthetic: true,
            ..Self::default()
        }
    }

    pub fn with_history(self, symbol: &str, bars: Vec<DailyBar>) -> Self {
        self.edit(symbol, |script| script.history = Some(Ok(bars)));
        self
    }

    pub fn with_history_error(self, symbol: &str, error: GatewayError) -> Self {
        self.edit(symbol, |script| script.history = Some(Err(error)));
        self
    }

    pub fn with_latest(self, symbol: &str, bar: DailyBar) -> Self {
        self.set_latest(symbol, Some(bar));
        self
    }

    pub fn with_latest_error(self, symbol: &str, error: GatewayError) -> Self {
        self.fail_latest(symbol, error);
        self
    }

    /// Delays every response for `symbol`, e.g. to trip a fetch timeout.
    pub fn with_delay(self, symbol: &str, delay: Duration) -> Self {
        self.edit(symbol, |script| script.delay = Some(delay));
        self
    }

    pub fn set_latest(&self, symbol: &str, bar: Option<DailyBar>) {
        self.edit(symbol, |script| script.latest = Some(Ok(bar)));
    }

    pub fn fail_latest(&self, symbol: &str, error: GatewayError) {
        self.edit(symbol, |script| script.latest = Some(Err(error)));
    }

    pub fn history_calls(&self) -> usize {
        self.counters.history.load(Ordering::SeqCst)
    }

    pub fn latest_calls(&self) -> usize {
        self.counters.latest.load(Ordering::SeqCst)
    }

    /// Calls of either kind made for `symbol`.
    pub fn calls_for(&self, symbol: &str) -> usize {
        self.counters
            .per_symbol
            .lock()
            .expect("call counter lock is not poisoned")
            .get(symbol)
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }

    fn edit(&self, symbol: &str, apply: impl FnOnce(&mut SymbolScript)) {
        let mut scripts = self
            .scripts
            .lock()
            .expect("script lock is not poisoned");
        apply(scripts.entry(symbol.to_owned()).or_default());
    }

    fn script(&self, symbol: &Symbol) -> SymbolScript {
        self.scripts
            .lock()
            .expect("script lock is not poisoned")
            .get(symbol.as_str())
            .cloned()
            .unwrap_or_default()
    }

    fn enter(&self, symbol: &Symbol) -> InFlight<'_> {
        *self
            .counters
            .per_symbol
            .lock()
            .expect("call counter lock is not poisoned")
            .entry(symbol.as_str().to_owned())
            .or_default() += 1;

        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.counters)
    }
}

/// Decrements the in-flight gauge even when the call future is dropped
/// by a timeout.
struct InFlight<'a>(&'a CallCounters);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl QuoteGateway for StaticGateway {
    fn name(&self) -> &'static str {
        "static"
    }

    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> GatewayFuture<'a, Vec<DailyBar>> {
        Box::pin(async move {
            self.counters.history.fetch_add(1, Ordering::SeqCst);
            let _guard = self.enter(&req.symbol);
            let script = self.script(&req.symbol);
            if let Some(delay) = script.delay {
                tokio::time::sleep(delay).await;
            }

            match script.history {
                Some(result) => result,
                None if self.synthetic => Ok(synthetic_history(&req.symbol, req.min_bars)),
                None => Ok(Vec::new()),
            }
        })
    }

    fn fetch_latest<'a>(&'a self, symbol: &'a Symbol) -> GatewayFuture<'a, Option<DailyBar>> {
        Box::pin(async move {
            self.counters.latest.fetch_add(1, Ordering::SeqCst);
            let _guard = self.enter(symbol);
            let script = self.script(symbol);
            if let Some(delay) = script.delay {
                tokio::time::sleep(delay).await;
            }

            match script.latest {
                Some(result) => result,
                None if self.synthetic => Ok(Some(synthetic_latest(symbol))),
                None => Ok(None),
            }
        })
    }
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol
        .as_str()
        .bytes()
        .fold(0_u64, |acc, byte| acc.wrapping_mul(33).wrapping_add(byte as u64))
}

fn session_date(sessions_ago: usize) -> UtcDateTime {
    let today = UtcDateTime::now().date();
    let date = today
        .checked_sub(time::Duration::days(sessions_ago as i64))
        .unwrap_or(today);
    UtcDateTime::start_of_day(date)
}

fn synthetic_bar(seed: u64, index: u64, sessions_ago: usize) -> DailyBar {
    let close = 20.0 + (seed % 300) as f64 + ((seed + index * 7) % 40) as f64 / 10.0;
    let volume = 20_000 + (seed.wrapping_add(index * 13) % 5_000) * 4;
    DailyBar {
        date: session_date(sessions_ago),
        open: close - 0.30,
        close,
        volume,
    }
}

/// `min_bars` sessions ending today, oldest first.
fn synthetic_history(symbol: &Symbol, min_bars: usize) -> Vec<DailyBar> {
    let seed = symbol_seed(symbol);
    (0..min_bars)
        .map(|index| synthetic_bar(seed, index as u64, min_bars - 1 - index))
        .collect()
}

fn synthetic_latest(symbol: &Symbol) -> DailyBar {
    let seed = symbol_seed(symbol);
    let mut bar = synthetic_bar(seed, 1_000, 0);
    // Spread the ratios so every bucket shows up across a universe.
    bar.volume = bar.volume * (seed % 13 + 1) / 2;
    bar
}
