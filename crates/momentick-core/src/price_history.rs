//! Single-stock daily history with 20/50/200-session EMAs.
//!
//! Averages are computed over the full lookback, then only the most recent
//! window is kept for display so the long EMA is already warmed up.

use std::time::Duration;

use serde::Serialize;

use crate::gateway::{GatewayError, HistoryRequest, QuoteGateway};
use crate::metrics;
use crate::{DailyBar, Symbol, UtcDateTime};

/// Sessions requested from the gateway, roughly three years.
pub const LOOKBACK_SESSIONS: usize = 756;

/// Calendar days kept for display, counted back from `as_of`.
pub const DISPLAY_DAYS: i64 = 200;

/// One displayed session with its moving averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub date: UtcDateTime,
    pub open: f64,
    pub close: f64,
    pub volume: u64,
    pub ema_20: f64,
    pub ema_50: f64,
    pub ema_200: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistory {
    pub symbol: String,
    pub title: String,
    /// Sessions available before trimming to the display window.
    pub sessions: usize,
    pub points: Vec<HistoryPoint>,
}

impl PriceHistory {
    /// Builds the display window from bars ordered oldest first.
    pub fn from_bars(symbol: &Symbol, bars: &[DailyBar], as_of: UtcDateTime) -> Self {
        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        let ema_20 = metrics::ema(&closes, 20);
        let ema_50 = metrics::ema(&closes, 50);
        let ema_200 = metrics::ema(&closes, 200);

        let cutoff = as_of.into_inner() - time::Duration::days(DISPLAY_DAYS);
        let points = bars
            .iter()
            .enumerate()
            .filter(|(_, bar)| bar.date.into_inner() >= cutoff)
            .map(|(i, bar)| HistoryPoint {
                date: bar.date,
                open: bar.open,
                close: bar.close,
                volume: bar.volume,
                ema_20: metrics::round2(ema_20[i]),
                ema_50: metrics::round2(ema_50[i]),
                ema_200: metrics::round2(ema_200[i]),
            })
            .collect();

        Self {
            symbol: symbol.to_string(),
            title: format!("{symbol} Stock Price and EMA 20/50/200"),
            sessions: bars.len(),
            points,
        }
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.last()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Fetches the lookback for `symbol` and builds its display window.
///
/// An empty history is not an error; the result simply has no points.
pub async fn load_price_history(
    gateway: &dyn QuoteGateway,
    symbol: Symbol,
    timeout: Duration,
) -> Result<PriceHistory, GatewayError> {
    let request = HistoryRequest::new(symbol.clone(), LOOKBACK_SESSIONS)?;
    let bars = tokio::time::timeout(timeout, gateway.fetch_history(request))
        .await
        .unwrap_or_else(|_| {
            Err(GatewayError::timeout(format!(
                "history fetch exceeded {}ms",
                timeout.as_millis()
            )))
        })?;
    tracing::debug!(%symbol, sessions = bars.len(), "price history fetched");
    Ok(PriceHistory::from_bars(&symbol, &bars, UtcDateTime::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticGateway;
    use crate::SymbolFamily;

    const DAY: i64 = 86_400;
    const START: i64 = 1_704_067_200;

    fn bar(day: i64, close: f64) -> DailyBar {
        let date = UtcDateTime::from_unix_timestamp(START + day * DAY).expect("valid timestamp");
        DailyBar::new(date, close, close, 1_000).expect("valid bar")
    }

    fn symbol(code: &str) -> Symbol {
        SymbolFamily::Numeric.resolve(code).expect("valid symbol")
    }

    #[test]
    fn keeps_only_the_display_window_with_warm_averages() {
        // Given: 300 daily sessions, flat at 10 then stepping up to 20
        let bars: Vec<DailyBar> = (0..300)
            .map(|day| bar(day, if day < 250 { 10.0 } else { 20.0 }))
            .collect();
        let as_of = bars[299].date;

        // When
        let history = PriceHistory::from_bars(&symbol("700"), &bars, as_of);

        // Then: Only the last 200 calendar days plus the boundary session are shown
        assert_eq!(history.sessions, 300);
        assert_eq!(history.points.len(), 201);
        assert_eq!(history.points[0].date, bars[99].date);
        assert_eq!(history.points[0].ema_200, 10.0);
        assert_eq!(history.title, "0700.HK Stock Price and EMA 20/50/200");

        // The short average reacts fastest to the step
        let latest = history.latest().expect("point");
        assert_eq!(latest.close, 20.0);
        assert!(latest.ema_20 > latest.ema_50);
        assert!(latest.ema_50 > latest.ema_200);
        assert!(latest.ema_200 > 10.0);
    }

    #[test]
    fn ema_values_match_hand_computation() {
        let bars = [bar(0, 10.0), bar(1, 31.0)];
        let history = PriceHistory::from_bars(&symbol("5"), &bars, bars[1].date);

        // alpha = 2/21, 2/51, 2/201 applied to a single step of 21
        let point = &history.points[1];
        assert_eq!(point.ema_20, 12.0);
        assert_eq!(point.ema_50, 10.82);
        assert_eq!(point.ema_200, 10.21);
    }

    #[tokio::test]
    async fn loads_through_the_gateway() {
        let gateway = StaticGateway::synthetic();
        let history = load_price_history(&gateway, symbol("388"), Duration::from_secs(1))
            .await
            .expect("history");

        assert_eq!(history.sessions, LOOKBACK_SESSIONS);
        assert!(!history.is_empty());
        assert!(history.points.len() < LOOKBACK_SESSIONS);
        assert_eq!(gateway.history_calls(), 1);
    }

    #[tokio::test]
    async fn empty_history_has_no_points() {
        let gateway = StaticGateway::new();
        let history = load_price_history(&gateway, symbol("9999"), Duration::from_secs(1))
            .await
            .expect("empty is not an error");
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }
}
