use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::gateway::{GatewayError, GatewayFuture, HistoryRequest, QuoteGateway};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{DailyBar, Symbol, UtcDateTime};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Quote gateway backed by Yahoo's public v8 chart endpoint.
///
/// Every call passes through a shared circuit breaker; while the circuit is
/// open the gateway fails fast with `Unavailable`.
#[derive(Clone)]
pub struct YahooGateway {
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
    request_timeout_ms: u64,
}

impl Default for YahooGateway {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooGateway {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::default()),
            base_url: String::from(DEFAULT_BASE_URL),
            request_timeout_ms: 10_000,
        }
    }

    pub fn with_circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = Arc::new(CircuitBreaker::new(config));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    fn chart_url(&self, symbol: &Symbol, range: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d",
            self.base_url,
            urlencoding::encode(symbol.as_str()),
            range
        )
    }

    async fn fetch_chart(&self, symbol: &Symbol, range: &str) -> Result<Vec<DailyBar>, GatewayError> {
        if !self.circuit_breaker.allow_request() {
            return Err(GatewayError::unavailable(
                "yahoo circuit breaker is open; skipping upstream call",
            ));
        }

        let request = HttpRequest::get(self.chart_url(symbol, range))
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout_ms(self.request_timeout_ms);

        // Bounded here so a hung upstream is counted before any caller drops us.
        let outcome = tokio::time::timeout(
            Duration::from_millis(self.request_timeout_ms),
            self.http_client.get(request),
        )
        .await;
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                self.circuit_breaker.record_failure();
                return Err(if error.is_timeout() {
                    GatewayError::timeout(format!("yahoo request for {symbol} timed out"))
                } else {
                    GatewayError::unavailable(format!("yahoo transport error: {}", error.message()))
                });
            }
            Err(_) => {
                self.circuit_breaker.record_failure();
                return Err(GatewayError::timeout(format!(
                    "yahoo request for {symbol} exceeded {}ms",
                    self.request_timeout_ms
                )));
            }
        };

        // 404 means an unknown symbol; the upstream itself is healthy.
        if response.status == 404 {
            self.circuit_breaker.record_success();
            return Ok(Vec::new());
        }
        if !response.is_success() {
            self.circuit_breaker.record_failure();
            return Err(GatewayError::unavailable(format!(
                "yahoo returned status {} for {symbol}",
                response.status
            )));
        }
        self.circuit_breaker.record_success();

        parse_chart(&response.body)
    }
}

impl QuoteGateway for YahooGateway {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> GatewayFuture<'a, Vec<DailyBar>> {
        Box::pin(async move {
            let bars = self
                .fetch_chart(&req.symbol, range_for_bars(req.min_bars))
                .await?;
            tracing::trace!(symbol = %req.symbol, bars = bars.len(), "yahoo history fetched");
            Ok(bars)
        })
    }

    fn fetch_latest<'a>(&'a self, symbol: &'a Symbol) -> GatewayFuture<'a, Option<DailyBar>> {
        Box::pin(async move {
            let mut bars = self.fetch_chart(symbol, "5d").await?;
            Ok(bars.pop())
        })
    }
}

/// Smallest chart range that covers `min_bars` trading sessions.
fn range_for_bars(min_bars: usize) -> &'static str {
    match min_bars {
        0..=4 => "5d",
        5..=18 => "1mo",
        19..=55 => "3mo",
        56..=115 => "6mo",
        116..=240 => "1y",
        241..=490 => "2y",
        _ => "5y",
    }
}

fn parse_chart(body: &str) -> Result<Vec<DailyBar>, GatewayError> {
    let chart_response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = chart_response.chart.error {
        return Err(GatewayError::unavailable(format!(
            "yahoo chart API error: {}",
            error.description.unwrap_or(error.code)
        )));
    }

    let Some(result) = chart_response.chart.result.into_iter().flatten().next() else {
        return Ok(Vec::new());
    };
    let Some(timestamps) = result.timestamp else {
        return Ok(Vec::new());
    };
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, seconds) in timestamps.into_iter().enumerate() {
        let open = quote.open.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();

        // Sessions with a missing field are holidays or suspensions.
        let (Some(open), Some(close), Some(volume)) = (open, close, volume) else {
            continue;
        };
        let volume = if volume.is_sign_negative() { 0 } else { volume as u64 };

        let date = UtcDateTime::from_unix_timestamp(seconds)
            .map_err(|e| GatewayError::internal(format!("invalid chart timestamp: {e}")))?;
        match DailyBar::new(date, open, close, volume) {
            Ok(bar) => bars.push(bar),
            Err(error) => {
                tracing::debug!(%error, timestamp = seconds, "skipping malformed yahoo bar");
            }
        }
    }

    Ok(bars)
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}
