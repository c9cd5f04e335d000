use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use momentick_core::{
    CircuitBreakerConfig, CircuitState, DailyBar, GatewayErrorKind, HistoryRequest, HttpClient,
    HttpError, HttpFuture, HttpRequest, HttpResponse, QuoteGateway, StaticGateway, Symbol,
    SymbolFamily, UtcDateTime, YahooGateway,
};
use serde_json::json;

const DAY: i64 = 86_400;
const START: i64 = 1_704_067_200;
const SESSIONS: i64 = 12;

fn symbol(code: &str) -> Symbol {
    SymbolFamily::Alphabetic.resolve(code).expect("valid symbol")
}

fn bar(day: i64) -> DailyBar {
    let date = UtcDateTime::from_unix_timestamp(START + day * DAY).expect("valid timestamp");
    let close = 100.0 + day as f64;
    DailyBar::new(date, close - 0.5, close, 1_000 + day as u64).expect("valid bar")
}

fn chart_body(days: i64) -> String {
    let timestamps: Vec<i64> = (0..days).map(|day| START + day * DAY).collect();
    let closes: Vec<f64> = (0..days).map(|day| 100.0 + day as f64).collect();
    let opens: Vec<f64> = closes.iter().map(|close| close - 0.5).collect();
    let volumes: Vec<u64> = (0..days).map(|day| 1_000 + day as u64).collect();
    json!({
        "chart": {
            "result": [{
                "timestamp": timestamps,
                "indicators": { "quote": [{ "open": opens, "close": closes, "volume": volumes }] }
            }],
            "error": null
        }
    })
    .to_string()
}

/// Serves canned chart bodies by symbol and 404 for everything else.
#[derive(Default)]
struct ChartHttpClient {
    bodies: HashMap<String, Result<HttpResponse, HttpError>>,
    urls: Mutex<Vec<String>>,
}

impl ChartHttpClient {
    fn with_chart(mut self, symbol: &str, body: String) -> Self {
        self.bodies
            .insert(symbol.to_owned(), Ok(HttpResponse::ok_json(body)));
        self
    }

    fn with_response(mut self, symbol: &str, response: Result<HttpResponse, HttpError>) -> Self {
        self.bodies.insert(symbol.to_owned(), response);
        self
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().expect("url log is not poisoned").clone()
    }
}

impl HttpClient for ChartHttpClient {
    fn get<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        self.urls
            .lock()
            .expect("url log is not poisoned")
            .push(request.url.clone());
        let response = self
            .bodies
            .iter()
            .find(|(symbol, _)| request.url.contains(&format!("/chart/{symbol}?")))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| Ok(HttpResponse::with_status(404, "")));
        Box::pin(async move { response })
    }
}

struct GatewayCase {
    name: &'static str,
    gateway: Arc<dyn QuoteGateway>,
}

fn gateway_cases() -> Vec<GatewayCase> {
    let history: Vec<DailyBar> = (0..SESSIONS).map(bar).collect();
    let http = ChartHttpClient::default().with_chart("AAPL", chart_body(SESSIONS));

    vec![
        GatewayCase {
            name: "static",
            gateway: Arc::new(
                StaticGateway::new()
                    .with_history("AAPL", history)
                    .with_latest("AAPL", bar(SESSIONS)),
            ),
        },
        GatewayCase {
            name: "yahoo",
            gateway: Arc::new(YahooGateway::new(Arc::new(http))),
        },
    ]
}

// =============================================================================
// Shared contract
// =============================================================================

#[tokio::test]
async fn history_is_oldest_first_and_covers_the_request() {
    for case in gateway_cases() {
        let request = HistoryRequest::new(symbol("AAPL"), 12).expect("request");
        let bars = case
            .gateway
            .fetch_history(request)
            .await
            .unwrap_or_else(|error| panic!("{}: history failed: {error}", case.name));

        assert!(bars.len() >= 12, "{}: only {} bars", case.name, bars.len());
        assert!(
            bars.windows(2).all(|pair| pair[0].date < pair[1].date),
            "{}: bars out of order",
            case.name
        );
    }
}

#[tokio::test]
async fn latest_bar_is_not_older_than_history() {
    for case in gateway_cases() {
        let request = HistoryRequest::new(symbol("AAPL"), 12).expect("request");
        let history = case.gateway.fetch_history(request).await.expect("history");
        let latest = case
            .gateway
            .fetch_latest(&symbol("AAPL"))
            .await
            .expect("latest")
            .unwrap_or_else(|| panic!("{}: no latest bar", case.name));

        let newest = history.last().expect("non-empty history");
        assert!(latest.date >= newest.date, "{}: stale latest bar", case.name);
    }
}

#[tokio::test]
async fn unknown_symbol_yields_no_data_rather_than_error() {
    for case in gateway_cases() {
        let request = HistoryRequest::new(symbol("ZZZZ"), 12).expect("request");
        let history = case.gateway.fetch_history(request).await;
        let latest = case.gateway.fetch_latest(&symbol("ZZZZ")).await;

        assert_eq!(history.expect("history"), Vec::new(), "{}", case.name);
        assert_eq!(latest.expect("latest"), None, "{}", case.name);
    }
}

// =============================================================================
// Yahoo chart adapter
// =============================================================================

#[tokio::test]
async fn yahoo_requests_the_smallest_covering_range() {
    let http = Arc::new(ChartHttpClient::default().with_chart("AAPL", chart_body(SESSIONS)));
    let gateway = YahooGateway::new(http.clone()).with_base_url("http://chart.test/");

    let request = HistoryRequest::new(symbol("AAPL"), 12).expect("request");
    gateway.fetch_history(request).await.expect("history");
    gateway.fetch_latest(&symbol("AAPL")).await.expect("latest");

    assert_eq!(
        http.urls(),
        vec![
            "http://chart.test/v8/finance/chart/AAPL?range=1mo&interval=1d",
            "http://chart.test/v8/finance/chart/AAPL?range=5d&interval=1d",
        ]
    );
}

#[tokio::test]
async fn yahoo_maps_transport_failures_to_gateway_kinds() {
    let http = ChartHttpClient::default()
        .with_response("SLOW", Err(HttpError::timed_out("deadline elapsed")))
        .with_response("BUSY", Ok(HttpResponse::with_status(503, "busy")))
        .with_response("JUNK", Ok(HttpResponse::ok_json("<html>")));
    let gateway = YahooGateway::new(Arc::new(http));

    let slow = gateway.fetch_latest(&symbol("SLOW")).await.expect_err("timeout");
    let busy = gateway.fetch_latest(&symbol("BUSY")).await.expect_err("503");
    let junk = gateway.fetch_latest(&symbol("JUNK")).await.expect_err("bad body");

    assert_eq!(slow.kind(), GatewayErrorKind::Timeout);
    assert_eq!(busy.kind(), GatewayErrorKind::Unavailable);
    assert_eq!(junk.kind(), GatewayErrorKind::Internal);
}

#[tokio::test]
async fn yahoo_fails_fast_once_the_circuit_opens() {
    let http = Arc::new(
        ChartHttpClient::default()
            .with_response("AAPL", Err(HttpError::new("connection refused"))),
    );
    let gateway = YahooGateway::new(http.clone()).with_circuit_breaker(CircuitBreakerConfig {
        failure_threshold: 2,
        open_timeout: Duration::from_secs(60),
    });

    for _ in 0..3 {
        let error = gateway
            .fetch_latest(&symbol("AAPL"))
            .await
            .expect_err("upstream down");
        assert_eq!(error.kind(), GatewayErrorKind::Unavailable);
    }

    assert_eq!(gateway.circuit_state(), CircuitState::Open);
    assert_eq!(http.urls().len(), 2);
}

#[tokio::test]
async fn yahoo_not_found_does_not_trip_the_circuit() {
    let http = Arc::new(ChartHttpClient::default());
    let gateway = YahooGateway::new(http.clone()).with_circuit_breaker(CircuitBreakerConfig {
        failure_threshold: 1,
        open_timeout: Duration::from_secs(60),
    });

    for _ in 0..3 {
        assert_eq!(gateway.fetch_latest(&symbol("GONE")).await.expect("404"), None);
    }
    assert_eq!(gateway.circuit_state(), CircuitState::Closed);
    assert_eq!(http.urls().len(), 3);
}
