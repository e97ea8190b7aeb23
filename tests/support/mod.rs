//! Shared fixtures for the integration tests: a scripted transport that
//! records every dispatched request with its (paused-clock) instant.
#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ferroscreen_core::{
    AlphaVantageClient, Candidate, HttpClient, HttpError, HttpErrorKind, HttpRequest,
    HttpResponse, ProgressSink, Screener, Symbol,
};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::time::Instant;

pub const INTERVAL: Duration = Duration::from_secs(12);
pub const API_KEY: &str = "test-key";

pub const QUOTA_NOTE: &str = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute and 25 calls per day."}"#;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: HttpRequest,
    pub at: Instant,
}

impl RecordedCall {
    pub fn function(&self) -> &str {
        self.request.param("function").unwrap_or_default()
    }

    pub fn symbol(&self) -> Option<&str> {
        self.request
            .param("symbol")
            .or_else(|| self.request.param("tickers"))
    }
}

type Route = (String, Option<String>);

/// Answers by `function` and, when scripted, by symbol; unscripted requests fail.
#[derive(Default)]
pub struct ScriptedHttpClient {
    routes: Mutex<HashMap<Route, Result<HttpResponse, HttpError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, function: &str, symbol: Option<&str>, body: impl Into<String>) -> &Self {
        self.script(function, symbol, Ok(HttpResponse::ok(body)))
    }

    pub fn fail(&self, function: &str, symbol: Option<&str>, error: HttpError) -> &Self {
        self.script(function, symbol, Err(error))
    }

    fn script(
        &self,
        function: &str,
        symbol: Option<&str>,
        response: Result<HttpResponse, HttpError>,
    ) -> &Self {
        self.routes
            .lock()
            .expect("route table should not be poisoned")
            .insert((function.to_owned(), symbol.map(str::to_owned)), response);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .expect("call log should not be poisoned")
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn lookup(&self, call: &RecordedCall) -> Result<HttpResponse, HttpError> {
        let routes = self.routes.lock().expect("route table should not be poisoned");
        let function = call.function().to_owned();
        routes
            .get(&(function.clone(), call.symbol().map(str::to_owned)))
            .or_else(|| routes.get(&(function.clone(), None)))
            .cloned()
            .unwrap_or_else(|| {
                Err(HttpError::new(
                    HttpErrorKind::Other,
                    format!("no scripted response for {function}"),
                ))
            })
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let call = RecordedCall {
            request,
            at: Instant::now(),
        };
        let response = self.lookup(&call);
        self.calls
            .lock()
            .expect("call log should not be poisoned")
            .push(call);
        Box::pin(async move { response })
    }
}

/// Records progress fractions and status lines.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    fractions: Mutex<Vec<f64>>,
    statuses: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn fractions(&self) -> Vec<f64> {
        self.fractions.lock().expect("not poisoned").clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().expect("not poisoned").clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn on_progress(&self, fraction: f64) {
        self.fractions.lock().expect("not poisoned").push(fraction);
    }

    fn on_status(&self, text: &str) {
        self.statuses.lock().expect("not poisoned").push(text.to_owned());
    }
}

pub fn client(http: Arc<ScriptedHttpClient>) -> AlphaVantageClient {
    AlphaVantageClient::new(http, API_KEY).with_base_url("https://example.test/query")
}

pub fn screener(http: Arc<ScriptedHttpClient>) -> Screener {
    Screener::new(client(http)).with_min_interval(INTERVAL)
}

pub fn mover(symbol: &str, price: Decimal, change_percent: Decimal) -> Candidate {
    Candidate::mover(
        Symbol::parse(symbol).expect("valid symbol"),
        price,
        change_percent,
        Some(1_000_000),
    )
    .expect("valid candidate")
}

pub fn abc() -> Candidate {
    mover("ABC", Decimal::new(500, 2), Decimal::from(60))
}

pub fn overview(symbol: &str, market_cap: &str) -> String {
    json!({"Symbol": symbol, "MarketCapitalization": market_cap}).to_string()
}

pub fn news(count: usize) -> String {
    let feed: Vec<_> = (0..count)
        .map(|i| json!({"title": format!("headline {i}"), "time_published": "20250314T093000"}))
        .collect();
    json!({"items": count.to_string(), "feed": feed}).to_string()
}

pub fn earnings(quarters: &[(&str, &str)]) -> String {
    let rows: Vec<_> = quarters
        .iter()
        .map(|(reported, estimated)| json!({"reportedEPS": reported, "estimatedEPS": estimated}))
        .collect();
    json!({"symbol": "ABC", "quarterlyEarnings": rows}).to_string()
}

/// Every pair of consecutive dispatches is at least `interval` apart.
pub fn assert_spacing(calls: &[RecordedCall], interval: Duration) {
    for pair in calls.windows(2) {
        let gap = pair[1].at - pair[0].at;
        assert!(
            gap >= interval,
            "calls {} -> {} only {gap:?} apart",
            pair[0].function(),
            pair[1].function()
        );
    }
}
