//! Alpha Vantage API client.
//!
//! One HTTP round trip per call and no retries: a quota notice is returned to
//! the caller as [`EnrichmentResult::QuotaExceeded`], since retrying would only
//! burn more of the daily allowance. Pacing is the caller's job.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::classify::{classify_json, classify_text};
use crate::enrichment::{EnrichmentQuery, EnrichmentResult, Payload};
use crate::failure::CallFailure;
use crate::http_client::{HttpClient, HttpRequest};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const NEWS_PAGE_LIMIT: &str = "50";

#[derive(Clone)]
pub struct AlphaVantageClient {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    timeout_ms: u64,
}

impl AlphaVantageClient {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Issues one enrichment lookup and normalizes the answer.
    pub async fn call(&self, query: &EnrichmentQuery) -> EnrichmentResult {
        let outcome = match query {
            EnrichmentQuery::CompanyOverview { symbol } => self
                .fetch_json(query.function(), &[("symbol", symbol.to_string())], "MarketCapitalization")
                .await
                .and_then(|object| market_cap(&object)),
            EnrichmentQuery::NewsInWindow { symbol, window } => {
                let (time_from, time_to) = window.query_bounds();
                self.fetch_json(
                    query.function(),
                    &[
                        ("tickers", symbol.to_string()),
                        ("time_from", time_from),
                        ("time_to", time_to),
                        ("limit", String::from(NEWS_PAGE_LIMIT)),
                    ],
                    "feed",
                )
                .await
                .and_then(|object| news_count(&object))
            }
            EnrichmentQuery::EarningsHistory { symbol, quarters } => self
                .fetch_json(query.function(), &[("symbol", symbol.to_string())], "quarterlyEarnings")
                .await
                .and_then(|object| beat_history(object, *quarters)),
        };

        match outcome {
            Ok(payload) => EnrichmentResult::success(payload),
            Err(failure) => failure.into(),
        }
    }

    /// Fetches a JSON endpoint and returns its top-level object once classified.
    pub async fn fetch_json(
        &self,
        function: &str,
        params: &[(&str, String)],
        expected_key: &str,
    ) -> Result<Map<String, Value>, CallFailure> {
        let request = self.request(function, params);
        debug!(url = %request.redacted_url(), "dispatching");
        classify_json(self.http_client.execute(request).await, expected_key)
    }

    /// Fetches a CSV endpoint and returns the raw table text once classified.
    pub async fn fetch_text(
        &self,
        function: &str,
        params: &[(&str, String)],
    ) -> Result<String, CallFailure> {
        let request = self.request(function, params);
        debug!(url = %request.redacted_url(), "dispatching");
        classify_text(self.http_client.execute(request).await)
    }

    fn request(&self, function: &str, params: &[(&str, String)]) -> HttpRequest {
        params
            .iter()
            .fold(
                HttpRequest::get(&self.base_url).with_param("function", function),
                |request, (name, value)| request.with_param(*name, value.clone()),
            )
            .with_param("apikey", self.api_key.clone())
            .with_timeout_ms(self.timeout_ms)
    }
}

fn market_cap(object: &Map<String, Value>) -> Result<Payload, CallFailure> {
    let raw = object
        .get("MarketCapitalization")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let value = parse_decimal(raw).ok_or_else(|| {
        CallFailure::schema(format!("MarketCapitalization is not numeric: '{raw}'"))
    })?;

    Ok(Payload::MarketCap { value })
}

fn news_count(object: &Map<String, Value>) -> Result<Payload, CallFailure> {
    let feed = object
        .get("feed")
        .and_then(Value::as_array)
        .ok_or_else(|| CallFailure::schema("'feed' is not an array"))?;

    Ok(Payload::NewsCount { count: feed.len() })
}

#[derive(Debug, Deserialize)]
struct QuarterlyEarnings {
    #[serde(rename = "reportedEPS", default)]
    reported_eps: Option<String>,
    #[serde(rename = "estimatedEPS", default)]
    estimated_eps: Option<String>,
}

impl QuarterlyEarnings {
    /// Both figures present and numeric, and reported strictly above estimate.
    fn beat(&self) -> bool {
        let reported = self.reported_eps.as_deref().and_then(parse_decimal);
        let estimated = self.estimated_eps.as_deref().and_then(parse_decimal);
        matches!((reported, estimated), (Some(reported), Some(estimated)) if reported > estimated)
    }
}

fn beat_history(mut object: Map<String, Value>, quarters: u32) -> Result<Payload, CallFailure> {
    let raw = object.remove("quarterlyEarnings").unwrap_or(Value::Null);
    let history: Vec<QuarterlyEarnings> = serde_json::from_value(raw)
        .map_err(|e| CallFailure::schema(format!("malformed quarterlyEarnings: {e}")))?;

    // Newest quarter first.
    let recent = history.iter().take(quarters as usize);
    let examined = recent.len() as u32;
    let beats = recent.filter(|quarter| quarter.beat()).count() as u32;

    Ok(Payload::BeatHistory { beats, examined })
}

/// Parses the provider's numeric strings. `None`, `-` and blanks are absent values.
pub(crate) fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "None" || trimmed == "-" {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(object) => object,
            _ => unreachable!("test fixtures are objects"),
        }
    }

    #[test]
    fn beat_requires_both_figures_and_strict_excess() {
        let history = object(json!({
            "quarterlyEarnings": [
                {"reportedEPS": "1.10", "estimatedEPS": "1.00"},
                {"reportedEPS": "1.00", "estimatedEPS": "1.00"},
                {"reportedEPS": "None", "estimatedEPS": "0.90"},
                {"reportedEPS": "0.95", "estimatedEPS": "0.80"},
                {"reportedEPS": "5.00", "estimatedEPS": "0.10"}
            ]
        }));

        assert_eq!(
            beat_history(history, 4).expect("well formed"),
            Payload::BeatHistory {
                beats: 2,
                examined: 4
            }
        );
    }

    #[test]
    fn short_history_reports_fewer_examined_quarters() {
        let history = object(json!({
            "quarterlyEarnings": [{"reportedEPS": "2", "estimatedEPS": "1"}]
        }));

        assert_eq!(
            beat_history(history, 4).expect("well formed"),
            Payload::BeatHistory {
                beats: 1,
                examined: 1
            }
        );
    }

    #[test]
    fn market_cap_none_is_schema_failure() {
        let failure = market_cap(&object(json!({"MarketCapitalization": "None"})))
            .expect_err("None is not a value");
        assert_eq!(failure.code(), "call.schema");
    }

    #[test]
    fn parse_decimal_handles_provider_placeholders() {
        assert_eq!(parse_decimal("50000000"), Some(Decimal::from(50_000_000)));
        assert_eq!(parse_decimal(" None "), None);
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(parse_decimal("-0.25"), Some(Decimal::new(-25, 2)));
    }
}
