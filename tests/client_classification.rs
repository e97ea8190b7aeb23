//! Behavior-driven tests for the API client: request shape per query type and
//! the normalization of every response shape into one enrichment result.

mod support;

use ferroscreen_core::{
    EnrichmentQuery, EnrichmentResult, HttpError, HttpRequest, Payload, Symbol, TimeWindow,
};
use rust_decimal::Decimal;
use support::{client, earnings, news, overview, ScriptedHttpClient, API_KEY, QUOTA_NOTE};
use time::macros::{date, datetime};

fn abc() -> Symbol {
    Symbol::parse("ABC").expect("valid symbol")
}

fn overview_query() -> EnrichmentQuery {
    EnrichmentQuery::CompanyOverview { symbol: abc() }
}

// =============================================================================
// Request shape
// =============================================================================

#[tokio::test]
async fn news_lookup_sends_ticker_window_and_page_limit() {
    // Given: a news lookup over a trailing six-hour window
    let http = ScriptedHttpClient::new();
    http.respond("NEWS_SENTIMENT", Some("ABC"), news(2));
    let client = client(http.clone());
    let window = TimeWindow::trailing(datetime!(2025-03-14 16:00), 6);

    // When: the lookup is issued
    let result = client
        .call(&EnrichmentQuery::NewsInWindow {
            symbol: abc(),
            window,
        })
        .await;

    // Then: the request carries the ticker, both bounds, the page limit and the key
    let calls = http.calls();
    let request = &calls[0].request;
    assert_eq!(request.param("function"), Some("NEWS_SENTIMENT"));
    assert_eq!(request.param("tickers"), Some("ABC"));
    assert_eq!(request.param("time_from"), Some("20250314T1000"));
    assert_eq!(request.param("time_to"), Some("20250314T1600"));
    assert_eq!(request.param("limit"), Some("50"));
    assert_eq!(request.param("apikey"), Some(API_KEY));

    // And: the feed length is the news count
    assert_eq!(
        result,
        EnrichmentResult::success(Payload::NewsCount { count: 2 })
    );
}

#[tokio::test]
async fn overview_lookup_parses_market_cap() {
    let http = ScriptedHttpClient::new();
    http.respond("OVERVIEW", Some("ABC"), overview("ABC", "123456789"));
    let client = client(http.clone());

    let result = client.call(&overview_query()).await;

    assert_eq!(
        result,
        EnrichmentResult::success(Payload::MarketCap {
            value: Decimal::from(123_456_789)
        })
    );
    assert_eq!(http.calls()[0].request.param("symbol"), Some("ABC"));
}

#[test]
fn redacted_url_hides_the_api_key() {
    let request = HttpRequest::get("https://example.test/query")
        .with_param("function", "OVERVIEW")
        .with_param("apikey", "secret-key");

    assert_eq!(request.param("apikey"), Some("secret-key"));
    assert_eq!(
        request.redacted_url(),
        "https://example.test/query?function=OVERVIEW&apikey=***"
    );
}

// =============================================================================
// Response classification
// =============================================================================

#[tokio::test]
async fn non_numeric_market_cap_is_a_schema_error() {
    // Given: the provider knows the symbol but reports no market cap
    let http = ScriptedHttpClient::new();
    http.respond("OVERVIEW", Some("ABC"), overview("ABC", "None"));
    let client = client(http.clone());

    // When: the overview is looked up
    let result = client.call(&overview_query()).await;

    // Then: it is a provider error tagged as a schema problem, not a zero cap
    match result {
        EnrichmentResult::ProviderError { message } => {
            assert!(message.contains("call.schema"), "message: {message}");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_payload_key_is_a_schema_error() {
    let http = ScriptedHttpClient::new();
    http.respond("OVERVIEW", Some("ABC"), "{}");
    let client = client(http.clone());

    let result = client.call(&overview_query()).await;

    assert!(matches!(
        result,
        EnrichmentResult::ProviderError { ref message } if message.contains("MarketCapitalization")
    ));
}

#[tokio::test]
async fn note_and_rate_limit_information_are_quota() {
    let http = ScriptedHttpClient::new();
    http.respond("OVERVIEW", Some("ABC"), QUOTA_NOTE).respond(
        "NEWS_SENTIMENT",
        Some("ABC"),
        r#"{"Information": "Our standard API rate limit is 25 requests per day."}"#,
    );
    let client = client(http.clone());

    let note = client.call(&overview_query()).await;
    let information = client
        .call(&EnrichmentQuery::NewsInWindow {
            symbol: abc(),
            window: TimeWindow::whole_day(date!(2025 - 03 - 14)),
        })
        .await;

    assert!(note.is_quota_exceeded());
    assert!(information.is_quota_exceeded());
}

#[tokio::test]
async fn error_message_is_a_provider_error() {
    let http = ScriptedHttpClient::new();
    http.respond(
        "OVERVIEW",
        Some("ABC"),
        r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#,
    );
    let client = client(http.clone());

    let result = client.call(&overview_query()).await;

    assert!(matches!(
        result,
        EnrichmentResult::ProviderError { ref message } if message.starts_with("Invalid API call")
    ));
}

#[tokio::test]
async fn transport_timeout_is_a_timeout() {
    let http = ScriptedHttpClient::new();
    http.fail("OVERVIEW", Some("ABC"), HttpError::timeout("request timed out"));
    let client = client(http.clone());

    assert_eq!(client.call(&overview_query()).await, EnrichmentResult::Timeout);
}

#[tokio::test]
async fn earnings_history_counts_strict_beats_over_recent_quarters() {
    // Given: five quarters, newest first; the fifth is outside the window
    let http = ScriptedHttpClient::new();
    http.respond(
        "EARNINGS",
        Some("ABC"),
        earnings(&[
            ("1.20", "1.00"),
            ("0.90", "1.00"),
            ("1.00", "1.00"),
            ("2.00", "None"),
            ("5.00", "1.00"),
        ]),
    );
    let client = client(http.clone());

    // When: the last four quarters are examined
    let result = client
        .call(&EnrichmentQuery::EarningsHistory {
            symbol: abc(),
            quarters: 4,
        })
        .await;

    // Then: only the strict beat with both figures counts
    assert_eq!(
        result,
        EnrichmentResult::success(Payload::BeatHistory {
            beats: 1,
            examined: 4
        })
    );
}
