//! Single response classifier shared by every query type.
//!
//! Alpha Vantage answers most failures with HTTP 200 and a one-key JSON object:
//!
//! | Key | Meaning | Classification |
//! |-----|---------|----------------|
//! | `Error Message` | hard error (bad symbol, bad function) | [`FailureKind::Provider`] |
//! | `Note` | per-minute or daily limit reached | [`FailureKind::Quota`] |
//! | `Information` | informational notice; usually the rate-limit text | [`FailureKind::Quota`] or [`FailureKind::Provider`] |
//!
//! A response that carries none of these and also lacks the payload key the
//! caller expects is a [`FailureKind::Schema`] failure.

use serde_json::{Map, Value};

use crate::failure::CallFailure;
use crate::http_client::{HttpError, HttpErrorKind, HttpResponse};

pub const ERROR_KEY: &str = "Error Message";
pub const NOTE_KEY: &str = "Note";
pub const INFORMATION_KEY: &str = "Information";

const QUOTA_MARKERS: [&str; 4] = [
    "rate limit",
    "requests per",
    "call frequency",
    "api calls per",
];

/// Classifies a JSON response and returns its top-level object when it holds `expected_key`.
pub fn classify_json(
    response: Result<HttpResponse, HttpError>,
    expected_key: &str,
) -> Result<Map<String, Value>, CallFailure> {
    let body = successful_body(response)?;

    let value: Value = serde_json::from_str(&body)
        .map_err(|e| CallFailure::schema(format!("response is not valid JSON: {e}")))?;
    let Value::Object(object) = value else {
        return Err(CallFailure::schema("response is not a JSON object"));
    };

    if let Some(failure) = sentinel(&object) {
        return Err(failure);
    }

    if !object.contains_key(expected_key) {
        return Err(CallFailure::schema(format!(
            "response is missing expected key '{expected_key}'"
        )));
    }

    Ok(object)
}

/// Classifies a tabular (CSV) response. The provider still reports failures as JSON
/// sentinels on these endpoints, so a JSON body is never treated as data.
pub fn classify_text(response: Result<HttpResponse, HttpError>) -> Result<String, CallFailure> {
    let body = successful_body(response)?;

    if body.trim_start().starts_with('{') {
        let failure = match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(object)) => sentinel(&object)
                .unwrap_or_else(|| CallFailure::schema("expected tabular data, got a JSON object")),
            _ => CallFailure::schema("expected tabular data, got malformed JSON"),
        };
        return Err(failure);
    }

    Ok(body)
}

/// Detects one of the provider's sentinel shapes in a decoded object.
pub fn sentinel(object: &Map<String, Value>) -> Option<CallFailure> {
    if let Some(message) = object.get(ERROR_KEY) {
        return Some(CallFailure::provider(text_of(message)));
    }

    if let Some(message) = object.get(NOTE_KEY) {
        return Some(CallFailure::quota(text_of(message)));
    }

    if let Some(message) = object.get(INFORMATION_KEY) {
        let text = text_of(message);
        return Some(if mentions_quota(&text) {
            CallFailure::quota(text)
        } else {
            CallFailure::provider(text)
        });
    }

    None
}

fn successful_body(response: Result<HttpResponse, HttpError>) -> Result<String, CallFailure> {
    let response = response.map_err(|error| match error.kind() {
        HttpErrorKind::Timeout => CallFailure::timeout(error.message()),
        HttpErrorKind::Connect | HttpErrorKind::Other => CallFailure::transport(error.message()),
    })?;

    if !response.is_success() {
        return Err(CallFailure::provider(format!(
            "upstream returned status {}",
            response.status
        )));
    }

    Ok(response.body)
}

fn mentions_quota(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    QUOTA_MARKERS.iter().any(|marker| lowered.contains(marker))
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
