//! Enrichment queries and their typed outcomes.

use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::failure::{CallFailure, FailureKind};
use crate::{Symbol, TimeWindow};

/// A dependent lookup bound to one candidate's symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum EnrichmentQuery {
    CompanyOverview { symbol: Symbol },
    NewsInWindow { symbol: Symbol, window: TimeWindow },
    EarningsHistory { symbol: Symbol, quarters: u32 },
}

impl EnrichmentQuery {
    /// Provider function name.
    pub const fn function(&self) -> &'static str {
        match self {
            Self::CompanyOverview { .. } => "OVERVIEW",
            Self::NewsInWindow { .. } => "NEWS_SENTIMENT",
            Self::EarningsHistory { .. } => "EARNINGS",
        }
    }
}

impl Display for EnrichmentQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CompanyOverview { symbol } => write!(f, "company overview for {symbol}"),
            Self::NewsInWindow { symbol, window } => write!(f, "news for {symbol} in {window}"),
            Self::EarningsHistory { symbol, quarters } => {
                write!(f, "last {quarters} quarters of earnings for {symbol}")
            }
        }
    }
}

/// Normalized data returned by a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    MarketCap { value: Decimal },
    NewsCount { count: usize },
    /// `beats` of the `examined` most recent quarters reported EPS above estimate.
    BeatHistory { beats: u32, examined: u32 },
}

impl Display for Payload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarketCap { value } => write!(f, "market cap {value}"),
            Self::NewsCount { count } => write!(f, "{count} news items"),
            Self::BeatHistory { beats, examined } => write!(f, "beat {beats}/{examined}"),
        }
    }
}

/// Outcome of one dispatched (or abandoned) enrichment call. Exactly one variant holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentResult {
    Success { payload: Payload },
    ProviderError { message: String },
    QuotaExceeded { message: String },
    Timeout,
    /// The query was never dispatched, so nothing is known about it.
    Unknown,
}

impl EnrichmentResult {
    pub const fn success(payload: Payload) -> Self {
        Self::Success { payload }
    }

    pub const fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Success { payload } => Some(payload),
            _ => None,
        }
    }

    pub const fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    pub fn label(&self) -> String {
        match self {
            Self::Success { payload } => payload.to_string(),
            Self::ProviderError { message } => format!("provider error: {message}"),
            Self::QuotaExceeded { message } => format!("quota exceeded: {message}"),
            Self::Timeout => String::from("timed out"),
            Self::Unknown => String::from("not dispatched"),
        }
    }
}

impl From<CallFailure> for EnrichmentResult {
    fn from(failure: CallFailure) -> Self {
        match failure.kind() {
            FailureKind::Quota => Self::QuotaExceeded {
                message: failure.message().to_owned(),
            },
            FailureKind::Timeout => Self::Timeout,
            FailureKind::Cancelled => Self::Unknown,
            FailureKind::Transport | FailureKind::Provider | FailureKind::Schema => {
                Self::ProviderError {
                    message: failure.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_fold_into_result_variants() {
        assert!(EnrichmentResult::from(CallFailure::quota("limit")).is_quota_exceeded());
        assert_eq!(
            EnrichmentResult::from(CallFailure::timeout("slow")),
            EnrichmentResult::Timeout
        );
        assert_eq!(
            EnrichmentResult::from(CallFailure::cancelled()),
            EnrichmentResult::Unknown
        );
        assert!(matches!(
            EnrichmentResult::from(CallFailure::schema("missing 'feed'")),
            EnrichmentResult::ProviderError { message } if message.contains("call.schema")
        ));
    }
}
