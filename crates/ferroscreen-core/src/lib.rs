//! Core of ferroscreen: a rate-limited stock screener over the Alpha Vantage API.
//!
//! This crate contains:
//! - Domain values (symbols, candidates, news windows) and their validation
//! - The HTTP transport seam and response classification
//! - The API client and its typed enrichment results
//! - Call pacing and the local daily call budget
//! - The candidate fetcher, acceptance predicates and the enrichment pipeline
//! - The [`Screener`] driver and environment configuration

pub mod calendar;
pub mod classify;
pub mod client;
pub mod config;
pub mod domain;
pub mod enrichment;
pub mod error;
pub mod failure;
pub mod fetcher;
pub mod http_client;
pub mod pacing;
pub mod pipeline;
pub mod predicate;
pub mod progress;
pub mod screener;

pub use calendar::{last_trading_day, next_trading_day};
pub use client::AlphaVantageClient;
pub use config::{Limits, ScreenerConfig, Thresholds};
pub use domain::{Candidate, Symbol, TimeWindow};
pub use enrichment::{EnrichmentQuery, EnrichmentResult, Payload};
pub use error::{ConfigError, ScreenError, ValidationError};
pub use failure::{CallFailure, FailureKind};
pub use fetcher::{EarningsFilter, EarningsHorizon, FetchReport, GainerFilter};
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use pacing::{CallBudget, Pacer};
pub use pipeline::{EnrichedCandidate, Rejection, RunOptions, RunReport};
pub use predicate::{Criterion, FailurePolicy, Predicate, Verdict};
pub use progress::{NoopProgress, ProgressSink};
pub use screener::{Gate, Screener};
