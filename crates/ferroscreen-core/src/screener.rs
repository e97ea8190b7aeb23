//! Screening driver.
//!
//! A [`Screener`] owns the pacing state shared by every upstream call it
//! makes, so back-to-back runs keep their spacing. Only one run may hold that
//! state at a time; a second concurrent run is refused rather than queued.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::AlphaVantageClient;
use crate::config::ScreenerConfig;
use crate::enrichment::{EnrichmentQuery, EnrichmentResult};
use crate::error::ScreenError;
use crate::failure::CallFailure;
use crate::fetcher::{self, EarningsFilter, FetchReport, GainerFilter};
use crate::http_client::HttpClient;
use crate::pacing::{CallBudget, Pacer};
use crate::pipeline::{self, RunOptions, RunReport};
use crate::predicate::Predicate;
use crate::progress::ProgressSink;
use crate::Candidate;

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(12);

#[derive(Debug, Default)]
struct DispatchState {
    pacer: Pacer,
    budget: Option<CallBudget>,
}

pub struct Screener {
    client: AlphaVantageClient,
    dispatch: Mutex<DispatchState>,
    min_interval: Duration,
}

impl Screener {
    pub fn new(client: AlphaVantageClient) -> Self {
        Self {
            client,
            dispatch: Mutex::new(DispatchState::default()),
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }

    pub fn from_config(config: &ScreenerConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let client = AlphaVantageClient::new(http_client, config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_timeout_ms(config.timeout_ms);

        let screener = Self::new(client).with_min_interval(config.min_interval());
        match config.limits.daily_budget {
            0 => screener,
            limit => screener.with_daily_budget(limit),
        }
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Answers calls locally with a quota failure once the daily allowance is
    /// spent. `limit` calls may go out back to back; after that one more is
    /// allowed every `24h / limit`.
    pub fn with_daily_budget(mut self, limit: u32) -> Self {
        self.dispatch.get_mut().budget = Some(CallBudget::per_day(limit));
        self
    }

    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Claims the dispatch state for one run.
    pub fn gate<'a>(&'a self, cancel: &'a CancellationToken) -> Result<Gate<'a>, ScreenError> {
        let state = self
            .dispatch
            .try_lock()
            .map_err(|_| ScreenError::RunInProgress)?;

        Ok(Gate {
            client: &self.client,
            state,
            cancel,
            min_interval: self.min_interval,
            calls_made: 0,
            waited: Duration::ZERO,
        })
    }

    pub async fn top_gainers(
        &self,
        filter: &GainerFilter,
        cancel: &CancellationToken,
    ) -> Result<FetchReport, ScreenError> {
        let mut gate = self.gate(cancel)?;
        Ok(fetcher::top_gainers(&mut gate, filter).await)
    }

    pub async fn earnings_calendar(
        &self,
        filter: &EarningsFilter,
        cancel: &CancellationToken,
    ) -> Result<FetchReport, ScreenError> {
        let mut gate = self.gate(cancel)?;
        Ok(fetcher::earnings_calendar(&mut gate, filter).await)
    }

    /// Runs the enrichment pipeline over `candidates`, evaluating `predicates`
    /// in order with short-circuit on the first rejection.
    pub async fn enrich(
        &self,
        candidates: Vec<Candidate>,
        predicates: &[Predicate],
        options: RunOptions,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<RunReport, ScreenError> {
        let mut gate = self.gate(cancel)?;
        if let Some(min_interval) = options.min_interval {
            gate.min_interval = min_interval;
        }
        Ok(pipeline::run(&mut gate, candidates, predicates, &options, progress).await)
    }
}

/// Exclusive handle on the dispatch state for the duration of one run.
///
/// Every upstream call goes through [`Gate::admit`]: pacing, then the daily
/// budget. A wait interrupted by cancellation spends no budget, and a call the
/// budget refuses does not take a pacing slot.
pub struct Gate<'a> {
    client: &'a AlphaVantageClient,
    state: MutexGuard<'a, DispatchState>,
    cancel: &'a CancellationToken,
    min_interval: Duration,
    calls_made: usize,
    waited: Duration,
}

impl Gate<'_> {
    /// Calls actually sent upstream through this gate.
    pub const fn calls_made(&self) -> usize {
        self.calls_made
    }

    /// Total time spent waiting for pacing slots.
    pub const fn waited(&self) -> Duration {
        self.waited
    }

    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn call(&mut self, query: &EnrichmentQuery) -> EnrichmentResult {
        match self.admit().await {
            Ok(()) => self.client.call(query).await,
            Err(failure) => failure.into(),
        }
    }

    pub async fn fetch_json(
        &mut self,
        function: &str,
        params: &[(&str, String)],
        expected_key: &str,
    ) -> Result<Map<String, Value>, CallFailure> {
        self.admit().await?;
        self.client.fetch_json(function, params, expected_key).await
    }

    pub async fn fetch_text(
        &mut self,
        function: &str,
        params: &[(&str, String)],
    ) -> Result<String, CallFailure> {
        self.admit().await?;
        self.client.fetch_text(function, params).await
    }

    async fn admit(&mut self) -> Result<(), CallFailure> {
        let waited = self
            .state
            .pacer
            .wait_turn(self.min_interval, self.cancel)
            .await
            .map_err(|_| CallFailure::cancelled())?;

        if !waited.is_zero() {
            debug!(waited_ms = waited.as_millis() as u64, "paced");
        }
        self.waited += waited;

        if let Some(budget) = &self.state.budget {
            if let Err(retry_after) = budget.try_consume() {
                warn!(
                    limit = budget.limit(),
                    retry_after_secs = retry_after.as_secs(),
                    "daily call budget exhausted"
                );
                return Err(CallFailure::quota(format!(
                    "daily budget of {} calls used up; next call allowed in {}s",
                    budget.limit(),
                    retry_after.as_secs()
                )));
            }
        }

        self.state.pacer.record_dispatch();
        self.calls_made += 1;
        Ok(())
    }
}
