//! Sequential, quota-paced enrichment pipeline.
//!
//! Candidates are processed in input order, predicates in declaration order,
//! and the first failing predicate stops further lookups for that candidate.
//! At most `max_candidates * predicates.len()` calls are dispatched per run.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::enrichment::{EnrichmentResult, Payload};
use crate::predicate::{Predicate, Verdict};
use crate::progress::ProgressSink;
use crate::screener::Gate;
use crate::{Candidate, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Only the first `max_candidates` inputs are considered.
    pub max_candidates: usize,
    /// Overrides the screener's spacing for this run.
    #[serde(default)]
    pub min_interval: Option<Duration>,
}

impl RunOptions {
    pub const fn new(max_candidates: usize) -> Self {
        Self {
            max_candidates,
            min_interval: None,
        }
    }

    pub const fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = Some(min_interval);
        self
    }
}

/// A candidate that passed every predicate, with the payloads that justified it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedCandidate {
    pub candidate: Candidate,
    pub payloads: Vec<Payload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub symbol: Symbol,
    pub predicate: String,
    pub reason: String,
    /// The lookup behind this rejection hit a quota, so the rejection says
    /// nothing about the candidate itself.
    pub quota_exceeded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Candidates considered after truncation.
    pub total: usize,
    /// Candidates fully evaluated.
    pub checked: usize,
    pub accepted: Vec<EnrichedCandidate>,
    pub rejections: Vec<Rejection>,
    pub calls_made: usize,
    pub quota_hits: usize,
    pub cancelled: bool,
    pub waited_ms: u64,
}

impl RunReport {
    pub fn accepted_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.accepted.iter().map(|enriched| &enriched.candidate.symbol)
    }

    pub const fn hit_quota(&self) -> bool {
        self.quota_hits > 0
    }
}

/// Working state of one run. Dropped with the run; nothing here outlives it.
struct PipelineRun {
    candidates: Vec<Candidate>,
    current_index: usize,
    accepted: Vec<EnrichedCandidate>,
    rejections: Vec<Rejection>,
    quota_hits: usize,
    cancelled: bool,
}

enum Outcome {
    Accepted(Vec<Payload>),
    Rejected(Rejection),
    Cancelled,
}

impl PipelineRun {
    fn new(mut candidates: Vec<Candidate>, max_candidates: usize) -> Self {
        candidates.truncate(max_candidates);
        Self {
            candidates,
            current_index: 0,
            accepted: Vec::new(),
            rejections: Vec::new(),
            quota_hits: 0,
            cancelled: false,
        }
    }

    async fn check(
        &mut self,
        gate: &mut Gate<'_>,
        candidate: &Candidate,
        predicates: &[Predicate],
        progress: &dyn ProgressSink,
    ) -> Outcome {
        let mut payloads = Vec::with_capacity(predicates.len());

        for predicate in predicates {
            let query = predicate.query(candidate);
            let result = gate.call(&query).await;
            debug!(symbol = %candidate.symbol, %query, outcome = %result.label(), "lookup finished");

            match &result {
                EnrichmentResult::Unknown => return Outcome::Cancelled,
                EnrichmentResult::QuotaExceeded { message } => {
                    self.quota_hits += 1;
                    warn!(symbol = %candidate.symbol, %message, "quota exceeded");
                    progress.on_status(&format!(
                        "API limit reached while checking {}: {message}",
                        candidate.symbol
                    ));
                }
                _ => {}
            }

            match predicate.evaluate(candidate, &result) {
                Verdict::Pass => payloads.extend(result.payload().cloned()),
                Verdict::Reject(reason) => {
                    return Outcome::Rejected(Rejection {
                        symbol: candidate.symbol.clone(),
                        predicate: predicate.to_string(),
                        reason,
                        quota_exceeded: result.is_quota_exceeded(),
                    })
                }
            }
        }

        Outcome::Accepted(payloads)
    }

    fn finish(self, run_id: Uuid, gate: &Gate<'_>) -> RunReport {
        RunReport {
            run_id,
            total: self.candidates.len(),
            checked: self.current_index,
            accepted: self.accepted,
            rejections: self.rejections,
            calls_made: gate.calls_made(),
            quota_hits: self.quota_hits,
            cancelled: self.cancelled,
            waited_ms: u64::try_from(gate.waited().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Estimated wall-clock time for a run that dispatches `calls` paced calls.
pub fn estimated_duration(calls: usize, min_interval: Duration) -> Duration {
    let gaps = u32::try_from(calls.saturating_sub(1)).unwrap_or(u32::MAX);
    min_interval.saturating_mul(gaps)
}

pub(crate) async fn run(
    gate: &mut Gate<'_>,
    candidates: Vec<Candidate>,
    predicates: &[Predicate],
    options: &RunOptions,
    progress: &dyn ProgressSink,
) -> RunReport {
    let run_id = Uuid::new_v4();
    let span = info_span!("enrichment_run", %run_id);
    execute(gate, run_id, PipelineRun::new(candidates, options.max_candidates), predicates, progress)
        .instrument(span)
        .await
}

async fn execute(
    gate: &mut Gate<'_>,
    run_id: Uuid,
    mut run: PipelineRun,
    predicates: &[Predicate],
    progress: &dyn ProgressSink,
) -> RunReport {
    let total = run.candidates.len();
    if total == 0 {
        info!("no candidates to check");
        return run.finish(run_id, gate);
    }

    let budget = total * predicates.len();
    info!(
        total,
        predicates = predicates.len(),
        max_calls = budget,
        interval_secs = gate.min_interval().as_secs(),
        "enrichment run started"
    );
    if budget > 0 {
        progress.on_status(&format!(
            "Checking {total} candidates: up to {budget} calls, about {}s at one call every {}s",
            estimated_duration(budget, gate.min_interval()).as_secs(),
            gate.min_interval().as_secs()
        ));
    }

    while run.current_index < total {
        if gate.is_cancelled() {
            run.cancelled = true;
            break;
        }

        let candidate = run.candidates[run.current_index].clone();
        match run.check(gate, &candidate, predicates, progress).await {
            Outcome::Accepted(payloads) => {
                info!(symbol = %candidate.symbol, "accepted");
                run.accepted.push(EnrichedCandidate { candidate, payloads });
            }
            Outcome::Rejected(rejection) => {
                debug!(symbol = %rejection.symbol, reason = %rejection.reason, "rejected");
                run.rejections.push(rejection);
            }
            Outcome::Cancelled => {
                run.cancelled = true;
                break;
            }
        }

        run.current_index += 1;
        progress.on_progress(run.current_index as f64 / total as f64);
    }

    let report = run.finish(run_id, gate);
    info!(
        checked = report.checked,
        accepted = report.accepted.len(),
        calls = report.calls_made,
        quota_hits = report.quota_hits,
        cancelled = report.cancelled,
        "enrichment run finished"
    );
    report
}
