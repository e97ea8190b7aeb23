//! Command results handed to the renderer.

use ferroscreen_core::{CallFailure, Candidate, FailureKind, RunReport};
use serde::Serialize;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Gainers,
    Earnings,
}

/// One screen: the unfiltered list, the enrichment run (if any) and warnings.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    pub criteria: String,
    pub unfiltered: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_failure: Option<CallFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunReport>,
    pub warnings: Vec<String>,
}

impl Section {
    pub fn new(kind: SectionKind, title: impl Into<String>, criteria: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            criteria: criteria.into(),
            unfiltered: Vec::new(),
            fetch_failure: None,
            run: None,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn record_fetch_failure(&mut self, failure: CallFailure) {
        let warning = if failure.kind() == FailureKind::Cancelled {
            format!("Cancelled before {} were loaded.", self.title.to_lowercase())
        } else if failure.is_quota() {
            format!(
                "Alpha Vantage rate limit reached while loading {}: {}. Free keys allow 5 calls per minute and 25 per day.",
                self.title.to_lowercase(),
                failure.message()
            )
        } else {
            format!("Could not load {}: {failure}", self.title.to_lowercase())
        };
        self.warn(warning);
        self.fetch_failure = Some(failure);
    }

    /// Attaches a finished run and derives one warning per condition worth flagging.
    pub fn record_run(&mut self, report: RunReport, none_accepted: &str) {
        if report.hit_quota() {
            self.warn(format!(
                "API limit reached during screening: {} lookups were refused, so results may be incomplete.",
                report.quota_hits
            ));
        }
        if report.cancelled {
            self.warn(format!(
                "Screening cancelled after {} of {} candidates; results are partial.",
                report.checked, report.total
            ));
        }
        if report.accepted.is_empty() && !report.cancelled && !report.hit_quota() {
            self.warn(none_accepted);
        }
        self.run = Some(report);
    }

    pub fn cancelled(&self) -> bool {
        self.run.as_ref().is_some_and(|run| run.cancelled)
            || self
                .fetch_failure
                .as_ref()
                .is_some_and(|failure| failure.kind() == FailureKind::Cancelled)
    }
}

/// Everything one invocation prints.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub reference_date: Date,
    pub last_trading_day: Date,
    pub next_trading_day: Date,
    pub notice: String,
    pub sections: Vec<Section>,
    pub footer: String,
}

impl Dashboard {
    pub fn cancelled(&self) -> bool {
        self.sections.iter().any(Section::cancelled)
    }

    pub fn has_fetch_failures(&self) -> bool {
        self.sections
            .iter()
            .filter_map(|section| section.fetch_failure.as_ref())
            .any(|failure| failure.kind() != FailureKind::Cancelled)
    }
}
