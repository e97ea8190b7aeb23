//! Acceptance predicates applied by the enrichment pipeline.
//!
//! Each predicate names the lookup it needs and decides on the result of that
//! lookup alone. A predicate's [`FailurePolicy`] states what happens when the
//! lookup yields no payload at all (quota, provider error, timeout), so a
//! rate-limit notice is never mistaken for a negative business answer.

use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enrichment::{EnrichmentQuery, EnrichmentResult, Payload};
use crate::{Candidate, TimeWindow, ValidationError};

/// Treatment of a lookup that produced no payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Reject the candidate.
    #[default]
    FailClosed,
    /// Let the candidate through this predicate.
    FailOpen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "criterion", rename_all = "snake_case")]
pub enum Criterion {
    /// Market capitalization at or above `floor`.
    MinMarketCap { floor: Decimal },
    /// No news items published inside `window`.
    NoNews { window: TimeWindow },
    /// At least `min_beats` of the last `quarters` quarters beat the EPS estimate.
    /// A shorter reporting history fails.
    BeatHistory { quarters: u32, min_beats: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Reject(String),
}

impl Verdict {
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub criterion: Criterion,
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

impl Predicate {
    pub fn min_market_cap(floor: Decimal) -> Result<Self, ValidationError> {
        if floor.is_sign_negative() {
            return Err(ValidationError::NegativeValue {
                field: "market_cap_floor",
            });
        }
        Ok(Self::from(Criterion::MinMarketCap { floor }))
    }

    pub fn no_news(window: TimeWindow) -> Self {
        Self::from(Criterion::NoNews { window })
    }

    pub fn beat_history(quarters: u32, min_beats: u32) -> Result<Self, ValidationError> {
        if min_beats > quarters {
            return Err(ValidationError::BeatsExceedQuarters {
                min_beats,
                quarters,
            });
        }
        Ok(Self::from(Criterion::BeatHistory {
            quarters,
            min_beats,
        }))
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    /// The lookup this predicate needs for `candidate`.
    pub fn query(&self, candidate: &Candidate) -> EnrichmentQuery {
        let symbol = candidate.symbol.clone();
        match &self.criterion {
            Criterion::MinMarketCap { .. } => EnrichmentQuery::CompanyOverview { symbol },
            Criterion::NoNews { window } => EnrichmentQuery::NewsInWindow {
                symbol,
                window: *window,
            },
            Criterion::BeatHistory { quarters, .. } => EnrichmentQuery::EarningsHistory {
                symbol,
                quarters: *quarters,
            },
        }
    }

    pub fn evaluate(&self, _candidate: &Candidate, result: &EnrichmentResult) -> Verdict {
        let Some(payload) = result.payload() else {
            return match self.on_failure {
                FailurePolicy::FailOpen => Verdict::Pass,
                FailurePolicy::FailClosed => Verdict::Reject(result.label()),
            };
        };

        match (&self.criterion, payload) {
            (Criterion::MinMarketCap { floor }, Payload::MarketCap { value }) => {
                if value >= floor {
                    Verdict::Pass
                } else {
                    Verdict::Reject(format!("market cap {value} below {floor}"))
                }
            }
            (Criterion::NoNews { .. }, Payload::NewsCount { count }) => {
                if *count == 0 {
                    Verdict::Pass
                } else {
                    Verdict::Reject(format!("{count} news items in window"))
                }
            }
            (
                Criterion::BeatHistory {
                    quarters,
                    min_beats,
                },
                Payload::BeatHistory { beats, examined },
            ) => {
                if examined < quarters {
                    Verdict::Reject(format!(
                        "only {examined} of {quarters} quarters reported"
                    ))
                } else if beats < min_beats {
                    Verdict::Reject(format!("beat {beats} of {examined} quarters"))
                } else {
                    Verdict::Pass
                }
            }
            (_, other) => Verdict::Reject(format!("unexpected payload: {other}")),
        }
    }
}

impl From<Criterion> for Predicate {
    fn from(criterion: Criterion) -> Self {
        Self {
            criterion,
            on_failure: FailurePolicy::default(),
        }
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.criterion {
            Criterion::MinMarketCap { floor } => write!(f, "market cap >= {floor}"),
            Criterion::NoNews { window } => write!(f, "no news in {window}"),
            Criterion::BeatHistory {
                quarters,
                min_beats,
            } => write!(f, "beat estimates in >= {min_beats} of last {quarters} quarters"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Symbol;
    use time::macros::date;

    fn candidate() -> Candidate {
        Candidate::mover(
            Symbol::parse("ABC").expect("valid"),
            Decimal::new(500, 2),
            Decimal::from(60),
            None,
        )
        .expect("valid candidate")
    }

    #[test]
    fn market_cap_floor_is_inclusive() {
        let predicate = Predicate::min_market_cap(Decimal::from(30_000_000)).expect("valid");
        let at_floor = EnrichmentResult::success(Payload::MarketCap {
            value: Decimal::from(30_000_000),
        });
        let below = EnrichmentResult::success(Payload::MarketCap {
            value: Decimal::from(29_999_999),
        });

        assert!(predicate.evaluate(&candidate(), &at_floor).passed());
        assert!(!predicate.evaluate(&candidate(), &below).passed());
    }

    #[test]
    fn any_news_rejects() {
        let predicate = Predicate::no_news(TimeWindow::whole_day(date!(2025 - 03 - 14)));
        let quiet = EnrichmentResult::success(Payload::NewsCount { count: 0 });
        let noisy = EnrichmentResult::success(Payload::NewsCount { count: 3 });

        assert!(predicate.evaluate(&candidate(), &quiet).passed());
        assert_eq!(
            predicate.evaluate(&candidate(), &noisy),
            Verdict::Reject(String::from("3 news items in window"))
        );
    }

    #[test]
    fn beat_history_needs_full_window_and_enough_beats() {
        let predicate = Predicate::beat_history(4, 3).expect("valid");
        let strong = EnrichmentResult::success(Payload::BeatHistory {
            beats: 3,
            examined: 4,
        });
        let short = EnrichmentResult::success(Payload::BeatHistory {
            beats: 3,
            examined: 3,
        });
        let weak = EnrichmentResult::success(Payload::BeatHistory {
            beats: 2,
            examined: 4,
        });

        assert!(predicate.evaluate(&candidate(), &strong).passed());
        assert!(!predicate.evaluate(&candidate(), &short).passed());
        assert!(!predicate.evaluate(&candidate(), &weak).passed());
    }

    #[test]
    fn quota_follows_failure_policy() {
        let quota = EnrichmentResult::QuotaExceeded {
            message: String::from("5 calls per minute"),
        };
        let closed = Predicate::no_news(TimeWindow::whole_day(date!(2025 - 03 - 14)));
        let open = closed.clone().on_failure(FailurePolicy::FailOpen);

        assert!(!closed.evaluate(&candidate(), &quota).passed());
        assert!(open.evaluate(&candidate(), &quota).passed());
    }

    #[test]
    fn constructors_validate_thresholds() {
        assert!(Predicate::beat_history(4, 5).is_err());
        assert!(Predicate::min_market_cap(Decimal::from(-1)).is_err());
    }

    #[test]
    fn query_matches_criterion() {
        let predicate = Predicate::beat_history(4, 3).expect("valid");
        assert_eq!(
            predicate.query(&candidate()),
            EnrichmentQuery::EarningsHistory {
                symbol: Symbol::parse("ABC").expect("valid"),
                quarters: 4
            }
        );
    }
}
