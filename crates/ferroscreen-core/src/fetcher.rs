//! Candidate fetcher: one upstream request plus cheap local filtering.
//!
//! Fetches never raise. An upstream failure yields an empty candidate list and
//! the failure classification in [`FetchReport::failure`].

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::macros::format_description;
use time::Date;
use tracing::{debug, info, warn};

use crate::client::parse_decimal;
use crate::failure::CallFailure;
use crate::screener::Gate;
use crate::{Candidate, Symbol};

const GAINERS_FUNCTION: &str = "TOP_GAINERS_LOSERS";
const GAINERS_KEY: &str = "top_gainers";
const CALENDAR_FUNCTION: &str = "EARNINGS_CALENDAR";

/// Static thresholds for the top-gainers list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainerFilter {
    pub price_floor: Decimal,
    pub change_percent_floor: Decimal,
    /// Cap on the returned list, applied after sorting.
    pub limit: usize,
}

impl Default for GainerFilter {
    fn default() -> Self {
        Self {
            price_floor: Decimal::from(3),
            change_percent_floor: Decimal::from(50),
            limit: 20,
        }
    }
}

/// Look-ahead span of the earnings calendar download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarningsHorizon {
    #[default]
    #[serde(rename = "3month")]
    ThreeMonths,
    #[serde(rename = "6month")]
    SixMonths,
    #[serde(rename = "12month")]
    TwelveMonths,
}

impl EarningsHorizon {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThreeMonths => "3month",
            Self::SixMonths => "6month",
            Self::TwelveMonths => "12month",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsFilter {
    pub report_date: Date,
    #[serde(default)]
    pub horizon: EarningsHorizon,
}

/// Result of one fetch: the filtered, ordered candidates plus what went wrong, if anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchReport {
    pub candidates: Vec<Candidate>,
    pub failure: Option<CallFailure>,
    /// Rows returned upstream before local filtering.
    pub upstream_rows: usize,
    /// Rows dropped because they could not be parsed.
    pub malformed_rows: usize,
}

impl FetchReport {
    pub fn failed(failure: CallFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

pub async fn top_gainers(gate: &mut Gate<'_>, filter: &GainerFilter) -> FetchReport {
    let report = match gate.fetch_json(GAINERS_FUNCTION, &[], GAINERS_KEY).await {
        Ok(object) => parse_top_gainers(&object, filter),
        Err(failure) => FetchReport::failed(failure),
    };
    log_report("top gainers", &report);
    report
}

pub async fn earnings_calendar(gate: &mut Gate<'_>, filter: &EarningsFilter) -> FetchReport {
    let params = [("horizon", String::from(filter.horizon.as_str()))];
    let report = match gate.fetch_text(CALENDAR_FUNCTION, &params).await {
        Ok(table) => parse_earnings_calendar(&table, filter),
        Err(failure) => FetchReport::failed(failure),
    };
    log_report("earnings calendar", &report);
    report
}

#[derive(Debug, Deserialize)]
struct MoverRow {
    ticker: String,
    price: String,
    change_percentage: String,
    #[serde(default)]
    volume: Option<String>,
}

impl MoverRow {
    fn into_candidate(self) -> Option<Candidate> {
        let symbol = Symbol::parse(&self.ticker).ok()?;
        let price = parse_decimal(&self.price)?.round_dp(2);
        let change = parse_decimal(self.change_percentage.trim().trim_end_matches('%'))?;
        let volume = self.volume.as_deref().and_then(|v| v.trim().parse().ok());
        Candidate::mover(symbol, price, change, volume).ok()
    }
}

/// Applies the price and change floors to a decoded `TOP_GAINERS_LOSERS` object and
/// orders the survivors by descending change percent (ties by symbol).
pub fn parse_top_gainers(object: &Map<String, Value>, filter: &GainerFilter) -> FetchReport {
    let Some(rows) = object.get(GAINERS_KEY).and_then(Value::as_array) else {
        return FetchReport::failed(CallFailure::schema(format!("'{GAINERS_KEY}' is not an array")));
    };

    let mut malformed_rows = 0;
    let mut candidates = rows
        .iter()
        .filter_map(|row| {
            let parsed = serde_json::from_value::<MoverRow>(row.clone())
                .ok()
                .and_then(MoverRow::into_candidate);
            if parsed.is_none() {
                malformed_rows += 1;
                debug!(row = %row, "skipping malformed mover row");
            }
            parsed
        })
        .filter(|candidate| {
            candidate.price >= Some(filter.price_floor)
                && candidate.change_percent >= Some(filter.change_percent_floor)
        })
        .collect::<Vec<_>>();

    candidates.sort_by(by_change_descending);
    candidates.truncate(filter.limit);

    FetchReport {
        candidates,
        failure: None,
        upstream_rows: rows.len(),
        malformed_rows,
    }
}

fn by_change_descending(left: &Candidate, right: &Candidate) -> Ordering {
    right
        .change_percent
        .cmp(&left.change_percent)
        .then_with(|| left.symbol.cmp(&right.symbol))
}

#[derive(Debug, Deserialize)]
struct CalendarRow {
    symbol: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "reportDate")]
    report_date: String,
    #[serde(rename = "fiscalDateEnding", default)]
    fiscal_date_ending: String,
    #[serde(default)]
    estimate: String,
    #[serde(default)]
    currency: String,
}

impl CalendarRow {
    fn into_candidate(self) -> Option<Candidate> {
        let symbol = Symbol::parse(&self.symbol).ok()?;
        let report_date = parse_date(&self.report_date)?;

        let mut candidate = Candidate::scheduled(symbol, report_date);
        if !self.name.trim().is_empty() {
            candidate = candidate.with_name(self.name.trim());
        }
        if let Some(estimate) = parse_decimal(&self.estimate) {
            candidate = candidate.with_eps_estimate(estimate);
        }
        if let Some(fiscal) = parse_date(&self.fiscal_date_ending) {
            candidate = candidate.with_fiscal_date_ending(fiscal);
        }
        if !self.currency.trim().is_empty() {
            candidate = candidate.with_currency(self.currency.trim());
        }
        Some(candidate)
    }
}

/// Keeps calendar rows reporting on the filter's date, ordered by symbol.
pub fn parse_earnings_calendar(table: &str, filter: &EarningsFilter) -> FetchReport {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(table.as_bytes());

    let mut upstream_rows = 0;
    let mut malformed_rows = 0;
    let mut candidates = Vec::new();

    for record in reader.deserialize::<CalendarRow>() {
        upstream_rows += 1;
        match record.ok().and_then(CalendarRow::into_candidate) {
            Some(candidate) if candidate.report_date == Some(filter.report_date) => {
                candidates.push(candidate)
            }
            Some(_) => {}
            None => malformed_rows += 1,
        }
    }

    candidates.sort_by(|left, right| left.symbol.cmp(&right.symbol));

    FetchReport {
        candidates,
        failure: None,
        upstream_rows,
        malformed_rows,
    }
}

fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

fn log_report(list: &str, report: &FetchReport) {
    match &report.failure {
        Some(failure) => warn!(list, code = failure.code(), error = %failure.message(), "fetch failed"),
        None => info!(
            list,
            upstream = report.upstream_rows,
            kept = report.candidates.len(),
            malformed = report.malformed_rows,
            "fetch complete"
        ),
    }
}
