use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Symbol, ValidationError};

/// A symbol under consideration, as produced by the candidate fetcher.
///
/// Mover candidates always carry `price` and `change_percent`. Earnings
/// calendar rows have no quote attached, so both are optional and the
/// calendar-only columns are kept alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: Symbol,
    pub price: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub volume: Option<u64>,
    pub report_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eps_estimate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_date_ending: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl Candidate {
    /// Builds a top-mover candidate. Negative prices are rejected; the change
    /// percent may be negative (losers).
    pub fn mover(
        symbol: Symbol,
        price: Decimal,
        change_percent: Decimal,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        if price.is_sign_negative() {
            return Err(ValidationError::NegativeValue { field: "price" });
        }

        Ok(Self {
            price: Some(price),
            change_percent: Some(change_percent),
            volume,
            ..Self::bare(symbol)
        })
    }

    /// Builds an earnings-calendar candidate reporting on `report_date`.
    pub fn scheduled(symbol: Symbol, report_date: Date) -> Self {
        Self {
            report_date: Some(report_date),
            ..Self::bare(symbol)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_eps_estimate(mut self, estimate: Decimal) -> Self {
        self.eps_estimate = Some(estimate);
        self
    }

    pub fn with_fiscal_date_ending(mut self, date: Date) -> Self {
        self.fiscal_date_ending = Some(date);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    fn bare(symbol: Symbol) -> Self {
        Self {
            symbol,
            price: None,
            change_percent: None,
            volume: None,
            report_date: None,
            name: None,
            eps_estimate: None,
            fiscal_date_ending: None,
            currency: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;
    use time::macros::date;

    #[test]
    fn mover_rejects_negative_price() {
        let err = Candidate::mover(
            Symbol::parse("ABC").expect("valid"),
            Decimal::from_f64(-1.0).expect("finite"),
            Decimal::from(60),
            None,
        )
        .expect_err("negative price must fail");

        assert_eq!(err, ValidationError::NegativeValue { field: "price" });
    }

    #[test]
    fn scheduled_candidate_has_no_quote() {
        let candidate = Candidate::scheduled(Symbol::parse("IBM").expect("valid"), date!(2025 - 01 - 21))
            .with_name("International Business Machines");

        assert_eq!(candidate.price, None);
        assert_eq!(candidate.change_percent, None);
        assert_eq!(candidate.report_date, Some(date!(2025 - 01 - 21)));
    }
}
