use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::macros::{format_description, time};
use time::{Date, Duration, PrimitiveDateTime};

use crate::ValidationError;

/// Inclusive lookup window for news queries, in the provider's local market time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    from: PrimitiveDateTime,
    to: PrimitiveDateTime,
}

impl TimeWindow {
    pub fn new(from: PrimitiveDateTime, to: PrimitiveDateTime) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::InvertedWindow);
        }
        Ok(Self { from, to })
    }

    /// The whole calendar day, `00:00` through `23:59`.
    pub fn whole_day(day: Date) -> Self {
        Self {
            from: day.with_time(time!(00:00)),
            to: day.with_time(time!(23:59)),
        }
    }

    /// The `hours` leading up to `end`.
    pub fn trailing(end: PrimitiveDateTime, hours: u32) -> Self {
        Self {
            from: end - Duration::hours(i64::from(hours)),
            to: end,
        }
    }

    pub const fn from(&self) -> PrimitiveDateTime {
        self.from
    }

    pub const fn to(&self) -> PrimitiveDateTime {
        self.to
    }

    /// `(time_from, time_to)` in the provider's `YYYYMMDDTHHMM` form.
    pub fn query_bounds(&self) -> (String, String) {
        (compact(self.from), compact(self.to))
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (from, to) = self.query_bounds();
        write!(f, "{from}..{to}")
    }
}

fn compact(value: PrimitiveDateTime) -> String {
    let format = format_description!("[year][month][day]T[hour][minute]");
    value
        .format(&format)
        .unwrap_or_else(|_| String::from("00000000T0000"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn whole_day_spans_midnight_to_last_minute() {
        let window = TimeWindow::whole_day(date!(2025 - 03 - 14));
        assert_eq!(
            window.query_bounds(),
            (String::from("20250314T0000"), String::from("20250314T2359"))
        );
    }

    #[test]
    fn trailing_window_crosses_day_boundary() {
        let window = TimeWindow::trailing(datetime!(2025-03-14 09:30), 24);
        assert_eq!(window.from(), datetime!(2025-03-13 09:30));
        assert_eq!(window.to(), datetime!(2025-03-14 09:30));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let result = TimeWindow::new(datetime!(2025-03-14 10:00), datetime!(2025-03-14 09:00));
        assert_eq!(result, Err(ValidationError::InvertedWindow));
    }
}
