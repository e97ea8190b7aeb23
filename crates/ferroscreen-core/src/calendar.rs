//! Weekday-only trading calendar. Exchange holidays are not modelled.

use time::{Date, Weekday};

/// Most recent weekday on or before `day`.
pub fn last_trading_day(day: Date) -> Date {
    let mut current = day;
    while is_weekend(current) {
        match current.previous_day() {
            Some(previous) => current = previous,
            None => break,
        }
    }
    current
}

/// First weekday strictly after `day`.
pub fn next_trading_day(day: Date) -> Date {
    let mut current = day;
    loop {
        match current.next_day() {
            Some(next) => current = next,
            None => return current,
        }
        if !is_weekend(current) {
            return current;
        }
    }
}

fn is_weekend(day: Date) -> bool {
    matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn weekend_rolls_back_to_friday() {
        assert_eq!(last_trading_day(date!(2025 - 03 - 15)), date!(2025 - 03 - 14));
        assert_eq!(last_trading_day(date!(2025 - 03 - 16)), date!(2025 - 03 - 14));
    }

    #[test]
    fn weekday_is_its_own_last_trading_day() {
        assert_eq!(last_trading_day(date!(2025 - 03 - 12)), date!(2025 - 03 - 12));
    }

    #[test]
    fn friday_rolls_forward_to_monday() {
        assert_eq!(next_trading_day(date!(2025 - 03 - 14)), date!(2025 - 03 - 17));
        assert_eq!(next_trading_day(date!(2025 - 03 - 15)), date!(2025 - 03 - 17));
        assert_eq!(next_trading_day(date!(2025 - 03 - 12)), date!(2025 - 03 - 13));
    }
}
