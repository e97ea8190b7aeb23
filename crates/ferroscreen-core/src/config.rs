//! Environment-backed screener configuration.
//!
//! Values come from the process environment (after loading `.env`) and fall
//! back to the free-tier defaults. A malformed value is an error rather than a
//! silent default; the CLI applies its flag overrides on top.

use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS};
use crate::error::{ConfigError, ValidationError};
use crate::fetcher::GainerFilter;
use crate::predicate::{FailurePolicy, Predicate};
use crate::TimeWindow;

pub const API_KEY_VAR: &str = "FERROSCREEN_ALPHAVANTAGE_API_KEY";
const LEGACY_API_KEY_VAR: &str = "API_KEY";
const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

/// Quarters of earnings history examined by the beat-history screen.
pub const BEAT_QUARTERS: u32 = 4;

#[derive(Clone, PartialEq, Eq)]
pub struct ScreenerConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_ms: u64,
    pub min_interval_secs: u64,
    pub thresholds: Thresholds,
    pub limits: Limits,
    /// Applied to every screening predicate.
    pub on_lookup_failure: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thresholds {
    pub price_floor: Decimal,
    pub change_percent_floor: Decimal,
    /// Zero disables the market cap screen.
    pub market_cap_floor: Decimal,
    /// Zero means the whole last trading day.
    pub news_lookback_hours: u32,
    pub min_beats: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            price_floor: Decimal::from(3),
            change_percent_floor: Decimal::from(50),
            market_cap_floor: Decimal::ZERO,
            news_lookback_hours: 0,
            min_beats: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Gainers checked for news.
    pub gainers_max: usize,
    /// Earnings reporters checked for beat history.
    pub earnings_max: usize,
    /// Rows shown in the unfiltered views.
    pub display_limit: usize,
    /// Daily call allowance, refilled one call per 24h/N once spent; zero
    /// disables the local budget.
    pub daily_budget: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            gainers_max: 10,
            earnings_max: 5,
            display_limit: 20,
            daily_budget: 25,
        }
    }
}

impl ScreenerConfig {
    /// Config with defaults for everything but the key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            min_interval_secs: 12,
            thresholds: Thresholds::default(),
            limits: Limits::default(),
            on_lookup_failure: FailurePolicy::FailClosed,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_VAR)
            .or_else(|| lookup(LEGACY_API_KEY_VAR))
            .unwrap_or_default();

        let defaults = Self::with_api_key(api_key);
        let thresholds = Thresholds {
            price_floor: parse_or(&lookup, "FERROSCREEN_PRICE_FLOOR", defaults.thresholds.price_floor)?,
            change_percent_floor: parse_or(
                &lookup,
                "FERROSCREEN_CHANGE_FLOOR",
                defaults.thresholds.change_percent_floor,
            )?,
            market_cap_floor: parse_or(
                &lookup,
                "FERROSCREEN_MARKET_CAP_FLOOR",
                defaults.thresholds.market_cap_floor,
            )?,
            news_lookback_hours: parse_or(
                &lookup,
                "FERROSCREEN_NEWS_LOOKBACK_HOURS",
                defaults.thresholds.news_lookback_hours,
            )?,
            min_beats: parse_or(&lookup, "FERROSCREEN_MIN_BEATS", defaults.thresholds.min_beats)?,
        };
        let limits = Limits {
            gainers_max: parse_or(&lookup, "FERROSCREEN_GAINERS_MAX", defaults.limits.gainers_max)?,
            earnings_max: parse_or(&lookup, "FERROSCREEN_EARNINGS_MAX", defaults.limits.earnings_max)?,
            display_limit: parse_or(&lookup, "FERROSCREEN_DISPLAY_LIMIT", defaults.limits.display_limit)?,
            daily_budget: parse_or(&lookup, "FERROSCREEN_DAILY_BUDGET", defaults.limits.daily_budget)?,
        };

        let config = Self {
            base_url: lookup("FERROSCREEN_BASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.base_url),
            timeout_ms: parse_or(&lookup, "FERROSCREEN_TIMEOUT_MS", defaults.timeout_ms)?,
            min_interval_secs: parse_or(
                &lookup,
                "FERROSCREEN_MIN_INTERVAL_SECS",
                defaults.min_interval_secs,
            )?,
            on_lookup_failure: if parse_or(&lookup, "FERROSCREEN_FAIL_OPEN", false)? {
                FailurePolicy::FailOpen
            } else {
                FailurePolicy::FailClosed
            },
            api_key: defaults.api_key,
            thresholds,
            limits,
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects a missing or placeholder key and out-of-range thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if key == PLACEHOLDER_API_KEY {
            return Err(ConfigError::PlaceholderApiKey(key.to_owned()));
        }

        let decimals = [
            ("price_floor", self.thresholds.price_floor),
            ("change_percent_floor", self.thresholds.change_percent_floor),
            ("market_cap_floor", self.thresholds.market_cap_floor),
        ];
        if let Some((field, _)) = decimals.iter().find(|(_, value)| value.is_sign_negative()) {
            return Err(ValidationError::NegativeValue { field: *field }.into());
        }

        if self.thresholds.min_beats > BEAT_QUARTERS {
            return Err(ValidationError::BeatsExceedQuarters {
                min_beats: self.thresholds.min_beats,
                quarters: BEAT_QUARTERS,
            }
            .into());
        }
        Ok(())
    }

    pub const fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }

    pub fn gainer_filter(&self) -> GainerFilter {
        GainerFilter {
            price_floor: self.thresholds.price_floor,
            change_percent_floor: self.thresholds.change_percent_floor,
            limit: self.limits.display_limit.max(self.limits.gainers_max),
        }
    }

    /// Market cap (when enabled) first, then the no-news screen over `news_window`.
    pub fn gainer_predicates(&self, news_window: TimeWindow) -> Result<Vec<Predicate>, ValidationError> {
        let mut predicates = Vec::with_capacity(2);
        if !self.thresholds.market_cap_floor.is_zero() {
            predicates.push(
                Predicate::min_market_cap(self.thresholds.market_cap_floor)?
                    .on_failure(self.on_lookup_failure),
            );
        }
        predicates.push(Predicate::no_news(news_window).on_failure(self.on_lookup_failure));
        Ok(predicates)
    }

    pub fn earnings_predicates(&self) -> Result<Vec<Predicate>, ValidationError> {
        Ok(vec![
            Predicate::beat_history(BEAT_QUARTERS, self.thresholds.min_beats)?
                .on_failure(self.on_lookup_failure),
        ])
    }
}

impl Debug for ScreenerConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenerConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("min_interval_secs", &self.min_interval_secs)
            .field("thresholds", &self.thresholds)
            .field("limits", &self.limits)
            .field("on_lookup_failure", &self.on_lookup_failure)
            .finish()
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_free_tier() {
        let config = ScreenerConfig::from_lookup(lookup(&[(API_KEY_VAR, "demo-key")]))
            .expect("valid config");

        assert_eq!(config.min_interval(), Duration::from_secs(12));
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.thresholds.price_floor, Decimal::from(3));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn missing_and_placeholder_keys_are_rejected() {
        assert_eq!(
            ScreenerConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingApiKey)
        );
        assert_eq!(
            ScreenerConfig::from_lookup(lookup(&[("API_KEY", "YOUR_API_KEY_HERE")])),
            Err(ConfigError::PlaceholderApiKey(String::from(PLACEHOLDER_API_KEY)))
        );
    }

    #[test]
    fn malformed_values_name_their_variable() {
        let result = ScreenerConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "demo-key"),
            ("FERROSCREEN_MIN_INTERVAL_SECS", "soon"),
        ]));

        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                key: "FERROSCREEN_MIN_INTERVAL_SECS",
                value: String::from("soon")
            })
        );
    }

    #[test]
    fn thresholds_are_validated() {
        let negative = ScreenerConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "demo-key"),
            ("FERROSCREEN_PRICE_FLOOR", "-1"),
        ]));
        assert!(matches!(
            negative,
            Err(ConfigError::Validation(ValidationError::NegativeValue { field: "price_floor" }))
        ));

        let beats = ScreenerConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "demo-key"),
            ("FERROSCREEN_MIN_BEATS", "5"),
        ]));
        assert!(matches!(
            beats,
            Err(ConfigError::Validation(ValidationError::BeatsExceedQuarters { .. }))
        ));
    }

    #[test]
    fn market_cap_screen_only_when_enabled() {
        let window = TimeWindow::whole_day(time::macros::date!(2025 - 03 - 14));
        let mut config = ScreenerConfig::with_api_key("demo-key");
        assert_eq!(config.gainer_predicates(window).expect("valid").len(), 1);

        config.thresholds.market_cap_floor = Decimal::from(50_000_000);
        assert_eq!(config.gainer_predicates(window).expect("valid").len(), 2);
    }

    #[test]
    fn fail_open_switch_reaches_every_predicate() {
        let config = ScreenerConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "demo-key"),
            ("FERROSCREEN_FAIL_OPEN", "true"),
        ]))
        .expect("valid config");

        let predicates = config.earnings_predicates().expect("valid");
        assert!(predicates
            .iter()
            .all(|predicate| predicate.on_failure == FailurePolicy::FailOpen));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let config = ScreenerConfig::with_api_key("secret-key");
        assert!(!format!("{config:?}").contains("secret-key"));
    }
}
