mod dashboard;
mod earnings;
mod gainers;
mod movers;

use std::sync::Arc;

use ferroscreen_core::{
    last_trading_day, next_trading_day, Candidate, FailurePolicy, FetchReport, ProgressSink,
    ReqwestHttpClient, Screener, ScreenerConfig, ValidationError,
};
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::{Cli, Command, EarningsArgs, GainersArgs};
use crate::error::CliError;
use crate::report::{Dashboard, Section};

/// What every command needs: resolved config, the shared screener and the run's dates.
pub struct Context<'a> {
    pub config: ScreenerConfig,
    pub screener: Screener,
    pub today: Date,
    pub progress: &'a dyn ProgressSink,
    pub cancel: &'a CancellationToken,
}

impl Context<'_> {
    pub fn last_trading_day(&self) -> Date {
        last_trading_day(self.today)
    }

    pub fn next_trading_day(&self) -> Date {
        next_trading_day(self.today)
    }
}

pub async fn run(
    cli: &Cli,
    progress: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> Result<Dashboard, CliError> {
    let config = resolve_config(cli)?;
    debug!(?config, "configuration resolved");

    let today = match cli.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => OffsetDateTime::now_utc().date(),
    };
    let screener = Screener::from_config(&config, Arc::new(ReqwestHttpClient::new()));
    let context = Context {
        config,
        screener,
        today,
        progress,
        cancel,
    };

    progress.on_status(&rate_limit_notice(&context.config));

    let sections: Vec<Section> = match &cli.command {
        Command::Gainers(_) => vec![gainers::run(&context).await?],
        Command::Earnings(args) => vec![earnings::run(&context, args).await?],
        Command::Dashboard(args) => dashboard::run(&context, &args.earnings).await?,
        Command::Movers(_) => movers::run(&context).await?,
    };

    Ok(Dashboard {
        reference_date: today,
        last_trading_day: context.last_trading_day(),
        next_trading_day: context.next_trading_day(),
        notice: rate_limit_notice(&context.config),
        footer: footer(&context),
        sections,
    })
}

/// Environment first, then global flags, then the subcommand's flags.
fn resolve_config(cli: &Cli) -> Result<ScreenerConfig, CliError> {
    let mut config = ScreenerConfig::from_env()?;

    if let Some(secs) = cli.min_interval_secs {
        config.min_interval_secs = secs;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(budget) = cli.daily_budget {
        config.limits.daily_budget = budget;
    }
    if cli.keep_on_lookup_failure {
        config.on_lookup_failure = FailurePolicy::FailOpen;
    }

    match &cli.command {
        Command::Gainers(args) => apply_gainers(&mut config, args),
        Command::Earnings(args) => apply_earnings(&mut config, args),
        Command::Dashboard(args) => {
            apply_gainers(&mut config, &args.gainers);
            apply_earnings(&mut config, &args.earnings);
        }
        Command::Movers(args) => {
            if let Some(limit) = args.display_limit {
                config.limits.display_limit = limit;
            }
        }
    }

    config.validate()?;
    Ok(config)
}

fn apply_gainers(config: &mut ScreenerConfig, args: &GainersArgs) {
    let thresholds = &mut config.thresholds;
    if let Some(floor) = args.price_floor {
        thresholds.price_floor = floor;
    }
    if let Some(floor) = args.change_floor {
        thresholds.change_percent_floor = floor;
    }
    if let Some(floor) = args.market_cap_floor {
        thresholds.market_cap_floor = floor;
    }
    if let Some(hours) = args.news_lookback_hours {
        thresholds.news_lookback_hours = hours;
    }
    if let Some(max) = args.max_gainers {
        config.limits.gainers_max = max;
    }
}

fn apply_earnings(config: &mut ScreenerConfig, args: &EarningsArgs) {
    if let Some(min_beats) = args.min_beats {
        config.thresholds.min_beats = min_beats;
    }
    if let Some(max) = args.max_reporters {
        config.limits.earnings_max = max;
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<Date, CliError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: raw.to_owned(),
        }
        .into()
    })
}

/// Records the display slice and returns the full list, or `None` after a failed fetch.
fn unfiltered(
    section: &mut Section,
    fetch: FetchReport,
    display_limit: usize,
) -> Option<Vec<Candidate>> {
    if let Some(failure) = fetch.failure {
        section.record_fetch_failure(failure);
        return None;
    }
    section.unfiltered = fetch.candidates.iter().take(display_limit).cloned().collect();
    Some(fetch.candidates)
}

fn rate_limit_notice(config: &ScreenerConfig) -> String {
    format!(
        "Free Alpha Vantage keys allow 5 calls per minute and 25 per day. Calls are spaced {}s apart, so screening takes a while.",
        config.min_interval_secs
    )
}

fn footer(context: &Context<'_>) -> String {
    format!(
        "Data from Alpha Vantage. Reference date {}: last trading day {}, next trading day {}.",
        context.today,
        context.last_trading_day(),
        context.next_trading_day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_reference_date() {
        assert_eq!(parse_date("2025-03-14").expect("valid"), date!(2025 - 03 - 14));
        assert!(matches!(
            parse_date("14/03/2025"),
            Err(CliError::Validation(ValidationError::InvalidDate { .. }))
        ));
    }

    #[test]
    fn subcommand_flags_override_environment_values() {
        let mut config = ScreenerConfig::with_api_key("demo-key");
        let args = GainersArgs {
            change_floor: Some(rust_decimal::Decimal::from(80)),
            max_gainers: Some(3),
            ..GainersArgs::default()
        };

        apply_gainers(&mut config, &args);

        assert_eq!(config.thresholds.change_percent_floor, rust_decimal::Decimal::from(80));
        assert_eq!(config.limits.gainers_max, 3);
        assert_eq!(config.thresholds.price_floor, rust_decimal::Decimal::from(3));
    }
}
