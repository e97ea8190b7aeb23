use ferroscreen_core::{EarningsFilter, EarningsHorizon};

use super::{unfiltered, Context};
use crate::error::CliError;
use crate::report::{Section, SectionKind};

/// Both candidate lists as fetched and locally filtered, with no enrichment lookups.
pub async fn run(context: &Context<'_>) -> Result<Vec<Section>, CliError> {
    let config = &context.config;
    let display_limit = config.limits.display_limit;

    let mut gainers = Section::new(
        SectionKind::Gainers,
        "Top gainers",
        format!(
            "price >= ${}, change >= {}%",
            config.thresholds.price_floor, config.thresholds.change_percent_floor
        ),
    );
    let fetch = context
        .screener
        .top_gainers(&config.gainer_filter(), context.cancel)
        .await?;
    if unfiltered(&mut gainers, fetch, display_limit).is_some_and(|rows| rows.is_empty()) {
        gainers.warn("No stocks met the price and change criteria today.");
    }

    let report_date = context.next_trading_day();
    let mut earnings = Section::new(
        SectionKind::Earnings,
        format!("Earnings on {report_date}"),
        "scheduled reporters",
    );
    let filter = EarningsFilter {
        report_date,
        horizon: EarningsHorizon::ThreeMonths,
    };
    let fetch = context.screener.earnings_calendar(&filter, context.cancel).await?;
    if unfiltered(&mut earnings, fetch, display_limit).is_some_and(|rows| rows.is_empty()) {
        earnings.warn(format!("No earnings reports scheduled for {report_date}."));
    }

    Ok(vec![gainers, earnings])
}
