use ferroscreen_core::{EarningsFilter, EarningsHorizon, RunOptions};

use super::{parse_date, unfiltered, Context};
use crate::cli::EarningsArgs;
use crate::error::CliError;
use crate::report::{Section, SectionKind};

pub async fn run(context: &Context<'_>, args: &EarningsArgs) -> Result<Section, CliError> {
    let config = &context.config;
    let report_date = match args.report_date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => context.next_trading_day(),
    };
    let mut section = Section::new(
        SectionKind::Earnings,
        format!("Earnings on {report_date}"),
        format!(
            "beat EPS estimates in >= {} of the last 4 quarters",
            config.thresholds.min_beats
        ),
    );

    context
        .progress
        .on_status(&format!("Fetching earnings calendar for {report_date}..."));
    let filter = EarningsFilter {
        report_date,
        horizon: EarningsHorizon::ThreeMonths,
    };
    let fetch = context.screener.earnings_calendar(&filter, context.cancel).await?;
    let Some(candidates) = unfiltered(&mut section, fetch, config.limits.display_limit) else {
        return Ok(section);
    };
    if candidates.is_empty() {
        section.warn(format!("No earnings reports scheduled for {report_date}."));
        return Ok(section);
    }

    let predicates = config.earnings_predicates()?;
    let report = context
        .screener
        .enrich(
            candidates,
            &predicates,
            RunOptions::new(config.limits.earnings_max),
            context.progress,
            context.cancel,
        )
        .await?;
    section.record_run(report, "No companies with a consistent record of beating estimates.");
    Ok(section)
}
