use ferroscreen_core::{RunOptions, TimeWindow};
use time::macros::time;

use super::{unfiltered, Context};
use crate::error::CliError;
use crate::report::{Section, SectionKind};

const TITLE: &str = "Top gainers";

pub async fn run(context: &Context<'_>) -> Result<Section, CliError> {
    let config = &context.config;
    let window = news_window(context);
    let mut section = Section::new(
        SectionKind::Gainers,
        TITLE,
        format!(
            "price >= ${}, change >= {}%, no news {}",
            config.thresholds.price_floor,
            config.thresholds.change_percent_floor,
            window_label(context)
        ),
    );

    context.progress.on_status("Fetching top gainers...");
    let fetch = context
        .screener
        .top_gainers(&config.gainer_filter(), context.cancel)
        .await?;
    let Some(candidates) = unfiltered(&mut section, fetch, config.limits.display_limit) else {
        return Ok(section);
    };
    if candidates.is_empty() {
        section.warn("No stocks met the price and change criteria today.");
        return Ok(section);
    }

    let predicates = config.gainer_predicates(window)?;
    let report = context
        .screener
        .enrich(
            candidates,
            &predicates,
            RunOptions::new(config.limits.gainers_max),
            context.progress,
            context.cancel,
        )
        .await?;
    section.record_run(report, "No big gainers without news found.");
    Ok(section)
}

fn news_window(context: &Context<'_>) -> TimeWindow {
    let last_day = context.last_trading_day();
    match context.config.thresholds.news_lookback_hours {
        0 => TimeWindow::whole_day(last_day),
        hours => TimeWindow::trailing(last_day.with_time(time!(23:59)), hours),
    }
}

fn window_label(context: &Context<'_>) -> String {
    match context.config.thresholds.news_lookback_hours {
        0 => format!("on {}", context.last_trading_day()),
        hours => format!("in the {hours}h before {} 23:59", context.last_trading_day()),
    }
}
