//! CLI argument definitions for ferroscreen.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `gainers` | Big gainers with no news on the last trading day |
//! | `earnings` | Next trading day's reporters with a record of beating estimates |
//! | `dashboard` | Both screens, one after the other |
//! | `movers` | The unfiltered candidate lists only (two API calls) |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--log-level` | `warn` | Log filter when `RUST_LOG` is unset |
//! | `--date` | today (UTC) | Reference date, `YYYY-MM-DD` |
//! | `--min-interval-secs` | `12` | Spacing between API calls |
//! | `--daily-budget` | `25` | Local daily call allowance, 0 disables |
//! | `--keep-on-lookup-failure` | `false` | Fail open instead of closed on failed lookups |
//!
//! Every threshold also reads a `FERROSCREEN_*` environment variable; flags win.

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

#[derive(Debug, Parser)]
#[command(
    name = "ferroscreen",
    author,
    version,
    about = "Rate-limited stock screener over the Alpha Vantage API",
    long_about = "ferroscreen finds large daily gainers that moved without news and \
upcoming earnings reporters that consistently beat estimates.\n\
\n\
The free Alpha Vantage tier allows 5 calls per minute and 25 per day, so every \
call is spaced out and a full dashboard takes a few minutes."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log filter directive used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Suppress progress and status lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    pub quiet: bool,

    /// Reference date (YYYY-MM-DD) used to derive the last and next trading days.
    #[arg(long, global = true)]
    pub date: Option<String>,

    /// Minimum seconds between two API calls.
    #[arg(long, global = true)]
    pub min_interval_secs: Option<u64>,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Daily call allowance; once spent, lookups are refused locally until it
    /// refills at one call per 24h/N (0 disables).
    #[arg(long, global = true)]
    pub daily_budget: Option<u32>,

    /// Keep a candidate whose lookup failed (quota, provider error, timeout)
    /// instead of dropping it.
    #[arg(long, global = true, default_value_t = false)]
    pub keep_on_lookup_failure: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain-text tables for terminal display.
    Table,
    /// Single JSON object output.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Top gainers above the price and change floors with no news on the last trading day.
    ///
    ///   ferroscreen gainers
    ///   ferroscreen gainers --change-floor 80 --max-gainers 5
    Gainers(GainersArgs),

    /// Next trading day's earnings reporters that beat estimates in most recent quarters.
    ///
    ///   ferroscreen earnings
    ///   ferroscreen earnings --min-beats 4
    Earnings(EarningsArgs),

    /// Run the gainers screen, then the earnings screen.
    Dashboard(DashboardArgs),

    /// Show the unfiltered candidate lists without any enrichment lookups.
    Movers(MoversArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct GainersArgs {
    /// Minimum last price in dollars.
    #[arg(long)]
    pub price_floor: Option<Decimal>,

    /// Minimum daily change in percent.
    #[arg(long)]
    pub change_floor: Option<Decimal>,

    /// Minimum market capitalization; enables the market cap lookup when above zero.
    #[arg(long)]
    pub market_cap_floor: Option<Decimal>,

    /// Look back this many hours for news instead of the whole last trading day.
    #[arg(long)]
    pub news_lookback_hours: Option<u32>,

    /// Gainers to check for news.
    #[arg(long)]
    pub max_gainers: Option<usize>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct EarningsArgs {
    /// Quarters (of the last four) that must beat the estimate.
    #[arg(long)]
    pub min_beats: Option<u32>,

    /// Reporters to check for beat history.
    #[arg(long)]
    pub max_reporters: Option<usize>,

    /// Report date to screen (YYYY-MM-DD); defaults to the next trading day.
    #[arg(long)]
    pub report_date: Option<String>,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub gainers: GainersArgs,

    #[command(flatten)]
    pub earnings: EarningsArgs,
}

#[derive(Debug, Args)]
pub struct MoversArgs {
    /// Rows shown per list.
    #[arg(long)]
    pub display_limit: Option<usize>,
}
