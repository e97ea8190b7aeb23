mod cli;
mod commands;
mod error;
mod output;
mod progress;
mod report;

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;
use crate::progress::TerminalProgress;

const CANCELLED_EXIT: u8 = 130;
const FETCH_FAILED_EXIT: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, finishing with partial results");
            trigger.cancel();
        }
    });

    let progress = TerminalProgress::new(cli.quiet);
    let dashboard = commands::run(&cli, &progress, &cancel).await?;
    output::render(&dashboard, cli.format, cli.pretty)?;

    if dashboard.cancelled() {
        return Ok(ExitCode::from(CANCELLED_EXIT));
    }
    if dashboard.has_fetch_failures() {
        return Ok(ExitCode::from(FETCH_FAILED_EXIT));
    }
    Ok(ExitCode::SUCCESS)
}
