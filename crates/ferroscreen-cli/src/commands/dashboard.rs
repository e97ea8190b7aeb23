use super::{earnings, gainers, Context};
use crate::cli::EarningsArgs;
use crate::error::CliError;
use crate::report::Section;

/// Gainers first, then earnings, sharing one screener so spacing carries over.
pub async fn run(context: &Context<'_>, earnings_args: &EarningsArgs) -> Result<Vec<Section>, CliError> {
    let mut sections = vec![gainers::run(context).await?];
    if context.cancel.is_cancelled() {
        return Ok(sections);
    }
    sections.push(earnings::run(context, earnings_args).await?);
    Ok(sections)
}
