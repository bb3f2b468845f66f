//! Retry-failed command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Clear failed units so the next run picks them up.
pub fn run_retry_failed(units: &[String], settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::offline(settings)?;
    let cleared = orchestrator.retry_failed(units)?;

    if cleared.is_empty() {
        Output::info("No failed units to clear.");
        return Ok(());
    }

    for unit in &cleared {
        Output::list_item(unit);
    }
    Output::success(&format!(
        "Cleared {} unit(s). Run `podquote run` to process them.",
        cleared.len()
    ));
    Ok(())
}
