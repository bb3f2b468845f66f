//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Print checkpoint progress.
pub fn run_status(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::offline(settings)?;

    if !orchestrator.checkpoint().exists() {
        Output::info("No checkpoint yet. Start with `podquote run`.");
    }

    let status = orchestrator.status()?;
    Output::status(&status);
    Output::kv(
        "Checkpoint",
        &orchestrator.checkpoint().path().display().to_string(),
    );

    Ok(())
}
