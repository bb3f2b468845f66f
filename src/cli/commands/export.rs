//! Export command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Write every quote file into one merged JSON array.
pub fn run_export(output: Option<String>, settings: Settings) -> Result<()> {
    let path = output
        .map(|p| Settings::expand_path(&p))
        .unwrap_or_else(|| settings.export_path());

    let orchestrator = Orchestrator::offline(settings)?;
    let count = orchestrator.export(Some(&path))?;

    if count == 0 {
        Output::warning("No quotes found. Run `podquote run` first.");
    }
    Output::success(&format!("Exported {} quotes to {}", count, path.display()));
    Ok(())
}
