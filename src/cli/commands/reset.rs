//! Reset command implementation.

use super::prompt_continue;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Discard progress and quote files for one unit or the whole corpus.
pub fn run_reset(unit: Option<&str>, yes: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::offline(settings)?;

    let question = match unit {
        Some(id) => format!("Delete the quotes of {} and extract it again?", id),
        None => "Delete the checkpoint and every quote file?".to_string(),
    };
    if !yes && !prompt_continue(&question)? {
        Output::info("Cancelled.");
        return Ok(());
    }

    let reset = orchestrator.reset(unit)?;
    match unit {
        Some(id) if reset == 0 => Output::info(&format!("{} had no recorded progress.", id)),
        Some(id) => Output::success(&format!("Reset {}.", id)),
        None => Output::success(&format!(
            "Removed the checkpoint and {} quote file(s).",
            reset
        )),
    }
    Ok(())
}
