//! Align command - fix quote timestamps from transcript markers.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

pub async fn run_align(settings: Settings) -> Result<()> {
    preflight::check(Operation::Align, &settings)?;
    let policy = settings.alignment.missing_timestamp;

    let orchestrator = Orchestrator::offline(settings)?;
    let spinner = Output::spinner("Aligning timestamps...");
    let result = orchestrator.align().await;
    spinner.finish_and_clear();

    let report = result?;
    if report.files == 0 {
        Output::info("No quote files found. Run `podquote run` first.");
        return Ok(());
    }

    Output::alignment_report(&report);
    Output::kv("Unresolved policy", &format!("{:?}", policy).to_lowercase());
    Output::success("Done.");
    Ok(())
}
