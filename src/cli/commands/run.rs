//! Run command - the resumable extract and translate pipeline.

use super::prompt_continue;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the pipeline after showing the plan and asking for confirmation.
pub async fn run_pipeline(yes: bool, quiet_progress: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Run, &settings)?;

    let orchestrator = Orchestrator::new(settings)?.with_progress(!quiet_progress);
    let plan = orchestrator.plan()?;

    Output::header("Quote Pipeline");
    Output::kv("Transcripts", &plan.total_files.to_string());
    if plan.resuming {
        Output::kv("Checkpoint", "resuming from previous run");
    }
    if plan.failed_files > 0 {
        Output::kv(
            "Failed (skipped)",
            &format!("{} (see `podquote status`)", plan.failed_files),
        );
    }

    if plan.is_empty() {
        Output::success("Nothing left to do. Every transcript is translated or failed.");
        return Ok(());
    }

    Output::estimate(&plan.estimate);
    println!();

    if !yes && !prompt_continue("Start processing?")? {
        Output::info("Cancelled.");
        return Ok(());
    }

    let summary = orchestrator.run(plan.confirm()).await?;
    Output::run_summary(&summary);

    if summary.is_complete() {
        Output::success("All transcripts processed.");
    } else if !summary.failed_units.is_empty() {
        Output::warning(&format!(
            "{} unit(s) failed. Fix the cause, then run `podquote retry-failed`.",
            summary.failed_units.len()
        ));
    }

    Ok(())
}
