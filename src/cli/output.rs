//! CLI output formatting utilities.

use crate::alignment::AlignmentReport;
use crate::pacing::RunEstimate;
use crate::report::{format_duration, BatchSummary, RunSummary, StatusReport};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Warnings listed in full before the rest are summarized.
const MAX_LISTED_WARNINGS: usize = 20;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print the upfront estimate of a run.
    pub fn estimate(estimate: &RunEstimate) {
        Self::kv("Files to extract", &estimate.files_to_extract.to_string());
        Self::kv("Files to translate", &estimate.files_to_translate.to_string());
        Self::kv("Batches", &estimate.batches.to_string());
        Self::kv("Estimated cost", &format!("${:.2}", estimate.cost_usd));
        Self::kv("Estimated time", &format_duration(estimate.duration));
    }

    /// Print progress after a batch.
    pub fn batch_summary(summary: &BatchSummary) {
        let eta = summary
            .eta
            .map(format_duration)
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "{} Batch {}/{}: {}/{} files, {} quotes extracted, {} translated, ${:.2} (elapsed {}, ETA {})",
            style(">>").green(),
            summary.batch,
            summary.total_batches,
            summary.files_completed,
            summary.total_files,
            summary.quotes_extracted,
            summary.quotes_translated,
            summary.cost_usd,
            format_duration(summary.elapsed),
            style(eta).cyan()
        );
    }

    /// Print the final report of a run.
    pub fn run_summary(summary: &RunSummary) {
        Self::header("Run Summary");
        Self::kv(
            "Files translated",
            &format!("{}/{}", summary.files_translated, summary.total_files),
        );
        Self::kv("Quotes extracted", &summary.quotes_extracted.to_string());
        Self::kv("Quotes translated", &summary.quotes_translated.to_string());
        Self::kv("External calls", &summary.calls.to_string());
        Self::kv("Total cost", &format!("${:.2}", summary.cost_usd));
        Self::kv("Elapsed", &format_duration(summary.elapsed));
        if let Some(exported) = summary.exported {
            Self::kv("Exported quotes", &exported.to_string());
        }

        Self::failures(&summary.failed_units, &summary.recent_errors);
    }

    /// Print checkpoint status.
    pub fn status(status: &StatusReport) {
        Self::header("Pipeline Status");
        Self::kv("Transcripts", &status.total_files.to_string());
        Self::kv("Pending", &status.pending.to_string());
        Self::kv("Extracted", &status.extracted.to_string());
        Self::kv("Translated", &status.translated.to_string());
        Self::kv("Failed", &status.failed_units.len().to_string());
        Self::kv("Quotes extracted", &status.quotes_extracted.to_string());
        Self::kv("Quotes translated", &status.quotes_translated.to_string());
        Self::kv("Total cost", &format!("${:.2}", status.cost_usd));
        Self::kv("Runs", &status.runs.to_string());
        if let Some(started) = status.started_at {
            Self::kv("Started", &started.format("%Y-%m-%d %H:%M:%S UTC").to_string());
        }

        Self::failures(&status.failed_units, &status.recent_errors);
    }

    fn failures(failed_units: &[String], recent_errors: &[String]) {
        if !failed_units.is_empty() {
            Self::header("Failed Units");
            for unit in failed_units {
                Self::list_item(unit);
            }
            println!(
                "  {}",
                style("Run `podquote retry-failed` to schedule them again.").dim()
            );
        }

        if !recent_errors.is_empty() {
            Self::header("Recent Errors");
            for error in recent_errors {
                Self::list_item(error);
            }
        }
    }

    /// Print the result of an alignment pass.
    pub fn alignment_report(report: &AlignmentReport) {
        Self::header("Alignment Summary");
        Self::kv("Files processed", &report.files.to_string());
        Self::kv("Quotes checked", &report.quotes_checked.to_string());
        Self::kv("Timestamps updated", &report.updated.to_string());
        Self::kv("Timestamps unchanged", &report.unchanged.to_string());
        Self::kv("Warnings", &report.warnings.len().to_string());

        if report.warnings.is_empty() {
            return;
        }
        if report.warnings.len() > MAX_LISTED_WARNINGS {
            Self::header(&format!(
                "First {} warnings (of {})",
                MAX_LISTED_WARNINGS,
                report.warnings.len()
            ));
        } else {
            Self::header("Warnings");
        }
        for warning in report.warnings.iter().take(MAX_LISTED_WARNINGS) {
            Self::list_item(warning);
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
