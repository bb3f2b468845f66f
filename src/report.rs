//! Progress summaries produced by a pipeline run.

use crate::checkpoint::{ErrorEntry, PipelineState, UnitStatus};
use crate::corpus::WorkUnit;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Progress snapshot emitted after each batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// 1-based batch number.
    pub batch: usize,
    pub total_batches: usize,
    /// Units that have finished translation.
    pub files_completed: usize,
    pub total_files: usize,
    pub quotes_extracted: usize,
    pub quotes_translated: usize,
    pub elapsed: Duration,
    pub eta: Option<Duration>,
    pub cost_usd: f64,
}

impl BatchSummary {
    pub fn from_state(
        state: &PipelineState,
        batch: usize,
        total_batches: usize,
        total_files: usize,
        elapsed: Duration,
    ) -> Self {
        let files_completed = state.count_status(UnitStatus::Translated);
        let remaining = total_files
            .saturating_sub(files_completed)
            .saturating_sub(state.count_status(UnitStatus::Failed));
        Self {
            batch,
            total_batches,
            files_completed,
            total_files,
            quotes_extracted: state.counters.quotes_extracted,
            quotes_translated: state.counters.quotes_translated,
            elapsed,
            eta: eta(elapsed, files_completed, remaining),
            cost_usd: state.counters.total_cost_usd,
        }
    }
}

/// Final report of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_files: usize,
    pub files_translated: usize,
    pub quotes_extracted: usize,
    pub quotes_translated: usize,
    pub cost_usd: f64,
    pub elapsed: Duration,
    /// External calls made during this run, including failed ones.
    pub calls: usize,
    pub failed_units: Vec<String>,
    pub recent_errors: Vec<String>,
    /// Records written to the merged export, if it was produced.
    pub exported: Option<usize>,
}

impl RunSummary {
    /// Number of trailing errors carried into the summary.
    pub const RECENT_ERRORS: usize = 10;

    pub fn from_state(state: &PipelineState, total_files: usize, elapsed: Duration, calls: usize) -> Self {
        Self {
            total_files,
            files_translated: state.count_status(UnitStatus::Translated),
            quotes_extracted: state.counters.quotes_extracted,
            quotes_translated: state.counters.quotes_translated,
            cost_usd: state.counters.total_cost_usd,
            elapsed,
            calls,
            failed_units: state.failed_units().into_iter().map(String::from).collect(),
            recent_errors: recent_errors(&state.errors, Self::RECENT_ERRORS),
            exported: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed_units.is_empty() && self.files_translated == self.total_files
    }
}

/// Checkpoint progress against the current corpus.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub total_files: usize,
    /// Discovered units with no recorded progress are counted as pending.
    pub pending: usize,
    pub extracted: usize,
    pub translated: usize,
    pub failed_units: Vec<String>,
    pub quotes_extracted: usize,
    pub quotes_translated: usize,
    pub cost_usd: f64,
    pub runs: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub recent_errors: Vec<String>,
}

impl StatusReport {
    pub fn from_state(state: &PipelineState, units: &[WorkUnit], error_limit: usize) -> Self {
        let count = |status: UnitStatus| {
            units
                .iter()
                .filter(|u| state.status(&u.unit_id) == status)
                .count()
        };

        Self {
            total_files: units.len(),
            pending: count(UnitStatus::Pending),
            extracted: count(UnitStatus::Extracted),
            translated: count(UnitStatus::Translated),
            failed_units: state.failed_units().into_iter().map(String::from).collect(),
            quotes_extracted: state.counters.quotes_extracted,
            quotes_translated: state.counters.quotes_translated,
            cost_usd: state.counters.total_cost_usd,
            runs: state.counters.runs,
            started_at: state.counters.started_at,
            recent_errors: recent_errors(&state.errors, error_limit),
        }
    }
}

fn recent_errors(errors: &[ErrorEntry], n: usize) -> Vec<String> {
    let skip = errors.len().saturating_sub(n);
    errors.iter().skip(skip).map(|e| e.to_string()).collect()
}

/// Remaining time extrapolated from the average so far.
pub fn eta(elapsed: Duration, completed: usize, remaining: usize) -> Option<Duration> {
    if completed == 0 {
        return None;
    }
    Some(elapsed.mul_f64(remaining as f64 / completed as f64))
}

/// Format a duration as e.g. `1h 5m 3s`.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::Stage;

    #[test]
    fn test_eta() {
        assert_eq!(eta(Duration::from_secs(100), 0, 10), None);
        assert_eq!(
            eta(Duration::from_secs(100), 2, 6),
            Some(Duration::from_secs(300))
        );
        assert_eq!(eta(Duration::from_secs(100), 5, 0), Some(Duration::ZERO));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 2m 3s");
    }

    #[test]
    fn test_summaries_from_state() {
        let mut state = PipelineState::default();
        state.mark_extracted("a", 4, 0.02);
        state.mark_translated("a", 4, 0.03);
        state.mark_extracted("b", 2, 0.02);
        state.mark_extracted("c", 3, 0.02);
        state.mark_failed("c", Stage::Translation);

        let batch = BatchSummary::from_state(&state, 1, 2, 4, Duration::from_secs(60));
        assert_eq!(batch.files_completed, 1);
        assert_eq!(batch.quotes_extracted, 6);
        assert_eq!(batch.quotes_translated, 4);
        // b and d remain; the failed unit c is not waited for
        assert_eq!(batch.eta, Some(Duration::from_secs(120)));

        let run = RunSummary::from_state(&state, 4, Duration::from_secs(90), 7);
        assert_eq!(run.failed_units, vec!["c"]);
        assert!(!run.is_complete());

        let units: Vec<WorkUnit> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| WorkUnit {
                unit_id: id.to_string(),
                transcript_path: format!("{}.txt", id).into(),
                quotes_path: format!("{}_quotes.json", id).into(),
            })
            .collect();
        let status = StatusReport::from_state(&state, &units, 5);
        assert_eq!(status.pending, 1);
        assert_eq!(status.extracted, 1);
        assert_eq!(status.translated, 1);
        assert_eq!(status.failed_units, vec!["c"]);
    }
}
