//! Durable pipeline progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extraction,
    Translation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Extraction => write!(f, "Extract"),
            Stage::Translation => write!(f, "Translate"),
        }
    }
}

/// Where a unit is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    #[default]
    Pending,
    Extracted,
    Translated,
    Failed,
}

/// Progress record for one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitProgress {
    pub status: UnitStatus,
    #[serde(default)]
    pub quote_count: usize,
    /// Stage that exhausted its retries, for failed units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
}

/// Aggregate run statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counters {
    pub quotes_extracted: usize,
    pub quotes_translated: usize,
    pub total_cost_usd: f64,
    pub started_at: Option<DateTime<Utc>>,
    /// Number of confirmed runs against this checkpoint.
    pub runs: u32,
}

/// One entry of the durable error log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub at: DateTime<Utc>,
    /// Run number the failure happened in.
    pub run: u32,
    pub unit_id: Option<String>,
    pub stage: Option<Stage>,
    pub attempt: Option<u32>,
    pub message: String,
    /// Set on the entry that records retry exhaustion.
    #[serde(default)]
    pub permanent: bool,
}

impl ErrorEntry {
    /// A single failed attempt.
    pub fn attempt(run: u32, unit_id: &str, stage: Stage, attempt: u32, message: String) -> Self {
        Self {
            at: Utc::now(),
            run,
            unit_id: Some(unit_id.to_string()),
            stage: Some(stage),
            attempt: Some(attempt),
            message,
            permanent: false,
        }
    }

    /// Retry exhaustion for a unit.
    pub fn exhausted(run: u32, unit_id: &str, stage: Stage, attempts: u32, message: String) -> Self {
        Self {
            at: Utc::now(),
            run,
            unit_id: Some(unit_id.to_string()),
            stage: Some(stage),
            attempt: Some(attempts),
            message,
            permanent: true,
        }
    }
}

impl std::fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] ", self.at.format("%Y-%m-%d %H:%M:%S"))?;
        if self.permanent {
            write!(f, "FAILED after {} attempts: ", self.attempt.unwrap_or(0))?;
        }
        match (&self.stage, &self.unit_id) {
            (Some(stage), Some(unit)) => write!(f, "{} {}", stage, unit)?,
            (None, Some(unit)) => write!(f, "{}", unit)?,
            _ => {}
        }
        if let (Some(attempt), false) = (self.attempt, self.permanent) {
            write!(f, " (attempt {})", attempt)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Everything the checkpoint file holds.
///
/// Mutators are idempotent: marking a unit twice never double-counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineState {
    pub units: BTreeMap<String, UnitProgress>,
    pub counters: Counters,
    pub errors: Vec<ErrorEntry>,
}

impl PipelineState {
    pub fn status(&self, unit_id: &str) -> UnitStatus {
        self.units
            .get(unit_id)
            .map(|p| p.status)
            .unwrap_or_default()
    }

    /// True once extraction has completed, including translated units.
    pub fn is_extracted(&self, unit_id: &str) -> bool {
        matches!(
            self.status(unit_id),
            UnitStatus::Extracted | UnitStatus::Translated
        )
    }

    pub fn is_translated(&self, unit_id: &str) -> bool {
        self.status(unit_id) == UnitStatus::Translated
    }

    pub fn is_failed(&self, unit_id: &str) -> bool {
        self.status(unit_id) == UnitStatus::Failed
    }

    /// Record a completed extraction. Returns false if nothing changed.
    pub fn mark_extracted(&mut self, unit_id: &str, quote_count: usize, cost: f64) -> bool {
        let progress = self.units.entry(unit_id.to_string()).or_default();
        if progress.status != UnitStatus::Pending {
            return false;
        }

        progress.status = UnitStatus::Extracted;
        progress.quote_count = quote_count;
        self.counters.quotes_extracted += quote_count;
        self.counters.total_cost_usd += cost;
        true
    }

    /// Record a completed translation. Only an extracted unit can advance.
    pub fn mark_translated(&mut self, unit_id: &str, quote_count: usize, cost: f64) -> bool {
        let Some(progress) = self.units.get_mut(unit_id) else {
            return false;
        };
        if progress.status != UnitStatus::Extracted {
            return false;
        }
        if quote_count != progress.quote_count {
            warn!(
                "{}: translated {} quotes but {} were extracted; counting the extracted total",
                unit_id, quote_count, progress.quote_count
            );
        }

        progress.status = UnitStatus::Translated;
        self.counters.quotes_translated += progress.quote_count;
        self.counters.total_cost_usd += cost;
        true
    }

    /// Move a unit to the failed sink, withdrawing its counter contribution.
    pub fn mark_failed(&mut self, unit_id: &str, stage: Stage) -> bool {
        let progress = self.units.entry(unit_id.to_string()).or_default();
        match progress.status {
            UnitStatus::Translated | UnitStatus::Failed => return false,
            UnitStatus::Extracted => self.counters.quotes_extracted -= progress.quote_count,
            UnitStatus::Pending => {}
        }

        progress.status = UnitStatus::Failed;
        progress.failed_stage = Some(stage);
        true
    }

    /// Operator action: return a failed unit to the status it failed from.
    pub fn clear_failed(&mut self, unit_id: &str) -> bool {
        let Some(progress) = self.units.get_mut(unit_id) else {
            return false;
        };
        if progress.status != UnitStatus::Failed {
            return false;
        }

        match progress.failed_stage.take() {
            Some(Stage::Translation) => {
                progress.status = UnitStatus::Extracted;
                self.counters.quotes_extracted += progress.quote_count;
            }
            _ => {
                progress.status = UnitStatus::Pending;
                progress.quote_count = 0;
            }
        }
        true
    }

    /// Operator action: forget a unit's progress so it is extracted again.
    /// Accrued cost is not refunded.
    pub fn reset_unit(&mut self, unit_id: &str) -> bool {
        let Some(progress) = self.units.get_mut(unit_id) else {
            return false;
        };

        match progress.status {
            UnitStatus::Pending => return false,
            UnitStatus::Translated => {
                self.counters.quotes_extracted -= progress.quote_count;
                self.counters.quotes_translated -= progress.quote_count;
            }
            UnitStatus::Extracted => self.counters.quotes_extracted -= progress.quote_count,
            UnitStatus::Failed => {}
        }

        *progress = UnitProgress::default();
        true
    }

    pub fn add_error(&mut self, entry: ErrorEntry) {
        self.errors.push(entry);
    }

    /// Start a confirmed run; sets the start time on the first one.
    pub fn begin_run(&mut self, now: DateTime<Utc>) -> u32 {
        if self.counters.started_at.is_none() {
            self.counters.started_at = Some(now);
        }
        self.counters.runs += 1;
        self.counters.runs
    }

    /// Wall-clock time since the first run started.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.counters
            .started_at
            .and_then(|start| (now - start).to_std().ok())
            .unwrap_or_default()
    }

    /// Number of units currently in a status.
    pub fn count_status(&self, status: UnitStatus) -> usize {
        self.units.values().filter(|p| p.status == status).count()
    }

    /// Units in the failed sink, sorted.
    pub fn failed_units(&self) -> Vec<&str> {
        self.units
            .iter()
            .filter(|(_, p)| p.status == UnitStatus::Failed)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Failed-attempt entries for a unit and stage within one run.
    pub fn attempts_logged(&self, run: u32, unit_id: &str, stage: Stage) -> usize {
        self.errors
            .iter()
            .filter(|e| {
                e.run == run
                    && !e.permanent
                    && e.stage == Some(stage)
                    && e.unit_id.as_deref() == Some(unit_id)
            })
            .count()
    }

    /// Recompute the counters from the unit index; used to check consistency.
    pub fn recount(&self) -> (usize, usize) {
        self.units.values().fold((0, 0), |(extracted, translated), p| match p.status {
            UnitStatus::Extracted => (extracted + p.quote_count, translated),
            UnitStatus::Translated => (extracted + p.quote_count, translated + p.quote_count),
            _ => (extracted, translated),
        })
    }

    pub fn is_consistent(&self) -> bool {
        self.recount() == (self.counters.quotes_extracted, self.counters.quotes_translated)
    }
}
