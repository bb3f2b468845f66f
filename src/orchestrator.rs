//! Pipeline orchestrator for Podquote.
//!
//! Coordinates batches of work units through extraction and translation,
//! committing the checkpoint after every unit so an interrupted run resumes
//! where it stopped.

use crate::alignment::{align_quotes, AlignmentReport, MarkerScanner};
use crate::checkpoint::{CheckpointStore, ErrorEntry, PipelineState, Stage, UnitStatus};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::corpus::{CorpusLock, CorpusStore, Language, WorkUnit};
use crate::error::{PodquoteError, Result};
use crate::generation::{create_generator, TextGenerator, Translators};
use crate::pacing::{estimate, Cooldown, RatePacer, RunEstimate};
use crate::report::{BatchSummary, RunSummary, StatusReport};
use crate::retry::{self, RetryOutcome, RetryPolicy};
use crate::stages::{extract_quotes, translate_quote, SpeakerProfiles};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Remaining work, shown to the operator before a run starts.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub total_files: usize,
    pub failed_files: usize,
    /// Whether a checkpoint from an earlier run is being resumed.
    pub resuming: bool,
    pub estimate: RunEstimate,
}

impl RunPlan {
    /// True when every unit is translated or failed.
    pub fn is_empty(&self) -> bool {
        self.estimate.files_to_extract == 0 && self.estimate.files_to_translate == 0
    }

    /// Record the operator's approval.
    pub fn confirm(self) -> ConfirmedPlan {
        ConfirmedPlan { plan: self }
    }
}

/// A plan the operator approved. Only obtainable through [`RunPlan::confirm`].
#[derive(Debug, Clone)]
pub struct ConfirmedPlan {
    plan: RunPlan,
}

impl ConfirmedPlan {
    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }
}

struct Generators {
    extractor: Arc<dyn TextGenerator>,
    translators: Translators,
}

/// The main orchestrator for the Podquote pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    store: CorpusStore,
    checkpoint: CheckpointStore,
    generators: Option<Generators>,
    speakers: SpeakerProfiles,
    scanner: MarkerScanner,
    pacer: RatePacer,
    retry_policy: RetryPolicy,
    show_progress: bool,
    calls: AtomicUsize,
}

impl Orchestrator {
    /// Create an orchestrator with the configured generation services.
    pub fn new(settings: Settings) -> Result<Self> {
        let timeout = settings.pipeline.request_timeout();
        let extractor = create_generator(&settings.providers.extraction, timeout)?;
        let translators = Translators::from_settings(&settings.providers, timeout)?;

        info!(
            "Extraction via {}, translation into {}",
            extractor.name(),
            translators
                .languages()
                .iter()
                .map(|l| l.code())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut orchestrator = Self::offline(settings)?;
        orchestrator.generators = Some(Generators {
            extractor,
            translators,
        });
        Ok(orchestrator)
    }

    /// Create an orchestrator for maintenance commands that make no external calls.
    pub fn offline(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let speakers = match settings.speaker_profiles_path() {
            Some(path) => SpeakerProfiles::load(&path)?,
            None => SpeakerProfiles::default(),
        };
        if !speakers.is_empty() {
            debug!("Loaded {} speaker profiles", speakers.len());
        }

        let pacer = RatePacer::from_settings(&settings.pipeline);
        Ok(Self::assemble(settings, prompts, None, speakers, pacer))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        extractor: Arc<dyn TextGenerator>,
        translators: Translators,
        pacer: RatePacer,
    ) -> Self {
        let generators = Generators {
            extractor,
            translators,
        };
        Self::assemble(
            settings,
            prompts,
            Some(generators),
            SpeakerProfiles::default(),
            pacer,
        )
    }

    fn assemble(
        settings: Settings,
        prompts: Prompts,
        generators: Option<Generators>,
        speakers: SpeakerProfiles,
        pacer: RatePacer,
    ) -> Self {
        let store = CorpusStore::new(settings.transcripts_dir(), settings.output_dir());
        let checkpoint = CheckpointStore::new(settings.checkpoint_path());
        let retry_policy = RetryPolicy::new(
            settings.pipeline.max_attempts,
            settings.pipeline.retry_wait(),
        );

        Self {
            settings,
            prompts,
            store,
            checkpoint,
            generators,
            speakers,
            scanner: MarkerScanner::new(),
            pacer,
            retry_policy,
            show_progress: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Show or hide progress bars and spinners.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn store(&self) -> &CorpusStore {
        &self.store
    }

    pub fn checkpoint(&self) -> &CheckpointStore {
        &self.checkpoint
    }

    fn generators(&self) -> Result<&Generators> {
        self.generators.as_ref().ok_or_else(|| {
            PodquoteError::Config("No generation services configured for this command".to_string())
        })
    }

    fn batch_size(&self) -> usize {
        self.settings.pipeline.batch_size.max(1)
    }

    /// Compute what a run would do, without doing it.
    pub fn plan(&self) -> Result<RunPlan> {
        let units = self.store.discover_units()?;
        let mut state = self.checkpoint.load()?;
        self.requeue_lost_units(&mut state, &units);

        let to_extract = units
            .iter()
            .filter(|u| needs_extraction(&state, &u.unit_id))
            .count();
        let to_translate = units
            .iter()
            .filter(|u| needs_translation_eventually(&state, &u.unit_id))
            .count();
        let batches = units
            .chunks(self.batch_size())
            .filter(|batch| has_work(&state, batch))
            .count();

        Ok(RunPlan {
            total_files: units.len(),
            failed_files: state.count_status(UnitStatus::Failed),
            resuming: self.checkpoint.exists(),
            estimate: estimate(
                to_extract,
                to_translate,
                batches,
                &self.settings.estimates,
                &self.pacer,
            ),
        })
    }

    /// Run the pipeline over every unit that still has work.
    #[instrument(skip(self, plan))]
    pub async fn run(&self, plan: ConfirmedPlan) -> Result<RunSummary> {
        let _lock = CorpusLock::acquire(&self.settings.lock_path())?;
        let generators = self.generators()?;
        let languages = generators.translators.languages();
        if languages.is_empty() {
            return Err(PodquoteError::Config(
                "No translation languages configured".to_string(),
            ));
        }

        let units = self.store.discover_units()?;
        let mut state = self.checkpoint.load()?;
        if self.requeue_lost_units(&mut state, &units) > 0 {
            self.checkpoint.commit(&state)?;
        }
        self.calls.store(0, Ordering::SeqCst);

        let batches: Vec<&[WorkUnit]> = units.chunks(self.batch_size()).collect();
        let total_batches = batches.len();

        if !batches.iter().any(|b| has_work(&state, b)) {
            info!("Nothing to do: every unit is translated or failed");
            let exported = self.store.export_merged(&self.settings.export_path())?;
            let mut summary =
                RunSummary::from_state(&state, units.len(), state.elapsed(Utc::now()), 0);
            summary.exported = Some(exported);
            return Ok(summary);
        }

        let run = state.begin_run(Utc::now());
        self.checkpoint.commit(&state)?;

        let estimate = &plan.plan().estimate;
        info!(
            "Run {}: {} files, {} to extract, {} to translate",
            run,
            units.len(),
            estimate.files_to_extract,
            estimate.files_to_translate
        );

        for (index, batch) in batches.iter().enumerate() {
            if !has_work(&state, batch) {
                debug!("Batch {}/{} already complete", index + 1, total_batches);
                continue;
            }

            let before = self.calls();
            self.extract_batch(&mut state, run, batch).await?;

            let extraction_calls = self.calls() - before;
            let translation_pending = batch
                .iter()
                .any(|u| state.status(&u.unit_id) == UnitStatus::Extracted);
            if extraction_calls > 0 && translation_pending {
                self.cool_down(Cooldown::Phase).await;
            }

            self.translate_batch(&mut state, run, batch, &languages)
                .await?;

            let summary = BatchSummary::from_state(
                &state,
                index + 1,
                total_batches,
                units.len(),
                state.elapsed(Utc::now()),
            );
            info!(
                "Batch {}/{} done: {}/{} files translated, {} quotes extracted, {} translated, ${:.2}",
                summary.batch,
                summary.total_batches,
                summary.files_completed,
                summary.total_files,
                summary.quotes_extracted,
                summary.quotes_translated,
                summary.cost_usd
            );
            if self.show_progress {
                Output::batch_summary(&summary);
            }

            let later_work = batches[index + 1..].iter().any(|b| has_work(&state, b));
            if self.calls() > before && later_work {
                self.cool_down(Cooldown::Batch).await;
            }
        }

        let exported = self.store.export_merged(&self.settings.export_path())?;
        info!(
            "Exported {} quotes to {:?}",
            exported,
            self.settings.export_path()
        );

        let mut summary =
            RunSummary::from_state(&state, units.len(), state.elapsed(Utc::now()), self.calls());
        summary.exported = Some(exported);
        Ok(summary)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Send extracted units whose quote file has disappeared back to
    /// extraction. Returns how many were requeued.
    fn requeue_lost_units(&self, state: &mut PipelineState, units: &[WorkUnit]) -> usize {
        let mut requeued = 0;
        for unit in units {
            let unit_id = unit.unit_id.as_str();
            if state.status(unit_id) == UnitStatus::Extracted && !self.store.has_quotes(unit_id) {
                warn!("{}: quote file missing, extracting again", unit_id);
                state.reset_unit(unit_id);
                requeued += 1;
            }
        }
        requeued
    }

    async fn extract_batch(
        &self,
        state: &mut PipelineState,
        run: u32,
        batch: &[WorkUnit],
    ) -> Result<()> {
        let pending: Vec<&WorkUnit> = batch
            .iter()
            .filter(|u| needs_extraction(state, &u.unit_id))
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let pb = self.progress_bar(pending.len(), "Extracting");
        for unit in pending {
            let unit_id = unit.unit_id.as_str();
            pb.set_message(unit_id.to_string());

            let outcome = retry::execute(
                self.retry_policy,
                |_| self.extract_unit(unit_id),
                |attempt, err| {
                    state.add_error(ErrorEntry::attempt(
                        run,
                        unit_id,
                        Stage::Extraction,
                        attempt,
                        err.to_string(),
                    ));
                    self.checkpoint.commit(state)
                },
            )
            .await;

            match outcome {
                Ok(RetryOutcome::Completed(count)) => {
                    state.mark_extracted(
                        unit_id,
                        count,
                        self.settings.estimates.cost_per_file_extract,
                    );
                    self.checkpoint.commit(state)?;
                    debug!("{}: extracted {} quotes", unit_id, count);
                }
                Ok(RetryOutcome::Exhausted {
                    attempts,
                    last_error,
                }) => {
                    let failure = ErrorEntry::exhausted(
                        run,
                        unit_id,
                        Stage::Extraction,
                        attempts,
                        last_error.to_string(),
                    );
                    self.record_failure(state, failure, &pb)?;
                }
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(())
    }

    async fn extract_unit(&self, unit_id: &str) -> Result<usize> {
        let generator = &self.generators()?.extractor;
        let transcript = self.store.read_transcript(unit_id)?;

        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = extract_quotes(generator.as_ref(), &self.prompts, &transcript).await;
        self.pacer.after_call().await;

        let mut quotes = result?;
        self.speakers.enrich(&mut quotes);
        self.store.save_quotes(unit_id, &quotes)?;
        Ok(quotes.len())
    }

    async fn translate_batch(
        &self,
        state: &mut PipelineState,
        run: u32,
        batch: &[WorkUnit],
        languages: &[Language],
    ) -> Result<()> {
        let pending: Vec<&WorkUnit> = batch
            .iter()
            .filter(|u| state.status(&u.unit_id) == UnitStatus::Extracted)
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let pb = self.progress_bar(pending.len(), "Translating");
        for unit in pending {
            let unit_id = unit.unit_id.as_str();
            pb.set_message(unit_id.to_string());

            let outcome = retry::execute(
                self.retry_policy,
                |_| self.translate_unit(unit_id, languages),
                |attempt, err| {
                    state.add_error(ErrorEntry::attempt(
                        run,
                        unit_id,
                        Stage::Translation,
                        attempt,
                        err.to_string(),
                    ));
                    self.checkpoint.commit(state)
                },
            )
            .await;

            match outcome {
                Ok(RetryOutcome::Completed(count)) => {
                    state.mark_translated(
                        unit_id,
                        count,
                        self.settings.estimates.cost_per_file_translate,
                    );
                    self.checkpoint.commit(state)?;
                    debug!("{}: translated {} quotes", unit_id, count);
                }
                Ok(RetryOutcome::Exhausted {
                    attempts,
                    last_error,
                }) => {
                    let failure = ErrorEntry::exhausted(
                        run,
                        unit_id,
                        Stage::Translation,
                        attempts,
                        last_error.to_string(),
                    );
                    self.record_failure(state, failure, &pb)?;
                }
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(())
    }

    /// Fill every missing translation of a unit. The quote file is saved after
    /// each quote, and before returning an error, so finished fields persist.
    async fn translate_unit(&self, unit_id: &str, languages: &[Language]) -> Result<usize> {
        let translators = &self.generators()?.translators;
        let mut quotes = self.store.load_quotes(unit_id)?;

        for index in 0..quotes.len() {
            let missing = quotes[index].missing_translations(languages);
            if missing.is_empty() {
                continue;
            }

            let mut dirty = false;
            for language in missing {
                let generator = translators.get(language)?;

                self.calls.fetch_add(1, Ordering::SeqCst);
                let result = translate_quote(
                    generator.as_ref(),
                    &self.prompts,
                    language,
                    &quotes[index].text,
                )
                .await;
                self.pacer.after_call().await;

                match result {
                    Ok(text) => {
                        quotes[index].set_translation(language, text);
                        dirty = true;
                    }
                    Err(e) => {
                        if dirty {
                            self.store.save_quotes(unit_id, &quotes)?;
                        }
                        return Err(e);
                    }
                }
            }
            self.store.save_quotes(unit_id, &quotes)?;
        }

        Ok(quotes.len())
    }

    /// Move a unit to the failed sink and log the permanent failure.
    fn record_failure(
        &self,
        state: &mut PipelineState,
        entry: ErrorEntry,
        pb: &ProgressBar,
    ) -> Result<()> {
        warn!("{}", entry);
        if self.show_progress {
            pb.suspend(|| Output::error(&entry.to_string()));
        }

        if let (Some(unit_id), Some(stage)) = (entry.unit_id.clone(), entry.stage) {
            state.mark_failed(&unit_id, stage);
        }
        state.add_error(entry);
        self.checkpoint.commit(state)
    }

    async fn cool_down(&self, cooldown: Cooldown) {
        let duration = self.pacer.cooldown_duration(cooldown);
        if duration.is_zero() {
            return;
        }

        let spinner = if self.show_progress {
            Output::spinner(&format!(
                "{:?} cooldown ({})",
                cooldown,
                crate::report::format_duration(duration)
            ))
        } else {
            ProgressBar::hidden()
        };
        self.pacer.cooldown(cooldown).await;
        spinner.finish_and_clear();
    }

    fn progress_bar(&self, len: usize, phase: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template(&format!(
                "  {{spinner:.green}} {} [{{bar:30.cyan/blue}}] {{pos}}/{{len}} {{msg}}",
                phase
            ))
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Re-derive every quote's timestamp from its transcript.
    #[instrument(skip(self))]
    pub async fn align(&self) -> Result<AlignmentReport> {
        let _lock = CorpusLock::acquire(&self.settings.lock_path())?;
        let policy = self.settings.alignment.missing_timestamp;
        let mut report = AlignmentReport::default();

        for unit in self.store.units_with_quotes()? {
            let unit_id = unit.unit_id.as_str();
            let mut quotes = self.store.load_quotes(unit_id)?;

            let transcript = match self.store.read_transcript(unit_id) {
                Ok(t) => t,
                Err(_) => {
                    report.merge(AlignmentReport {
                        files: 1,
                        quotes_checked: quotes.len(),
                        warnings: vec![format!("[{}] Transcript not found", unit_id)],
                        ..Default::default()
                    });
                    continue;
                }
            };

            let mut file_report = align_quotes(&self.scanner, &transcript, &mut quotes, policy);
            if file_report.updated > 0 {
                self.store.save_quotes(unit_id, &quotes)?;
            }
            info!(
                "{}: {}/{} timestamps updated",
                unit_id, file_report.updated, file_report.quotes_checked
            );

            for warning in &mut file_report.warnings {
                *warning = format!("[{}] {}", unit_id, warning);
            }
            report.merge(file_report);
        }

        Ok(report)
    }

    /// Return failed units to the stage they failed in. An empty list clears
    /// every failed unit. Returns the units that were cleared.
    pub fn retry_failed(&self, unit_ids: &[String]) -> Result<Vec<String>> {
        let _lock = CorpusLock::acquire(&self.settings.lock_path())?;
        let mut state = self.checkpoint.load()?;

        let targets: Vec<String> = if unit_ids.is_empty() {
            state.failed_units().into_iter().map(String::from).collect()
        } else {
            unit_ids.to_vec()
        };

        let mut cleared = Vec::new();
        for unit_id in targets {
            if !state.is_failed(&unit_id) {
                warn!("{} is not a failed unit, skipping", unit_id);
                continue;
            }
            state.clear_failed(&unit_id);
            cleared.push(unit_id);
        }

        self.checkpoint.commit(&state)?;
        Ok(cleared)
    }

    /// Forget progress for one unit, or for the whole corpus. Removes the
    /// affected quote files. Returns the number of units reset.
    pub fn reset(&self, unit_id: Option<&str>) -> Result<usize> {
        let _lock = CorpusLock::acquire(&self.settings.lock_path())?;

        match unit_id {
            Some(unit_id) => {
                let mut state = self.checkpoint.load()?;
                let changed = state.reset_unit(unit_id);
                self.store.remove_quotes(unit_id)?;
                self.checkpoint.commit(&state)?;
                Ok(usize::from(changed))
            }
            None => {
                let units = self.store.units_with_quotes()?;
                for unit in &units {
                    self.store.remove_quotes(&unit.unit_id)?;
                }
                self.checkpoint.clear()?;
                Ok(units.len())
            }
        }
    }

    /// Write the merged export. Returns the number of quotes written.
    pub fn export(&self, path: Option<&std::path::Path>) -> Result<usize> {
        let default_path = self.settings.export_path();
        self.store.export_merged(path.unwrap_or(&default_path))
    }

    /// Snapshot of the checkpoint against the current corpus.
    pub fn status(&self) -> Result<StatusReport> {
        let units = self.store.discover_units()?;
        let state = self.checkpoint.load()?;
        Ok(StatusReport::from_state(&state, &units, RunSummary::RECENT_ERRORS))
    }
}

fn needs_extraction(state: &PipelineState, unit_id: &str) -> bool {
    state.status(unit_id) == UnitStatus::Pending
}

fn needs_translation_eventually(state: &PipelineState, unit_id: &str) -> bool {
    matches!(
        state.status(unit_id),
        UnitStatus::Pending | UnitStatus::Extracted
    )
}

fn has_work(state: &PipelineState, batch: &[WorkUnit]) -> bool {
    batch
        .iter()
        .any(|u| needs_translation_eventually(state, &u.unit_id))
}
