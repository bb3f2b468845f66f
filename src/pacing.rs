//! Static pacing policy against provider throughput limits, and upfront estimates.

use crate::config::{EstimateSettings, PipelineSettings};
use std::time::Duration;
use tracing::{debug, info};

/// Which cooldown to wait out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cooldown {
    /// Between the extraction and translation phases of a batch.
    Phase,
    /// Between two batches.
    Batch,
}

/// Fixed delays around external calls. No adaptive back-off.
#[derive(Debug, Clone)]
pub struct RatePacer {
    api_delay: Duration,
    phase_cooldown: Duration,
    batch_cooldown: Duration,
}

impl RatePacer {
    pub fn new(api_delay: Duration, phase_cooldown: Duration, batch_cooldown: Duration) -> Self {
        Self {
            api_delay,
            phase_cooldown,
            batch_cooldown,
        }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(
            settings.api_delay(),
            settings.phase_cooldown(),
            settings.batch_cooldown(),
        )
    }

    /// A pacer that never waits.
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    pub fn cooldown_duration(&self, cooldown: Cooldown) -> Duration {
        match cooldown {
            Cooldown::Phase => self.phase_cooldown,
            Cooldown::Batch => self.batch_cooldown,
        }
    }

    /// Wait the minimum delay that must follow every external call.
    pub async fn after_call(&self) {
        if !self.api_delay.is_zero() {
            debug!("Pacing {:?} after external call", self.api_delay);
            tokio::time::sleep(self.api_delay).await;
        }
    }

    /// Wait out a phase or batch cooldown.
    pub async fn cooldown(&self, cooldown: Cooldown) {
        let duration = self.cooldown_duration(cooldown);
        if duration.is_zero() {
            return;
        }
        info!("{:?} cooldown: waiting {:?}", cooldown, duration);
        tokio::time::sleep(duration).await;
    }
}

/// Upfront cost and time estimate shown before a run is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunEstimate {
    pub files_to_extract: usize,
    pub files_to_translate: usize,
    /// Batches that still contain work.
    pub batches: usize,
    pub cost_usd: f64,
    pub duration: Duration,
}

/// Estimate the remaining run from static per-call constants.
pub fn estimate(
    remaining_extract: usize,
    remaining_translate: usize,
    batches: usize,
    constants: &EstimateSettings,
    pacer: &RatePacer,
) -> RunEstimate {
    let cost_usd = remaining_extract as f64 * constants.cost_per_file_extract
        + remaining_translate as f64 * constants.cost_per_file_translate;

    let extract_secs = remaining_extract as u64 * constants.seconds_per_file_extract;
    let translate_secs = remaining_translate as u64
        * constants.avg_quotes_per_file
        * constants.seconds_per_quote_translate;

    let cooldowns = pacer.cooldown_duration(Cooldown::Phase) * batches as u32
        + pacer.cooldown_duration(Cooldown::Batch) * batches.saturating_sub(1) as u32;

    RunEstimate {
        files_to_extract: remaining_extract,
        files_to_translate: remaining_translate,
        batches,
        cost_usd,
        duration: Duration::from_secs(extract_secs + translate_secs) + cooldowns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_uses_static_constants() {
        let pacer = RatePacer::new(
            Duration::from_secs(2),
            Duration::from_secs(600),
            Duration::from_secs(600),
        );
        let est = estimate(100, 100, 2, &EstimateSettings::default(), &pacer);

        assert_eq!(est.files_to_extract, 100);
        assert!((est.cost_usd - 5.0).abs() < 1e-9);
        // 100*15 + 100*10*8 + 2*600 + 1*600
        assert_eq!(est.duration, Duration::from_secs(1500 + 8000 + 1800));
    }

    #[test]
    fn test_estimate_nothing_remaining() {
        let est = estimate(0, 0, 0, &EstimateSettings::default(), &RatePacer::unpaced());
        assert_eq!(est.cost_usd, 0.0);
        assert_eq!(est.duration, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_call_waits_configured_delay() {
        let pacer = RatePacer::new(Duration::from_secs(2), Duration::ZERO, Duration::ZERO);
        let start = tokio::time::Instant::now();
        pacer.after_call().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldowns_are_distinct() {
        let pacer = RatePacer::new(
            Duration::ZERO,
            Duration::from_secs(60),
            Duration::from_secs(600),
        );
        let start = tokio::time::Instant::now();
        pacer.cooldown(Cooldown::Phase).await;
        let after_phase = start.elapsed();
        pacer.cooldown(Cooldown::Batch).await;

        assert!(after_phase >= Duration::from_secs(60) && after_phase < Duration::from_secs(600));
        assert!(start.elapsed() >= Duration::from_secs(660));
    }
}
