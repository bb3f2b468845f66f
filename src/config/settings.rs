//! Configuration settings for Podquote.

use crate::corpus::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub pipeline: PipelineSettings,
    pub estimates: EstimateSettings,
    pub providers: ProviderSettings,
    pub alignment: AlignmentSettings,
    pub prompts: PromptSettings,
}

/// Corpus locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Root directory of the corpus. Relative paths below are resolved against it.
    pub corpus_dir: String,
    /// Directory holding `*.txt` transcripts.
    pub transcripts_dir: String,
    /// Directory receiving `*_quotes.json` files, the checkpoint and exports.
    pub output_dir: String,
    /// Optional speaker profile JSON used to enrich extracted quotes.
    pub speaker_profiles: Option<String>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            corpus_dir: ".".to_string(),
            transcripts_dir: "transcripts".to_string(),
            output_dir: "output".to_string(),
            speaker_profiles: Some("speaker_profiles.json".to_string()),
        }
    }
}

/// Batching, retry and pacing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Number of transcripts per batch.
    pub batch_size: usize,
    /// Attempts per unit and stage before the unit is marked failed.
    pub max_attempts: u32,
    /// Wait before retrying a failed unit, in seconds.
    pub retry_wait_seconds: u64,
    /// Minimum delay after every external call, in seconds.
    pub api_delay_seconds: u64,
    /// Cooldown between the extraction and translation phases of a batch.
    pub phase_cooldown_seconds: u64,
    /// Cooldown between batches.
    pub batch_cooldown_seconds: u64,
    /// Timeout for a single provider request.
    pub request_timeout_seconds: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_attempts: 3,
            retry_wait_seconds: 5 * 60,
            api_delay_seconds: 2,
            phase_cooldown_seconds: 10 * 60,
            batch_cooldown_seconds: 10 * 60,
            request_timeout_seconds: 300,
        }
    }
}

impl PipelineSettings {
    pub fn retry_wait(&self) -> Duration {
        Duration::from_secs(self.retry_wait_seconds)
    }

    pub fn api_delay(&self) -> Duration {
        Duration::from_secs(self.api_delay_seconds)
    }

    pub fn phase_cooldown(&self) -> Duration {
        Duration::from_secs(self.phase_cooldown_seconds)
    }

    pub fn batch_cooldown(&self) -> Duration {
        Duration::from_secs(self.batch_cooldown_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Static cost and time constants used for the upfront estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateSettings {
    /// Cost of extracting one transcript (USD).
    pub cost_per_file_extract: f64,
    /// Cost of translating one transcript's quotes (USD).
    pub cost_per_file_translate: f64,
    /// Seconds spent per transcript on extraction, delays included.
    pub seconds_per_file_extract: u64,
    /// Seconds spent per quote on translation, delays included.
    pub seconds_per_quote_translate: u64,
    /// Average number of quotes extracted per transcript.
    pub avg_quotes_per_file: u64,
}

impl Default for EstimateSettings {
    fn default() -> Self {
        Self {
            cost_per_file_extract: 0.02,
            cost_per_file_translate: 0.03,
            seconds_per_file_extract: 15,
            seconds_per_quote_translate: 8,
            avg_quotes_per_file: 10,
        }
    }
}

/// Generation provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Anthropic,
    OpenAI,
}

impl ProviderKind {
    /// Environment variable holding the provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAI => "OPENAI_API_KEY",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" | "gpt" => Ok(ProviderKind::OpenAI),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::OpenAI => write!(f, "openai"),
        }
    }
}

/// One bound text-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model: String,
    pub max_tokens: u32,
    /// Omitted from requests when unset (some models only accept the default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::anthropic("claude-sonnet-4-20250514", 4096)
    }
}

impl ProviderConfig {
    pub fn anthropic(model: &str, max_tokens: u32) -> Self {
        Self {
            kind: ProviderKind::Anthropic,
            model: model.to_string(),
            max_tokens,
            temperature: Some(0.3),
        }
    }

    pub fn openai(model: &str, max_tokens: u32) -> Self {
        Self {
            kind: ProviderKind::OpenAI,
            model: model.to_string(),
            max_tokens,
            temperature: None,
        }
    }
}

/// Provider bindings: one for extraction, one per translation language.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub extraction: ProviderConfig,
    /// Target languages and the service bound to each. The keys define which
    /// translation fields a quote needs before its unit counts as translated.
    pub translation: BTreeMap<Language, ProviderConfig>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        let mut translation = BTreeMap::new();
        translation.insert(Language::Korean, ProviderConfig::openai("gpt-5-mini", 2000));
        translation.insert(
            Language::Chinese,
            ProviderConfig::anthropic("claude-sonnet-4-20250514", 2048),
        );
        translation.insert(
            Language::Spanish,
            ProviderConfig::anthropic("claude-sonnet-4-20250514", 2048),
        );

        Self {
            extraction: ProviderConfig::anthropic("claude-sonnet-4-20250514", 4096),
            translation,
        }
    }
}

impl ProviderSettings {
    /// Target languages in a stable order.
    pub fn languages(&self) -> Vec<Language> {
        self.translation.keys().copied().collect()
    }

    /// Every provider kind referenced by the configuration.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        let mut kinds = vec![self.extraction.kind];
        for config in self.translation.values() {
            if !kinds.contains(&config.kind) {
                kinds.push(config.kind);
            }
        }
        kinds
    }
}

/// What the alignment pass does with a quote whose timestamp cannot be resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingTimestampPolicy {
    /// Keep whatever timestamp the quote already has (possibly none) and warn.
    #[default]
    Leave,
    /// Set the timestamp to `00:00:00`.
    Zero,
}

/// Alignment pass settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AlignmentSettings {
    pub missing_timestamp: MissingTimestampPolicy,
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::PodquoteError;

        if self.pipeline.batch_size == 0 {
            return Err(PodquoteError::Config("pipeline.batch_size must be at least 1".to_string()));
        }
        if self.pipeline.max_attempts == 0 {
            return Err(PodquoteError::Config(
                "pipeline.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.providers.translation.is_empty() {
            return Err(PodquoteError::Config(
                "providers.translation must bind at least one language".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PodquoteError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podquote")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded corpus root.
    pub fn corpus_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.corpus_dir)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let expanded = Self::expand_path(path);
        if expanded.is_absolute() {
            expanded
        } else {
            self.corpus_dir().join(expanded)
        }
    }

    /// Get the transcripts directory.
    pub fn transcripts_dir(&self) -> PathBuf {
        self.resolve(&self.general.transcripts_dir)
    }

    /// Get the quotes/output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.general.output_dir)
    }

    /// Get the checkpoint file path.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.output_dir().join("pipeline_checkpoint.json")
    }

    /// Get the lock file path.
    pub fn lock_path(&self) -> PathBuf {
        self.output_dir().join(".podquote.lock")
    }

    /// Get the merged export path.
    pub fn export_path(&self) -> PathBuf {
        self.output_dir().join("quotes_complete.json")
    }

    /// Get the speaker profiles path, if configured.
    pub fn speaker_profiles_path(&self) -> Option<PathBuf> {
        self.general.speaker_profiles.as_deref().map(|p| self.resolve(p))
    }
}
