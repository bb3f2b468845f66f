//! Configuration module for Podquote.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ExtractionPrompts, Prompts, TranslationPrompts};
pub use settings::{
    AlignmentSettings, EstimateSettings, GeneralSettings, MissingTimestampPolicy,
    PipelineSettings, PromptSettings, ProviderConfig, ProviderKind, ProviderSettings, Settings,
};
