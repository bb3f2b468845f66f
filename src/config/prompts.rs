//! Prompt templates for Podquote.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory:
//! `extraction.toml` (keys `system`, `user`) and `translation.toml` (one key per
//! language code, e.g. `ko = "..."`).

use crate::corpus::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub extraction: ExtractionPrompts,
    pub translation: TranslationPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for quote extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionPrompts {
    pub system: String,
    pub user: String,
}

impl Default for ExtractionPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an editor building a library of memorable business quotes from podcast interviews.

Select the 8 to 15 most insightful, quotable statements made by the guest. Prefer statements that:
- Stand on their own without surrounding context
- Express a clear opinion, principle or lesson
- Use vivid or memorable wording

For each quote return an object with:
- "text": the exact words from the transcript (do not paraphrase)
- "speaker": the name of the person speaking
- "timestamp": the nearest preceding timestamp in the transcript, formatted HH:MM:SS
- "context": one sentence describing what was being discussed
- "vocabulary_highlights": up to 5 business terms or idioms used in the quote
- "topics": 1 to 3 short topic labels
- "difficulty_level": one of "beginner", "intermediate", "advanced"

Respond with a JSON array of quote objects and nothing else."#
                .to_string(),

            user: r#"Here is the podcast transcript to analyze:

{{transcript}}"#
                .to_string(),
        }
    }
}

/// Translation prompts keyed by target language.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationPrompts {
    #[serde(flatten)]
    pub by_language: HashMap<Language, String>,
}

impl Default for TranslationPrompts {
    fn default() -> Self {
        let mut by_language = HashMap::new();

        by_language.insert(
            Language::Korean,
            r#"Translate this English business quote into natural, conversational Korean that Korean professionals actually use. Use -요/-해요 endings. For technical terms or jargon, add the English in parentheses, like '호기심 루프(curiosity loop)'. Avoid stiff literal translation.

Return ONLY the Korean translation."#
                .to_string(),
        );

        by_language.insert(
            Language::Chinese,
            r#"Translate this English business quote into natural, conversational Simplified Chinese that Chinese business professionals actually use.

Rules:
- Use natural spoken Chinese (口语化), not stiff written Chinese
- Avoid literal word-for-word translation (避免翻译腔)
- Keep English jargon in parentheses after the Chinese, e.g. "好奇心循环(curiosity loop)"

Return ONLY the Chinese translation, nothing else."#
                .to_string(),
        );

        by_language.insert(
            Language::Spanish,
            r#"Translate this English business quote into natural, conversational Spanish that Spanish-speaking business professionals actually use.

Rules:
- Use a professional but approachable tone
- Avoid literal word-for-word translation
- Keep English jargon in parentheses after the Spanish, e.g. "bucle de curiosidad (curiosity loop)"

Return ONLY the Spanish translation, nothing else."#
                .to_string(),
        );

        Self { by_language }
    }
}

impl TranslationPrompts {
    /// Instructions for a language, with a generic fallback for languages
    /// that have no dedicated prompt.
    pub fn for_language(&self, language: Language) -> String {
        self.by_language.get(&language).cloned().unwrap_or_else(|| {
            format!(
                "Translate this English business quote into natural, conversational {}. Return ONLY the translation.",
                language.display_name()
            )
        })
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let extraction_path = custom_path.join("extraction.toml");
            if extraction_path.exists() {
                let content = std::fs::read_to_string(&extraction_path)?;
                prompts.extraction = toml::from_str(&content)?;
            }

            // Per-language overrides merge over the defaults
            let translation_path = custom_path.join("translation.toml");
            if translation_path.exists() {
                let content = std::fs::read_to_string(&translation_path)?;
                let overrides: TranslationPrompts = toml::from_str(&content)?;
                prompts.translation.by_language.extend(overrides.by_language);
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.extraction.system.is_empty());
        assert!(prompts.extraction.user.contains("{{transcript}}"));
        assert!(prompts.translation.for_language(Language::Korean).contains("Korean"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_custom_translation_override_merges() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("translation.toml"),
            "es = \"Traduce al español rioplatense.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(
            prompts.translation.for_language(Language::Spanish),
            "Traduce al español rioplatense."
        );
        assert!(prompts.translation.for_language(Language::Chinese).contains("Chinese"));
    }
}
