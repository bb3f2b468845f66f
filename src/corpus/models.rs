//! Corpus data models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Target language of a translation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "es")]
    Spanish,
}

impl Language {
    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Korean => "ko",
            Language::Chinese => "zh",
            Language::Spanish => "es",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Korean => "Korean",
            Language::Chinese => "Simplified Chinese",
            Language::Spanish => "Spanish",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ko" | "korean" => Ok(Language::Korean),
            "zh" | "chinese" => Ok(Language::Chinese),
            "es" | "spanish" => Ok(Language::Spanish),
            _ => Err(format!("Unknown language: {}", s)),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One extracted quote and its accumulated enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Source-language text, exactly as spoken.
    pub text: String,
    #[serde(default)]
    pub speaker: String,
    /// Zero-padded `HH:MM:SS`, unset until resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_ko: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_es: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_function: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speaker_expertise: Vec<String>,
    /// Enrichment payload this pipeline does not interpret (vocabulary, topics, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuoteRecord {
    pub fn new(text: impl Into<String>, speaker: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speaker: speaker.into(),
            timestamp: None,
            context: None,
            text_ko: None,
            text_zh: None,
            text_es: None,
            speaker_function: None,
            speaker_expertise: Vec::new(),
            extra: Map::new(),
        }
    }

    /// The translation for a language, if present and non-blank.
    pub fn translation(&self, language: Language) -> Option<&str> {
        let field = match language {
            Language::Korean => &self.text_ko,
            Language::Chinese => &self.text_zh,
            Language::Spanish => &self.text_es,
        };
        field.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn set_translation(&mut self, language: Language, text: String) {
        let field = match language {
            Language::Korean => &mut self.text_ko,
            Language::Chinese => &mut self.text_zh,
            Language::Spanish => &mut self.text_es,
        };
        *field = Some(text);
    }

    /// Languages from `languages` that still lack a usable translation.
    pub fn missing_translations(&self, languages: &[Language]) -> Vec<Language> {
        languages
            .iter()
            .copied()
            .filter(|lang| self.translation(*lang).is_none())
            .collect()
    }

    pub fn is_fully_translated(&self, languages: &[Language]) -> bool {
        self.missing_translations(languages).is_empty()
    }
}

/// One transcript and the quote file derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    /// Transcript file stem, unique across the corpus.
    pub unit_id: String,
    pub transcript_path: PathBuf,
    pub quotes_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_preserves_unknown_fields() {
        let json = r#"{
            "text": "Growth is about retention.",
            "speaker": "Ada Chen",
            "timestamp": "00:01:15",
            "text_ko": "",
            "topics": ["growth"],
            "vocabulary_highlights": [{"word": "retention", "definition": "keeping users"}]
        }"#;

        let quote: QuoteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(quote.timestamp.as_deref(), Some("00:01:15"));
        assert!(quote.extra.contains_key("topics"));
        assert!(quote.extra.contains_key("vocabulary_highlights"));

        let value = serde_json::to_value(&quote).unwrap();
        assert_eq!(value["vocabulary_highlights"][0]["word"], "retention");
        assert!(value.get("text_zh").is_none());
    }

    #[test]
    fn test_blank_translation_counts_as_missing() {
        let mut quote = QuoteRecord::new("Ship it.", "Lenny");
        quote.text_ko = Some("  ".to_string());
        quote.set_translation(Language::Spanish, "Lánzalo.".to_string());

        let all = [Language::Korean, Language::Chinese, Language::Spanish];
        assert_eq!(
            quote.missing_translations(&all),
            vec![Language::Korean, Language::Chinese]
        );
        assert!(quote.is_fully_translated(&[Language::Spanish]));
        assert!(!quote.is_fully_translated(&all));
    }

    #[test]
    fn test_language_parse() {
        assert_eq!("ZH".parse::<Language>().unwrap(), Language::Chinese);
        assert_eq!(Language::Korean.to_string(), "ko");
        assert!("fr".parse::<Language>().is_err());
    }
}
