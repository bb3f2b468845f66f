//! Per-field quote translation.

use crate::config::Prompts;
use crate::corpus::Language;
use crate::error::{PodquoteError, Result};
use crate::generation::TextGenerator;

/// Translate one quote's source text into `language`.
pub async fn translate_quote(
    generator: &dyn TextGenerator,
    prompts: &Prompts,
    language: Language,
    text: &str,
) -> Result<String> {
    let instructions = prompts.render_with_custom(
        &prompts.translation.for_language(language),
        &Default::default(),
    );

    let translated = generator.generate(&instructions, text).await?;
    let translated = clean_translation(&translated);

    if translated.is_empty() {
        return Err(PodquoteError::MalformedResponse(format!(
            "{} returned an empty {} translation",
            generator.name(),
            language.display_name()
        )));
    }

    Ok(translated)
}

/// Trim whitespace and a wrapping pair of quotation marks.
fn clean_translation(raw: &str) -> String {
    let trimmed = raw.trim();
    for (open, close) in [('"', '"'), ('“', '”'), ('「', '」')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim().to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::testing::ScriptedGenerator;

    #[test]
    fn test_clean_translation() {
        assert_eq!(clean_translation("  Lánzalo.\n"), "Lánzalo.");
        assert_eq!(clean_translation("\"Lánzalo.\""), "Lánzalo.");
        assert_eq!(clean_translation("「发布吧」"), "发布吧");
    }

    #[tokio::test]
    async fn test_uses_language_prompt() {
        let generator = ScriptedGenerator::new("ko", |instructions, input| {
            assert!(instructions.contains("Korean"));
            Ok(format!("[ko] {}", input))
        });

        let out = translate_quote(&generator, &Prompts::default(), Language::Korean, "Ship it.")
            .await
            .unwrap();
        assert_eq!(out, "[ko] Ship it.");
    }

    #[tokio::test]
    async fn test_blank_translation_is_malformed() {
        let generator = ScriptedGenerator::fixed("es", "   ");
        let err = translate_quote(&generator, &Prompts::default(), Language::Spanish, "Ship it.")
            .await
            .unwrap_err();
        assert!(matches!(err, PodquoteError::MalformedResponse(_)));
    }
}
