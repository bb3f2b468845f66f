//! Quote extraction from a transcript.

use crate::config::Prompts;
use crate::corpus::QuoteRecord;
use crate::error::{PodquoteError, Result};
use crate::generation::TextGenerator;
use std::collections::HashMap;
use tracing::debug;

/// Ask the generator for the most quotable statements in a transcript.
pub async fn extract_quotes(
    generator: &dyn TextGenerator,
    prompts: &Prompts,
    transcript: &str,
) -> Result<Vec<QuoteRecord>> {
    let mut vars = HashMap::new();
    vars.insert("transcript".to_string(), transcript.to_string());
    let input = prompts.render_with_custom(&prompts.extraction.user, &vars);

    let response = generator
        .generate(&prompts.extraction.system, &input)
        .await?;

    let quotes = parse_quote_response(&response)?;
    debug!("{} extracted {} quotes", generator.name(), quotes.len());
    Ok(quotes)
}

/// Parse a quote array out of a model response.
///
/// Accepts bare JSON, markdown-fenced JSON and JSON surrounded by prose.
/// Entries with blank `text` are dropped.
pub fn parse_quote_response(response: &str) -> Result<Vec<QuoteRecord>> {
    let trimmed = strip_code_fence(response.trim());

    let json_str = match (trimmed.find('['), trimmed.rfind(']')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    };

    let quotes: Vec<QuoteRecord> = serde_json::from_str(json_str).map_err(|e| {
        PodquoteError::MalformedResponse(format!(
            "Failed to parse quote list: {}. Response began: {}",
            e,
            response.chars().take(200).collect::<String>()
        ))
    })?;

    Ok(quotes
        .into_iter()
        .filter(|q| !q.text.trim().is_empty())
        .collect())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the language tag line, e.g. ```json
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
