//! Speaker profile enrichment.

use crate::corpus::QuoteRecord;
use crate::error::{PodquoteError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Function assigned to speakers without a profile.
pub const DEFAULT_FUNCTION: &str = "Leadership";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeakerProfile {
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub expertise: Vec<String>,
}

/// Known speakers keyed by the name the extractor reports.
#[derive(Debug, Clone, Default)]
pub struct SpeakerProfiles {
    profiles: HashMap<String, SpeakerProfile>,
}

impl SpeakerProfiles {
    /// Load profiles from a JSON object file. A missing file yields no profiles.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let profiles = serde_json::from_str(&content).map_err(|e| {
            PodquoteError::Config(format!(
                "Invalid speaker profiles {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self { profiles })
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Set `speaker_function` and `speaker_expertise` on every quote.
    pub fn enrich(&self, quotes: &mut [QuoteRecord]) {
        for quote in quotes {
            match self.profiles.get(quote.speaker.trim()) {
                Some(profile) => {
                    quote.speaker_function = Some(
                        profile
                            .function
                            .clone()
                            .unwrap_or_else(|| DEFAULT_FUNCTION.to_string()),
                    );
                    quote.speaker_expertise = profile.expertise.clone();
                }
                None => {
                    quote.speaker_function = Some(DEFAULT_FUNCTION.to_string());
                    quote.speaker_expertise.clear();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_enrich_known_and_unknown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("speaker_profiles.json");
        std::fs::write(
            &path,
            r#"{"Ada Chen": {"function": "Growth", "expertise": ["retention", "pricing"]},
                "Lee": {"expertise": ["hiring"]}}"#,
        )
        .unwrap();

        let profiles = SpeakerProfiles::load(&path).unwrap();
        assert_eq!(profiles.len(), 2);

        let mut quotes = vec![
            QuoteRecord::new("Growth is about retention.", "Ada Chen"),
            QuoteRecord::new("Hire for slope.", "Lee"),
            QuoteRecord::new("Focus wins.", "Unknown Guest"),
        ];
        profiles.enrich(&mut quotes);

        assert_eq!(quotes[0].speaker_function.as_deref(), Some("Growth"));
        assert_eq!(quotes[0].speaker_expertise, vec!["retention", "pricing"]);
        assert_eq!(quotes[1].speaker_function.as_deref(), Some(DEFAULT_FUNCTION));
        assert_eq!(quotes[1].speaker_expertise, vec!["hiring"]);
        assert_eq!(quotes[2].speaker_function.as_deref(), Some(DEFAULT_FUNCTION));
        assert!(quotes[2].speaker_expertise.is_empty());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let profiles = SpeakerProfiles::load(Path::new("/nonexistent/profiles.json")).unwrap();
        assert!(profiles.is_empty());
    }
}
