//! Error types for Podquote.

use thiserror::Error;

/// Library-level error type for Podquote operations.
#[derive(Error, Debug)]
pub enum PodquoteError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network, rate-limit or provider-side failure.
    #[error("Generation service error ({provider}): {message}")]
    TransientService { provider: String, message: String },

    /// The provider answered, but the structured payload could not be parsed.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Alignment failed: {0}")]
    AlignmentNotFound(String),

    /// Checkpoint or corpus write failure. Always fatal to the run.
    #[error("Failed to persist {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("Corpus is locked by another run ({0}). Remove the lock file if no other run is active.")]
    Locked(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PodquoteError {
    /// Build a transient service error for the named provider.
    pub fn service(provider: &str, message: impl Into<String>) -> Self {
        Self::TransientService {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Build a persistence error for the given path.
    pub fn persistence(path: &std::path::Path, message: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Errors that must terminate the run instead of being contained to one unit.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PodquoteError::Persistence { .. } | PodquoteError::Config(_) | PodquoteError::Locked(_)
        )
    }

    /// Whether re-issuing the same operation could succeed. Missing or
    /// unreadable local input does not fix itself between attempts.
    pub fn is_retryable(&self) -> bool {
        !self.is_fatal()
            && !matches!(
                self,
                PodquoteError::AlignmentNotFound(_) | PodquoteError::InvalidInput(_)
            )
    }
}

/// Result type alias for Podquote operations.
pub type Result<T> = std::result::Result<T, PodquoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let transient = PodquoteError::service("openai", "429 Too Many Requests");
        assert!(transient.is_retryable());
        assert!(!transient.is_fatal());

        let malformed = PodquoteError::MalformedResponse("no JSON array".to_string());
        assert!(malformed.is_retryable());

        let alignment = PodquoteError::AlignmentNotFound("quote text".to_string());
        assert!(!alignment.is_retryable());
        assert!(!alignment.is_fatal());

        let missing = PodquoteError::InvalidInput("Cannot read a_quotes.json".to_string());
        assert!(!missing.is_retryable());
        assert!(!missing.is_fatal());

        let persistence =
            PodquoteError::persistence(std::path::Path::new("/tmp/x.json"), "disk full");
        assert!(persistence.is_fatal());
        assert!(!persistence.is_retryable());
        assert!(persistence.to_string().contains("/tmp/x.json"));
    }
}
