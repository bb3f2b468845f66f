//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials and inputs are available before starting a
//! run that would otherwise fail on its first external call.

use crate::config::{ProviderKind, Settings};
use crate::error::{PodquoteError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// A pipeline run needs every configured provider's key and a transcript directory.
    Run,
    /// Alignment reads local files only.
    Align,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Run => {
            for kind in settings.providers.kinds() {
                check_api_key(kind)?;
            }
            check_dir_exists(&settings.transcripts_dir())?;
        }
        Operation::Align => {
            check_dir_exists(&settings.output_dir())?;
        }
    }
    Ok(())
}

/// Check that the API key for a provider is set and non-empty.
pub fn check_api_key(kind: ProviderKind) -> Result<()> {
    let var = kind.api_key_var();
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(PodquoteError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(PodquoteError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

fn check_dir_exists(path: &std::path::Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(PodquoteError::InvalidInput(format!(
            "Directory not found: {}",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_requires_output_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.general.corpus_dir = dir.path().to_string_lossy().to_string();

        assert!(check(Operation::Align, &settings).is_err());
        std::fs::create_dir_all(settings.output_dir()).unwrap();
        assert!(check(Operation::Align, &settings).is_ok());
    }
}
