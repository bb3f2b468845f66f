//! Doctor command - verify credentials, corpus layout and configuration.

use crate::checkpoint::CheckpointStore;
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::{ProviderKind, Settings};
use crate::corpus::CorpusStore;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(config_path: Option<&Path>, settings: &Settings) -> anyhow::Result<()> {
    Output::header("Podquote Doctor");
    println!();

    let mut checks = Vec::new();

    let mut section = |title: &str, results: Vec<CheckResult>| {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    };

    section(
        "API Configuration",
        settings
            .providers
            .kinds()
            .into_iter()
            .map(check_api_key)
            .collect(),
    );
    section("Providers", check_providers(settings));
    section("Corpus", check_corpus(settings));
    section("Configuration", vec![check_config_file(config_path)]);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before running the pipeline.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Podquote is ready to run.");
    }

    Ok(())
}

/// Check a provider's API key, masking all but its ends.
fn check_api_key(kind: ProviderKind) -> CheckResult {
    let var = kind.api_key_var();
    let hint = format!("Set with: export {}='...'", var);

    match preflight::check_api_key(kind) {
        Ok(()) => {
            let key = std::env::var(var).unwrap_or_default();
            CheckResult::ok(var, &format!("configured ({})", mask_key(&key)))
        }
        Err(e) => CheckResult::error(var, &e.to_string(), &hint),
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_providers(settings: &Settings) -> Vec<CheckResult> {
    let mut results = vec![CheckResult::ok(
        "Extraction",
        &format!(
            "{}:{}",
            settings.providers.extraction.kind, settings.providers.extraction.model
        ),
    )];

    for (language, config) in &settings.providers.translation {
        results.push(CheckResult::ok(
            &format!("Translation ({})", language.display_name()),
            &format!("{}:{}", config.kind, config.model),
        ));
    }
    results
}

fn check_corpus(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();
    let store = CorpusStore::new(settings.transcripts_dir(), settings.output_dir());

    match store.discover_units() {
        Ok(units) if units.is_empty() => results.push(CheckResult::warning(
            "Transcripts",
            &format!("{} (no .txt files)", settings.transcripts_dir().display()),
            "Add one transcript per episode as <name>.txt",
        )),
        Ok(units) => results.push(CheckResult::ok(
            "Transcripts",
            &format!("{} transcripts in {}", units.len(), settings.transcripts_dir().display()),
        )),
        Err(e) => results.push(CheckResult::error(
            "Transcripts",
            &e.to_string(),
            "Set general.corpus_dir or general.transcripts_dir",
        )),
    }

    let output_dir = settings.output_dir();
    if output_dir.exists() {
        results.push(CheckResult::ok("Output directory", &output_dir.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Output directory",
            &format!("{} (will be created)", output_dir.display()),
            "Directory will be created on first run",
        ));
    }

    if settings.lock_path().exists() {
        results.push(CheckResult::warning(
            "Lock",
            &format!("{} exists", settings.lock_path().display()),
            "Another run may be active. Remove the file if it is stale.",
        ));
    }

    match CheckpointStore::new(settings.checkpoint_path()).load() {
        Ok(state) if state.counters.runs == 0 => {
            results.push(CheckResult::ok("Checkpoint", "none yet"));
        }
        Ok(state) if !state.is_consistent() => results.push(CheckResult::warning(
            "Checkpoint",
            "counters disagree with unit records",
            "Run `podquote status` and consider `podquote reset`",
        )),
        Ok(state) => results.push(CheckResult::ok(
            "Checkpoint",
            &format!(
                "{} runs, {} failed units",
                state.counters.runs,
                state.failed_units().len()
            ),
        )),
        Err(e) => results.push(CheckResult::error(
            "Checkpoint",
            &e.to_string(),
            "Fix or remove the checkpoint file",
        )),
    }

    if let Some(path) = settings.speaker_profiles_path() {
        if !path.exists() {
            results.push(CheckResult::warning(
                "Speaker profiles",
                &format!("{} not found", path.display()),
                "Speakers will default to function 'Leadership'",
            ));
        }
    }

    results
}

/// Check if config file exists.
fn check_config_file(config_path: Option<&Path>) -> CheckResult {
    let default_path = Settings::default_config_path();
    let config_path = config_path.unwrap_or(&default_path);
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: podquote config edit",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("short"), "***");
        assert_eq!(mask_key("sk-ant-api03-abcdefgh1234"), "sk-ant-...1234");
    }

    #[test]
    fn test_check_corpus_missing_transcripts() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.general.corpus_dir = dir.path().to_string_lossy().to_string();
        settings.general.speaker_profiles = None;

        let results = check_corpus(&settings);
        assert_eq!(results[0].status, CheckStatus::Error);
        assert_eq!(results[1].status, CheckStatus::Warning);
    }
}
