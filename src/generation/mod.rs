//! Text generation services used by the extraction and translation stages.

mod anthropic;
mod openai;

pub use anthropic::AnthropicGenerator;
pub use openai::OpenAiGenerator;

use crate::config::{ProviderConfig, ProviderKind, ProviderSettings};
use crate::corpus::Language;
use crate::error::{PodquoteError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Trait for a bound text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send instructions and input, returning the generated text.
    async fn generate(&self, instructions: &str, input: &str) -> Result<String>;

    /// Identifier used in logs and error messages, e.g. `openai:gpt-5-mini`.
    fn name(&self) -> &str;
}

/// Build the generator for a provider binding.
pub fn create_generator(
    config: &ProviderConfig,
    timeout: Duration,
) -> Result<Arc<dyn TextGenerator>> {
    match config.kind {
        ProviderKind::Anthropic => Ok(Arc::new(AnthropicGenerator::from_env(config, timeout)?)),
        ProviderKind::OpenAI => Ok(Arc::new(OpenAiGenerator::with_config(config, timeout)?)),
    }
}

/// Translation services keyed by target language.
#[derive(Clone, Default)]
pub struct Translators {
    by_language: BTreeMap<Language, Arc<dyn TextGenerator>>,
}

impl Translators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one generator per configured language.
    pub fn from_settings(settings: &ProviderSettings, timeout: Duration) -> Result<Self> {
        let mut translators = Self::new();
        for (language, config) in &settings.translation {
            translators.insert(*language, create_generator(config, timeout)?);
        }
        Ok(translators)
    }

    pub fn insert(&mut self, language: Language, generator: Arc<dyn TextGenerator>) {
        self.by_language.insert(language, generator);
    }

    pub fn get(&self, language: Language) -> Result<&Arc<dyn TextGenerator>> {
        self.by_language.get(&language).ok_or_else(|| {
            PodquoteError::Config(format!("No translator configured for {}", language))
        })
    }

    /// Languages in a stable order.
    pub fn languages(&self) -> Vec<Language> {
        self.by_language.keys().copied().collect()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted generator for exercising stages without network access.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Responder = dyn Fn(&str, &str) -> Result<String> + Send + Sync;

    pub struct ScriptedGenerator {
        name: String,
        calls: AtomicUsize,
        /// Errors returned before the responder is consulted, one per call.
        failures: Mutex<VecDeque<PodquoteError>>,
        respond: Box<Responder>,
    }

    impl ScriptedGenerator {
        pub fn new(
            name: &str,
            respond: impl Fn(&str, &str) -> Result<String> + Send + Sync + 'static,
        ) -> Self {
            Self {
                name: name.to_string(),
                calls: AtomicUsize::new(0),
                failures: Mutex::new(VecDeque::new()),
                respond: Box::new(respond),
            }
        }

        /// Always answers with `text`.
        pub fn fixed(name: &str, text: &str) -> Self {
            let text = text.to_string();
            Self::new(name, move |_, _| Ok(text.clone()))
        }

        /// Echoes the input with a prefix, e.g. `"[ko] Ship it."`.
        pub fn echo(name: &str, prefix: &str) -> Self {
            let prefix = prefix.to_string();
            Self::new(name, move |_, input| Ok(format!("{} {}", prefix, input)))
        }

        pub fn fail_next(self, errors: impl IntoIterator<Item = PodquoteError>) -> Self {
            self.failures.lock().unwrap().extend(errors);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, instructions: &str, input: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.failures.lock().unwrap().pop_front() {
                return Err(err);
            }
            (self.respond)(instructions, input)
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}
