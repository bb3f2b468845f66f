//! OpenAI chat-completions generator.

use super::TextGenerator;
use crate::config::ProviderConfig;
use crate::error::{PodquoteError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Text generation through the OpenAI chat API.
pub struct OpenAiGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    name: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl OpenAiGenerator {
    pub fn with_config(config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            name: format!("openai:{}", config.model),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn build_error(&self, e: impl std::fmt::Display) -> PodquoteError {
        PodquoteError::Config(format!("Failed to build {} request: {}", self.name, e))
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    #[instrument(skip(self, instructions, input), fields(provider = %self.name))]
    async fn generate(&self, instructions: &str, input: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(instructions)
                .build()
                .map_err(|e| self.build_error(e))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(input)
                .build()
                .map_err(|e| self.build_error(e))?
                .into(),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(messages)
            .max_completion_tokens(self.max_tokens);
        if let Some(temperature) = self.temperature {
            builder.temperature(temperature);
        }
        let request = builder.build().map_err(|e| self.build_error(e))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PodquoteError::service(&self.name, e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PodquoteError::MalformedResponse(format!("{}: empty response", self.name)))?;

        debug!("{} returned {} chars", self.name, content.len());
        Ok(content)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
