//! Anthropic Messages API generator.

use super::TextGenerator;
use crate::config::ProviderConfig;
use crate::error::{PodquoteError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Text generation through Claude.
pub struct AnthropicGenerator {
    client: Client,
    api_key: String,
    name: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl AnthropicGenerator {
    /// Create a generator, reading the key from `ANTHROPIC_API_KEY`.
    pub fn from_env(config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            PodquoteError::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key, config, timeout)
    }

    pub fn new(api_key: String, config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PodquoteError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            name: format!("anthropic:{}", config.model),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    #[instrument(skip(self, instructions, input), fields(provider = %self.name))]
    async fn generate(&self, instructions: &str, input: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: Some(instructions),
            messages: vec![Message {
                role: "user",
                content: input,
            }],
        };

        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| PodquoteError::service(&self.name, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PodquoteError::service(
                &self.name,
                format!("{} - {}", status, body),
            ));
        }

        let response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| PodquoteError::MalformedResponse(format!("{}: {}", self.name, e)))?;

        let text = response
            .content
            .into_iter()
            .find(|block| block.content_type == "text")
            .map(|block| block.text)
            .ok_or_else(|| {
                PodquoteError::MalformedResponse(format!("{}: no text content", self.name))
            })?;

        debug!("{} returned {} chars", self.name, text.len());
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}
