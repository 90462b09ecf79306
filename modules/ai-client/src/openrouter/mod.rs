mod client;
pub(crate) mod types;

use std::time::Duration;

use crate::error::{AiError, Result};
use client::OpenRouterClient;
use types::{ChatRequest, WireMessage};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of a single chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub content: String,
    pub model: String,
    pub total_tokens: Option<u32>,
}

#[derive(Clone)]
pub struct OpenRouter {
    client: OpenRouterClient,
    model: String,
    timeout: Duration,
    max_tokens: u32,
    temperature: f32,
}

impl OpenRouter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: OpenRouterClient::new(api_key.into()),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
            max_tokens: 4096,
            temperature: 0.0,
        }
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.client.app_name = Some(name.into());
        self
    }

    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.client.site_url = Some(url.into());
        self
    }

    /// Point the client at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a single user message and return the first choice.
    pub async fn complete(&self, prompt: &str) -> Result<ChatCompletion> {
        self.send(vec![WireMessage::user(prompt)]).await
    }

    async fn send(&self, messages: Vec<WireMessage>) -> Result<ChatCompletion> {
        if !self.client.has_key() {
            return Err(AiError::Config("OpenRouter API key is not configured".into()));
        }

        let request = messages
            .into_iter()
            .fold(ChatRequest::new(&self.model), |req, msg| req.message(msg))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature);

        let response = self.client.chat(&request, self.timeout).await?;

        let total_tokens = response.usage.as_ref().map(|u| u.total_tokens);
        match response.choices.into_iter().next() {
            Some(choice) => Ok(ChatCompletion {
                content: choice.message.content.unwrap_or_default().trim().to_string(),
                model: self.model.clone(),
                total_tokens,
            }),
            None => {
                let reason = response
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "no choices returned".to_string());
                Err(AiError::EmptyResponse(reason))
            }
        }
    }
}
