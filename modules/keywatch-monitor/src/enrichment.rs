use std::time::Duration;

use ai_client::{truncate_chars_with_ellipsis, AiError, OpenRouter};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use keywatch_common::AiSettings;

const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;
const TIMEOUT: Duration = Duration::from_secs(60);
const APP_NAME: &str = "VK-TG-Monitor";
const SITE_URL: &str = "https://github.com/monitor-service";

pub const DEFAULT_PROMPT: &str = "Analyze the following social media post. \
Summarize what it is about in two or three sentences, state its overall tone, \
and point out anything that needs attention (events, dates, requests, offers).\n\n\
Post:\n{text}";

/// Outcome of analyzing one item's text. Failures are values, never errors:
/// the notification goes out either way and shows what happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Enrichment {
    Analysis { text: String, model: String },
    Failed { reason: String },
}

impl Enrichment {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Analysis { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } => Some(reason),
            Self::Analysis { .. } => None,
        }
    }
}

#[async_trait]
pub trait Enricher: Send + Sync {
    async fn analyze(&self, text: &str) -> Enrichment;
}

/// Text analysis through an OpenRouter-hosted model.
pub struct OpenRouterEnricher {
    client: OpenRouter,
    prompt: String,
    max_text_length: usize,
}

impl OpenRouterEnricher {
    pub fn new(client: OpenRouter) -> Self {
        Self {
            client,
            prompt: DEFAULT_PROMPT.to_string(),
            max_text_length: keywatch_common::settings::DEFAULT_AI_MAX_TEXT_LENGTH,
        }
    }

    /// Built from the `ai` section; `None` unless enabled with a key.
    pub fn from_settings(settings: &AiSettings) -> Option<Self> {
        if !settings.is_active() {
            return None;
        }
        let client = OpenRouter::new(settings.api_key.trim(), settings.model.clone())
            .with_app_name(APP_NAME)
            .with_site_url(SITE_URL)
            .with_timeout(TIMEOUT)
            .with_max_tokens(MAX_TOKENS)
            .with_temperature(TEMPERATURE);
        Some(
            Self::new(client)
                .with_prompt(&settings.prompt)
                .with_max_text_length(settings.max_text_length),
        )
    }

    /// A blank prompt keeps the default.
    pub fn with_prompt(mut self, prompt: &str) -> Self {
        if !prompt.trim().is_empty() {
            self.prompt = prompt.to_string();
        }
        self
    }

    pub fn with_max_text_length(mut self, max: usize) -> Self {
        if max > 0 {
            self.max_text_length = max;
        }
        self
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    fn render_prompt(&self, text: &str) -> String {
        let text = truncate_chars_with_ellipsis(text, self.max_text_length);
        if self.prompt.contains("{text}") {
            self.prompt.replace("{text}", &text)
        } else {
            format!("{}\n\n{}", self.prompt, text)
        }
    }
}

fn failure_reason(err: &AiError) -> String {
    match err {
        AiError::Config(msg) => msg.clone(),
        AiError::Timeout => "timeout".to_string(),
        AiError::Network(msg) => format!("network error: {msg}"),
        AiError::Api { status: 401, .. } => "invalid API key".to_string(),
        AiError::Api { status: 429, .. } => "rate limit exceeded".to_string(),
        AiError::Api { status, message } => format!("HTTP {status}: {message}"),
        AiError::Parse(msg) => format!("unexpected response: {msg}"),
        AiError::EmptyResponse(msg) => format!("empty response: {msg}"),
    }
}

#[async_trait]
impl Enricher for OpenRouterEnricher {
    async fn analyze(&self, text: &str) -> Enrichment {
        if text.trim().is_empty() {
            return Enrichment::failed("empty text");
        }

        match self.client.complete(&self.render_prompt(text)).await {
            Ok(completion) if completion.content.is_empty() => {
                warn!(model = %completion.model, "Model returned an empty analysis");
                Enrichment::failed("empty response from model")
            }
            Ok(completion) => {
                debug!(model = %completion.model, tokens = ?completion.total_tokens, "Analysis complete");
                Enrichment::Analysis {
                    text: completion.content,
                    model: completion.model,
                }
            }
            Err(e) => {
                warn!(model = %self.model(), error = %e, "Text analysis failed");
                Enrichment::Failed {
                    reason: failure_reason(&e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(enabled: bool, key: &str) -> AiSettings {
        AiSettings {
            enabled,
            api_key: key.into(),
            ..AiSettings::default()
        }
    }

    #[test]
    fn disabled_or_keyless_settings_build_nothing() {
        assert!(OpenRouterEnricher::from_settings(&settings(false, "k")).is_none());
        assert!(OpenRouterEnricher::from_settings(&settings(true, "  ")).is_none());
        let enricher = OpenRouterEnricher::from_settings(&settings(true, "k")).unwrap();
        assert_eq!(enricher.model(), keywatch_common::settings::DEFAULT_AI_MODEL);
    }

    #[test]
    fn prompt_placeholder_receives_truncated_text() {
        let enricher = OpenRouterEnricher::new(OpenRouter::new("k", "m"))
            .with_prompt("Summarize: {text}")
            .with_max_text_length(5);
        assert_eq!(enricher.render_prompt("abcdefgh"), "Summarize: abcde...");
    }

    #[test]
    fn blank_prompt_keeps_default() {
        let enricher = OpenRouterEnricher::new(OpenRouter::new("k", "m")).with_prompt("   ");
        assert!(enricher.render_prompt("hello").ends_with("Post:\nhello"));
    }

    #[test]
    fn api_failures_have_readable_reasons() {
        assert_eq!(failure_reason(&AiError::Timeout), "timeout");
        assert_eq!(
            failure_reason(&AiError::Api { status: 401, message: String::new() }),
            "invalid API key"
        );
        assert_eq!(
            failure_reason(&AiError::Api { status: 429, message: String::new() }),
            "rate limit exceeded"
        );
        assert_eq!(
            failure_reason(&AiError::Api { status: 500, message: "boom".into() }),
            "HTTP 500: boom"
        );
    }

    #[tokio::test]
    async fn empty_text_fails_without_a_request() {
        let enricher = OpenRouterEnricher::new(OpenRouter::new("", "m"));
        assert_eq!(enricher.analyze("  ").await, Enrichment::failed("empty text"));
    }

    #[tokio::test]
    async fn missing_key_is_reported_not_raised() {
        let enricher = OpenRouterEnricher::new(OpenRouter::new("", "m"));
        let result = enricher.analyze("some text").await;
        assert!(!result.is_success());
        assert!(result.error_message().unwrap().contains("not configured"));
    }
}
