pub mod error;
pub mod preview;
pub mod types;

pub use error::{Result, TelegramError};
pub use preview::{parse_preview, ChannelPreview};
pub use types::{Chat, ChatType, PreviewMessage, PreviewPage};

use serde::de::DeserializeOwned;
use serde::Serialize;
use types::{BotResponse, SendMessage};

const BASE_URL: &str = "https://api.telegram.org";

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramBot {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl TelegramBot {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn call<B: Serialize + ?Sized, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let resp = self.client.post(&url).json(body).send().await?;

        // Bot API errors come back as JSON bodies with 4xx statuses.
        let status = resp.status();
        let text = resp.text().await?;
        let parsed: BotResponse<T> = serde_json::from_str(&text).map_err(|e| {
            TelegramError::Parse(format!("{method} (status {status}): {e}"))
        })?;

        if !parsed.ok {
            return Err(TelegramError::Api {
                code: parsed.error_code.unwrap_or(i64::from(status.as_u16())),
                description: parsed.description.unwrap_or_default(),
            });
        }

        parsed
            .result
            .ok_or_else(|| TelegramError::Parse(format!("{method}: ok response without result")))
    }

    /// Look up a chat by numeric id or `@username`.
    pub async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
        self.call("getChat", &serde_json::json!({ "chat_id": chat_id }))
            .await
    }

    /// Send an HTML-formatted message with link previews disabled.
    pub async fn send_html(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let _: serde_json::Value = self.call("sendMessage", &body).await?;
        tracing::debug!(chat_id, "Telegram message sent");
        Ok(())
    }
}
