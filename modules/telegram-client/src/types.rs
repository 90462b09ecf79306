use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope of every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct BotResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<i64>,
    pub description: Option<String>,
}

/// `getChat` result.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    pub title: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Chat {
    /// Title for groups and channels, full name for private chats.
    pub fn display_name(&self) -> Option<String> {
        if let Some(ref title) = self.title {
            return Some(title.clone());
        }
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// `sendMessage` request body.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'a str,
    pub disable_web_page_preview: bool,
}

/// One message scraped from a public channel preview.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewMessage {
    pub id: i64,
    pub text: String,
    pub date: Option<DateTime<Utc>>,
}

/// Parsed `t.me/s/<name>` page.
#[derive(Debug, Clone, Default)]
pub struct PreviewPage {
    pub title: Option<String>,
    /// False when Telegram served the plain landing page (private or unknown chat).
    pub has_feed: bool,
    /// Oldest first, as laid out on the page.
    pub messages: Vec<PreviewMessage>,
}
