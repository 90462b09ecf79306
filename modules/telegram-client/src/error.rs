use thiserror::Error;

pub type Result<T> = std::result::Result<T, TelegramError>;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Bot API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("HTTP error (status {status}) for {url}")]
    Http { status: u16, url: String },

    #[error("No public preview for @{0}")]
    PreviewUnavailable(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl TelegramError {
    /// The Bot API could not find a chat with that id or username.
    pub fn is_not_found(&self) -> bool {
        match self {
            TelegramError::Api { description, .. } => {
                description.to_lowercase().contains("not found")
            }
            _ => false,
        }
    }

    /// The bot is not allowed to read or write the chat.
    pub fn is_forbidden(&self) -> bool {
        match self {
            TelegramError::Api { code, .. } => *code == 403,
            TelegramError::PreviewUnavailable(_) => true,
            _ => false,
        }
    }
}

/// The request URL carries the token, so it never reaches the message.
impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        TelegramError::Network(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for TelegramError {
    fn from(err: serde_json::Error) -> Self {
        TelegramError::Parse(err.to_string())
    }
}
