use thiserror::Error;

pub type Result<T> = std::result::Result<T, VkError>;

/// VK error codes that mean "you may not read this wall".
const ACCESS_DENIED_CODES: [i64; 3] = [15, 18, 30];

#[derive(Debug, Error)]
pub enum VkError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error (status {status}): {message}")]
    Http { status: u16, message: String },

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl VkError {
    /// Private profile, closed community, deleted or banned page.
    pub fn is_access_denied(&self) -> bool {
        match self {
            VkError::Api { code, message } => {
                let lower = message.to_lowercase();
                ACCESS_DENIED_CODES.contains(code)
                    || lower.contains("access denied")
                    || lower.contains("private")
            }
            _ => false,
        }
    }
}

/// The request URL carries the token, so it never reaches the message.
impl From<reqwest::Error> for VkError {
    fn from(err: reqwest::Error) -> Self {
        VkError::Network(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for VkError {
    fn from(err: serde_json::Error) -> Self {
        VkError::Parse(err.to_string())
    }
}
