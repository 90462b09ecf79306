use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_MAX_POSTS_PER_CHECK: u32 = 20;
pub const MIN_CHECK_INTERVAL_SECS: u64 = 10;
pub const MAX_POSTS_PER_CHECK_LIMIT: u32 = 100;
pub const DEFAULT_AI_MODEL: &str = "deepseek/deepseek-r1-0528:free";
pub const DEFAULT_AI_MAX_TEXT_LENGTH: usize = 2000;

const REDACTED: &str = "***";

/// The monitoring document: what to watch, what to look for, whom to tell.
///
/// Edited by the admin API, read by the monitor as a snapshot at the start of
/// every cycle. Unknown keys in the JSON file are ignored, missing ones take
/// their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub telegram: TelegramSettings,
    pub vk: VkSettings,
    pub keywords: Vec<String>,
    pub recipients: Vec<i64>,
    pub monitoring: MonitoringSettings,
    pub ai: AiSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VkSettings {
    pub access_token: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringSettings {
    /// Seconds between the end of one cycle and the start of the next.
    pub check_interval: u64,
    pub max_posts_per_check: u32,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL_SECS,
            max_posts_per_check: DEFAULT_MAX_POSTS_PER_CHECK,
        }
    }
}

impl MonitoringSettings {
    /// Pause between cycles, never below `MIN_CHECK_INTERVAL_SECS` whatever
    /// the file says.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval.max(MIN_CHECK_INTERVAL_SECS))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub enabled: bool,
    #[serde(alias = "openrouter_api_key")]
    pub api_key: String,
    pub model: String,
    /// Prompt template with a `{text}` placeholder. Blank means the built-in prompt.
    pub prompt: String,
    pub max_text_length: usize,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            model: DEFAULT_AI_MODEL.to_string(),
            prompt: String::new(),
            max_text_length: DEFAULT_AI_MAX_TEXT_LENGTH,
        }
    }
}

impl AiSettings {
    pub fn is_active(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }
}

impl MonitorConfig {
    pub fn has_vk_credentials(&self) -> bool {
        !self.vk.access_token.trim().is_empty()
    }

    pub fn has_telegram_credentials(&self) -> bool {
        !self.telegram.bot_token.trim().is_empty()
    }

    /// Copy safe to show over the admin API: credentials masked.
    pub fn redacted(&self) -> Self {
        let mask = |s: &str| {
            if s.is_empty() {
                String::new()
            } else {
                REDACTED.to_string()
            }
        };
        let mut copy = self.clone();
        copy.telegram.bot_token = mask(&self.telegram.bot_token);
        copy.vk.access_token = mask(&self.vk.access_token);
        copy.ai.api_key = mask(&self.ai.api_key);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_takes_defaults() {
        let cfg: MonitorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.monitoring.check_interval, 300);
        assert_eq!(cfg.monitoring.max_posts_per_check, 20);
        assert_eq!(cfg.ai.max_text_length, 2000);
        assert!(cfg.keywords.is_empty());
        assert!(!cfg.has_vk_credentials());
    }

    #[test]
    fn legacy_document_with_extra_keys_parses() {
        let raw = r#"{
            "telegram": {"api_id": 123, "api_hash": "h", "bot_token": "t", "phone": "", "channels": ["@news"]},
            "vk": {"access_token": "vk", "groups": ["apiclub"]},
            "keywords": ["встреча"],
            "recipients": [111, 222],
            "admin": {"username": "admin", "password": "x"},
            "monitoring": {"check_interval": 60}
        }"#;
        let cfg: MonitorConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.telegram.channels, vec!["@news"]);
        assert_eq!(cfg.recipients, vec![111, 222]);
        assert_eq!(cfg.monitoring.check_interval, 60);
        assert_eq!(cfg.monitoring.max_posts_per_check, 20);
        assert!(cfg.has_telegram_credentials());
    }

    #[test]
    fn hand_edited_zero_interval_is_raised_to_the_floor() {
        let cfg: MonitorConfig =
            serde_json::from_str(r#"{"monitoring": {"check_interval": 0}}"#).unwrap();
        assert_eq!(cfg.monitoring.interval(), Duration::from_secs(MIN_CHECK_INTERVAL_SECS));

        let slow = MonitoringSettings {
            check_interval: 60,
            ..MonitoringSettings::default()
        };
        assert_eq!(slow.interval(), Duration::from_secs(60));
    }

    #[test]
    fn redaction_masks_only_present_secrets() {
        let mut cfg = MonitorConfig::default();
        cfg.vk.access_token = "secret".into();
        let shown = cfg.redacted();
        assert_eq!(shown.vk.access_token, "***");
        assert_eq!(shown.telegram.bot_token, "");
        assert_eq!(cfg.vk.access_token, "secret");
    }

    #[test]
    fn ai_requires_both_flag_and_key() {
        let mut ai = AiSettings {
            enabled: true,
            ..AiSettings::default()
        };
        assert!(!ai.is_active());
        ai.api_key = "or-key".into();
        assert!(ai.is_active());
    }
}
