use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display format for item timestamps in notifications.
pub const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Vk,
    Telegram,
}

impl Platform {
    /// Human-facing platform name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Vk => "VK",
            Self::Telegram => "Telegram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vk => write!(f, "vk"),
            Self::Telegram => write!(f, "telegram"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Group,
    User,
    Channel,
    Chat,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Group => "Group",
            Self::User => "User",
            Self::Channel => "Channel",
            Self::Chat => "Chat",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => write!(f, "group"),
            Self::User => write!(f, "user"),
            Self::Channel => write!(f, "channel"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

/// Resolved identity of a monitored source. Re-resolved every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub id: i64,
    /// Signed id per platform convention (negative for VK communities).
    pub owner_id: i64,
    pub kind: EntityKind,
    pub display_name: String,
    pub canonical_url: String,
    /// Screen name / username, when the platform has one.
    pub handle: Option<String>,
}

impl EntityDescriptor {
    /// Dedup key: the absolute numeric owner id.
    pub fn entity_key(&self) -> String {
        self.owner_id.unsigned_abs().to_string()
    }
}

/// One post or message, as fetched. Lives for a single cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: i64,
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A keyword hit in one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub source: Platform,
    pub entity_kind: EntityKind,
    pub entity_name: String,
    pub entity_url: String,
    pub item_id: i64,
    pub owner_id: i64,
    /// Truncated item text.
    pub text: String,
    /// The item text as fetched, for enrichment.
    #[serde(skip)]
    pub full_text: String,
    /// In keyword-list order.
    pub keywords: Vec<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub url: String,
}

impl Match {
    pub fn display_date(&self) -> String {
        self.posted_at
            .map(|dt| dt.format(DISPLAY_DATE_FORMAT).to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn entity_key_ignores_sign() {
        let group = EntityDescriptor {
            id: 1,
            owner_id: -1,
            kind: EntityKind::Group,
            display_name: "apiclub".into(),
            canonical_url: "https://vk.com/apiclub".into(),
            handle: Some("apiclub".into()),
        };
        assert_eq!(group.entity_key(), "1");
        assert_eq!(
            EntityDescriptor { owner_id: i64::MIN, ..group }.entity_key(),
            "9223372036854775808"
        );
    }

    #[test]
    fn display_date_uses_day_first_format() {
        let m = Match {
            source: Platform::Vk,
            entity_kind: EntityKind::Group,
            entity_name: "g".into(),
            entity_url: "u".into(),
            item_id: 1,
            owner_id: -1,
            text: String::new(),
            full_text: String::new(),
            keywords: vec![],
            posted_at: Some(Utc.with_ymd_and_hms(2024, 3, 9, 15, 4, 5).unwrap()),
            url: "u".into(),
        };
        assert_eq!(m.display_date(), "09.03.2024 15:04:05");
        assert_eq!(Match { posted_at: None, ..m }.display_date(), "unknown");
    }

    #[test]
    fn platform_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Platform::Telegram).unwrap(), "\"telegram\"");
        assert_eq!(Platform::Vk.to_string(), "vk");
        assert_eq!(Platform::Vk.label(), "VK");
    }
}
