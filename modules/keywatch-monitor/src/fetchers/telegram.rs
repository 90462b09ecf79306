use async_trait::async_trait;
use tracing::warn;
use telegram_client::{Chat, ChatType, ChannelPreview, TelegramBot, TelegramError};

use keywatch_common::{EntityDescriptor, EntityKind, Item, Platform, SourceError};

use super::reference::normalize_telegram_reference;
use crate::traits::SourceFetcher;

const TELEGRAM_URL: &str = "https://t.me";

/// Public channels and groups: resolved through the Bot API, read through
/// the public web preview.
pub struct TelegramFetcher {
    bot: TelegramBot,
    preview: ChannelPreview,
}

impl TelegramFetcher {
    pub fn new(bot: TelegramBot, preview: ChannelPreview) -> Self {
        Self { bot, preview }
    }
}

fn chat_descriptor(chat: &Chat) -> EntityDescriptor {
    let kind = match chat.chat_type {
        ChatType::Channel => EntityKind::Channel,
        ChatType::Group | ChatType::Supergroup => EntityKind::Chat,
        ChatType::Private => EntityKind::User,
    };
    let handle = chat.username.clone().filter(|u| !u.is_empty());
    let canonical_url = match handle {
        Some(ref username) => format!("{TELEGRAM_URL}/{username}"),
        None => format!("{TELEGRAM_URL}/c/{}", internal_id(chat.id)),
    };
    EntityDescriptor {
        id: chat.id,
        owner_id: chat.id,
        kind,
        display_name: chat
            .display_name()
            .or_else(|| handle.clone())
            .unwrap_or_else(|| chat.id.to_string()),
        canonical_url,
        handle,
    }
}

/// Bot API ids of supergroups and channels carry a `-100` prefix that
/// `t.me/c/` links omit.
fn internal_id(chat_id: i64) -> i64 {
    let abs = chat_id.unsigned_abs();
    let raw = abs.to_string();
    raw.strip_prefix("100")
        .and_then(|rest| rest.parse().ok())
        .filter(|_| chat_id < 0)
        .unwrap_or(abs as i64)
}

fn into_source_error(err: TelegramError) -> SourceError {
    if err.is_not_found() {
        return SourceError::NotFound(err.to_string());
    }
    if err.is_forbidden() {
        return SourceError::AccessDenied(err.to_string());
    }
    match err {
        TelegramError::Parse(msg) => SourceError::Parse(msg),
        other => SourceError::Transport(other.to_string()),
    }
}

#[async_trait]
impl SourceFetcher for TelegramFetcher {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn resolve_entity(&self, reference: &str) -> Result<EntityDescriptor, SourceError> {
        let name = normalize_telegram_reference(reference);
        if name.is_empty() {
            return Err(SourceError::NotFound(reference.to_string()));
        }
        let chat_id = if name.parse::<i64>().is_ok() {
            name
        } else {
            format!("@{name}")
        };
        let chat = self
            .bot
            .get_chat(&chat_id)
            .await
            .map_err(into_source_error)?;
        Ok(chat_descriptor(&chat))
    }

    async fn fetch_recent_items(
        &self,
        entity: &EntityDescriptor,
        count: u32,
    ) -> Result<Vec<Item>, SourceError> {
        let Some(ref username) = entity.handle else {
            warn!(
                entity = %entity.display_name,
                chat_id = entity.id,
                "Telegram chat has no public username, cannot read its history"
            );
            return Ok(Vec::new());
        };

        match self.preview.recent_messages(username, count as usize).await {
            Ok(messages) => Ok(messages
                .into_iter()
                .filter(|m| !m.text.trim().is_empty())
                .map(|m| Item {
                    id: m.id,
                    text: m.text,
                    timestamp: m.date,
                })
                .collect()),
            Err(e) if e.is_forbidden() => {
                warn!(entity = %entity.display_name, error = %e, "Telegram history not public, skipping");
                Ok(Vec::new())
            }
            Err(e) => Err(into_source_error(e)),
        }
    }

    fn item_url(&self, entity: &EntityDescriptor, item_id: i64) -> String {
        match entity.handle {
            Some(ref username) => format!("{TELEGRAM_URL}/{username}/{item_id}"),
            None => format!("{TELEGRAM_URL}/c/{}/{item_id}", internal_id(entity.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(chat_type: ChatType, username: Option<&str>) -> Chat {
        Chat {
            id: -1001234567890,
            chat_type,
            title: Some("City News".into()),
            username: username.map(String::from),
            first_name: None,
            last_name: None,
        }
    }

    #[test]
    fn chat_types_map_to_entity_kinds() {
        assert_eq!(chat_descriptor(&chat(ChatType::Channel, Some("news"))).kind, EntityKind::Channel);
        assert_eq!(chat_descriptor(&chat(ChatType::Supergroup, Some("news"))).kind, EntityKind::Chat);
        assert_eq!(chat_descriptor(&chat(ChatType::Group, None)).kind, EntityKind::Chat);
    }

    #[test]
    fn public_channel_links() {
        let fetcher = TelegramFetcher::new(TelegramBot::new("t".into()), ChannelPreview::new());
        let d = chat_descriptor(&chat(ChatType::Channel, Some("news")));
        assert_eq!(d.canonical_url, "https://t.me/news");
        assert_eq!(fetcher.item_url(&d, 42), "https://t.me/news/42");
    }

    #[test]
    fn private_chat_links_drop_the_prefix() {
        let d = chat_descriptor(&chat(ChatType::Supergroup, None));
        assert_eq!(d.canonical_url, "https://t.me/c/1234567890");
    }

    #[test]
    fn bot_errors_map_to_source_errors() {
        let not_found = TelegramError::Api {
            code: 400,
            description: "Bad Request: chat not found".into(),
        };
        assert!(matches!(into_source_error(not_found), SourceError::NotFound(_)));
        let forbidden = TelegramError::Api {
            code: 403,
            description: "Forbidden".into(),
        };
        assert!(matches!(into_source_error(forbidden), SourceError::AccessDenied(_)));
    }
}
