// Seams of the pipeline.
//
// SourceFetcher: one implementation per platform (VK, Telegram).
// MessageSink: outbound delivery of a formatted notification.
//
// Both are mocked in `testing` so the whole cycle runs without network.

use anyhow::Result;
use async_trait::async_trait;

use keywatch_common::{EntityDescriptor, Item, Platform, SourceError};

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    fn platform(&self) -> Platform;

    /// Resolve an operator-supplied reference (id, short name or URL).
    async fn resolve_entity(&self, reference: &str) -> Result<EntityDescriptor, SourceError>;

    /// Up to `count` most recent items, newest first. Access-denied and
    /// private content yields an empty list, not an error.
    async fn fetch_recent_items(
        &self,
        entity: &EntityDescriptor,
        count: u32,
    ) -> Result<Vec<Item>, SourceError>;

    /// Deep link to one item.
    fn item_url(&self, entity: &EntityDescriptor, item_id: i64) -> String;
}

#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Deliver a Telegram-HTML message to one recipient.
    async fn deliver(&self, recipient: i64, text: &str) -> Result<()>;
}
