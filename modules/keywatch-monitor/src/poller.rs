use std::sync::Arc;
use std::time::Duration;

use ai_client::truncate_chars_with_ellipsis;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use keywatch_common::{EntityDescriptor, Match, Platform, SourceError};

use crate::matcher::match_keywords;
use crate::seen::SeenStore;
use crate::traits::SourceFetcher;

/// Characters of item text carried into a Match.
pub const MATCH_TEXT_CHARS: usize = 500;

/// What one `poll_all` pass produced.
#[derive(Debug, Default)]
pub struct PollOutcome {
    pub matches: Vec<Match>,
    pub entities_polled: u32,
    pub entities_failed: u32,
    /// Items not seen before this pass.
    pub items_seen: u32,
}

/// Polls every entity of one platform, deduplicating against its own SeenStore.
pub struct SourcePoller {
    fetcher: Arc<dyn SourceFetcher>,
    seen: SeenStore,
    entity_delay: Duration,
    max_text_chars: usize,
}

impl SourcePoller {
    pub fn new(fetcher: Arc<dyn SourceFetcher>) -> Self {
        let entity_delay = match fetcher.platform() {
            Platform::Vk => Duration::from_millis(500),
            Platform::Telegram => Duration::from_secs(1),
        };
        Self {
            fetcher,
            seen: SeenStore::new(),
            entity_delay,
            max_text_chars: MATCH_TEXT_CHARS,
        }
    }

    pub fn with_entity_delay(mut self, delay: Duration) -> Self {
        self.entity_delay = delay;
        self
    }

    pub fn platform(&self) -> Platform {
        self.fetcher.platform()
    }

    pub fn seen(&self) -> &SeenStore {
        &self.seen
    }

    /// Poll `references` in order. A failing entity is logged and skipped.
    /// Cancellation is observed between entities.
    pub async fn poll_all(
        &mut self,
        references: &[String],
        keywords: &[String],
        max_items: u32,
        cancel: &CancellationToken,
    ) -> PollOutcome {
        let platform = self.platform();
        let mut outcome = PollOutcome::default();

        for (i, reference) in references.iter().enumerate() {
            if i > 0 {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.entity_delay) => {}
                }
            }
            if cancel.is_cancelled() {
                info!(%platform, remaining = references.len() - i, "Poll interrupted by shutdown");
                break;
            }

            match self.poll_entity(reference, keywords, max_items, &mut outcome).await {
                Ok(found) => {
                    outcome.entities_polled += 1;
                    if found > 0 {
                        info!(%platform, reference = %reference, matches = found, "Keyword matches found");
                    }
                }
                Err(SourceError::NotFound(_)) => {
                    outcome.entities_failed += 1;
                    warn!(%platform, reference = %reference, "Entity not found, skipping");
                }
                Err(e) => {
                    outcome.entities_failed += 1;
                    warn!(%platform, reference = %reference, error = %e, "Failed to poll entity");
                }
            }
        }

        outcome
    }

    async fn poll_entity(
        &mut self,
        reference: &str,
        keywords: &[String],
        max_items: u32,
        outcome: &mut PollOutcome,
    ) -> Result<usize, SourceError> {
        let entity = self.fetcher.resolve_entity(reference).await?;
        let items = self.fetcher.fetch_recent_items(&entity, max_items).await?;
        let key = entity.entity_key();

        debug!(
            entity = %entity.display_name,
            kind = %entity.kind,
            fetched = items.len(),
            "Fetched items"
        );

        let mut found = 0;
        for item in items {
            if self.seen.has_seen(&key, item.id) {
                continue;
            }
            // Marked before matching so an item is never considered twice.
            self.seen.mark_seen(&key, item.id);
            outcome.items_seen += 1;

            let hits = match_keywords(&item.text, keywords);
            if hits.is_empty() {
                continue;
            }
            outcome.matches.push(self.build_match(&entity, item.id, &item.text, hits, item.timestamp));
            found += 1;
        }

        Ok(found)
    }

    fn build_match(
        &self,
        entity: &EntityDescriptor,
        item_id: i64,
        text: &str,
        keywords: Vec<String>,
        posted_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Match {
        Match {
            source: self.platform(),
            entity_kind: entity.kind,
            entity_name: entity.display_name.clone(),
            entity_url: entity.canonical_url.clone(),
            item_id,
            owner_id: entity.owner_id,
            text: truncate_chars_with_ellipsis(text, self.max_text_chars),
            full_text: text.to_string(),
            keywords,
            posted_at,
            url: self.fetcher.item_url(entity, item_id),
        }
    }
}
