// Test mocks for the monitoring pipeline.
//
// - MockFetcher (SourceFetcher): reference→entity and reference→items maps
// - MockSink (MessageSink): records deliveries, fails for chosen recipients
// - MockEnricher (Enricher): fixed Enrichment, records the texts it was given
// - MockConnector (PlatformConnector): wires the above into Connections

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use keywatch_common::{
    EntityDescriptor, EntityKind, Item, Match, MonitorConfig, Platform, SourceError,
};

use crate::connector::{Connections, PlatformConnector};
use crate::enrichment::{Enricher, Enrichment};
use crate::notify::Notifier;
use crate::poller::SourcePoller;
use crate::traits::{MessageSink, SourceFetcher};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn item(id: i64, text: &str) -> Item {
    Item {
        id,
        text: text.to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single(),
    }
}

/// A VK group match on item 42 for the keyword "встреча".
pub fn sample_match() -> Match {
    Match {
        source: Platform::Vk,
        entity_kind: EntityKind::Group,
        entity_name: "Городские новости".to_string(),
        entity_url: "https://vk.com/citynews".to_string(),
        item_id: 42,
        owner_id: -1,
        text: "Завтра встреча в 15:00".to_string(),
        full_text: "Завтра встреча в 15:00".to_string(),
        keywords: vec!["встреча".to_string()],
        posted_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single(),
        url: "https://vk.com/wall-1_42".to_string(),
    }
}

pub fn keywords(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Map-based source. Unregistered references resolve to `NotFound`.
/// Builder: `.on_group()`, `.on_user()`, `.on_channel()`, `.on_items()`,
/// `.failing_fetch()`. Items can be swapped between cycles with `set_items`.
pub struct MockFetcher {
    platform: Platform,
    entities: HashMap<String, EntityDescriptor>,
    items: Mutex<HashMap<String, Vec<Item>>>,
    failing: HashSet<String>,
    resolve_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MockFetcher {
    fn new(platform: Platform) -> Self {
        Self {
            platform,
            entities: HashMap::new(),
            items: Mutex::new(HashMap::new()),
            failing: HashSet::new(),
            resolve_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn vk() -> Self {
        Self::new(Platform::Vk)
    }

    pub fn telegram() -> Self {
        Self::new(Platform::Telegram)
    }

    fn with_entity(mut self, reference: &str, id: i64, owner_id: i64, kind: EntityKind, name: &str) -> Self {
        let base = match self.platform {
            Platform::Vk => "https://vk.com",
            Platform::Telegram => "https://t.me",
        };
        self.entities.insert(
            reference.to_string(),
            EntityDescriptor {
                id,
                owner_id,
                kind,
                display_name: name.to_string(),
                canonical_url: format!("{base}/{reference}"),
                handle: Some(reference.to_string()),
            },
        );
        self
    }

    /// VK-style community: owner id is `-id`.
    pub fn on_group(self, reference: &str, id: i64, name: &str) -> Self {
        self.with_entity(reference, id, -id, EntityKind::Group, name)
    }

    pub fn on_user(self, reference: &str, id: i64, name: &str) -> Self {
        self.with_entity(reference, id, id, EntityKind::User, name)
    }

    pub fn on_channel(self, reference: &str, id: i64, name: &str) -> Self {
        self.with_entity(reference, id, id, EntityKind::Channel, name)
    }

    pub fn on_items(self, reference: &str, items: Vec<Item>) -> Self {
        self.set_items(reference, items);
        self
    }

    /// The entity resolves but fetching its items fails with a transport error.
    pub fn failing_fetch(mut self, reference: &str) -> Self {
        self.failing.insert(reference.to_string());
        self
    }

    pub fn set_items(&self, reference: &str, items: Vec<Item>) {
        self.items
            .lock()
            .unwrap()
            .insert(reference.to_string(), items);
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn resolve_entity(&self, reference: &str) -> Result<EntityDescriptor, SourceError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.entities
            .get(reference)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(reference.to_string()))
    }

    async fn fetch_recent_items(
        &self,
        entity: &EntityDescriptor,
        count: u32,
    ) -> Result<Vec<Item>, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let reference = entity.handle.clone().unwrap_or_default();
        if self.failing.contains(&reference) {
            return Err(SourceError::Transport(format!("MockFetcher: {reference} unreachable")));
        }
        Ok(self
            .items
            .lock()
            .unwrap()
            .get(&reference)
            .map(|items| items.iter().take(count as usize).cloned().collect())
            .unwrap_or_default())
    }

    fn item_url(&self, entity: &EntityDescriptor, item_id: i64) -> String {
        match self.platform {
            Platform::Vk => format!("https://vk.com/wall{}_{item_id}", entity.owner_id),
            Platform::Telegram => format!("{}/{item_id}", entity.canonical_url),
        }
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

/// Records every delivery attempt. Recipients registered with
/// `.failing_for()` get an error instead.
#[derive(Default)]
pub struct MockSink {
    failing: HashSet<i64>,
    attempts: Mutex<Vec<i64>>,
    delivered: Mutex<Vec<(i64, String)>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, recipient: i64) -> Self {
        self.failing.insert(recipient);
        self
    }

    /// Recipients in attempt order, failures included.
    pub fn attempted(&self) -> Vec<i64> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn delivered(&self) -> Vec<(i64, String)> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_to(&self, recipient: i64) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == recipient)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl MessageSink for MockSink {
    async fn deliver(&self, recipient: i64, text: &str) -> Result<()> {
        self.attempts.lock().unwrap().push(recipient);
        if self.failing.contains(&recipient) {
            bail!("MockSink: chat {recipient} blocked the bot");
        }
        self.delivered
            .lock()
            .unwrap()
            .push((recipient, text.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockEnricher
// ---------------------------------------------------------------------------

pub struct MockEnricher {
    result: Enrichment,
    texts: Mutex<Vec<String>>,
}

impl MockEnricher {
    pub fn returning(result: Enrichment) -> Self {
        Self {
            result,
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.texts.lock().unwrap().len()
    }

    /// Texts passed to `analyze`, in call order.
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Enricher for MockEnricher {
    async fn analyze(&self, text: &str) -> Enrichment {
        self.texts.lock().unwrap().push(text.to_string());
        self.result.clone()
    }
}

// ---------------------------------------------------------------------------
// MockConnector
// ---------------------------------------------------------------------------

/// Hands out pollers over shared mock fetchers, with zero pacing delays.
#[derive(Default)]
pub struct MockConnector {
    fetchers: Vec<Arc<MockFetcher>>,
    sink: Option<Arc<MockSink>>,
    enricher: Option<Arc<MockEnricher>>,
    connects: AtomicUsize,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fetcher(mut self, fetcher: Arc<MockFetcher>) -> Self {
        self.fetchers.push(fetcher);
        self
    }

    pub fn with_sink(mut self, sink: Arc<MockSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_enricher(mut self, enricher: Arc<MockEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformConnector for MockConnector {
    async fn connect(&self, _config: &MonitorConfig) -> Connections {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Connections {
            pollers: self
                .fetchers
                .iter()
                .map(|f| {
                    SourcePoller::new(f.clone() as Arc<dyn SourceFetcher>)
                        .with_entity_delay(Duration::ZERO)
                })
                .collect(),
            notifier: self.sink.clone().map(|sink| {
                Notifier::new(sink as Arc<dyn MessageSink>).with_send_delay(Duration::ZERO)
            }),
            enricher: self.enricher.clone().map(|e| e as Arc<dyn Enricher>),
        }
    }
}
