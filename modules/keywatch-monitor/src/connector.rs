use std::sync::Arc;

use async_trait::async_trait;
use telegram_client::{ChannelPreview, TelegramBot};
use tracing::{info, warn};
use vk_client::VkClient;

use keywatch_common::MonitorConfig;

use crate::enrichment::{Enricher, OpenRouterEnricher};
use crate::fetchers::{TelegramFetcher, VkFetcher};
use crate::notify::Notifier;
use crate::poller::SourcePoller;

/// Everything a monitoring run talks to, built once when the service starts.
#[derive(Default)]
pub struct Connections {
    /// In polling order.
    pub pollers: Vec<SourcePoller>,
    pub notifier: Option<Notifier>,
    pub enricher: Option<Arc<dyn Enricher>>,
}

/// Builds [`Connections`] from the monitoring document. A platform whose
/// credentials are missing is left out; that is never an error.
#[async_trait]
pub trait PlatformConnector: Send + Sync {
    async fn connect(&self, config: &MonitorConfig) -> Connections;
}

/// Real VK, Telegram and OpenRouter clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveConnector;

#[async_trait]
impl PlatformConnector for LiveConnector {
    async fn connect(&self, config: &MonitorConfig) -> Connections {
        let mut connections = Connections::default();

        if config.has_vk_credentials() {
            let client = VkClient::new(config.vk.access_token.trim().to_string());
            connections
                .pollers
                .push(SourcePoller::new(Arc::new(VkFetcher::new(client))));
            info!(groups = config.vk.groups.len(), "VK monitoring enabled");
        } else {
            warn!("VK access token not configured, VK monitoring disabled");
        }

        if config.has_telegram_credentials() {
            let bot = TelegramBot::new(config.telegram.bot_token.trim().to_string());
            let fetcher = TelegramFetcher::new(bot.clone(), ChannelPreview::new());
            connections.pollers.push(SourcePoller::new(Arc::new(fetcher)));
            connections.notifier = Some(Notifier::new(Arc::new(bot)));
            info!(channels = config.telegram.channels.len(), "Telegram monitoring enabled");
        } else {
            warn!("Telegram bot token not configured, Telegram monitoring and notifications disabled");
        }

        match OpenRouterEnricher::from_settings(&config.ai) {
            Some(enricher) => {
                info!(model = %enricher.model(), "AI analysis enabled");
                connections.enricher = Some(Arc::new(enricher));
            }
            None if config.ai.enabled => warn!("AI analysis enabled but no API key configured"),
            None => {}
        }

        connections
    }
}
