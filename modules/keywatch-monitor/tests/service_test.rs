//! MonitorService lifecycle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use keywatch_common::{ConfigStore, EntityDescriptor, Item, MonitorConfig, Platform, SourceError};
use keywatch_monitor::testing::{item, keywords, MockConnector, MockFetcher, MockSink};
use keywatch_monitor::{Connections, MonitorService, MonitorState, PlatformConnector, SourceFetcher, SourcePoller};

fn store(kw: &[&str], groups: &[&str], recipients: &[i64]) -> Arc<ConfigStore> {
    let mut config = MonitorConfig::default();
    config.keywords = keywords(kw);
    config.vk.groups = keywords(groups);
    config.recipients = recipients.to_vec();
    Arc::new(ConfigStore::in_memory(config))
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn start_runs_a_cycle_and_stop_returns_to_stopped() {
    let vk = Arc::new(MockFetcher::vk().on_group("g", 1, "G").on_items("g", vec![item(1, "sale")]));
    let sink = Arc::new(MockSink::new());
    let connector = MockConnector::new().with_fetcher(vk).with_sink(sink.clone());
    let service = MonitorService::new(store(&["sale"], &["g"], &[7]), Arc::new(connector));

    assert_eq!(service.state(), MonitorState::Stopped);
    assert!(service.start());
    wait_for(|| service.status().cycles_completed >= 1).await;

    assert!(service.is_running());
    let status = service.status();
    assert_eq!(status.last_cycle.as_ref().map(|s| s.matches), Some(1));
    assert!(status.last_cycle_at.is_some());
    assert_eq!(sink.delivered_to(7).len(), 1);

    // Default interval is minutes long; stop must not wait for it.
    let stopped = tokio::time::timeout(Duration::from_secs(2), service.shutdown()).await;
    assert!(stopped.is_ok());
    assert_eq!(service.state(), MonitorState::Stopped);
    assert!(!service.is_running());
}

#[tokio::test]
async fn second_start_is_a_no_op() {
    let connector = Arc::new(MockConnector::new());
    let service = MonitorService::new(store(&["x"], &[], &[]), connector.clone());

    assert!(service.start());
    assert!(!service.start());
    wait_for(|| service.is_running()).await;
    assert!(!service.start());
    assert_eq!(connector.connects(), 1);

    service.shutdown().await;
}

#[tokio::test]
async fn stop_when_stopped_is_a_no_op() {
    let service = MonitorService::new(store(&[], &[], &[]), Arc::new(MockConnector::new()));
    assert!(!service.stop());
    service.join().await;
    assert_eq!(service.state(), MonitorState::Stopped);
}

#[tokio::test]
async fn service_can_restart_after_stop() {
    let connector = Arc::new(MockConnector::new());
    let service = MonitorService::new(store(&["x"], &[], &[]), connector.clone());

    service.start();
    wait_for(|| service.is_running()).await;
    service.shutdown().await;

    assert!(service.start());
    wait_for(|| service.is_running()).await;
    service.shutdown().await;
    assert_eq!(connector.connects(), 2);
}

#[tokio::test]
async fn empty_keywords_skip_cycles_without_source_calls() {
    let vk = Arc::new(MockFetcher::vk().on_group("g", 1, "G").on_items("g", vec![item(1, "x")]));
    let connector = MockConnector::new().with_fetcher(vk.clone());
    let service = MonitorService::new(store(&[], &["g"], &[]), Arc::new(connector));

    service.start();
    wait_for(|| service.status().cycles_completed >= 1).await;

    assert_eq!(service.status().last_cycle.map(|s| s.skipped), Some(true));
    assert_eq!(vk.resolve_calls(), 0);
    service.shutdown().await;
}

#[tokio::test]
async fn zero_interval_in_the_file_does_not_spin() {
    let vk = Arc::new(MockFetcher::vk().on_group("g", 1, "G"));
    let mut config = MonitorConfig::default();
    config.keywords = keywords(&["x"]);
    config.vk.groups = keywords(&["g"]);
    config.monitoring.check_interval = 0;
    let connector = MockConnector::new().with_fetcher(vk.clone());
    let service = MonitorService::new(Arc::new(ConfigStore::in_memory(config)), Arc::new(connector));

    service.start();
    wait_for(|| service.status().cycles_completed >= 1).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(service.status().cycles_completed, 1);
    assert_eq!(vk.resolve_calls(), 1);
    service.shutdown().await;
}

struct PanickingFetcher;

#[async_trait]
impl SourceFetcher for PanickingFetcher {
    fn platform(&self) -> Platform {
        Platform::Vk
    }

    async fn resolve_entity(&self, _reference: &str) -> Result<EntityDescriptor, SourceError> {
        panic!("resolver exploded");
    }

    async fn fetch_recent_items(&self, _: &EntityDescriptor, _: u32) -> Result<Vec<Item>, SourceError> {
        Ok(Vec::new())
    }

    fn item_url(&self, _: &EntityDescriptor, _: i64) -> String {
        String::new()
    }
}

struct PanickingConnector;

#[async_trait]
impl PlatformConnector for PanickingConnector {
    async fn connect(&self, _config: &MonitorConfig) -> Connections {
        Connections {
            pollers: vec![SourcePoller::new(Arc::new(PanickingFetcher))],
            ..Connections::default()
        }
    }
}

#[tokio::test]
async fn crashed_loop_is_observable_as_stopped() {
    let service = MonitorService::new(store(&["x"], &["g"], &[]), Arc::new(PanickingConnector));

    assert!(service.start());
    wait_for(|| service.state() == MonitorState::Stopped).await;

    assert!(!service.is_running());
    service.join().await;
    assert!(service.start(), "a crashed service can be started again");
    service.shutdown().await;
}
