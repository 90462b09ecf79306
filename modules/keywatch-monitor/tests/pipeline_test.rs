//! Whole cycles against mock sources, sink and enricher.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use keywatch_common::{MonitorConfig, Platform};
use keywatch_monitor::testing::{item, keywords, MockConnector, MockEnricher, MockFetcher, MockSink};
use keywatch_monitor::{run_cycle, Enrichment, PlatformConnector};

fn config(kw: &[&str], vk_groups: &[&str], channels: &[&str], recipients: &[i64]) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.keywords = keywords(kw);
    config.vk.groups = keywords(vk_groups);
    config.telegram.channels = keywords(channels);
    config.recipients = recipients.to_vec();
    config
}

#[tokio::test]
async fn new_item_matches_once_then_never_again() {
    let vk = Arc::new(
        MockFetcher::vk()
            .on_group("citynews", 1, "City News")
            .on_items("citynews", vec![item(42, "Завтра встреча в 15:00")]),
    );
    let sink = Arc::new(MockSink::new());
    let connector = MockConnector::new().with_fetcher(vk.clone()).with_sink(sink.clone());
    let cfg = config(&["встреча"], &["citynews"], &[], &[111]);
    let cancel = CancellationToken::new();
    let mut connections = connector.connect(&cfg).await;

    let first = run_cycle(&cfg, &mut connections, &cancel).await;
    assert_eq!(first.stats.matches, 1);
    let (m, enrichment) = &first.matches[0];
    assert_eq!(m.keywords, vec!["встреча"]);
    assert_eq!(m.item_id, 42);
    assert!(enrichment.is_none());
    assert_eq!(sink.delivered_to(111).len(), 1);

    // Same id, edited text: still a duplicate.
    vk.set_items("citynews", vec![item(42, "Встреча перенесена, встреча в 16:00")]);
    let second = run_cycle(&cfg, &mut connections, &cancel).await;
    assert_eq!(second.stats.matches, 0);
    assert_eq!(second.stats.items_seen, 0);
    assert_eq!(sink.delivered().len(), 1);
}

#[tokio::test]
async fn unchanged_sources_produce_nothing_on_second_cycle() {
    let vk = Arc::new(MockFetcher::vk().on_group("a", 1, "A").on_items(
        "a",
        vec![item(3, "sale"), item(2, "no"), item(1, "big SALE")],
    ));
    let connector = MockConnector::new().with_fetcher(vk);
    let cfg = config(&["sale"], &["a"], &[], &[]);
    let cancel = CancellationToken::new();
    let mut connections = connector.connect(&cfg).await;

    assert_eq!(run_cycle(&cfg, &mut connections, &cancel).await.stats.matches, 2);
    assert_eq!(run_cycle(&cfg, &mut connections, &cancel).await.stats.matches, 0);
}

#[tokio::test]
async fn unresolvable_entity_does_not_hide_others() {
    let vk = Arc::new(
        MockFetcher::vk()
            .on_group("real_group", 5, "Real")
            .on_items("real_group", vec![item(10, "meetup tonight")]),
    );
    let connector = MockConnector::new().with_fetcher(vk);
    let cfg = config(&["meetup"], &["ghost_group_404", "real_group"], &[], &[]);
    let mut connections = connector.connect(&cfg).await;

    let report = run_cycle(&cfg, &mut connections, &CancellationToken::new()).await;

    assert_eq!(report.stats.entities_failed, 1);
    assert_eq!(report.stats.entities_polled, 1);
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].0.entity_name, "Real");
}

#[tokio::test]
async fn fetch_failure_is_isolated_to_its_entity() {
    let vk = Arc::new(
        MockFetcher::vk()
            .on_group("down", 1, "Down")
            .failing_fetch("down")
            .on_group("up", 2, "Up")
            .on_items("up", vec![item(1, "meetup")]),
    );
    let connector = MockConnector::new().with_fetcher(vk);
    let cfg = config(&["meetup"], &["down", "up"], &[], &[]);
    let mut connections = connector.connect(&cfg).await;

    let report = run_cycle(&cfg, &mut connections, &CancellationToken::new()).await;

    assert_eq!(report.stats.entities_failed, 1);
    assert_eq!(report.matches.len(), 1);
}

#[tokio::test]
async fn platforms_are_polled_in_order_with_separate_seen_sets() {
    // Same numeric ids on both platforms must not dedupe against each other.
    let vk = Arc::new(MockFetcher::vk().on_group("g", 1, "G").on_items("g", vec![item(1, "sale")]));
    let tg = Arc::new(
        MockFetcher::telegram()
            .on_channel("c", 1, "C")
            .on_items("c", vec![item(1, "sale")]),
    );
    let connector = MockConnector::new().with_fetcher(vk).with_fetcher(tg);
    let cfg = config(&["sale"], &["g"], &["c"], &[]);
    let mut connections = connector.connect(&cfg).await;

    let report = run_cycle(&cfg, &mut connections, &CancellationToken::new()).await;

    let sources: Vec<_> = report.matches.iter().map(|(m, _)| m.source).collect();
    assert_eq!(sources, vec![Platform::Vk, Platform::Telegram]);
    assert_eq!(report.matches[1].0.url, "https://t.me/c/1");
}

#[tokio::test]
async fn empty_keyword_list_skips_all_source_calls() {
    let vk = Arc::new(MockFetcher::vk().on_group("g", 1, "G").on_items("g", vec![item(1, "x")]));
    let connector = MockConnector::new().with_fetcher(vk.clone());
    let cfg = config(&[], &["g"], &[], &[1]);
    let mut connections = connector.connect(&cfg).await;

    let report = run_cycle(&cfg, &mut connections, &CancellationToken::new()).await;

    assert!(report.stats.skipped);
    assert_eq!(vk.resolve_calls(), 0);
    assert_eq!(vk.fetch_calls(), 0);
}

#[tokio::test]
async fn enrichment_failure_is_visible_and_does_not_block_delivery() {
    let vk = Arc::new(
        MockFetcher::vk()
            .on_group("citynews", 1, "City News")
            .on_items("citynews", vec![item(42, "Завтра встреча в 15:00")]),
    );
    let sink = Arc::new(MockSink::new());
    let enricher = Arc::new(MockEnricher::returning(Enrichment::failed("timeout")));
    let connector = MockConnector::new()
        .with_fetcher(vk)
        .with_sink(sink.clone())
        .with_enricher(enricher.clone());
    let cfg = config(&["встреча"], &["citynews"], &[], &[111, 222]);
    let mut connections = connector.connect(&cfg).await;

    let report = run_cycle(&cfg, &mut connections, &CancellationToken::new()).await;

    assert_eq!(enricher.calls(), 1);
    assert_eq!(report.stats.enrichments_failed, 1);
    assert_eq!(report.stats.notifications_delivered, 2);
    let message = &sink.delivered_to(222)[0];
    assert!(message.contains("Enrichment failed: timeout"));
    assert!(message.contains("Завтра встреча в 15:00"));
    assert!(message.contains("встреча"));
}

#[tokio::test]
async fn enrichment_sees_the_whole_item_not_the_truncated_match() {
    let long = format!("встреча {}", "текст ".repeat(250));
    let vk = Arc::new(
        MockFetcher::vk()
            .on_group("citynews", 1, "City News")
            .on_items("citynews", vec![item(42, &long)]),
    );
    let enricher = Arc::new(MockEnricher::returning(Enrichment::Analysis {
        text: "summary".into(),
        model: "m".into(),
    }));
    let connector = MockConnector::new().with_fetcher(vk).with_enricher(enricher.clone());
    let cfg = config(&["встреча"], &["citynews"], &[], &[]);
    let mut connections = connector.connect(&cfg).await;

    let report = run_cycle(&cfg, &mut connections, &CancellationToken::new()).await;

    assert_eq!(enricher.texts(), vec![long.clone()]);
    let (m, _) = &report.matches[0];
    assert!(m.text.chars().count() < long.chars().count());
    assert!(m.text.ends_with("..."));
}

#[tokio::test]
async fn one_bad_recipient_is_counted_separately() {
    let vk = Arc::new(MockFetcher::vk().on_group("g", 1, "G").on_items("g", vec![item(1, "sale")]));
    let sink = Arc::new(MockSink::new().failing_for(111));
    let connector = MockConnector::new().with_fetcher(vk).with_sink(sink.clone());
    let cfg = config(&["sale"], &["g"], &[], &[111, 222]);
    let mut connections = connector.connect(&cfg).await;

    let report = run_cycle(&cfg, &mut connections, &CancellationToken::new()).await;

    assert_eq!(report.stats.notifications_delivered, 1);
    assert_eq!(report.stats.notifications_failed, 1);
    assert_eq!(sink.attempted(), vec![111, 222]);
}

#[tokio::test]
async fn max_items_limits_each_fetch() {
    let items = (1..=30).rev().map(|id| item(id, "sale")).collect();
    let vk = Arc::new(MockFetcher::vk().on_group("g", 1, "G").on_items("g", items));
    let connector = MockConnector::new().with_fetcher(vk);
    let mut cfg = config(&["sale"], &["g"], &[], &[]);
    cfg.monitoring.max_posts_per_check = 5;
    let mut connections = connector.connect(&cfg).await;

    let report = run_cycle(&cfg, &mut connections, &CancellationToken::new()).await;

    assert_eq!(report.stats.items_seen, 5);
    assert_eq!(report.matches.first().map(|(m, _)| m.item_id), Some(30));
}
