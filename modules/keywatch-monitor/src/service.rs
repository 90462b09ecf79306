use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use keywatch_common::{ConfigStore, Match, MonitorConfig, Platform};

use crate::connector::{Connections, PlatformConnector};
use crate::enrichment::Enrichment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
        }
    }
}

/// Counters from one monitoring cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    /// No keywords configured, nothing was polled.
    pub skipped: bool,
    pub entities_polled: u32,
    pub entities_failed: u32,
    pub items_seen: u32,
    pub matches: u32,
    pub notifications_delivered: u32,
    pub notifications_failed: u32,
    pub enrichments_failed: u32,
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped {
            return write!(f, "skipped (no keywords)");
        }
        write!(
            f,
            "entities_polled={} entities_failed={} new_items={} matches={} delivered={} delivery_failures={} enrichment_failures={}",
            self.entities_polled,
            self.entities_failed,
            self.items_seen,
            self.matches,
            self.notifications_delivered,
            self.notifications_failed,
            self.enrichments_failed,
        )
    }
}

/// Result of [`run_cycle`]: the counters plus the matches it found.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub stats: CycleStats,
    pub matches: Vec<(Match, Option<Enrichment>)>,
}

/// Snapshot for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub state: MonitorState,
    pub running: bool,
    pub cycles_completed: u64,
    pub last_cycle: Option<CycleStats>,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

/// One pass over every configured platform: poll, enrich, notify.
///
/// Sequential throughout. An empty keyword list skips the cycle without
/// touching any source.
pub async fn run_cycle(
    config: &MonitorConfig,
    connections: &mut Connections,
    cancel: &CancellationToken,
) -> CycleReport {
    let mut report = CycleReport::default();

    if config.keywords.is_empty() {
        info!("No keywords configured, skipping cycle");
        report.stats.skipped = true;
        return report;
    }

    let max_items = config.monitoring.max_posts_per_check;
    let mut matches = Vec::new();
    for poller in connections.pollers.iter_mut() {
        if cancel.is_cancelled() {
            break;
        }
        let references = match poller.platform() {
            Platform::Vk => &config.vk.groups,
            Platform::Telegram => &config.telegram.channels,
        };
        if references.is_empty() {
            continue;
        }
        let outcome = poller
            .poll_all(references, &config.keywords, max_items, cancel)
            .await;
        report.stats.entities_polled += outcome.entities_polled;
        report.stats.entities_failed += outcome.entities_failed;
        report.stats.items_seen += outcome.items_seen;
        matches.extend(outcome.matches);
    }
    report.stats.matches = matches.len() as u32;

    if !matches.is_empty() {
        if connections.notifier.is_none() {
            warn!(matches = matches.len(), "No notifier configured, matches will not be delivered");
        } else if config.recipients.is_empty() {
            warn!(matches = matches.len(), "No recipients configured, matches will not be delivered");
        }
    }

    for m in matches {
        let enrichment = match connections.enricher {
            Some(ref enricher) => Some(enricher.analyze(&m.full_text).await),
            None => None,
        };
        if matches!(enrichment, Some(Enrichment::Failed { .. })) {
            report.stats.enrichments_failed += 1;
        }

        if let Some(ref notifier) = connections.notifier {
            let delivery = notifier
                .notify_all(&config.recipients, &m, enrichment.as_ref(), cancel)
                .await;
            report.stats.notifications_delivered += delivery.delivered.len() as u32;
            report.stats.notifications_failed += delivery.failed.len() as u32;
        }

        report.matches.push((m, enrichment));
    }

    report
}

#[derive(Debug, Default)]
struct LastCycle {
    stats: Option<CycleStats>,
    finished_at: Option<DateTime<Utc>>,
    count: u64,
}

struct Shared {
    state: Mutex<MonitorState>,
    last_cycle: Mutex<LastCycle>,
}

impl Shared {
    fn state(&self) -> MonitorState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: MonitorState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Move `from` → `to`; false if the current state is something else.
    fn transition(&self, from: MonitorState, to: MonitorState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            return false;
        }
        *state = to;
        true
    }

    fn record(&self, stats: CycleStats) {
        let mut last = self.last_cycle.lock().unwrap_or_else(PoisonError::into_inner);
        last.stats = Some(stats);
        last.finished_at = Some(Utc::now());
        last.count += 1;
    }
}

/// Long-running monitoring loop with start/stop control.
pub struct MonitorService {
    store: Arc<ConfigStore>,
    connector: Arc<dyn PlatformConnector>,
    shared: Arc<Shared>,
    cancel: Mutex<CancellationToken>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MonitorService {
    pub fn new(store: Arc<ConfigStore>, connector: Arc<dyn PlatformConnector>) -> Self {
        Self {
            store,
            connector,
            shared: Arc::new(Shared {
                state: Mutex::new(MonitorState::Stopped),
                last_cycle: Mutex::new(LastCycle::default()),
            }),
            cancel: Mutex::new(CancellationToken::new()),
            task: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn state(&self) -> MonitorState {
        self.shared.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == MonitorState::Running
    }

    pub fn status(&self) -> MonitorStatus {
        let state = self.state();
        let last = self.shared.last_cycle.lock().unwrap_or_else(PoisonError::into_inner);
        MonitorStatus {
            state,
            running: state == MonitorState::Running,
            cycles_completed: last.count,
            last_cycle: last.stats.clone(),
            last_cycle_at: last.finished_at,
        }
    }

    /// Spawn the monitoring loop. Returns false (and does nothing) unless the
    /// service is stopped. Must be called within a Tokio runtime.
    pub fn start(&self) -> bool {
        if !self.shared.transition(MonitorState::Stopped, MonitorState::Starting) {
            info!(state = %self.state(), "Monitor already active, start ignored");
            return false;
        }

        let cancel = CancellationToken::new();
        *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = cancel.clone();

        let worker = tokio::spawn(run_loop(
            self.store.clone(),
            self.connector.clone(),
            self.shared.clone(),
            cancel,
        ));

        let shared = self.shared.clone();
        let supervisor = tokio::spawn(async move {
            match worker.await {
                Ok(()) => {}
                Err(e) if e.is_panic() => error!(error = %e, "Monitor loop crashed"),
                Err(e) => error!(error = %e, "Monitor loop aborted"),
            }
            shared.set_state(MonitorState::Stopped);
            info!("Monitor stopped");
        });

        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(supervisor);
        true
    }

    /// Request a stop. The in-flight cycle finishes its current network call;
    /// use [`join`](Self::join) to wait for it. Returns false if not active.
    pub fn stop(&self) -> bool {
        let requested = self.shared.transition(MonitorState::Running, MonitorState::Stopping)
            || self.shared.transition(MonitorState::Starting, MonitorState::Stopping);
        if requested {
            info!("Stopping monitor");
            self.cancel
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .cancel();
        }
        requested
    }

    /// Wait for the background task, if any, to finish.
    pub async fn join(&self) {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(error = %e, "Monitor supervisor task failed");
                self.shared.set_state(MonitorState::Stopped);
            }
        }
    }

    /// `stop` followed by `join`.
    pub async fn shutdown(&self) {
        self.stop();
        self.join().await;
    }
}

async fn run_loop(
    store: Arc<ConfigStore>,
    connector: Arc<dyn PlatformConnector>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
) {
    let mut connections = connector.connect(&store.snapshot()).await;

    if !shared.transition(MonitorState::Starting, MonitorState::Running) {
        return;
    }
    info!(
        platforms = connections.pollers.len(),
        notifier = connections.notifier.is_some(),
        enrichment = connections.enricher.is_some(),
        "Monitor running"
    );

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if let Err(e) = store.reload() {
            warn!(error = %e, "Could not re-read config file, using last known config");
        }
        let config = store.snapshot();

        let report = run_cycle(&config, &mut connections, &cancel).await;
        info!("Cycle complete: {}", report.stats);
        shared.record(report.stats);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.monitoring.interval()) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_display_is_one_line() {
        let stats = CycleStats {
            entities_polled: 3,
            matches: 1,
            notifications_delivered: 2,
            ..CycleStats::default()
        };
        let line = stats.to_string();
        assert!(line.contains("entities_polled=3"));
        assert!(line.contains("matches=1"));
        assert!(line.contains("delivered=2"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn skipped_cycle_says_so() {
        let stats = CycleStats {
            skipped: true,
            ..CycleStats::default()
        };
        assert_eq!(stats.to_string(), "skipped (no keywords)");
    }

    #[test]
    fn state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MonitorState::Running).unwrap(), "\"running\"");
    }
}
