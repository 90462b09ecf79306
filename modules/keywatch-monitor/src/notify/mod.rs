mod format;
mod telegram;

pub use format::{escape_html, format_message};

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use keywatch_common::Match;

use crate::enrichment::Enrichment;
use crate::traits::MessageSink;

const SEND_DELAY: Duration = Duration::from_millis(100);

/// Per-recipient result of one fan-out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryReport {
    pub delivered: Vec<i64>,
    pub failed: Vec<(i64, String)>,
}

impl DeliveryReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sends each Match to every recipient, independently.
pub struct Notifier {
    sink: Arc<dyn MessageSink>,
    send_delay: Duration,
}

impl Notifier {
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self {
            sink,
            send_delay: SEND_DELAY,
        }
    }

    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    /// One failing recipient never stops delivery to the rest. After
    /// cancellation the pacing delay is skipped but delivery continues, since
    /// the match is already marked seen and would otherwise be lost.
    pub async fn notify_all(
        &self,
        recipients: &[i64],
        m: &Match,
        enrichment: Option<&Enrichment>,
        cancel: &CancellationToken,
    ) -> DeliveryReport {
        let message = format_message(m, enrichment);
        let mut report = DeliveryReport::default();

        for (i, &recipient) in recipients.iter().enumerate() {
            if i > 0 && !cancel.is_cancelled() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.send_delay) => {}
                }
            }

            match self.sink.deliver(recipient, &message).await {
                Ok(()) => report.delivered.push(recipient),
                Err(e) => {
                    warn!(recipient, item_id = m.item_id, error = %e, "Failed to deliver notification");
                    report.failed.push((recipient, e.to_string()));
                }
            }
        }

        info!(
            item_id = m.item_id,
            entity = %m.entity_name,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Notification sent"
        );
        report
    }
}
