pub mod connector;
pub mod enrichment;
pub mod fetchers;
pub mod matcher;
pub mod notify;
pub mod poller;
pub mod seen;
pub mod service;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use connector::{Connections, LiveConnector, PlatformConnector};
pub use enrichment::{Enricher, Enrichment, OpenRouterEnricher};
pub use matcher::match_keywords;
pub use notify::{DeliveryReport, Notifier};
pub use poller::{PollOutcome, SourcePoller};
pub use seen::SeenStore;
pub use service::{run_cycle, CycleReport, CycleStats, MonitorService, MonitorState, MonitorStatus};
pub use traits::{MessageSink, SourceFetcher};
