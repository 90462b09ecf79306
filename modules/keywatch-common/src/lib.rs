pub mod config;
pub mod error;
pub mod settings;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{SourceError, StoreError};
pub use settings::{AiSettings, MonitorConfig, MonitoringSettings, TelegramSettings, VkSettings};
pub use store::ConfigStore;
pub use types::*;
