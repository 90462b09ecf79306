use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

/// Process configuration loaded from environment variables.
///
/// The monitoring document itself (keywords, sources, recipients, credentials)
/// lives in the JSON file at `config_path`; see [`crate::ConfigStore`].
#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,

    // Admin API
    pub api_host: String,
    pub api_port: u16,
    pub admin_username: String,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .context("API_PORT must be a number")?;

        Ok(Self {
            config_path: env::var("KEYWATCH_CONFIG")
                .unwrap_or_else(|_| "config.json".to_string())
                .into(),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port,
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
        })
    }

    /// The admin API refuses to start without a password.
    pub fn require_admin_password(&self) -> Result<&str> {
        self.admin_password
            .as_deref()
            .context("ADMIN_PASSWORD environment variable is required to serve the admin API")
    }

    pub fn log_redacted(&self) {
        info!(
            config_path = %self.config_path.display(),
            api_host = %self.api_host,
            api_port = self.api_port,
            admin_username = %self.admin_username,
            admin_password = if self.admin_password.is_some() { "[set]" } else { "[unset]" },
            "Loaded configuration"
        );
    }
}
