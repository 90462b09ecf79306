use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{error, info, warn};

use crate::error::StoreError;
use crate::settings::{AiSettings, MonitorConfig, MAX_POSTS_PER_CHECK_LIMIT, MIN_CHECK_INTERVAL_SECS};

/// JSON-file-backed holder of the monitoring document.
///
/// Every mutation is applied to a copy, written to disk, then swapped in, so a
/// failed write leaves both the file and the in-memory document untouched.
pub struct ConfigStore {
    path: Option<PathBuf>,
    current: RwLock<MonitorConfig>,
}

impl ConfigStore {
    /// Open the document at `path`. A missing file is created with defaults;
    /// an unparsable one is logged and replaced in memory by defaults (the
    /// file itself is only rewritten on the next mutation).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let config = match read_document(&path) {
            Ok(config) => config,
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Config file not found, creating defaults");
                let config = MonitorConfig::default();
                write_document(&path, &config)?;
                config
            }
            Err(StoreError::Parse(e)) => {
                error!(path = %path.display(), error = %e, "Config file is not valid JSON, using defaults");
                MonitorConfig::default()
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            path: Some(path),
            current: RwLock::new(config),
        })
    }

    /// Store with no backing file.
    pub fn in_memory(config: MonitorConfig) -> Self {
        Self {
            path: None,
            current: RwLock::new(config),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Clone of the current document.
    pub fn snapshot(&self) -> MonitorConfig {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-read the backing file, picking up edits made outside this process.
    ///
    /// The file is read under the write lock so a concurrent `update` can
    /// never be replaced by the document it superseded.
    pub fn reload(&self) -> Result<(), StoreError> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = read_document(path)?;
        Ok(())
    }

    /// Apply `f` to a copy of the document and persist it. `f` returns whether
    /// anything changed; unchanged documents are not written.
    pub fn update<F>(&self, f: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut MonitorConfig) -> Result<bool, StoreError>,
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut draft = guard.clone();
        if !f(&mut draft)? {
            return Ok(false);
        }
        if let Some(ref path) = self.path {
            write_document(path, &draft)?;
        }
        *guard = draft;
        info!("Configuration saved");
        Ok(true)
    }

    // --- Keywords ---

    pub fn keywords(&self) -> Vec<String> {
        self.snapshot().keywords
    }

    /// Returns false if the keyword is already present (case-insensitively).
    pub fn add_keyword(&self, keyword: &str) -> Result<bool, StoreError> {
        let keyword = non_blank(keyword, "keyword")?;
        self.update(|cfg| {
            let lower = keyword.to_lowercase();
            if cfg.keywords.iter().any(|k| k.to_lowercase() == lower) {
                return Ok(false);
            }
            cfg.keywords.push(keyword.to_string());
            Ok(true)
        })
    }

    pub fn remove_keyword(&self, keyword: &str) -> Result<bool, StoreError> {
        let lower = keyword.trim().to_lowercase();
        self.update(|cfg| {
            let before = cfg.keywords.len();
            cfg.keywords.retain(|k| k.to_lowercase() != lower);
            Ok(cfg.keywords.len() != before)
        })
    }

    // --- Recipients ---

    pub fn recipients(&self) -> Vec<i64> {
        self.snapshot().recipients
    }

    pub fn add_recipient(&self, chat_id: i64) -> Result<bool, StoreError> {
        self.update(|cfg| {
            if cfg.recipients.contains(&chat_id) {
                return Ok(false);
            }
            cfg.recipients.push(chat_id);
            Ok(true)
        })
    }

    pub fn remove_recipient(&self, chat_id: i64) -> Result<bool, StoreError> {
        self.update(|cfg| {
            let before = cfg.recipients.len();
            cfg.recipients.retain(|r| *r != chat_id);
            Ok(cfg.recipients.len() != before)
        })
    }

    // --- VK groups ---

    pub fn vk_groups(&self) -> Vec<String> {
        self.snapshot().vk.groups
    }

    pub fn add_vk_group(&self, group: &str) -> Result<bool, StoreError> {
        let group = non_blank(group, "VK group")?;
        self.update(|cfg| Ok(push_unique(&mut cfg.vk.groups, group)))
    }

    pub fn remove_vk_group(&self, group: &str) -> Result<bool, StoreError> {
        self.update(|cfg| Ok(remove_exact(&mut cfg.vk.groups, group.trim())))
    }

    // --- Telegram channels ---

    pub fn telegram_channels(&self) -> Vec<String> {
        self.snapshot().telegram.channels
    }

    pub fn add_telegram_channel(&self, channel: &str) -> Result<bool, StoreError> {
        let channel = non_blank(channel, "Telegram channel")?;
        self.update(|cfg| Ok(push_unique(&mut cfg.telegram.channels, channel)))
    }

    pub fn remove_telegram_channel(&self, channel: &str) -> Result<bool, StoreError> {
        self.update(|cfg| Ok(remove_exact(&mut cfg.telegram.channels, channel.trim())))
    }

    // --- Settings ---

    pub fn update_monitoring(&self, check_interval: u64, max_posts_per_check: u32) -> Result<bool, StoreError> {
        if check_interval < MIN_CHECK_INTERVAL_SECS {
            return Err(StoreError::Invalid(format!(
                "check_interval must be at least {MIN_CHECK_INTERVAL_SECS} seconds"
            )));
        }
        if !(1..=MAX_POSTS_PER_CHECK_LIMIT).contains(&max_posts_per_check) {
            return Err(StoreError::Invalid(format!(
                "max_posts_per_check must be between 1 and {MAX_POSTS_PER_CHECK_LIMIT}"
            )));
        }
        self.update(|cfg| {
            let changed = cfg.monitoring.check_interval != check_interval
                || cfg.monitoring.max_posts_per_check != max_posts_per_check;
            cfg.monitoring.check_interval = check_interval;
            cfg.monitoring.max_posts_per_check = max_posts_per_check;
            Ok(changed)
        })
    }

    /// Applied by the monitor the next time it starts.
    pub fn update_telegram_token(&self, bot_token: &str) -> Result<bool, StoreError> {
        let bot_token = non_blank(bot_token, "bot_token")?;
        self.update(|cfg| {
            let changed = cfg.telegram.bot_token != bot_token;
            cfg.telegram.bot_token = bot_token.to_string();
            Ok(changed)
        })
    }

    /// Applied by the monitor the next time it starts.
    pub fn update_vk_token(&self, access_token: &str) -> Result<bool, StoreError> {
        let access_token = non_blank(access_token, "access_token")?;
        self.update(|cfg| {
            let changed = cfg.vk.access_token != access_token;
            cfg.vk.access_token = access_token.to_string();
            Ok(changed)
        })
    }

    pub fn update_ai(&self, ai: AiSettings) -> Result<bool, StoreError> {
        if ai.max_text_length == 0 {
            return Err(StoreError::Invalid("max_text_length must be positive".into()));
        }
        self.update(|cfg| {
            let changed = cfg.ai != ai;
            cfg.ai = ai;
            Ok(changed)
        })
    }
}

fn non_blank<'a>(value: &'a str, what: &str) -> Result<&'a str, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Invalid(format!("{what} must not be empty")));
    }
    Ok(trimmed)
}

fn push_unique(list: &mut Vec<String>, value: &str) -> bool {
    if list.iter().any(|v| v == value) {
        return false;
    }
    list.push(value.to_string());
    true
}

fn remove_exact(list: &mut Vec<String>, value: &str) -> bool {
    let before = list.len();
    list.retain(|v| v != value);
    list.len() != before
}

fn read_document(path: &Path) -> Result<MonitorConfig, StoreError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_document(path: &Path, config: &MonitorConfig) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
