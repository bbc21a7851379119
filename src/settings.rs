use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::source::{MAX_PAGE_SIZE, RetryPolicy};

pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub slack: SlackSettings,
    #[serde(default)]
    pub history: HistorySettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackSettings {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    #[serde(default = "default_page_size", rename = "page-size")]
    pub page_size: u32,
    #[serde(default, rename = "max-retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms", rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

fn default_page_size() -> u32 {
    u32::from(MAX_PAGE_SIZE)
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl HistorySettings {
    /// Page size as sent to `conversations.history`, which accepts 1 to 1000.
    pub fn page_size(&self) -> Result<u16> {
        u16::try_from(self.page_size)
            .ok()
            .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
            .ok_or(AppError::InvalidPageSize(self.page_size))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AppError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| AppError::TomlParse(e.to_string()))
    }

    /// The configured token, if any.
    pub fn token(&self) -> Option<&str> {
        let token = self.slack.token.trim();
        (!token.is_empty()).then_some(token)
    }
}
