//! Configuration management
//!
//! Settings live in `settings.json` in the statement directory:
//! ```json
//! {
//!   "apiBaseUrl": "https://localhost:7293/api/",
//!   "analyticsUrl": "https://localhost:7293/api/VisitorEvent/log",
//!   "pageSize": 10,
//!   "balanceMode": "client",
//!   "language": "en",
//!   "requestTimeoutSecs": 30
//! }
//! ```
//! Every field is optional. Environment variables override the file.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::adapters::analytics::VISITOR_EVENT_PATH;
use crate::adapters::http::{DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::services::balance::BalanceMode;
use crate::services::disclosure::DEFAULT_PAGE_SIZE;
use crate::services::view::TextDirection;

pub const ENV_API_URL: &str = "STATEMENT_API_URL";
pub const ENV_ANALYTICS_URL: &str = "STATEMENT_ANALYTICS_URL";
pub const ENV_PAGE_SIZE: &str = "STATEMENT_PAGE_SIZE";
pub const ENV_BALANCE_MODE: &str = "STATEMENT_BALANCE_MODE";
pub const ENV_LANGUAGE: &str = "STATEMENT_LANGUAGE";

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    analytics_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    balance_mode: Option<BalanceMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Statement viewer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    /// Explicit visitor-event URL; derived from the API root when unset
    pub analytics_url: Option<String>,
    pub page_size: usize,
    pub balance_mode: BalanceMode,
    pub language: String,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            analytics_url: None,
            page_size: DEFAULT_PAGE_SIZE,
            balance_mode: BalanceMode::default(),
            language: "en".to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load config from the statement directory, then apply environment overrides
    pub fn load(statement_dir: &Path) -> Result<Self> {
        Self::load_with_env(statement_dir, |name| std::env::var(name).ok())
    }

    /// Load config with a custom environment lookup
    pub fn load_with_env<F>(statement_dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = read_settings(statement_dir)?;
        let defaults = Self::default();

        let mut config = Self {
            api_base_url: raw.api_base_url.unwrap_or(defaults.api_base_url),
            analytics_url: raw.analytics_url,
            page_size: raw.page_size.unwrap_or(defaults.page_size),
            balance_mode: raw.balance_mode.unwrap_or(defaults.balance_mode),
            language: raw.language.unwrap_or(defaults.language),
            request_timeout_secs: raw.request_timeout_secs.unwrap_or(defaults.request_timeout_secs),
        };

        if let Some(url) = env(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url;
        }
        if let Some(url) = env(ENV_ANALYTICS_URL).filter(|v| !v.trim().is_empty()) {
            config.analytics_url = Some(url);
        }
        if let Some(value) = env(ENV_PAGE_SIZE) {
            match value.trim().parse::<usize>() {
                Ok(size) => config.page_size = size,
                Err(_) => warn!(value = %value, "Ignoring invalid {}", ENV_PAGE_SIZE),
            }
        }
        if let Some(value) = env(ENV_BALANCE_MODE) {
            match value.parse::<BalanceMode>() {
                Ok(mode) => config.balance_mode = mode,
                Err(_) => warn!(value = %value, "Ignoring invalid {}", ENV_BALANCE_MODE),
            }
        }
        if let Some(language) = env(ENV_LANGUAGE).filter(|v| !v.trim().is_empty()) {
            config.language = language;
        }

        if config.page_size == 0 {
            config.page_size = DEFAULT_PAGE_SIZE;
        }
        Ok(config)
    }

    /// Save config to the statement directory
    /// Preserves other settings this tool doesn't manage
    pub fn save(&self, statement_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(statement_dir)
            .with_context(|| format!("Failed to create {}", statement_dir.display()))?;

        let mut settings = read_settings(statement_dir)?;
        settings.api_base_url = Some(self.api_base_url.clone());
        settings.analytics_url = self.analytics_url.clone();
        settings.page_size = Some(self.page_size);
        settings.balance_mode = Some(self.balance_mode);
        settings.language = Some(self.language.clone());
        settings.request_timeout_secs = Some(self.request_timeout_secs);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(statement_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    /// Visitor-event endpoint, explicit or under the API root
    pub fn analytics_endpoint(&self) -> String {
        match &self.analytics_url {
            Some(url) => url.clone(),
            None => {
                let base = self.api_base_url.trim_end_matches('/');
                format!("{}/{}", base, VISITOR_EVENT_PATH)
            }
        }
    }

    pub fn direction(&self) -> TextDirection {
        TextDirection::for_language(&self.language)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Read settings.json; a missing or unparseable file means defaults
fn read_settings(statement_dir: &Path) -> Result<SettingsFile> {
    let settings_path = statement_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }

    let content = std::fs::read_to_string(&settings_path)
        .with_context(|| format!("Failed to read {}", settings_path.display()))?;
    Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(error = %e, "Unreadable settings.json, using defaults");
        SettingsFile::default()
    }))
}
