//! Configuration file handling for lwgated

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Daemon configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub notifications: NotificationConfig,
    pub coap: CoapConfig,
    pub mock: MockConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    /// Time allowed for a callback probe or push to answer
    pub callback_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8888,
            callback_timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Deliver the journal to the subscribed callback
    pub push: bool,
    pub push_interval_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            push: true,
            push_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoapConfig {
    /// Credential database; persistence is off when unset
    pub database_file: Option<PathBuf>,
}

/// Demo protocol engine setup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    pub auto_complete: bool,
    pub clients: Vec<MockClientConfig>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            auto_complete: true,
            clients: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockClientConfig {
    pub name: String,
    /// Initial resource values keyed by resource path
    #[serde(default)]
    pub resources: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from `path`, or defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.http.callback_timeout_secs)
    }

    pub fn push_interval(&self) -> Duration {
        Duration::from_millis(self.notifications.push_interval_ms.max(1))
    }
}
