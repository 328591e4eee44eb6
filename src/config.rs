//! Connection and bulk settings, read from the environment or a TOML file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::elasticsearch::RefreshPolicy;
use crate::error::{EsError, Result};
use crate::models::DEFAULT_FAILURE_STATUS_THRESHOLD;

pub const DEFAULT_URL: &str = "http://localhost:9200";

pub const ENV_URL: &str = "ELASTICSEARCH_URL";
pub const ENV_USERNAME: &str = "ELASTICSEARCH_USERNAME";
pub const ENV_PASSWORD: &str = "ELASTICSEARCH_PASSWORD";
pub const ENV_TIMEOUT_SECS: &str = "ELASTICSEARCH_TIMEOUT_SECS";
pub const ENV_INSECURE: &str = "ELASTICSEARCH_INSECURE";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub elasticsearch: EsConfig,
    #[serde(default)]
    pub bulk: BulkConfig,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EsError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| EsError::config(format!("Failed to parse config file: {}", e)))?;
        // Fail early rather than at client construction
        config.elasticsearch.parsed_url()?;
        Ok(config)
    }
}

/// Cluster connection settings
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EsConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Transport-level timeout applied to every request
    pub timeout_secs: Option<u64>,
    /// Skip TLS certificate validation
    pub insecure: bool,
}

impl Default for EsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            username: None,
            password: None,
            timeout_secs: None,
            insecure: false,
        }
    }
}

impl EsConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Read settings from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(urls) = lookup(ENV_URL) {
            let mut nodes = urls.split(',').map(str::trim).filter(|u| !u.is_empty());
            if let Some(first) = nodes.next() {
                config.url = first.to_string();
            }
            let ignored: Vec<&str> = nodes.collect();
            if !ignored.is_empty() {
                warn!(
                    "{} lists {} extra nodes; only {} is used",
                    ENV_URL,
                    ignored.len(),
                    config.url
                );
            }
        }

        config.username = lookup(ENV_USERNAME).filter(|v| !v.is_empty());
        config.password = lookup(ENV_PASSWORD).filter(|v| !v.is_empty());

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                EsError::config(format!("Invalid {} '{}': {}", ENV_TIMEOUT_SECS, secs, e))
            })?;
            config.timeout_secs = Some(secs);
        }

        if let Some(flag) = lookup(ENV_INSECURE) {
            config.insecure = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true");
        }

        config.parsed_url()?;
        Ok(config)
    }

    pub fn parsed_url(&self) -> Result<Url> {
        Url::parse(&self.url).map_err(|e| {
            EsError::config(format!("Invalid Elasticsearch URL '{}': {}", self.url, e))
        })
    }

    /// Basic auth pair, present only when a username is set.
    pub fn basic_auth(&self) -> Option<(String, String)> {
        self.username
            .as_ref()
            .map(|user| (user.clone(), self.password.clone().unwrap_or_default()))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Bulk import settings
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct BulkConfig {
    /// Item status above which a document counts as failed
    pub failure_status_threshold: u16,
    pub refresh: Option<RefreshPolicy>,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            failure_status_threshold: DEFAULT_FAILURE_STATUS_THRESHOLD,
            refresh: None,
        }
    }
}
