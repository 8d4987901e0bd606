//! Scrape target configuration.
//!
//! All knobs are explicit values passed into the engine's constructor;
//! there is no process-global state read at client-construction time.

use crate::metrics::MetricsServerConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration for the status page scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// URI of the machine-readable status page.
    pub scrape_uri: String,
    /// Optional override for the HTTP `Host` header.
    pub host_override: Option<String>,
    /// Skip TLS certificate verification when scraping over https.
    pub insecure: bool,
    /// Static extra request headers sent with every scrape.
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            scrape_uri: "http://localhost/server-status/?auto".to_string(),
            host_override: None,
            insecure: false,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl ScrapeConfig {
    /// Creates a configuration for the given status page URI.
    pub fn with_uri(scrape_uri: impl Into<String>) -> Self {
        Self {
            scrape_uri: scrape_uri.into(),
            ..Self::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scrape_uri.starts_with("http://") && !self.scrape_uri.starts_with("https://") {
            return Err(ConfigError::InvalidUri(self.scrape_uri.clone()));
        }
        if self.extra_headers.keys().any(|name| name.is_empty()) {
            return Err(ConfigError::InvalidHeader(String::new()));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("scrape URI {0:?} is not an http or https URI")]
    InvalidUri(String),
    #[error("invalid extra header {0:?}, expected NAME=VALUE")]
    InvalidHeader(String),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// The `[scrape]` section.
    #[serde(default)]
    pub scrape: ScrapeConfig,
    /// The `[telemetry]` section.
    #[serde(default)]
    pub telemetry: MetricsServerConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.scrape.validate()?;
        Ok(config)
    }
}
