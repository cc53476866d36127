//! Application configuration
//!
//! Precedence, lowest first: built-in defaults, the TOML config file,
//! environment variables (a `.env` file is loaded by `main`), CLI flags.

pub mod repository;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ingest::IngestConfig;
use crate::ingest::config::{DEFAULT_SOURCE_URL, MAX_HEADER_SEARCH_ROWS};

pub const ENV_SOURCE_URL: &str = "COFFEE_PRICES_SOURCE_URL";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_ENVIRONMENT: &str = "ENVIRONMENT";
pub const ENV_ALLOWED_ORIGIN: &str = "COFFEE_PRICES_ALLOWED_ORIGIN";
pub const ENV_HTTP_TIMEOUT: &str = "COFFEE_PRICES_HTTP_TIMEOUT_SECS";

/// Deployment environment, gates the CORS origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Only the exact name `production` selects production
    pub fn from_name(name: &str) -> Self {
        if name.trim() == "production" {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_url: String,
    pub database_url: String,
    pub environment: Environment,
    /// CORS origin answered in production
    pub allowed_origin: String,
    pub http_timeout_secs: u64,
    pub header_scan_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            database_url: "sqlite://coffee-prices.db".to_string(),
            environment: Environment::Development,
            allowed_origin: "https://your-production-domain.com".to_string(),
            http_timeout_secs: 60,
            header_scan_rows: MAX_HEADER_SEARCH_ROWS,
        }
    }
}

impl Config {
    /// Load from `path` (or the default config file if it exists), then
    /// apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// `<config dir>/coffee-prices/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("coffee-prices").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Override fields from environment lookups
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = get(ENV_SOURCE_URL) {
            self.source_url = url;
        }
        if let Some(url) = get(ENV_DATABASE_URL) {
            self.database_url = url;
        }
        if let Some(name) = get(ENV_ENVIRONMENT) {
            self.environment = Environment::from_name(&name);
        }
        if let Some(origin) = get(ENV_ALLOWED_ORIGIN) {
            self.allowed_origin = origin;
        }
        if let Some(secs) = get(ENV_HTTP_TIMEOUT) {
            self.http_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds, got '{}'", ENV_HTTP_TIMEOUT, secs))?;
        }
        Ok(())
    }

    /// Pipeline settings derived from this config
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig::builder()
            .source_url(self.source_url.clone())
            .header_scan_rows(self.header_scan_rows)
            .request_timeout(Duration::from_secs(self.http_timeout_secs))
            .build()
    }
}
