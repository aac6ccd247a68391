//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a default, so a partial (or empty) file is valid.
//! The provider chains are configured here rather than hard-wired.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Env var naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "WEATHER_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub storage: StorageConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the geocoding API (`/v1/search` is appended).
    pub geocoding_url: String,
    /// Base URL of the forecast API (`/v1/forecast` is appended).
    pub forecast_url: String,
    /// Per-call budget; expiry is reported as a gateway timeout.
    pub timeout_secs: u64,
    pub forecast_days: u32,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com".to_string(),
            forecast_url: "https://api.open-meteo.com".to_string(),
            timeout_secs: 5,
            forecast_days: 10,
            user_agent: "weather-api/0.1.0".to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://weather_overrides.db".to_string(),
        }
    }
}

/// A weather source that can appear in a provider chain.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Operator-pinned forecasts from the override store.
    Override,
    /// Live Open-Meteo geocoding + forecast.
    OpenMeteo,
}

/// Source order for each chain. Earlier entries win.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub current: Vec<SourceKind>,
    pub forecast: Vec<SourceKind>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            current: vec![SourceKind::OpenMeteo],
            forecast: vec![SourceKind::Override, SourceKind::OpenMeteo],
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$WEATHER_CONFIG` or `config.toml`, falling back to
    /// defaults when the default file is absent.
    pub fn load_default() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load(&path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.upstream.timeout_secs == 0 {
            bail!("upstream.timeout_secs must be greater than zero");
        }
        if self.upstream.timeout_secs > 300 {
            bail!("upstream.timeout_secs cannot exceed 300 seconds");
        }
        if self.upstream.forecast_days == 0 || self.upstream.forecast_days > 16 {
            bail!("upstream.forecast_days must be between 1 and 16");
        }
        for (name, url) in [
            ("upstream.geocoding_url", &self.upstream.geocoding_url),
            ("upstream.forecast_url", &self.upstream.forecast_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("{name} must be an HTTP or HTTPS URL, got '{url}'");
            }
        }
        if self.providers.current.is_empty() {
            bail!("providers.current must list at least one source");
        }
        if self.providers.forecast.is_empty() {
            bail!("providers.forecast must list at least one source");
        }
        if self.providers.current.contains(&SourceKind::Override) {
            bail!("providers.current cannot use the override source: overrides hold forecasts only");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
