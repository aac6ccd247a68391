//! Ordered weather source chains.
//!
//! A chain asks each source in turn and returns the first success. When
//! every source fails, the last failure is returned as-is, so a single
//! source chain surfaces exactly what that source reported. A storage
//! failure ends the chain immediately.

use chrono::NaiveDate;
use std::future::Future;
use tracing::{debug, warn};

use crate::config::{ProvidersConfig, SourceKind};
use crate::storage::OverrideStore;
use crate::types::{CurrentWeather, ForecastWeather, WeatherError};
use crate::upstream::OpenMeteoClient;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// One place weather can come from.
#[derive(Clone)]
pub enum WeatherSource {
    /// Operator-pinned forecasts. Has no current conditions.
    Override(OverrideStore),
    OpenMeteo(OpenMeteoClient),
}

impl WeatherSource {
    pub fn name(&self) -> &'static str {
        match self {
            WeatherSource::Override(_) => "override",
            WeatherSource::OpenMeteo(_) => "open_meteo",
        }
    }

    pub async fn current_weather(&self, city: &str) -> Result<CurrentWeather, WeatherError> {
        match self {
            WeatherSource::Override(_) => Err(WeatherError::NotFound(
                "Overrides hold no current conditions".to_string(),
            )),
            WeatherSource::OpenMeteo(client) => client.current_weather(city).await,
        }
    }

    /// An absent override answers `NotFound` so the chain moves on.
    pub async fn forecast(&self, city: &str, date: NaiveDate) -> Result<ForecastWeather, WeatherError> {
        match self {
            WeatherSource::Override(store) => store
                .get(city, date)
                .await?
                .ok_or_else(|| WeatherError::NotFound("No override for this city and date".to_string())),
            WeatherSource::OpenMeteo(client) => client.forecast(city, date).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ProviderChain {
    current: Vec<WeatherSource>,
    forecast: Vec<WeatherSource>,
}

impl ProviderChain {
    pub fn new(current: Vec<WeatherSource>, forecast: Vec<WeatherSource>) -> Self {
        Self { current, forecast }
    }

    /// Wire sources in the order `cfg` lists them.
    pub fn from_config(cfg: &ProvidersConfig, store: &OverrideStore, upstream: &OpenMeteoClient) -> Self {
        let build = |kinds: &[SourceKind]| -> Vec<WeatherSource> {
            kinds
                .iter()
                .map(|kind| match kind {
                    SourceKind::Override => WeatherSource::Override(store.clone()),
                    SourceKind::OpenMeteo => WeatherSource::OpenMeteo(upstream.clone()),
                })
                .collect()
        };
        Self::new(build(&cfg.current), build(&cfg.forecast))
    }

    pub async fn current_weather(&self, city: &str) -> Result<CurrentWeather, WeatherError> {
        first_success(&self.current, |source| source.current_weather(city)).await
    }

    pub async fn forecast(&self, city: &str, date: NaiveDate) -> Result<ForecastWeather, WeatherError> {
        first_success(&self.forecast, |source| source.forecast(city, date)).await
    }
}

async fn first_success<'a, T, F, Fut>(sources: &'a [WeatherSource], mut attempt: F) -> Result<T, WeatherError>
where
    F: FnMut(&'a WeatherSource) -> Fut,
    Fut: Future<Output = Result<T, WeatherError>>,
{
    let mut last = WeatherError::Unknown("No weather sources configured".to_string());
    for source in sources {
        match attempt(source).await {
            Ok(value) => {
                debug!(source = source.name(), "Weather source answered");
                return Ok(value);
            }
            // A broken override store must not be masked by upstream data.
            Err(err @ WeatherError::Storage(_)) => return Err(err),
            Err(err @ WeatherError::NotFound(_)) => {
                debug!(source = source.name(), error = %err, "Weather source has no answer, trying next");
                last = err;
            }
            Err(err) => {
                warn!(source = source.name(), error = %err, "Weather source failed, trying next");
                last = err;
            }
        }
    }
    Err(last)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
