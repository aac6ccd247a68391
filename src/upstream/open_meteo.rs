//! Open-Meteo forecast client.
//!
//! Resolves the city through [`GeoResolver`], then queries the forecast
//! endpoint for either current conditions or a daily min/max series.
//!
//! API: `https://api.open-meteo.com/v1/forecast`
//! Auth: None required.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tracing::{debug, info};

use super::{build_http_client, get_json, join_url, GeoResolver};
use crate::config::UpstreamConfig;
use crate::types::{CurrentWeather, ForecastWeather, GeoLocation, WeatherError};

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    utc_offset_seconds: Option<i64>,
    #[serde(default)]
    current_weather: Option<OpenMeteoCurrent>,
    #[serde(default)]
    daily: Option<OpenMeteoDaily>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    #[serde(default)]
    temperature: Option<f64>,
}

/// Parallel arrays indexed by day. Open-Meteo emits `null` for missing
/// model output, hence the inner `Option`.
#[derive(Debug, Deserialize)]
struct OpenMeteoDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct OpenMeteoClient {
    http: Client,
    geo: GeoResolver,
    base_url: String,
    forecast_days: u32,
}

impl OpenMeteoClient {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self> {
        Self::with_timeout(cfg, cfg.timeout())
    }

    /// Build with an explicit per-call timeout instead of `cfg.timeout_secs`.
    pub fn with_timeout(cfg: &UpstreamConfig, timeout: StdDuration) -> Result<Self> {
        let http = build_http_client(timeout, &cfg.user_agent)?;
        Ok(Self {
            geo: GeoResolver::new(http.clone(), cfg.geocoding_url.clone()),
            http,
            base_url: cfg.forecast_url.clone(),
            forecast_days: cfg.forecast_days,
        })
    }

    /// Current temperature and local wall-clock time for `city`.
    pub async fn current_weather(&self, city: &str) -> Result<CurrentWeather, WeatherError> {
        let loc = self.geo.resolve(city).await?;

        let url = format!(
            "{}&current_weather=true",
            self.forecast_url(&loc)
        );
        let data: OpenMeteoResponse = get_json(&self.http, &url, "Current weather").await?;

        let temperature = data
            .current_weather
            .and_then(|c| c.temperature)
            .ok_or_else(|| {
                WeatherError::Upstream("Current weather response has no temperature".to_string())
            })?;
        let local_time = local_time_from_offset(Utc::now(), data.utc_offset_seconds.unwrap_or(0));

        info!(city, temperature, %local_time, "Current weather fetched");
        Ok(CurrentWeather {
            temperature,
            local_time,
        })
    }

    /// Daily min/max for `city` on `date`, if `date` is in the returned window.
    pub async fn forecast(&self, city: &str, date: NaiveDate) -> Result<ForecastWeather, WeatherError> {
        let loc = self.geo.resolve(city).await?;

        let url = format!(
            "{}&daily=temperature_2m_min,temperature_2m_max&forecast_days={}",
            self.forecast_url(&loc),
            self.forecast_days
        );
        let data: OpenMeteoResponse = get_json(&self.http, &url, "Forecast").await?;

        let forecast = pick_daily(data.daily.as_ref(), date)?;
        info!(city, %date, %forecast, "Forecast fetched");
        Ok(forecast)
    }

    fn forecast_url(&self, loc: &GeoLocation) -> String {
        format!(
            "{}?latitude={}&longitude={}&timezone={}",
            join_url(&self.base_url, "/v1/forecast"),
            loc.latitude,
            loc.longitude,
            urlencoding::encode(&loc.timezone)
        )
    }
}

/// Find `date` in the daily series and return its paired min/max.
fn pick_daily(daily: Option<&OpenMeteoDaily>, date: NaiveDate) -> Result<ForecastWeather, WeatherError> {
    let daily = daily
        .filter(|d| {
            !d.time.is_empty() && !d.temperature_2m_min.is_empty() && !d.temperature_2m_max.is_empty()
        })
        .ok_or_else(|| WeatherError::Upstream("Forecast response has no daily series".to_string()))?;

    let wanted = date.format("%Y-%m-%d").to_string();
    let Some(idx) = daily.time.iter().position(|d| *d == wanted) else {
        debug!(%date, days = daily.time.len(), "Date not in forecast window");
        return Err(WeatherError::NotFound(
            "No forecast available for this date".to_string(),
        ));
    };

    match (
        daily.temperature_2m_min.get(idx).copied().flatten(),
        daily.temperature_2m_max.get(idx).copied().flatten(),
    ) {
        (Some(min_temperature), Some(max_temperature)) => Ok(ForecastWeather {
            min_temperature,
            max_temperature,
        }),
        _ => Err(WeatherError::Upstream(format!(
            "Forecast for {wanted} has no min/max temperature"
        ))),
    }
}

/// Wall-clock `HH:MM` at a place `offset_secs` east of UTC.
///
/// Offsets apply to UTC now; the server's own timezone never enters.
pub fn local_time_from_offset(now: DateTime<Utc>, offset_secs: i64) -> String {
    (now + Duration::seconds(offset_secs))
        .format("%H:%M")
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
