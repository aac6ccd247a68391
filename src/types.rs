//! Shared types for the weather API.
//!
//! These types form the data model used across all modules: the upstream
//! client, the override store, the provider chain and the HTTP layer all
//! speak in terms of them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Fallback timezone sent upstream when geocoding returns none.
pub const AUTO_TIMEZONE: &str = "auto";

/// Coordinates resolved for a city name. Lives for one request only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone name, or `"auto"` when the geocoder omitted it.
    pub timezone: String,
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.4}, {:.4}) tz={}",
            self.latitude, self.longitude, self.timezone
        )
    }
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Current conditions for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    /// Wall-clock time at the city, `HH:MM`.
    pub local_time: String,
}

/// Daily min/max temperature for a city on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastWeather {
    pub min_temperature: f64,
    pub max_temperature: f64,
}

impl fmt::Display for ForecastWeather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}..{:.1}°C",
            self.min_temperature, self.max_temperature
        )
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// An operator-pinned forecast, unique per (city, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub city: String,
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub min_temperature: f64,
    pub max_temperature: f64,
}

impl OverrideRecord {
    pub fn forecast(&self) -> ForecastWeather {
        ForecastWeather {
            min_temperature: self.min_temperature,
            max_temperature: self.max_temperature,
        }
    }

    /// Helper to build a test record with sensible defaults.
    #[cfg(test)]
    pub fn sample(city: &str, date: NaiveDate) -> Self {
        OverrideRecord {
            city: city.to_string(),
            date,
            min_temperature: 10.0,
            max_temperature: 20.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Classified outcome of a failed weather lookup.
///
/// Every variant maps onto exactly one HTTP status; see [`WeatherError::status_code`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeatherError {
    /// City unresolvable, date outside the forecast window, or no override.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Weather service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Weather service timed out: {0}")]
    GatewayTimeout(String),

    /// Malformed upstream payload or any other transport failure.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Override storage error: {0}")]
    Storage(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl WeatherError {
    /// HTTP status this outcome is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            WeatherError::NotFound(_) => 404,
            WeatherError::ServiceUnavailable(_) => 503,
            WeatherError::GatewayTimeout(_) => 504,
            WeatherError::Upstream(_) | WeatherError::Storage(_) | WeatherError::Unknown(_) => 500,
        }
    }

    /// Client-facing message. Internal details stay in the logs.
    pub fn detail(&self) -> String {
        match self {
            WeatherError::NotFound(msg) => msg.clone(),
            WeatherError::ServiceUnavailable(_) => {
                "Unable to connect to the weather service.".to_string()
            }
            WeatherError::GatewayTimeout(_) => {
                "The weather service did not respond in time.".to_string()
            }
            WeatherError::Upstream(_) => {
                "The weather service returned an unexpected response.".to_string()
            }
            WeatherError::Storage(_) => "Forecast override storage failed.".to_string(),
            WeatherError::Unknown(_) => "Unexpected error.".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
