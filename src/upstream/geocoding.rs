//! City name → coordinates via the Open-Meteo geocoding API.
//!
//! API: `https://geocoding-api.open-meteo.com/v1/search`
//! Auth: None required.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{get_json, join_url};
use crate::types::{GeoLocation, WeatherError, AUTO_TIMEZONE};

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// `results` is omitted entirely when nothing matches.
#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    timezone: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct GeoResolver {
    http: Client,
    base_url: String,
}

impl GeoResolver {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Resolve `city` to the upstream's top-ranked match.
    pub async fn resolve(&self, city: &str) -> Result<GeoLocation, WeatherError> {
        let url = format!(
            "{}?name={}&count=1&language=en&format=json",
            join_url(&self.base_url, "/v1/search"),
            urlencoding::encode(city)
        );

        let resp: GeocodingResponse = get_json(&self.http, &url, "Geocoding").await?;
        let location = Self::first_location(city, resp)?;

        info!(city, %location, "City resolved");
        Ok(location)
    }

    fn first_location(city: &str, resp: GeocodingResponse) -> Result<GeoLocation, WeatherError> {
        let Some(first) = resp.results.and_then(|r| r.into_iter().next()) else {
            debug!(city, "Geocoding returned no results");
            return Err(WeatherError::NotFound("City not found".to_string()));
        };

        match (first.latitude, first.longitude) {
            (Some(latitude), Some(longitude)) => Ok(GeoLocation {
                latitude,
                longitude,
                timezone: first
                    .timezone
                    .filter(|tz| !tz.is_empty())
                    .unwrap_or_else(|| AUTO_TIMEZONE.to_string()),
            }),
            _ => Err(WeatherError::Upstream(format!(
                "Geocoding result for '{}' has no coordinates",
                first.name.as_deref().unwrap_or(city)
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
