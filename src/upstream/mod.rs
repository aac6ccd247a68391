//! Upstream weather API integration (Open-Meteo).
//!
//! Holds the geocoder and the forecast client, plus the transport fault
//! classification both of them share: every reqwest failure is folded into
//! a [`WeatherError`] here so callers never see a raw transport error.

pub mod geocoding;
pub mod open_meteo;

pub use geocoding::GeoResolver;
pub use open_meteo::OpenMeteoClient;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::WeatherError;

/// Build the HTTP client shared by the geocoder and the forecast client.
///
/// Connecting is bounded separately at half of `timeout`, so a host that
/// never accepts fails as a connect error before the request deadline.
pub(crate) fn build_http_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout / 2)
        .user_agent(user_agent)
        .build()
        .context("Failed to build upstream HTTP client")
}

/// Map a transport failure onto the status taxonomy.
///
/// Connection failures are checked before timeouts: a connect that times
/// out counts as the service being unreachable.
pub(crate) fn classify_transport_error(err: &reqwest::Error, what: &str) -> WeatherError {
    if err.is_connect() {
        WeatherError::ServiceUnavailable(format!("{what}: {err}"))
    } else if err.is_timeout() {
        WeatherError::GatewayTimeout(format!("{what}: {err}"))
    } else {
        WeatherError::Upstream(format!("{what}: {err}"))
    }
}

/// GET `url` and decode a JSON body. Non-2xx statuses and undecodable
/// bodies are upstream errors.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    what: &str,
) -> std::result::Result<T, WeatherError> {
    debug!(url, "{what} request");

    let resp = http.get(url).send().await.map_err(|e| {
        let err = classify_transport_error(&e, what);
        warn!(error = %e, status = err.status_code(), "{what} request failed");
        err
    })?;

    let status = resp.status();
    if !status.is_success() {
        warn!(%status, "{what} returned an error status");
        return Err(WeatherError::Upstream(format!("{what}: HTTP {status}")));
    }

    resp.json::<T>().await.map_err(|e| {
        let err = classify_transport_error(&e, what);
        warn!(error = %e, status = err.status_code(), "{what} response unreadable");
        err
    })
}

/// Join a configured base URL and an API path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
