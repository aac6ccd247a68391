//! API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ApiState>`.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use super::validation::{local_today, CityQuery, ForecastQuery, OverridePayload};
use crate::providers::ProviderChain;
use crate::storage::OverrideStore;
use crate::types::{CurrentWeather, ForecastWeather, OverrideRecord};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ApiState {
    pub chain: ProviderChain,
    pub store: OverrideStore,
    /// Source of "today" for the forecast window.
    pub today: fn() -> NaiveDate,
}

impl ApiState {
    pub fn new(chain: ProviderChain, store: OverrideStore) -> Self {
        Self {
            chain,
            store,
            today: local_today,
        }
    }
}

pub type AppState = Arc<ApiState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct OverrideSaved {
    pub message: &'static str,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverrideDeleted {
    pub message: &'static str,
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /current?city=
pub async fn get_current(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<CurrentWeather>, ApiError> {
    let query = CityQuery::from_params(&params)?;
    let current = state.chain.current_weather(&query.city).await?;
    Ok(Json(current))
}

/// GET /forecast?city=&date=DD.MM.YYYY
pub async fn get_forecast(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ForecastWeather>, ApiError> {
    let query = ForecastQuery::from_params(&params, (state.today)())?;
    let forecast = state.chain.forecast(&query.city, query.date).await?;
    Ok(Json(forecast))
}

/// POST /forecast: pin min/max for a city and date.
pub async fn post_forecast(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<OverrideSaved>, ApiError> {
    let payload = OverridePayload::from_json(&body, (state.today)())?;
    let (record, created) = state
        .store
        .upsert(
            &payload.city,
            payload.date,
            payload.min_temperature,
            payload.max_temperature,
        )
        .await?;

    info!(city = %record.city, date = %record.date, created, "Forecast override written");
    Ok(Json(OverrideSaved {
        message: "OK",
        created,
    }))
}

/// DELETE /forecast?city=&date=DD.MM.YYYY
pub async fn delete_forecast(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<OverrideDeleted>, ApiError> {
    let key = ForecastQuery::key_from_params(&params)?;
    let deleted = state.store.delete(&key.city, key.date).await?;
    Ok(Json(OverrideDeleted {
        message: "OK",
        deleted,
    }))
}

/// GET /overrides[?city=]
pub async fn list_overrides(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<OverrideRecord>>, ApiError> {
    let city = params
        .get("city")
        .map(|c| c.trim())
        .filter(|c| !c.is_empty());
    let records = state.store.list(city).await?;
    Ok(Json(records))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
