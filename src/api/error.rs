//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, info};

use super::validation::ValidationErrors;
use crate::types::WeatherError;

/// Everything a handler can fail with. Always terminal for the request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0:?}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Weather(#[from] WeatherError),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Weather(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(errors) => {
                info!(?errors, "Rejected invalid request");
                (status, Json(errors)).into_response()
            }
            ApiError::Weather(err) => {
                if status.is_server_error() {
                    error!(error = %err, status = status.as_u16(), "Weather lookup failed");
                } else {
                    info!(error = %err, status = status.as_u16(), "Weather lookup unsuccessful");
                }
                (status, Json(json!({ "detail": err.detail() }))).into_response()
            }
        }
    }
}
