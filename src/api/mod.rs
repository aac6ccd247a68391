//! HTTP API: Axum router and server.
//!
//! Serves the weather endpoints and the operator override endpoints.
//! CORS is enabled and every request is traced.

pub mod error;
pub mod routes;
pub mod validation;

use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use routes::{ApiState, AppState};

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/current", get(routes::get_current))
        .route(
            "/forecast",
            get(routes::get_forecast)
                .post(routes::post_forecast)
                .delete(routes::delete_forecast),
        )
        .route("/overrides", get(routes::list_overrides))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(addr, "Weather API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Weather API shut down cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received.");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
