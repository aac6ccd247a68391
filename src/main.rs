//! Weather API server.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the override store, wires the provider chains and serves HTTP
//! until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use weather_api::api::{self, ApiState};
use weather_api::config::AppConfig;
use weather_api::providers::ProviderChain;
use weather_api::storage::OverrideStore;
use weather_api::upstream::OpenMeteoClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_default()?;
    init_logging();

    info!(
        addr = %cfg.bind_addr(),
        geocoding_url = %cfg.upstream.geocoding_url,
        forecast_url = %cfg.upstream.forecast_url,
        timeout_secs = cfg.upstream.timeout_secs,
        current_sources = ?cfg.providers.current,
        forecast_sources = ?cfg.providers.forecast,
        "Weather API starting up"
    );

    let store = OverrideStore::connect(&cfg.storage.database_url).await?;
    let upstream = OpenMeteoClient::new(&cfg.upstream)?;
    let chain = ProviderChain::from_config(&cfg.providers, &store, &upstream);

    let state = Arc::new(ApiState::new(chain, store.clone()));
    api::serve(state, &cfg.bind_addr()).await?;

    store.close().await;
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("weather_api=info,tower_http=info"));

    let json_logging = std::env::var("WEATHER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
