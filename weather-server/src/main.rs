//! HTTP server for the weather lookup service.
//!
//! Configuration comes from the same file as the CLI, with `WEATHER_DB`,
//! `WEATHER_ADDR` and `OPENWEATHER_API_KEY` taking precedence.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use weather_core::{Config, Store, WeatherService, provider::provider_from_config};
use weather_server::{AppState, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;

    let db_path = config.database_path()?;
    let store = Store::open(&db_path).with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    let provider = provider_from_config(&config)?;
    let service = WeatherService::new(Arc::from(provider), Arc::new(store));

    let app = create_router(AppState::new(service));

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(%addr, "weather server listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
