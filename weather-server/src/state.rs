//! Application state for the HTTP server.

use std::sync::Arc;

use weather_core::{Store, WeatherService};

/// Shared state passed to all handlers.
///
/// The store is opened once at startup; handlers never open connections.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: WeatherService,
}

impl AppState {
    pub fn new(service: WeatherService) -> Self {
        Self { service }
    }

    pub fn store(&self) -> &Arc<Store> {
        self.service.store()
    }
}
