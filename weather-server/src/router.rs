//! Router configuration for the HTTP API.

use axum::{
    Router,
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // The browser front end may be served from another origin during development.
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let api = Router::new()
        .route("/searches", get(handlers::list_searches).post(handlers::create_search))
        .route(
            "/searches/{id}",
            get(handlers::get_search).put(handlers::update_search).delete(handlers::delete_search),
        )
        .route("/searches/{id}/weather", get(handlers::reload_search))
        .route("/weather-data", get(handlers::list_snapshots).post(handlers::create_snapshot))
        .route("/weather-data/{id}", axum::routing::put(handlers::update_snapshot).delete(handlers::delete_snapshot))
        .route("/weather", get(handlers::lookup_weather))
        .route("/weather/position", get(handlers::lookup_position))
        .route("/export/{format}", get(handlers::export));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
