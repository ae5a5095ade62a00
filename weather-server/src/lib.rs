//! HTTP API for the weather lookup service.
//!
//! Routes mirror the browser front end's needs: saved searches, their weather
//! snapshots, live lookups and downloadable exports. Handlers delegate to
//! `weather_core` for everything beyond request parsing.

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
