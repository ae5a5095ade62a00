//! Core library for the weather lookup service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the `WeatherProvider` trait
//! - SQLite storage of searches and weather snapshots
//! - Daily bucketing of forecasts and multi-format export
//!
//! It is used by `weather-cli` and `weather-server`.

pub mod config;
pub mod export;
pub mod forecast;
pub mod location;
pub mod model;
pub mod provider;
pub mod service;
pub mod store;

pub use config::Config;
pub use export::{ExportError, ExportFormat, ExportedDocument, export_as};
pub use forecast::{DailyBucket, DailyForecast, bucket_forecast};
pub use location::{LocationError, LocationQuery};
pub use model::{
    Coordinates, CurrentConditions, DateRange, ExportEnvelope, Forecast, NewSearch, SearchRecord,
    SearchWithWeather, SnapshotFields, WeatherSample, WeatherSnapshot,
};
pub use provider::{ProviderError, WeatherProvider};
pub use service::{LookupReport, RangeReport, ServiceError, WeatherService};
pub use store::{Store, StoreError};
