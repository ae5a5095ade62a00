use crate::{
    Config,
    location::LocationQuery,
    model::{Coordinates, CurrentConditions, DateRange, Forecast, WeatherSample},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt::Debug;

pub mod openweather;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Location not found. Please check your input and try again.")]
    LocationNotFound,

    #[error("API authentication failed. Please check your API key.")]
    Unauthorized,

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status { endpoint: &'static str, status: u16, body: String },

    #[error("Failed to send {endpoint} request: {source}")]
    Http {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("End date must be after start date")]
    InvalidDateRange,

    #[error(
        "Historical weather ({start} .. {end}) is not supported by this provider.\n\
         Only current weather and up to 5 days forecast are available."
    )]
    HistoricalRangeUnsupported { start: NaiveDate, end: NaiveDate },
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Resolve a parsed location to coordinates. Coordinates pass through unchanged.
    async fn geocode(&self, query: &LocationQuery) -> Result<Coordinates, ProviderError>;

    async fn current(&self, coords: Coordinates) -> Result<CurrentConditions, ProviderError>;

    /// 3-hour samples covering the next five days.
    async fn forecast(&self, coords: Coordinates) -> Result<Forecast, ProviderError>;

    /// Daily samples for a past calendar range.
    ///
    /// Providers without a history endpoint keep this default, which validates
    /// the range and reports the capability as missing.
    async fn date_range(
        &self,
        _coords: Coordinates,
        range: DateRange,
    ) -> Result<Vec<WeatherSample>, ProviderError> {
        validate_range(range)?;
        Err(ProviderError::HistoricalRangeUnsupported { start: range.start, end: range.end })
    }
}

pub fn validate_range(range: DateRange) -> Result<(), ProviderError> {
    if range.end < range.start {
        return Err(ProviderError::InvalidDateRange);
    }
    Ok(())
}

/// Construct the OpenWeather provider from the configured API key.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `weather configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    Ok(Box::new(OpenWeatherProvider::new(api_key)))
}
