//! Request and response bodies for the HTTP API.
//!
//! Request fields are optional so missing values produce a 400 with a
//! readable message instead of a deserialization rejection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use weather_core::{NewSearch, SnapshotFields};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Body of `POST /api/searches` and `PUT /api/searches/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchBody {
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TryFrom<SearchBody> for NewSearch {
    type Error = AppError;

    fn try_from(body: SearchBody) -> Result<Self, Self::Error> {
        match (body.location.filter(|l| !l.trim().is_empty()), body.latitude, body.longitude) {
            (Some(location), Some(latitude), Some(longitude)) => Ok(NewSearch { location, latitude, longitude }),
            _ => Err(AppError::BadRequest("Missing required fields".to_string())),
        }
    }
}

/// Body of `POST /api/weather-data` and `PUT /api/weather-data/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBody {
    pub search_id: Option<i64>,
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<i64>,
    pub wind_speed: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
}

impl SnapshotBody {
    pub fn into_fields(self) -> Result<SnapshotFields, AppError> {
        let temperature =
            self.temperature.ok_or_else(|| AppError::BadRequest("Temperature is required".to_string()))?;

        Ok(SnapshotFields {
            temperature,
            feels_like: self.feels_like,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
            description: self.description,
            icon: self.icon,
            date_start: self.date_start,
            date_end: self.date_end,
        })
    }
}

/// `?searchId=N`, kept as text so a bad number gets its own message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchIdQuery {
    #[serde(rename = "searchId")]
    pub search_id: Option<String>,
}

impl SearchIdQuery {
    pub fn parse(&self) -> Result<Option<i64>, AppError> {
        match self.search_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::BadRequest("Search ID must be a number".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherQuery {
    pub location: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionQuery {
    pub lat: f64,
    pub lon: f64,
}
