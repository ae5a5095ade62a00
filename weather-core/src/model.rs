use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

/// One point-in-time observation or forecast entry, in metric units.
///
/// `temperature_min <= temperature <= temperature_max` is not guaranteed by
/// the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub feels_like: f64,
    pub humidity: i64,
    pub wind_speed: f64,
    pub condition: String,
    pub icon_id: String,
}

/// Current conditions at a resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location_name: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub sample: WeatherSample,
}

impl CurrentConditions {
    /// Human label such as "London, GB"; the country is omitted when unknown.
    pub fn label(&self) -> String {
        match (self.location_name.is_empty(), self.country.is_empty()) {
            (false, false) => format!("{}, {}", self.location_name, self.country),
            (false, true) => self.location_name.clone(),
            (true, _) => self.coordinates.to_string(),
        }
    }
}

/// Flat list of 3-hour forecast samples for a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city: String,
    pub country: String,
    pub samples: Vec<WeatherSample>,
}

/// A persisted lookup issued by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub id: i64,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

impl SearchRecord {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Fields needed to create or replace a search record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSearch {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A persisted weather observation tied to a search.
///
/// Field order is significant: CSV and Markdown exports use it for columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub id: i64,
    pub search_id: i64,
    pub temperature: f64,
    pub feels_like: Option<f64>,
    pub humidity: Option<i64>,
    pub wind_speed: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Values of a snapshot excluding the store-assigned id, owner and timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotFields {
    pub temperature: f64,
    pub feels_like: Option<f64>,
    pub humidity: Option<i64>,
    pub wind_speed: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
}

impl SnapshotFields {
    /// Snapshot of the given conditions, as saved after a lookup.
    pub fn from_sample(sample: &WeatherSample) -> Self {
        Self {
            temperature: sample.temperature,
            feels_like: Some(sample.feels_like),
            humidity: Some(sample.humidity),
            wind_speed: Some(sample.wind_speed),
            description: Some(sample.condition.clone()),
            icon: Some(sample.icon_id.clone()),
            date_start: None,
            date_end: None,
        }
    }
}

/// A search together with its snapshots, as it appears in an all-searches export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchWithWeather {
    #[serde(flatten)]
    pub search: SearchRecord,
    #[serde(rename = "weatherData")]
    pub weather_data: Vec<WeatherSnapshot>,
}

/// Export-time wrapper distinguishing one search's data from all searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportEnvelope {
    Single {
        #[serde(rename = "weatherData")]
        weather_data: Vec<WeatherSnapshot>,
    },
    All {
        searches: Vec<SearchWithWeather>,
    },
}

/// Inclusive calendar range requested for historical data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}
