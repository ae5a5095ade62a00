use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    location::LocationQuery,
    model::{Coordinates, CurrentConditions, Forecast, WeatherSample},
};

use super::{ProviderError, WeatherProvider};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Country appended to bare zip codes, which the geocoder needs.
const ZIP_COUNTRY: &str = "us";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the client at another host, e.g. a local mock server.
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| ProviderError::Http { endpoint, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| ProviderError::Http { endpoint, source })?;

        tracing::debug!(endpoint, %status, "OpenWeather response");

        match status {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(ProviderError::LocationNotFound),
            StatusCode::UNAUTHORIZED => return Err(ProviderError::Unauthorized),
            _ => {
                return Err(ProviderError::Status {
                    endpoint,
                    status: status.as_u16(),
                    body: truncate_body(&body),
                });
            }
        }

        serde_json::from_str(&body).map_err(|source| ProviderError::Decode { endpoint, source })
    }

    fn coords_query(coords: Coordinates) -> Vec<(&'static str, String)> {
        vec![
            ("lat", coords.lat.to_string()),
            ("lon", coords.lon.to_string()),
            ("units", "metric".to_string()),
        ]
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwSys {
    country: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCurrentResponse {
    name: String,
    dt: Option<i64>,
    coord: Option<OwCoord>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCity {
    name: String,
    country: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeoPlace {
    lat: f64,
    lon: f64,
}

fn sample(timestamp: DateTime<Utc>, main: &OwMain, weather: &[OwWeather], wind: &OwWind) -> WeatherSample {
    let (condition, icon_id) = weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_default();

    WeatherSample {
        timestamp,
        temperature: main.temp,
        temperature_min: main.temp_min,
        temperature_max: main.temp_max,
        feels_like: main.feels_like,
        humidity: main.humidity,
        wind_speed: wind.speed,
        condition,
        icon_id,
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn geocode(&self, query: &LocationQuery) -> Result<Coordinates, ProviderError> {
        match query {
            LocationQuery::Coordinates(coords) => Ok(*coords),
            LocationQuery::ZipCode(zip) => {
                let place: OwGeoPlace = self
                    .get_json("geocoding (zip)", "/geo/1.0/zip", &[("zip", format!("{zip},{ZIP_COUNTRY}"))])
                    .await?;
                Ok(Coordinates::new(place.lat, place.lon))
            }
            LocationQuery::PlaceName(name) => {
                let places: Vec<OwGeoPlace> = self
                    .get_json(
                        "geocoding (direct)",
                        "/geo/1.0/direct",
                        &[("q", name.clone()), ("limit", "1".to_string())],
                    )
                    .await?;
                places
                    .first()
                    .map(|p| Coordinates::new(p.lat, p.lon))
                    .ok_or(ProviderError::LocationNotFound)
            }
        }
    }

    async fn current(&self, coords: Coordinates) -> Result<CurrentConditions, ProviderError> {
        let parsed: OwCurrentResponse = self
            .get_json("current weather", "/data/2.5/weather", &Self::coords_query(coords))
            .await?;

        let observation_time = parsed.dt.and_then(unix_to_utc).unwrap_or_else(Utc::now);
        let coordinates = parsed.coord.map(|c| Coordinates::new(c.lat, c.lon)).unwrap_or(coords);

        Ok(CurrentConditions {
            location_name: parsed.name,
            country: parsed.sys.country,
            coordinates,
            sample: sample(observation_time, &parsed.main, &parsed.weather, &parsed.wind),
        })
    }

    async fn forecast(&self, coords: Coordinates) -> Result<Forecast, ProviderError> {
        let parsed: OwForecastResponse = self
            .get_json("5-day forecast", "/data/2.5/forecast", &Self::coords_query(coords))
            .await?;

        let samples = parsed
            .list
            .iter()
            .map(|e| sample(unix_to_utc(e.dt).unwrap_or_default(), &e.main, &e.weather, &e.wind))
            .collect();

        Ok(Forecast { city: parsed.city.name, country: parsed.city.country, samples })
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
