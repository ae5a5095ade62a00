//! Lookup flows: resolve a location, fetch its weather, record the search.

use serde::Serialize;
use std::sync::Arc;

use crate::{
    forecast::{DailyForecast, bucket_forecast},
    location::{LocationError, LocationQuery},
    model::{
        Coordinates, CurrentConditions, DateRange, NewSearch, SearchRecord, SnapshotFields,
        WeatherSample, WeatherSnapshot,
    },
    provider::{ProviderError, WeatherProvider, validate_range},
    store::{Store, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of a current-conditions lookup.
///
/// `search` and `snapshot` are `None` when recording the lookup failed; the
/// weather itself is still returned.
#[derive(Debug, Clone, Serialize)]
pub struct LookupReport {
    pub search: Option<SearchRecord>,
    pub snapshot: Option<WeatherSnapshot>,
    pub current: CurrentConditions,
    pub forecast: DailyForecast,
}

/// Result of a historical range lookup.
#[derive(Debug, Clone, Serialize)]
pub struct RangeReport {
    pub search: Option<SearchRecord>,
    pub snapshot: Option<WeatherSnapshot>,
    pub coordinates: Coordinates,
    pub range: DateRange,
    pub samples: Vec<WeatherSample>,
}

#[derive(Debug, Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    store: Arc<Store>,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherProvider>, store: Arc<Store>) -> Self {
        Self { provider, store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Look up current conditions and forecast for free-text input and record it.
    pub async fn search(&self, input: &str) -> Result<LookupReport, ServiceError> {
        let query = LocationQuery::parse(input)?;
        let coords = self.provider.geocode(&query).await?;
        tracing::info!(location = %query, %coords, "resolved location");

        let (current, forecast) = self.fetch(coords).await?;
        let (search, snapshot) =
            self.record(input.trim(), coords, SnapshotFields::from_sample(&current.sample)).await;

        Ok(LookupReport { search, snapshot, current, forecast })
    }

    /// Look up weather for a calendar range; most providers report this as unsupported.
    pub async fn search_range(&self, input: &str, range: DateRange) -> Result<RangeReport, ServiceError> {
        let query = LocationQuery::parse(input)?;
        validate_range(range)?;
        let coords = self.provider.geocode(&query).await?;

        let samples = self.provider.date_range(coords, range).await?;

        let (search, snapshot) = match samples.first() {
            Some(first) => {
                let fields = SnapshotFields {
                    date_start: Some(range.start),
                    date_end: Some(range.end),
                    ..SnapshotFields::from_sample(first)
                };
                self.record(input.trim(), coords, fields).await
            }
            None => (None, None),
        };

        Ok(RangeReport { search, snapshot, coordinates: coords, range, samples })
    }

    /// Look up the weather at a device position, labelled by the provider's place name.
    pub async fn lookup_position(&self, coords: Coordinates) -> Result<LookupReport, ServiceError> {
        let (current, forecast) = self.fetch(coords).await?;
        let label = current.label();
        let (search, snapshot) =
            self.record(&label, current.coordinates, SnapshotFields::from_sample(&current.sample)).await;

        Ok(LookupReport { search, snapshot, current, forecast })
    }

    /// Refetch weather for a saved search without recording anything new.
    pub async fn reload(&self, search_id: i64) -> Result<LookupReport, ServiceError> {
        let search = self
            .on_store(move |store| store.get_search(search_id))
            .await??
            .ok_or(StoreError::SearchNotFound(search_id))?;
        let (current, forecast) = self.fetch(search.coordinates()).await?;

        Ok(LookupReport { search: Some(search), snapshot: None, current, forecast })
    }

    async fn fetch(&self, coords: Coordinates) -> Result<(CurrentConditions, DailyForecast), ServiceError> {
        let (current, forecast) =
            tokio::try_join!(self.provider.current(coords), self.provider.forecast(coords))?;

        Ok((current, bucket_forecast(&forecast.samples)))
    }

    /// Run a synchronous store operation on the blocking thread pool.
    async fn on_store<T, F>(&self, f: F) -> Result<T, tokio::task::JoinError>
    where
        F: FnOnce(&Store) -> T + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store)).await
    }

    /// Persist the search and its snapshot. Failures are logged, not returned.
    async fn record(
        &self,
        label: &str,
        coords: Coordinates,
        fields: SnapshotFields,
    ) -> (Option<SearchRecord>, Option<WeatherSnapshot>) {
        let new = NewSearch { location: label.to_string(), latitude: coords.lat, longitude: coords.lon };

        match self.on_store(move |store| save_lookup(store, &new, &fields)).await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(error = %e, "storage task for lookup failed");
                (None, None)
            }
        }
    }
}

fn save_lookup(
    store: &Store,
    new: &NewSearch,
    fields: &SnapshotFields,
) -> (Option<SearchRecord>, Option<WeatherSnapshot>) {
    let search = match store.create_search(new) {
        Ok(search) => search,
        Err(e) => {
            tracing::warn!(error = %e, "failed to save search");
            return (None, None);
        }
    };

    let snapshot = match store.create_snapshot(search.id, fields) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!(error = %e, search_id = search.id, "failed to save weather snapshot");
            None
        }
    };

    (Some(search), snapshot)
}
