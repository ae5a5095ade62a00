//! HTTP handlers for the REST API.
//!
//! SQLite calls are synchronous, so every store access runs on the blocking pool.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use weather_core::{
    Coordinates, DateRange, ExportFormat, LookupReport, NewSearch, RangeReport, SearchRecord, Store,
    WeatherSnapshot, export_as,
};

use crate::dto::{
    HealthResponse, MessageResponse, PositionQuery, SearchBody, SearchIdQuery, SnapshotBody, WeatherQuery,
};
use crate::error::AppError;
use crate::extract::{AppJson, AppQuery, SearchId, SnapshotId};
use crate::state::AppState;

pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Run `f` against the store on the blocking thread pool.
async fn with_store<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Store) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(state.store());
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {e}")))?
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Searches
// =============================================================================

/// GET /api/searches
pub async fn list_searches(State(state): State<AppState>) -> HandlerResult<Vec<SearchRecord>> {
    let searches = with_store(&state, |store| Ok(store.list_searches()?)).await?;
    Ok(Json(searches))
}

/// POST /api/searches
pub async fn create_search(
    State(state): State<AppState>,
    AppJson(body): AppJson<SearchBody>,
) -> Result<(StatusCode, Json<SearchRecord>), AppError> {
    let new = NewSearch::try_from(body)?;
    let search = with_store(&state, move |store| Ok(store.create_search(&new)?)).await?;
    Ok((StatusCode::CREATED, Json(search)))
}

/// GET /api/searches/{id}
pub async fn get_search(State(state): State<AppState>, SearchId(id): SearchId) -> HandlerResult<SearchRecord> {
    let search = with_store(&state, move |store| {
        store.get_search(id)?.ok_or_else(|| AppError::NotFound("Search not found".to_string()))
    })
    .await?;
    Ok(Json(search))
}

/// PUT /api/searches/{id}
pub async fn update_search(
    State(state): State<AppState>,
    SearchId(id): SearchId,
    AppJson(body): AppJson<SearchBody>,
) -> HandlerResult<SearchRecord> {
    let new = NewSearch::try_from(body)?;
    let search = with_store(&state, move |store| Ok(store.update_search(id, &new)?)).await?;
    Ok(Json(search))
}

/// DELETE /api/searches/{id}
///
/// Snapshots of the search are removed with it.
pub async fn delete_search(State(state): State<AppState>, SearchId(id): SearchId) -> HandlerResult<MessageResponse> {
    with_store(&state, move |store| Ok(store.delete_search(id)?)).await?;
    Ok(Json(MessageResponse { message: "Search deleted successfully" }))
}

/// GET /api/searches/{id}/weather
///
/// Fresh weather for a saved search; nothing new is recorded.
pub async fn reload_search(State(state): State<AppState>, SearchId(id): SearchId) -> HandlerResult<LookupReport> {
    Ok(Json(state.service.reload(id).await?))
}

// =============================================================================
// Weather snapshots
// =============================================================================

/// GET /api/weather-data?searchId=N
pub async fn list_snapshots(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchIdQuery>,
) -> HandlerResult<Vec<WeatherSnapshot>> {
    let search_id = query
        .parse()?
        .ok_or_else(|| AppError::BadRequest("Search ID is required".to_string()))?;
    let snapshots = with_store(&state, move |store| Ok(store.snapshots_for_search(search_id)?)).await?;
    Ok(Json(snapshots))
}

/// POST /api/weather-data
pub async fn create_snapshot(
    State(state): State<AppState>,
    AppJson(body): AppJson<SnapshotBody>,
) -> Result<(StatusCode, Json<WeatherSnapshot>), AppError> {
    let search_id = body.search_id.ok_or_else(|| AppError::BadRequest("Missing required fields".to_string()))?;
    let fields = body.into_fields()?;
    let snapshot = with_store(&state, move |store| Ok(store.create_snapshot(search_id, &fields)?)).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// PUT /api/weather-data/{id}
pub async fn update_snapshot(
    State(state): State<AppState>,
    SnapshotId(id): SnapshotId,
    AppJson(body): AppJson<SnapshotBody>,
) -> HandlerResult<WeatherSnapshot> {
    let fields = body.into_fields()?;
    let snapshot = with_store(&state, move |store| Ok(store.update_snapshot(id, &fields)?)).await?;
    Ok(Json(snapshot))
}

/// DELETE /api/weather-data/{id}
pub async fn delete_snapshot(State(state): State<AppState>, SnapshotId(id): SnapshotId) -> HandlerResult<MessageResponse> {
    with_store(&state, move |store| Ok(store.delete_snapshot(id)?)).await?;
    Ok(Json(MessageResponse { message: "Weather data deleted successfully" }))
}

// =============================================================================
// Lookups
// =============================================================================

/// GET /api/weather?location=...[&start=YYYY-MM-DD&end=YYYY-MM-DD]
pub async fn lookup_weather(State(state): State<AppState>, AppQuery(query): AppQuery<WeatherQuery>) -> Result<Response, AppError> {
    let location = query.location.unwrap_or_default();

    match (query.start, query.end) {
        (Some(start), Some(end)) => {
            let report: RangeReport = state.service.search_range(&location, DateRange { start, end }).await?;
            Ok(Json(report).into_response())
        }
        (None, None) => {
            let report: LookupReport = state.service.search(&location).await?;
            Ok(Json(report).into_response())
        }
        _ => Err(AppError::BadRequest("Both start and end dates are required for a date range".to_string())),
    }
}

/// GET /api/weather/position?lat=..&lon=..
pub async fn lookup_position(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PositionQuery>,
) -> HandlerResult<LookupReport> {
    Ok(Json(state.service.lookup_position(Coordinates::new(query.lat, query.lon)).await?))
}

// =============================================================================
// Export
// =============================================================================

/// GET /api/export/{format}[?searchId=N]
///
/// The format is validated before any data is read.
pub async fn export(
    State(state): State<AppState>,
    Path(format): Path<String>,
    AppQuery(query): AppQuery<SearchIdQuery>,
) -> Result<Response, AppError> {
    let format = ExportFormat::try_from(format.as_str())?;
    // Zero is not a stored id; it selects every search, as an absent id does.
    let search_id = query.parse()?.filter(|id| *id != 0);

    let doc = with_store(&state, move |store| {
        let envelope = store.export_envelope(search_id)?;
        Ok(export_as(&envelope, format)?)
    })
    .await?;

    tracing::info!(%format, ?search_id, "exported weather data");

    Ok((
        [
            (header::CONTENT_TYPE, doc.mime_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename={}", doc.filename)),
        ],
        doc.content,
    )
        .into_response())
}
