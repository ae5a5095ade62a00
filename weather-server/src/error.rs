//! HTTP error handling.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use weather_core::{ExportError, LocationError, ProviderError, ServiceError, StoreError};

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    /// The upstream provider cannot serve this kind of request at all.
    NotImplemented(String),
    /// The weather provider failed or rejected our credentials.
    Upstream(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotImplemented(msg) => (StatusCode::NOT_IMPLEMENTED, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(ApiError { error })).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SearchNotFound(_) => AppError::NotFound("Search not found".to_string()),
            StoreError::SnapshotNotFound(_) => AppError::NotFound("Weather data not found".to_string()),
            StoreError::Database(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::LocationNotFound => AppError::NotFound(err.to_string()),
            ProviderError::InvalidDateRange => AppError::BadRequest(err.to_string()),
            ProviderError::HistoricalRangeUnsupported { .. } => AppError::NotImplemented(err.to_string()),
            other => {
                tracing::warn!(error = %other, "weather provider request failed");
                AppError::Upstream(other.to_string())
            }
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Location(e @ LocationError::Empty) => AppError::BadRequest(e.to_string()),
            ServiceError::Provider(e) => e.into(),
            ServiceError::Store(e) => e.into(),
            ServiceError::Task(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::UnsupportedFormat(_) => AppError::BadRequest("Unsupported export format".to_string()),
            ExportError::Serialize(e) => AppError::Internal(e.to_string()),
            ExportError::Xml(msg) => AppError::Internal(msg),
        }
    }
}
