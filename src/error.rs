//! Error taxonomy.
//!
//! `FetchError` never escapes the fan-out layer: it is logged and the source
//! contributes an empty list. `AppError` is what HTTP handlers return.

use shuttle_axum::axum::http::StatusCode;
use shuttle_axum::axum::response::{IntoResponse, Response};
use shuttle_axum::axum::Json;
use thiserror::Error;

use crate::sources::SourceId;

#[derive(Debug, Error)]
pub enum SourceIdError {
    #[error("source id is empty")]
    Empty,
    #[error("source id '{id}' contains invalid character {ch:?}")]
    InvalidChar { id: String, ch: char },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no getter registered for source '{0}'")]
    NotRegistered(SourceId),
    #[error("source '{source_id}' fetch failed: {cause:#}")]
    Source {
        source_id: SourceId,
        cause: anyhow::Error,
    },
    #[error("getter task for source '{0}' panicked")]
    TaskPanicked(SourceId),
}

impl FetchError {
    pub fn source_id(&self) -> &SourceId {
        match self {
            FetchError::NotRegistered(id) | FetchError::TaskPanicked(id) => id,
            FetchError::Source { source_id, .. } => source_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("aggregation failed: {0:#}")]
    Aggregation(#[from] anyhow::Error),
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Aggregation(e) => {
                tracing::error!(error = ?e, "aggregation failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
