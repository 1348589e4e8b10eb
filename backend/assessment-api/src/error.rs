use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::catalog::CatalogError;

/// Application error, mapped to HTTP responses at the handler boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    /// Catalog could not satisfy an attempt: surfaced to the candidate as
    /// "assessment unavailable".
    #[error("assessment unavailable: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Catalog(err) => {
                tracing::error!("Catalog cannot serve attempt: {}", err);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "assessment unavailable, try again".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
