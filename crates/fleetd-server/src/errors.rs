//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The serial in the path names no known device.
    #[error("device not found")]
    UnknownDevice,

    /// The request was malformed.
    #[error("{0}")]
    BadRequest(String),

    /// Something failed on our side; details stay in the logs.
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::UnknownDevice => (StatusCode::NOT_FOUND, self.to_string()),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::Internal(detail) => {
                error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "try again later".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
