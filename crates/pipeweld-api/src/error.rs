//! API error handling.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use pipeweld_resolver::ResolveError;

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::FetchFailed { .. }
            | ResolveError::DecodeFailed { .. }
            | ResolveError::CycleDetected(_)
            | ResolveError::TemplateNotFound(_)
            | ResolveError::TemplateRenderFailed { .. } => ApiError::BadRequest(err.to_string()),
            ResolveError::CredentialFailed(_) | ResolveError::Timeout => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}
