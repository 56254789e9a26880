//! Error types for ytdl-genre HTTP handlers

use crate::classifier::ClassifyError;
use crate::tagger::TaggerError;
use crate::vote::VoteError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Models produced no tags at all (422)
    #[error("No genre could be determined: {0}")]
    NoResult(String),

    /// Tagger produced unusable output (502)
    #[error("Tagger error: {0}")]
    BadGateway(String),

    /// Tagger did not answer in time (504)
    #[error("Tagger timeout: {0}")]
    Timeout(String),

    /// Service is shutting down (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ClassifyError> for ApiError {
    fn from(err: ClassifyError) -> Self {
        let message = err.to_string();
        match err {
            ClassifyError::Vote(VoteError::NoTags) => ApiError::NoResult(message),
            ClassifyError::Vote(VoteError::InvalidInput(_)) => ApiError::BadGateway(message),
            ClassifyError::Unavailable => ApiError::Unavailable(message),
            ClassifyError::Input(source) | ClassifyError::Tagger { source, .. } => {
                from_tagger_error(&source, message)
            }
        }
    }
}

fn from_tagger_error(source: &TaggerError, message: String) -> ApiError {
    match source {
        TaggerError::FileNotFound(_) => ApiError::NotFound(message),
        TaggerError::Timeout(_) => ApiError::Timeout(message),
        TaggerError::AnalysisFailed { .. }
        | TaggerError::ParseError(_)
        | TaggerError::InvalidOutput(_) => ApiError::BadGateway(message),
        TaggerError::BinaryNotFound(_)
        | TaggerError::ExecutionError(_)
        | TaggerError::IoError(_) => ApiError::Internal(message),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NoResult(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "NO_RESULT", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "TAGGER_ERROR", msg),
            ApiError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "TAGGER_TIMEOUT", msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", message);
        } else {
            warn!(status = status.as_u16(), "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
