//! HTTP API handlers for ytdl-genre

pub mod genre;
pub mod health;

pub use genre::{classify_stored, classify_upload, GenreResponse};
pub use health::health_routes;

use axum::http::StatusCode;

/// Fallback for unknown paths
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
