//! HTTP API handlers for ytdl-music-api

pub mod health;
pub mod meta;
pub mod playlist;

pub use health::health_routes;
pub use meta::get_meta;
pub use playlist::{get_playlist, PlaylistBody};

use axum::http::StatusCode;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// `?id=` query shared by the meta and playlist routes
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    /// The trimmed id, or 400 when absent or blank
    pub fn require(self) -> ApiResult<String> {
        self.id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Missing 'id' query parameter".to_string()))
    }
}

/// Fallback for unknown paths
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
