//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use ytdl_common::health::HealthResponse;

use crate::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(
        "ytdl-music-api",
        env!("CARGO_PKG_VERSION"),
        state.startup_time,
        state.shutdown.is_triggered(),
    ))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
