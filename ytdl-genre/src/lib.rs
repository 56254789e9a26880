//! ytdl-genre library interface
//!
//! Genre tagging service: four tagging model variants vote on a genre label
//! for uploaded or stored audio.

pub mod api;
pub mod classifier;
pub mod error;
pub mod tagger;
pub mod vote;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::{DefaultBodyLimit, FromRef};
use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use ytdl_common::config::ServiceConfig;
use ytdl_common::shutdown::shutdown_routes;
use ytdl_common::ShutdownHandle;

use crate::classifier::GenreClassifier;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Tagging + voting pipeline
    pub classifier: GenreClassifier,
    /// Root for the stored-file form of the genre endpoint
    pub audio_dir: Arc<PathBuf>,
    /// Server lifecycle, triggered by the kill route
    pub shutdown: ShutdownHandle,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(classifier: GenreClassifier, audio_dir: PathBuf, shutdown: ShutdownHandle) -> Self {
        Self {
            classifier,
            audio_dir: Arc::new(audio_dir),
            shutdown,
            startup_time: Utc::now(),
        }
    }
}

impl FromRef<AppState> for ShutdownHandle {
    fn from_ref(state: &AppState) -> Self {
        state.shutdown.clone()
    }
}

/// Route paths and limits taken from configuration
#[derive(Debug, Clone)]
pub struct GenreRoutes {
    pub genre: String,
    pub kill: String,
    pub max_upload_bytes: usize,
}

impl GenreRoutes {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            genre: config.endpoints.genre.clone(),
            kill: config.endpoints.kill.clone(),
            max_upload_bytes: config.genre.max_upload_mb.saturating_mul(1024 * 1024),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState, routes: &GenreRoutes) -> Router {
    use axum::routing::post;

    Router::new()
        .route(
            &routes.genre,
            post(api::classify_upload).get(api::classify_stored),
        )
        .merge(shutdown_routes(&routes.kill))
        .merge(api::health_routes())
        .fallback(api::not_found)
        .layer(DefaultBodyLimit::max(routes.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
