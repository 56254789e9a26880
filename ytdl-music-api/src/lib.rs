//! ytdl-music-api library interface
//!
//! Thin metadata service: resolves a video id to display metadata and a
//! playlist id to its track ids.

pub mod api;
pub mod error;
pub mod provider;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::FromRef;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use ytdl_common::config::ServiceConfig;
use ytdl_common::shutdown::shutdown_routes;
use ytdl_common::ShutdownHandle;

use crate::provider::MetadataProvider;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MetadataProvider>,
    pub shutdown: ShutdownHandle,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(provider: Arc<dyn MetadataProvider>, shutdown: ShutdownHandle) -> Self {
        Self {
            provider,
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

/// Route paths taken from configuration
#[derive(Debug, Clone)]
pub struct MusicRoutes {
    pub meta: String,
    pub playlist: String,
    pub kill: String,
}

impl MusicRoutes {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            meta: config.endpoints.meta.clone(),
            playlist: config.endpoints.playlist.clone(),
            kill: config.endpoints.kill.clone(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState, routes: &MusicRoutes) -> Router {
    Router::new()
        .route(&routes.meta, get(api::get_meta))
        .route(&routes.playlist, get(api::get_playlist))
        .merge(shutdown_routes(&routes.kill))
        .merge(api::health_routes())
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
