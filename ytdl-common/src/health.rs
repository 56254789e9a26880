//! Health check response shared by all services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status ("ok" or "shutting_down")
    pub status: String,
    /// Module name ("ytdl-genre", "ytdl-music-api")
    pub module: String,
    /// Crate version of the serving binary
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
}

impl HealthResponse {
    /// Build a response for a module started at `startup_time`
    pub fn new(module: &str, version: &str, startup_time: DateTime<Utc>, shutting_down: bool) -> Self {
        let uptime = Utc::now().signed_duration_since(startup_time);
        Self {
            status: if shutting_down { "shutting_down" } else { "ok" }.to_string(),
            module: module.to_string(),
            version: version.to_string(),
            uptime_seconds: uptime.num_seconds().max(0) as u64,
        }
    }
}
