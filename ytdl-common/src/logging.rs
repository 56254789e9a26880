//! Tracing subscriber setup shared by all service binaries

use tracing_subscriber::EnvFilter;

/// Build the log filter: `RUST_LOG` when set, otherwise the configured level
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the global fmt subscriber
///
/// Returns an error when a global subscriber is already installed.
pub fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}
