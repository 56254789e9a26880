//! Server lifecycle: shutdown handle, signal handling and the `/kill` route
//!
//! Each service owns one [`ShutdownHandle`] created in `main`. It is stored in
//! the router state so the `/kill` handler can trigger it, and the same handle
//! is awaited by `axum::serve(..).with_graceful_shutdown(..)`.

use axum::{
    extract::{FromRef, State},
    routing::get,
    Router,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Response body sent by the `/kill` route
pub const SHUTDOWN_MESSAGE: &str = "Server is shutting down...";

/// Cloneable handle signalling that the server should stop
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown (idempotent)
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Whether shutdown has been requested
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once shutdown has been requested
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}

/// Graceful shutdown future
///
/// Completes on Ctrl+C, SIGTERM, or when `handle` is triggered.
pub async fn shutdown_signal(handle: ShutdownHandle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
        _ = handle.triggered() => {
            info!("Shutdown requested over HTTP");
        },
    }

    // Make sure anything else watching the handle sees the shutdown too
    handle.trigger();
}

/// GET {kill}
///
/// Acknowledges the request, then lets the graceful shutdown finish in-flight
/// requests (this one included).
pub async fn kill(State(handle): State<ShutdownHandle>) -> &'static str {
    info!("Kill endpoint called");
    handle.trigger();
    SHUTDOWN_MESSAGE
}

/// Build the shutdown route at the configured path
pub fn shutdown_routes<S>(path: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ShutdownHandle: FromRef<S>,
{
    Router::new().route(path, get(kill))
}
