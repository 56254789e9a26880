//! HTTP server run loop shared by the service binaries

use crate::shutdown::{shutdown_signal, ShutdownHandle};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

/// Serve `app` until `handle` is triggered (or Ctrl+C / SIGTERM arrives)
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve(listener: TcpListener, app: Router, handle: ShutdownHandle) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
        info!("Health check: http://{}/health", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(handle))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
