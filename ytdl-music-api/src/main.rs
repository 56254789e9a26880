//! ytdl-music-api - Track Metadata Microservice
//!
//! Serves track metadata and playlist contents for the downloader.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use ytdl_common::config::load_service_config;
use ytdl_common::ShutdownHandle;

use ytdl_music_api::provider::HttpMetadataProvider;
use ytdl_music_api::{build_router, AppState, MusicRoutes};

/// Command-line arguments for ytdl-music-api
#[derive(Parser, Debug)]
#[command(name = "ytdl-music-api")]
#[command(about = "Track metadata and playlist microservice")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides ports.music_api)
    #[arg(short, long, env = "YTDL_MUSIC_API_PORT")]
    port: Option<u16>,

    /// Metadata bridge base URL (overrides music_api.upstream_url)
    #[arg(long, env = "YTDL_MUSIC_API_UPSTREAM")]
    upstream: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = load_service_config(args.config.as_deref()).context("Failed to load configuration")?;
    let mut config = loaded.config;

    ytdl_common::logging::init_tracing(&config.logging.level)?;

    info!("Starting ytdl-music-api (Track Metadata) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", loaded.source);

    if let Some(port) = args.port {
        config.ports.music_api = port;
    }
    if let Some(upstream) = args.upstream {
        config.music_api.upstream_url = upstream;
    }

    let provider = HttpMetadataProvider::from_config(&config.music_api)
        .context("Failed to build upstream HTTP client")?;
    info!("Metadata upstream: {}", provider.base_url());

    let shutdown = ShutdownHandle::new();
    let state = AppState::new(Arc::new(provider), shutdown.clone());
    let app = build_router(state, &MusicRoutes::from_config(&config));

    let addr = format!("{}:{}", config.host, config.ports.music_api);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!(
        "Endpoints: meta={} playlist={}",
        config.endpoints.meta, config.endpoints.playlist
    );

    ytdl_common::server::serve(listener, app, shutdown)
        .await
        .context("Server error")?;

    Ok(())
}
