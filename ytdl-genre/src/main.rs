//! ytdl-genre - Genre Tagging Microservice
//!
//! Classifies uploaded or stored audio into a genre by letting four tagging
//! model variants vote.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use ytdl_common::config::load_service_config;
use ytdl_common::ShutdownHandle;

use ytdl_genre::classifier::GenreClassifier;
use ytdl_genre::tagger::CommandTagger;
use ytdl_genre::vote::GenreVoteConfig;
use ytdl_genre::{build_router, AppState, GenreRoutes};

/// Command-line arguments for ytdl-genre
#[derive(Parser, Debug)]
#[command(name = "ytdl-genre")]
#[command(about = "Genre tagging microservice")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides ports.genre)
    #[arg(short, long, env = "YTDL_GENRE_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = load_service_config(args.config.as_deref()).context("Failed to load configuration")?;
    let mut config = loaded.config;

    ytdl_common::logging::init_tracing(&config.logging.level)?;

    info!("Starting ytdl-genre (Genre Tagging) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", loaded.source);

    if let Some(port) = args.port {
        config.ports.genre = port;
    }

    let tagger = CommandTagger::from_config(&config.tagger);
    if let Err(e) = tagger.check_available().await {
        warn!("Tagger '{}' not usable yet: {}", tagger.program(), e);
    }

    let vote = GenreVoteConfig::from_genre_config(&config.genre);
    info!(
        top_n = vote.top_n,
        case_sensitive = vote.case_sensitive,
        preferred = vote.preferred.len(),
        "Genre voting configured"
    );
    if vote.preferred.is_empty() {
        warn!("Preferred genre list is empty, the top-scoring tag always wins");
    }

    let classifier = GenreClassifier::new(Arc::new(tagger), vote, config.concurrency.genre);
    let shutdown = ShutdownHandle::new();
    let state = AppState::new(classifier, config.genre.audio_dir.clone(), shutdown.clone());
    let app = build_router(state, &GenreRoutes::from_config(&config));

    let addr = format!("{}:{}", config.host, config.ports.genre);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Genre endpoint: {}", config.endpoints.genre);

    ytdl_common::server::serve(listener, app, shutdown)
        .await
        .context("Server error")?;

    Ok(())
}
