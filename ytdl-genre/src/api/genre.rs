//! Genre classification endpoints
//!
//! One route, two input forms:
//! - `POST {genre}` with the raw audio file as request body
//! - `GET {genre}?file=<name>` for a file stored under `genre.audio_dir`

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::tagger::AudioInput;
use crate::AppState;

/// Genre response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreResponse {
    pub genre: String,
}

/// Query parameters for the stored-file form
#[derive(Debug, Deserialize)]
pub struct StoredFileQuery {
    pub file: Option<String>,
}

/// POST {genre}
///
/// Classifies the uploaded audio bytes.
pub async fn classify_upload(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<GenreResponse>> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Request body must contain audio data".to_string()));
    }
    debug!(bytes = body.len(), "Genre upload received");

    let decision = state
        .classifier
        .classify(&AudioInput::from_bytes(body))
        .await?;

    Ok(Json(GenreResponse {
        genre: decision.genre,
    }))
}

/// GET {genre}?file=<name>
///
/// Classifies a file already present in the audio directory.
pub async fn classify_stored(
    State(state): State<AppState>,
    Query(query): Query<StoredFileQuery>,
) -> ApiResult<Json<GenreResponse>> {
    let name = query
        .file
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing 'file' query parameter".to_string()))?;

    let path = resolve_stored_file(&state.audio_dir, &name)?;
    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(ApiError::NotFound(format!("Audio file not found: {}", name)));
    }

    let decision = state.classifier.classify(&AudioInput::from_path(path)).await?;

    Ok(Json(GenreResponse {
        genre: decision.genre,
    }))
}

/// Join a client-supplied name onto the audio directory
///
/// Only plain relative names are accepted; anything that could leave the
/// directory (absolute paths, `..`, drive prefixes) is rejected.
pub fn resolve_stored_file(audio_dir: &Path, name: &str) -> ApiResult<PathBuf> {
    let relative = Path::new(name);
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    let has_name = relative.components().any(|c| matches!(c, Component::Normal(_)));

    if !plain || !has_name {
        return Err(ApiError::BadRequest(format!("Invalid file name: {}", name)));
    }

    Ok(audio_dir.join(relative))
}
