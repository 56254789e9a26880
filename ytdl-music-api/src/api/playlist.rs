//! Playlist expansion endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::IdQuery;
use crate::error::ApiResult;
use crate::provider::TrackRef;
use crate::AppState;

/// Playlist response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistBody {
    pub tracks: Vec<TrackRef>,
}

/// GET {playlist}?id=<playlist id>
///
/// Returns the playlist's track ids in order.
pub async fn get_playlist(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<PlaylistBody>> {
    let id = query.require()?;
    let tracks = state.provider.get_playlist(&id).await?;
    Ok(Json(PlaylistBody { tracks }))
}
