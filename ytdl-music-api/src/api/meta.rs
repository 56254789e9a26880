//! Track metadata endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use super::IdQuery;
use crate::error::ApiResult;
use crate::provider::TrackMeta;
use crate::AppState;

/// GET {meta}?id=<video id>
///
/// Returns `{title, author, image, type}` for one track.
pub async fn get_meta(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<TrackMeta>> {
    let id = query.require()?;
    let meta = state.provider.get_track(&id).await?;
    Ok(Json(meta))
}
