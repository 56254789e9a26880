//! Track metadata and playlist providers
//!
//! Upstream responses arrive in the music service's native shape
//! (`videoDetails`, `tracks[].videoId`) and are reduced here to the small
//! records the downloader consumes.

mod http;

pub use http::HttpMetadataProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Not found upstream: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream error {0}: {1}")]
    Upstream(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Id that cannot be used as a single upstream path segment
    #[error("Invalid id: {0:?}")]
    InvalidId(String),

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),
}

/// Kind of video backing a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    /// Audio track video (album art over the studio recording)
    Atv,
    /// Official music video and everything else
    Omv,
}

impl VideoType {
    /// Classify an upstream `musicVideoType` value
    pub fn from_music_video_type(raw: &str) -> Self {
        if raw.to_lowercase().contains("atv") {
            VideoType::Atv
        } else {
            VideoType::Omv
        }
    }
}

/// Track metadata served by the meta route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMeta {
    pub title: String,
    pub author: String,
    /// Largest available thumbnail
    pub image: String,
    #[serde(rename = "type")]
    pub video_type: VideoType,
}

/// Playlist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    pub id: String,
}

/// Upstream song lookup response
#[derive(Debug, Clone, Deserialize)]
pub struct SongResponse {
    #[serde(rename = "videoDetails")]
    pub video_details: VideoDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoDetails {
    pub title: String,
    pub author: String,
    #[serde(rename = "musicVideoType", default)]
    pub music_video_type: String,
    pub thumbnail: ThumbnailSet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailSet {
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// Upstream playlist lookup response
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistResponse {
    #[serde(default)]
    pub tracks: Vec<PlaylistTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrack {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

impl TryFrom<SongResponse> for TrackMeta {
    type Error = ProviderError;

    fn try_from(song: SongResponse) -> Result<Self, Self::Error> {
        let details = song.video_details;
        // Thumbnails are listed smallest first
        let image = details
            .thumbnail
            .thumbnails
            .last()
            .map(|t| t.url.clone())
            .ok_or_else(|| ProviderError::Parse("videoDetails has no thumbnails".to_string()))?;

        Ok(TrackMeta {
            title: details.title,
            author: details.author,
            image,
            video_type: VideoType::from_music_video_type(&details.music_video_type),
        })
    }
}

impl PlaylistResponse {
    /// Track references in playlist order, skipping entries with no video
    pub fn into_track_refs(self) -> Vec<TrackRef> {
        self.tracks
            .into_iter()
            .filter_map(|t| t.video_id)
            .filter(|id| !id.is_empty())
            .map(|id| TrackRef { id })
            .collect()
    }
}

/// Source of track metadata and playlist contents
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn get_track(&self, id: &str) -> Result<TrackMeta, ProviderError>;

    async fn get_playlist(&self, id: &str) -> Result<Vec<TrackRef>, ProviderError>;
}
