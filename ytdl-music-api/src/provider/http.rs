//! HTTP metadata provider
//!
//! Talks to a metadata bridge exposing `GET {base}/song/{id}` and
//! `GET {base}/playlist/{id}` in the music service's native JSON shapes.
//! The id always travels as one escaped path segment.

use super::{MetadataProvider, PlaylistResponse, ProviderError, SongResponse, TrackMeta, TrackRef};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;
use ytdl_common::config::MusicApiConfig;

const USER_AGENT: &str = concat!("ytdl-music-api/", env!("CARGO_PKG_VERSION"));

/// Metadata provider backed by an HTTP bridge
pub struct HttpMetadataProvider {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpMetadataProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidUrl(base_url.to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn from_config(config: &MusicApiConfig) -> Result<Self, ProviderError> {
        Self::new(&config.upstream_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `{base}/{kind}/{id}` with `id` percent-encoded as a single segment
    pub fn endpoint(&self, kind: &str, id: &str) -> Result<Url, ProviderError> {
        // Dot segments are dropped by the URL serializer
        if id.is_empty() || id == "." || id == ".." {
            return Err(ProviderError::InvalidId(id.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(kind)
            .push(id);
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<T, ProviderError> {
        let url = self.endpoint(kind, id)?;

        tracing::debug!(id = %id, url = %url, "Querying metadata upstream");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(format!("{} {}", kind, id)));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream(status.as_u16(), error_text));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl MetadataProvider for HttpMetadataProvider {
    async fn get_track(&self, id: &str) -> Result<TrackMeta, ProviderError> {
        let song: SongResponse = self.fetch("song", id).await?;
        let meta = TrackMeta::try_from(song)?;

        tracing::info!(
            id = %id,
            title = %meta.title,
            author = %meta.author,
            "Track metadata fetched"
        );

        Ok(meta)
    }

    async fn get_playlist(&self, id: &str) -> Result<Vec<TrackRef>, ProviderError> {
        let playlist: PlaylistResponse = self.fetch("playlist", id).await?;
        let total = playlist.tracks.len();
        let tracks = playlist.into_track_refs();

        if tracks.len() < total {
            tracing::debug!(
                id = %id,
                skipped = total - tracks.len(),
                "Playlist entries without video id skipped"
            );
        }
        tracing::info!(id = %id, tracks = tracks.len(), "Playlist fetched");

        Ok(tracks)
    }
}
