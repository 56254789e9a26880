//! Audio tagging seam
//!
//! The tagging model itself runs outside this crate. [`AudioTagger`] is the
//! narrow interface the genre pipeline needs: given audio and one model
//! variant, return the top-N tags, most confident first.
//!
//! Raw uploads and stored files share the same interface through
//! [`AudioInput`]. A tagger that needs a file on disk turns an upload into
//! one in [`AudioTagger::prepare`], once per classification.

pub mod command;

pub use command::CommandTagger;

use crate::vote::{RankedTagList, VoteError};
use async_trait::async_trait;
use axum::body::Bytes;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Tagging model variants (architecture × training corpus)
///
/// Declaration order is the order in which their lists are voted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelVariant {
    MsdMusicnn,
    MsdVgg,
    MttMusicnn,
    MttVgg,
}

impl ModelVariant {
    /// All variants in voting order
    pub const ALL: [ModelVariant; 4] = [
        ModelVariant::MsdMusicnn,
        ModelVariant::MsdVgg,
        ModelVariant::MttMusicnn,
        ModelVariant::MttVgg,
    ];

    /// Model name understood by the tagging tool
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::MsdMusicnn => "MSD_musicnn",
            ModelVariant::MsdVgg => "MSD_vgg",
            ModelVariant::MttMusicnn => "MTT_musicnn",
            ModelVariant::MttVgg => "MTT_vgg",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio to classify
#[derive(Debug, Clone)]
pub enum AudioInput {
    /// Raw file contents, e.g. an HTTP upload
    Bytes(Bytes),
    /// Audio file already on disk
    Path(PathBuf),
}

impl AudioInput {
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        AudioInput::Bytes(data.into())
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        AudioInput::Path(path.into())
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            AudioInput::Bytes(data) => format!("upload ({} bytes)", data.len()),
            AudioInput::Path(path) => path.display().to_string(),
        }
    }
}

/// Tagger errors
#[derive(Debug, Error)]
pub enum TaggerError {
    /// Tagging program not found
    #[error("Tagger binary not found: {0}")]
    BinaryNotFound(String),

    /// Failed to start or wait for the tagging program
    #[error("Failed to execute tagger: {0}")]
    ExecutionError(String),

    /// Tagging program exited with an error
    #[error("Tagging failed for {variant}: {message}")]
    AnalysisFailed {
        variant: ModelVariant,
        message: String,
    },

    /// Tagger output could not be parsed
    #[error("Failed to parse tagger output: {0}")]
    ParseError(String),

    /// Tagger output parsed but is not a list of tags
    #[error(transparent)]
    InvalidOutput(#[from] VoteError),

    /// Audio file missing
    #[error("Audio file not found: {0}")]
    FileNotFound(String),

    /// Tagging took longer than the configured timeout
    #[error("Tagger timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error (temp file write/remove)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Upload written to a temporary file
///
/// Call [`SpooledFile::remove`] when done; dropping it instead removes the
/// file on a blocking thread.
#[derive(Debug)]
pub struct SpooledFile {
    path: Option<PathBuf>,
}

impl SpooledFile {
    /// Write `data` to a fresh uniquely named file in `dir`
    pub async fn write(dir: &Path, data: &[u8]) -> Result<Self, TaggerError> {
        let path = dir.join(format!("ytdl_upload_{}.audio", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, data).await?;
        Ok(Self { path: Some(path) })
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    pub async fn remove(mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), "Failed to remove spooled upload: {}", e);
            }
        }
    }
}

fn remove_spooled(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), "Failed to remove spooled upload: {}", e);
    }
}

impl Drop for SpooledFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn_blocking(move || remove_spooled(&path));
                }
                Err(_) => remove_spooled(&path),
            }
        }
    }
}

/// Audio ready to be tagged by every model variant
#[derive(Debug)]
pub struct PreparedAudio {
    input: AudioInput,
    spool: Option<SpooledFile>,
}

impl PreparedAudio {
    /// Input used as is
    pub fn new(input: AudioInput) -> Self {
        Self { input, spool: None }
    }

    /// Upload that now lives in `spool`
    pub fn spooled(spool: SpooledFile) -> Self {
        Self {
            input: AudioInput::Path(spool.path().to_path_buf()),
            spool: Some(spool),
        }
    }

    pub fn input(&self) -> &AudioInput {
        &self.input
    }

    /// Remove any temporary file backing the input
    pub async fn release(mut self) {
        if let Some(spool) = self.spool.take() {
            spool.remove().await;
        }
    }
}

/// Top-N tag prediction for one model variant
#[async_trait]
pub trait AudioTagger: Send + Sync {
    /// Tagger name for logs
    fn name(&self) -> &'static str;

    /// Turn the input into the form `top_tags` will be called with
    ///
    /// Runs once per classification, before the per-variant calls.
    async fn prepare(&self, input: &AudioInput) -> Result<PreparedAudio, TaggerError> {
        Ok(PreparedAudio::new(input.clone()))
    }

    /// Return at most `top_n` tags, most confident first
    async fn top_tags(
        &self,
        input: &AudioInput,
        variant: ModelVariant,
        top_n: usize,
    ) -> Result<RankedTagList, TaggerError>;
}
