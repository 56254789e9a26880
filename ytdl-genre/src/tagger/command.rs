//! External command tagger
//!
//! Runs the tagging tool once per model variant:
//!
//! ```text
//! <program> [args..] --model <variant> --top-n <N> <audio file>
//! ```
//!
//! The tool prints a JSON array of tag strings on stdout, most confident
//! first. Uploaded bytes are spooled to a temporary file once in
//! [`AudioTagger::prepare`] and shared by all variant runs.

use super::{AudioInput, AudioTagger, ModelVariant, PreparedAudio, SpooledFile, TaggerError};
use crate::vote::{RankedTagList, VoteError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use ytdl_common::config::TaggerConfig;

/// Tagger backed by an external program
#[derive(Debug, Clone)]
pub struct CommandTagger {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    spool_dir: PathBuf,
}

impl CommandTagger {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            spool_dir: std::env::temp_dir(),
        }
    }

    pub fn from_config(config: &TaggerConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Directory for spooled uploads (system temp dir by default)
    pub fn with_spool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = dir.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Verify the program can be started
    pub async fn check_available(&self) -> Result<(), TaggerError> {
        let mut command = Command::new(&self.program);
        command.arg("--help").kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => Err(TaggerError::Timeout(self.timeout)),
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TaggerError::BinaryNotFound(self.program.clone()))
            }
            Ok(Err(e)) => Err(TaggerError::ExecutionError(e.to_string())),
        }
    }

    async fn ensure_file(path: &Path) -> Result<(), TaggerError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => Ok(()),
            _ => Err(TaggerError::FileNotFound(path.display().to_string())),
        }
    }

    async fn run(
        &self,
        audio: &Path,
        variant: ModelVariant,
        top_n: usize,
    ) -> Result<RankedTagList, TaggerError> {
        tracing::debug!(
            program = %self.program,
            audio_file = %audio.display(),
            model = %variant,
            top_n,
            "Running tagger"
        );

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--model")
            .arg(variant.as_str())
            .arg("--top-n")
            .arg(top_n.to_string())
            .arg(audio)
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => return Err(TaggerError::Timeout(self.timeout)),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TaggerError::BinaryNotFound(self.program.clone()))
            }
            Ok(Err(e)) => return Err(TaggerError::ExecutionError(e.to_string())),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TaggerError::AnalysisFailed {
                variant,
                message: format!("Exit code: {:?}, stderr: {}", output.status.code(), stderr.trim()),
            });
        }

        parse_tag_output(&output.stdout, top_n)
    }
}

/// Parse tagger stdout into a ranked list of at most `top_n` tags
pub fn parse_tag_output(stdout: &[u8], top_n: usize) -> Result<RankedTagList, TaggerError> {
    let value: serde_json::Value =
        serde_json::from_slice(stdout).map_err(|e| TaggerError::ParseError(e.to_string()))?;
    let list = RankedTagList::from_json(&value)?;

    if list.len() > top_n {
        return Err(TaggerError::InvalidOutput(VoteError::InvalidInput(format!(
            "tagger returned {} tags, requested {}",
            list.len(),
            top_n
        ))));
    }

    Ok(list)
}

#[async_trait]
impl AudioTagger for CommandTagger {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn prepare(&self, input: &AudioInput) -> Result<PreparedAudio, TaggerError> {
        match input {
            AudioInput::Path(path) => {
                Self::ensure_file(path).await?;
                Ok(PreparedAudio::new(input.clone()))
            }
            AudioInput::Bytes(data) => {
                let spool = SpooledFile::write(&self.spool_dir, data).await?;
                Ok(PreparedAudio::spooled(spool))
            }
        }
    }

    async fn top_tags(
        &self,
        input: &AudioInput,
        variant: ModelVariant,
        top_n: usize,
    ) -> Result<RankedTagList, TaggerError> {
        match input {
            AudioInput::Path(path) => {
                Self::ensure_file(path).await?;
                self.run(path, variant, top_n).await
            }
            AudioInput::Bytes(data) => {
                let spool = SpooledFile::write(&self.spool_dir, data).await?;
                let result = self.run(spool.path(), variant, top_n).await;
                spool.remove().await;
                result
            }
        }
    }
}
