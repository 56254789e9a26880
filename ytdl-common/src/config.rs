//! Configuration loading and config file resolution
//!
//! All services read one shared TOML file. Every section and key has a
//! built-in default, so a partial file (or no file at all) still yields a
//! usable configuration.
//!
//! # Resolution priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`YTDL_CONFIG`)
//! 3. `./config/config.toml` in the working directory
//! 4. `<user config dir>/ytdl/config.toml`
//! 5. Built-in defaults
//!
//! An explicitly requested file (1 or 2) that does not exist is an error.
//! The implicit locations (3 and 4) are skipped when absent.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "YTDL_CONFIG";

/// Config file looked up relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Largest accepted `genre.top_n`
pub const MAX_TOP_N: usize = 50;

/// Largest accepted `genre.max_upload_mb`
pub const MAX_UPLOAD_MB: usize = 4096;

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bind address shared by all services
    pub host: String,
    pub ports: PortsConfig,
    pub endpoints: EndpointsConfig,
    pub concurrency: ConcurrencyConfig,
    pub genre: GenreConfig,
    pub tagger: TaggerConfig,
    pub music_api: MusicApiConfig,
    pub logging: LoggingConfig,
}

/// Listening port per service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    pub genre: u16,
    #[serde(alias = "musicAPI")]
    pub music_api: u16,
}

/// Route paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub genre: String,
    pub meta: String,
    pub playlist: String,
    pub kill: String,
}

/// Concurrency limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Maximum number of genre classifications running at once
    pub genre: usize,
}

/// Genre voting and genre service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenreConfig {
    /// Number of tags requested from each model variant
    pub top_n: usize,
    /// Exact-match membership check against the preferred genre list
    pub case_sensitive: bool,
    /// Preferred genre list override (built-in list when absent)
    pub preferred: Option<Vec<String>>,
    /// Directory holding stored audio files for the by-name lookup
    pub audio_dir: PathBuf,
    /// Upload size limit in megabytes
    pub max_upload_mb: usize,
}

/// External tagging command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Program invoked once per model variant
    pub program: String,
    /// Extra arguments placed before the generated ones
    pub args: Vec<String>,
    /// Per-invocation timeout in seconds
    pub timeout_secs: u64,
}

/// Upstream metadata provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicApiConfig {
    /// Base URL of the metadata/playlist bridge
    pub upstream_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), overridden by RUST_LOG
    pub level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            ports: PortsConfig::default(),
            endpoints: EndpointsConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            genre: GenreConfig::default(),
            tagger: TaggerConfig::default(),
            music_api: MusicApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            genre: 8081,
            music_api: 8082,
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            genre: "/genre".to_string(),
            meta: "/meta".to_string(),
            playlist: "/playlist".to_string(),
            kill: "/kill".to_string(),
        }
    }
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self { genre: 1 }
    }
}

impl Default for GenreConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            case_sensitive: true,
            preferred: None,
            audio_dir: PathBuf::from("downloads"),
            max_upload_mb: 64,
        }
    }
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            program: "musicnn-tagger".to_string(),
            args: Vec::new(),
            timeout_secs: 300,
        }
    }
}

impl Default for MusicApiConfig {
    fn default() -> Self {
        Self {
            upstream_url: "http://127.0.0.1:9000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ServiceConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check value ranges and route consistency
    pub fn validate(&self) -> Result<()> {
        if self.genre.top_n == 0 || self.genre.top_n > MAX_TOP_N {
            return Err(Error::Config(format!(
                "genre.top_n must be between 1 and {}, got {}",
                MAX_TOP_N, self.genre.top_n
            )));
        }
        if self.ports.genre == 0 || self.ports.music_api == 0 {
            return Err(Error::Config("ports must be non-zero".to_string()));
        }
        if self.concurrency.genre == 0 {
            return Err(Error::Config("concurrency.genre must be at least 1".to_string()));
        }
        if self.genre.max_upload_mb == 0 || self.genre.max_upload_mb > MAX_UPLOAD_MB {
            return Err(Error::Config(format!(
                "genre.max_upload_mb must be between 1 and {}, got {}",
                MAX_UPLOAD_MB, self.genre.max_upload_mb
            )));
        }
        if self.tagger.program.trim().is_empty() {
            return Err(Error::Config("tagger.program must not be empty".to_string()));
        }
        if self.tagger.timeout_secs == 0 || self.music_api.timeout_secs == 0 {
            return Err(Error::Config("timeouts must be at least 1 second".to_string()));
        }

        let routes = [
            ("genre", &self.endpoints.genre),
            ("meta", &self.endpoints.meta),
            ("playlist", &self.endpoints.playlist),
            ("kill", &self.endpoints.kill),
        ];
        for (name, path) in routes {
            if !path.starts_with('/') || path.len() < 2 {
                return Err(Error::Config(format!(
                    "endpoints.{} must be an absolute path like \"/{}\", got {:?}",
                    name, name, path
                )));
            }
            if path == "/health" {
                return Err(Error::Config(format!("endpoints.{} collides with /health", name)));
            }
        }
        if self.endpoints.genre == self.endpoints.kill {
            return Err(Error::Config("endpoints.genre and endpoints.kill must differ".to_string()));
        }
        let music_routes = [&self.endpoints.meta, &self.endpoints.playlist, &self.endpoints.kill];
        for (i, a) in music_routes.iter().enumerate() {
            if music_routes[i + 1..].contains(a) {
                return Err(Error::Config(format!("endpoint {} is configured twice", a)));
            }
        }

        Ok(())
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    WorkingDirectory(PathBuf),
    UserConfigDir(PathBuf),
    Defaults,
}

impl ConfigSource {
    /// File backing this source, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::WorkingDirectory(p)
            | ConfigSource::UserConfigDir(p) => Some(p),
            ConfigSource::Defaults => None,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::CommandLine(p) => write!(f, "command line ({})", p.display()),
            ConfigSource::Environment(p) => {
                write!(f, "{} ({})", CONFIG_ENV_VAR, p.display())
            }
            ConfigSource::WorkingDirectory(p) => write!(f, "working directory ({})", p.display()),
            ConfigSource::UserConfigDir(p) => write!(f, "user config dir ({})", p.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Configuration together with its origin
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ServiceConfig,
    pub source: ConfigSource,
}

/// Pick the config file to use, following the resolution priority
pub fn resolve_config_source(cli_arg: Option<&Path>) -> Result<ConfigSource> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(ConfigSource::CommandLine(path.to_path_buf()));
    }

    // Priority 2: Environment variable
    if let Ok(value) = std::env::var(CONFIG_ENV_VAR) {
        if !value.trim().is_empty() {
            let path = PathBuf::from(value);
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file from {} not found: {}",
                    CONFIG_ENV_VAR,
                    path.display()
                )));
            }
            return Ok(ConfigSource::Environment(path));
        }
    }

    // Priority 3: Working directory
    let local = PathBuf::from(DEFAULT_CONFIG_PATH);
    if local.exists() {
        return Ok(ConfigSource::WorkingDirectory(local));
    }

    // Priority 4: Per-user config directory
    if let Some(user) = dirs::config_dir().map(|d| d.join("ytdl").join("config.toml")) {
        if user.exists() {
            return Ok(ConfigSource::UserConfigDir(user));
        }
    }

    // Priority 5: Built-in defaults
    Ok(ConfigSource::Defaults)
}

/// Resolve and load the service configuration
pub fn load_service_config(cli_arg: Option<&Path>) -> Result<LoadedConfig> {
    let source = resolve_config_source(cli_arg)?;
    let config = match source.path() {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    Ok(LoadedConfig { config, source })
}
