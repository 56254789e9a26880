//! Integration tests for configuration loading and resolution
//!
//! Tests that manipulate YTDL_CONFIG are marked with #[serial] so they do not
//! race each other.

use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;
use ytdl_common::config::{
    load_service_config, resolve_config_source, ConfigSource, ServiceConfig, CONFIG_ENV_VAR,
};

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Should write config file");
    path
}

#[test]
#[serial]
fn test_cli_argument_has_highest_priority() {
    let dir = TempDir::new().unwrap();
    let cli = write_config(&dir, "cli.toml", "[ports]\ngenre = 9001\n");
    let envf = write_config(&dir, "env.toml", "[ports]\ngenre = 9002\n");
    env::set_var(CONFIG_ENV_VAR, &envf);

    let loaded = load_service_config(Some(&cli)).unwrap();

    assert_eq!(loaded.source, ConfigSource::CommandLine(cli.clone()));
    assert_eq!(loaded.config.ports.genre, 9001);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_environment_variable_used_without_cli() {
    let dir = TempDir::new().unwrap();
    let envf = write_config(&dir, "env.toml", "[genre]\ncase_sensitive = false\n");
    env::set_var(CONFIG_ENV_VAR, &envf);

    let loaded = load_service_config(None).unwrap();

    assert_eq!(loaded.source, ConfigSource::Environment(envf.clone()));
    assert!(!loaded.config.genre.case_sensitive);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = resolve_config_source(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("not found"));

    env::set_var(CONFIG_ENV_VAR, &missing);
    let err = resolve_config_source(None).unwrap_err();
    assert!(err.to_string().contains(CONFIG_ENV_VAR));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_full_config_file_round_trips_through_loader() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "config.toml",
        r#"
host = "127.0.0.1"

[ports]
genre = 8181
music_api = 8182

[endpoints]
genre = "/api/genre"
meta = "/api/meta"
playlist = "/api/playlist"
kill = "/api/kill"

[concurrency]
genre = 2

[genre]
top_n = 7
case_sensitive = false
preferred = ["rock", "jazz"]
audio_dir = "/srv/audio"
max_upload_mb = 16

[tagger]
program = "/usr/local/bin/tagger"
args = ["--quiet"]
timeout_secs = 60

[music_api]
upstream_url = "http://bridge:9000"
timeout_secs = 5

[logging]
level = "debug"
"#,
    );

    let config = ServiceConfig::load(&path).unwrap();

    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.endpoints.playlist, "/api/playlist");
    assert_eq!(config.concurrency.genre, 2);
    assert_eq!(config.genre.top_n, 7);
    assert_eq!(
        config.genre.preferred,
        Some(vec!["rock".to_string(), "jazz".to_string()])
    );
    assert_eq!(config.tagger.args, vec!["--quiet".to_string()]);
    assert_eq!(config.music_api.upstream_url, "http://bridge:9000");
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_invalid_file_reports_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "bad.toml", "[genre]\ntop_n = 500\n");

    let err = ServiceConfig::load(&path).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}

#[test]
fn test_shipped_sample_config_matches_defaults() {
    let sample = include_str!("../../config/config.toml");

    let config = ServiceConfig::from_toml_str(sample).unwrap();

    assert_eq!(config, ServiceConfig::default());
}
