//! Integration tests for ytdl-genre API endpoints
//!
//! Tests cover:
//! - Genre classification from uploaded bytes and from stored files
//! - Error mapping (empty upload, no tags, tagger failure, bad file names)
//! - Kill endpoint and health endpoint
//! - Unknown paths

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method
use ytdl_common::config::ServiceConfig;
use ytdl_common::ShutdownHandle;
use ytdl_genre::classifier::GenreClassifier;
use ytdl_genre::tagger::{AudioInput, AudioTagger, ModelVariant, TaggerError};
use ytdl_genre::vote::{GenreVoteConfig, RankedTagList};
use ytdl_genre::{build_router, AppState, GenreRoutes};

/// Tagger returning canned lists and recording what it was asked to tag
struct StubTagger {
    lists: HashMap<ModelVariant, Vec<&'static str>>,
    fail_with_timeout: bool,
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl AudioTagger for StubTagger {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn top_tags(
        &self,
        input: &AudioInput,
        variant: ModelVariant,
        _top_n: usize,
    ) -> Result<RankedTagList, TaggerError> {
        self.seen.lock().unwrap().push(input.describe());
        if self.fail_with_timeout {
            return Err(TaggerError::Timeout(std::time::Duration::from_secs(1)));
        }
        Ok(self.lists.get(&variant).cloned().unwrap_or_default().into())
    }
}

struct TestApp {
    app: axum::Router,
    tagger: Arc<StubTagger>,
    shutdown: ShutdownHandle,
    audio_dir: TempDir,
}

fn setup_app(lists: Vec<(ModelVariant, Vec<&'static str>)>, fail_with_timeout: bool) -> TestApp {
    let tagger = Arc::new(StubTagger {
        lists: lists.into_iter().collect(),
        fail_with_timeout,
        seen: Mutex::new(Vec::new()),
    });
    let audio_dir = TempDir::new().unwrap();
    let shutdown = ShutdownHandle::new();

    let config = ServiceConfig::default();
    let classifier = GenreClassifier::new(
        tagger.clone(),
        GenreVoteConfig::from_genre_config(&config.genre),
        config.concurrency.genre,
    );
    let state = AppState::new(classifier, audio_dir.path().to_path_buf(), shutdown.clone());
    let app = build_router(state, &GenreRoutes::from_config(&config));

    TestApp {
        app,
        tagger,
        shutdown,
        audio_dir,
    }
}

fn rock_lists() -> Vec<(ModelVariant, Vec<&'static str>)> {
    vec![
        (ModelVariant::MsdMusicnn, vec!["guitar", "rock", "male vocal"]),
        (ModelVariant::MsdVgg, vec!["guitar", "rock"]),
        (ModelVariant::MttMusicnn, vec!["guitar", "loud"]),
        (ModelVariant::MttVgg, vec!["rock"]),
    ]
}

async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.expect("Should read body").to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn extract_text(body: Body) -> String {
    let bytes = body.collect().await.expect("Should read body").to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}

// =============================================================================
// Upload form
// =============================================================================

#[tokio::test]
async fn test_upload_returns_preferred_genre() {
    let test = setup_app(rock_lists(), false);

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/genre")
                .body(Body::from(vec![0u8; 128]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["genre"], "Rock");

    let seen = test.tagger.seen.lock().unwrap();
    assert_eq!(seen.len(), 4);
    assert!(seen.iter().all(|s| s == "upload (128 bytes)"));
}

#[tokio::test]
async fn test_empty_upload_rejected() {
    let test = setup_app(rock_lists(), false);

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/genre")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(test.tagger.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_no_tags_from_any_model_is_422() {
    let test = setup_app(vec![], false);

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/genre")
                .body(Body::from("audio"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NO_RESULT");
}

#[tokio::test]
async fn test_tagger_timeout_is_504() {
    let test = setup_app(rock_lists(), true);

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/genre")
                .body(Body::from("audio"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

// =============================================================================
// Stored-file form
// =============================================================================

#[tokio::test]
async fn test_stored_file_is_classified() {
    let test = setup_app(rock_lists(), false);
    let file = test.audio_dir.path().join("song.mp3");
    std::fs::write(&file, b"ID3").unwrap();

    let response = test
        .app
        .oneshot(
            Request::builder()
                .uri("/genre?file=song.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["genre"], "Rock");

    let seen = test.tagger.seen.lock().unwrap();
    assert_eq!(seen[0], file.display().to_string());
}

#[tokio::test]
async fn test_stored_file_missing_is_404() {
    let test = setup_app(rock_lists(), false);

    let response = test
        .app
        .oneshot(
            Request::builder()
                .uri("/genre?file=absent.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_stored_directory_is_404() {
    let test = setup_app(rock_lists(), false);
    std::fs::create_dir(test.audio_dir.path().join("album")).unwrap();

    let response = test
        .app
        .oneshot(
            Request::builder()
                .uri("/genre?file=album")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(test.tagger.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_stored_file_traversal_rejected() {
    let test = setup_app(rock_lists(), false);

    let response = test
        .app
        .oneshot(
            Request::builder()
                .uri("/genre?file=..%2F..%2Fetc%2Fpasswd")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stored_file_requires_name() {
    let test = setup_app(rock_lists(), false);

    let response = test
        .app
        .oneshot(Request::builder().uri("/genre").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Lifecycle and misc routes
// =============================================================================

#[tokio::test]
async fn test_kill_triggers_shutdown() {
    let test = setup_app(rock_lists(), false);

    let response = test
        .app
        .oneshot(Request::builder().uri("/kill").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_text(response.into_body()).await, "Server is shutting down...");
    assert!(test.shutdown.is_triggered());
}

#[tokio::test]
async fn test_health_endpoint() {
    let test = setup_app(rock_lists(), false);

    let response = test
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "ytdl-genre");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_number());
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let test = setup_app(rock_lists(), false);

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .body(Body::from("audio"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(extract_text(response.into_body()).await, "Not Found");
}

#[test]
fn test_upload_limit_saturates_instead_of_overflowing() {
    let mut config = ServiceConfig::default();
    config.genre.max_upload_mb = usize::MAX;

    assert_eq!(GenreRoutes::from_config(&config).max_upload_bytes, usize::MAX);

    config.genre.max_upload_mb = 2;
    assert_eq!(GenreRoutes::from_config(&config).max_upload_bytes, 2 * 1024 * 1024);
}
