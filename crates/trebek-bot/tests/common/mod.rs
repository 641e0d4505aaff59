//! Shared test helpers for status route integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use trebek_core::rng::DeterministicRng;
use trebek_core::scoreboard::ScoreStore;
use trebek_game::application::buffer::{DEFAULT_TARGET, QuestionBuffer};
use trebek_game::application::engine::RoundEngine;
use trebek_store::InMemoryScoreboard;
use trebek_test_support::{MockRng, ScriptedQuestionSource, questions};

use trebek_bot::routes;
use trebek_bot::state::AppState;

/// Engine over a scripted source with deterministic selection.
pub fn engine(answers: &[&str]) -> Arc<RoundEngine> {
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(MockRng));
    let buffer = Arc::new(QuestionBuffer::new(
        Box::new(ScriptedQuestionSource::new(questions(answers))),
        Arc::clone(&rng),
        DEFAULT_TARGET,
    ));
    Arc::new(RoundEngine::new(buffer, rng, 2))
}

/// Build the full app router over the given engine and score store. Uses the
/// same route structure as `main.rs`.
pub fn build_test_app(engine: Arc<RoundEngine>, scores: Arc<dyn ScoreStore>) -> Router {
    routes::app(AppState::new(engine, scores))
}

/// Build the app with an empty engine and scoreboard.
pub fn build_empty_app() -> Router {
    build_test_app(engine(&[]), Arc::new(InMemoryScoreboard::new()))
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    // Extractor rejections are plain text.
    let json: serde_json::Value =
        serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}
