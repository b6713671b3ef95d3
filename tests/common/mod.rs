//! Shared utilities for integration tests.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use chatbot_config::admin::{setup_router, AppState};
use chatbot_config::config::{ConfigPaths, Settings};
use chatbot_config::observability::LogLevelHandle;

pub const TEST_KEY: &str = "test-admin-key";

/// A bot root with every config file seeded from defaults.
pub struct TestRoot {
    pub dir: TempDir,
    pub settings: Arc<Settings>,
}

pub fn seeded_root() -> TestRoot {
    let dir = TempDir::new().unwrap();
    let paths = ConfigPaths::new(dir.path());
    paths.seed_defaults().unwrap();
    let settings = Arc::new(Settings::open(paths).unwrap());
    TestRoot { dir, settings }
}

/// Router with fixed secrets, independent of the process environment.
#[allow(dead_code)]
pub fn app(settings: Arc<Settings>, ws_auth_key: Option<&str>) -> Router {
    setup_router(AppState {
        settings,
        log_level: LogLevelHandle::detached(),
        auth_key: TEST_KEY.to_string(),
        ws_auth_key: ws_auth_key.map(str::to_string),
    })
}

#[allow(dead_code)]
pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Send one request and decode the body as JSON (or a JSON string for text).
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}
