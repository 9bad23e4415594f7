//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use snippet_api::{build_app, build_pipeline};
use snippet_cache::CacheManager;
use snippet_client::mock::MockAssignmentBackend;
use snippet_core::config::AppConfig;
use snippet_database::MemoryAssignmentStore;
use snippet_worker::QueueWorker;

/// User id sent by default in `X-User-Id`.
pub const EDITOR: &str = "editor-1";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Assignment rows and history
    pub store: Arc<MemoryAssignmentStore>,
    /// Recording execution service
    pub backend: Arc<MockAssignmentBackend>,
    /// The queue consumer, stopped until a test starts it
    pub worker: Arc<QueueWorker>,
}

impl TestApp {
    /// Create a test application whose execution service accepts everything
    pub fn new() -> Self {
        Self::with_backend(MockAssignmentBackend::new())
    }

    /// Create a test application around a configured execution service
    pub fn with_backend(backend: MockAssignmentBackend) -> Self {
        let mut config = AppConfig::default();
        config.worker.poll_timeout_seconds = 1;
        config.worker.error_backoff_ms = 50;

        let store = Arc::new(MemoryAssignmentStore::new());
        let backend = Arc::new(backend);
        let cache = Arc::new(CacheManager::in_memory());
        let pipeline = build_pipeline(
            Arc::new(config),
            store.clone(),
            Arc::clone(&cache),
            cache,
            backend.clone(),
        );

        Self {
            router: build_app(pipeline.state),
            store,
            backend,
            worker: pipeline.worker,
        }
    }

    /// Send a request, optionally as `user`
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        user: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(user) = user {
            req = req.header("X-User-Id", user);
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Poll a job until it reaches `state` or give up after two seconds
    pub async fn wait_for_job(&self, assignment_id: &str, state: &str) -> Value {
        let path = format!("/api/assignment/{assignment_id}/status");
        for _ in 0..200 {
            let response = self.request("GET", &path, None, None).await;
            if response.status == StatusCode::OK && response.body["status"] == state {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {assignment_id} never reached {state}");
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// A valid request body assigning `slugs` under `league` to `snippet_id`
pub fn assignment_body(snippet_id: &str, slugs: &[&str]) -> Value {
    serde_json::json!({
        "snippetId": snippet_id,
        "assignments": [{ "catType": "league", "slugs": slugs }],
        "categoryTypes": ["league"],
        "snippetVariationTypes": ["SLIM"],
        "locale": "en-GB",
    })
}
