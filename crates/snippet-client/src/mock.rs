//! Recording backend for tests.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use snippet_core::error::AppError;
use snippet_core::result::AppResult;

use crate::backend::AssignmentBackend;
use crate::types::{ExecuteRequest, ExecuteResponse, PreviewRequest};

/// How the mock answers a given batch.
#[derive(Debug, Clone)]
enum Failure {
    /// Reply `success: false`.
    Rejected,
    /// Return a transport-style error.
    Error(String),
}

/// An [`AssignmentBackend`] that records every call and answers from
/// configuration.
///
/// By default every batch succeeds with `{processed: <batch len>}`.
#[derive(Debug, Default)]
pub struct MockAssignmentBackend {
    executed: Mutex<Vec<ExecuteRequest>>,
    previewed: Mutex<Vec<PreviewRequest>>,
    fail_at: Option<(usize, Failure)>,
    processed_per_batch: Option<u64>,
    delay: Option<Duration>,
    preview_reply: Option<serde_json::Value>,
}

impl MockAssignmentBackend {
    /// A backend where every batch succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply `success: false` to the `batch`-th call (1-based).
    pub fn rejecting_batch(mut self, batch: usize) -> Self {
        self.fail_at = Some((batch, Failure::Rejected));
        self
    }

    /// Fail the `batch`-th call (1-based) with an external-service error.
    pub fn failing_batch(mut self, batch: usize, message: impl Into<String>) -> Self {
        self.fail_at = Some((batch, Failure::Error(message.into())));
        self
    }

    /// Report `processed` for every batch instead of the batch length.
    pub fn processed_per_batch(mut self, processed: u64) -> Self {
        self.processed_per_batch = Some(processed);
        self
    }

    /// Sleep before answering each execute call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer previews with `reply`; without one previews fail.
    pub fn with_preview(mut self, reply: serde_json::Value) -> Self {
        self.preview_reply = Some(reply);
        self
    }

    /// Execute requests received so far.
    pub async fn executed(&self) -> Vec<ExecuteRequest> {
        self.executed.lock().await.clone()
    }

    /// Preview requests received so far.
    pub async fn previewed(&self) -> Vec<PreviewRequest> {
        self.previewed.lock().await.clone()
    }
}

#[async_trait]
impl AssignmentBackend for MockAssignmentBackend {
    async fn execute(&self, request: &ExecuteRequest, _timeout: Duration) -> AppResult<ExecuteResponse> {
        let call = {
            let mut executed = self.executed.lock().await;
            executed.push(request.clone());
            executed.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.fail_at {
            Some((batch, Failure::Rejected)) if *batch == call => Ok(ExecuteResponse {
                success: false,
                results: None,
            }),
            Some((batch, Failure::Error(message))) if *batch == call => {
                Err(AppError::external_service(message.clone()))
            }
            _ => {
                let processed = self
                    .processed_per_batch
                    .unwrap_or(request.assignments.len() as u64);
                Ok(ExecuteResponse::ok(serde_json::json!({
                    "processed": processed,
                    "failed": 0,
                    "errors": [],
                })))
            }
        }
    }

    async fn preview(&self, request: &PreviewRequest) -> AppResult<serde_json::Value> {
        self.previewed.lock().await.push(request.clone());
        self.preview_reply
            .clone()
            .ok_or_else(|| AppError::external_service("Failed to preview assignment"))
    }

    fn base_url(&self) -> &str {
        "http://mock-backend"
    }
}
