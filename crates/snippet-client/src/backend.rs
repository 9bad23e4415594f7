//! Assignment execution seam.

use std::time::Duration;

use async_trait::async_trait;

use snippet_core::result::AppResult;

use crate::types::{ExecuteRequest, ExecuteResponse, PreviewRequest};

/// The external service that applies assignments.
#[async_trait]
pub trait AssignmentBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Apply one batch of assignments, waiting at most `timeout`.
    ///
    /// A response with `success: false` is returned as `Ok`; callers decide
    /// what it means for their job.
    async fn execute(&self, request: &ExecuteRequest, timeout: Duration) -> AppResult<ExecuteResponse>;

    /// Ask which category pages a set of work items would touch. The
    /// response body is returned untouched.
    async fn preview(&self, request: &PreviewRequest) -> AppResult<serde_json::Value>;

    /// Base URL of the service, for diagnostics.
    fn base_url(&self) -> &str;
}
