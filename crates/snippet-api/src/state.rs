//! Shared application state threaded through every handler.

use std::sync::Arc;

use snippet_core::config::AppConfig;
use snippet_service::{AssignmentService, BulkAssignmentService};

/// Services reachable from handlers via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Assignment CRUD and synchronous execution.
    pub assignment_service: Arc<AssignmentService>,
    /// Bulk queue front, job status and pipeline health.
    pub bulk_service: Arc<BulkAssignmentService>,
}
