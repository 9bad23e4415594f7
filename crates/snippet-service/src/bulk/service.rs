//! Front of the bulk assignment pipeline: enqueue, poll, preview, and the
//! diagnostics around it.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use snippet_cache::keys::HEALTH_PROBE_ID;
use snippet_client::AssignmentBackend;
use snippet_client::locale::normalize_to_backend;
use snippet_client::types::PreviewRequest;
use snippet_core::error::AppError;
use snippet_core::result::AppResult;
use snippet_entity::assignment::WorkItem;
use snippet_entity::job::{AssignmentJobStatus, JobState, new_job_id};
use snippet_worker::{AssignmentQueue, BatchExecutor, BatchOutcome, QueueWorker, StatusStore, WorkerStats};

use crate::context::RequestContext;
use crate::request::{AssignmentRequest, PreviewAssignmentRequest};

/// Reply to an accepted bulk request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedAssignment {
    /// Id to poll the status with.
    pub assignment_id: String,
    /// Always `PENDING`.
    pub status: JobState,
    /// Human-readable outcome.
    pub message: String,
}

/// Summary echoed back by a test-sync run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSyncSummary {
    /// Id the run was executed under.
    pub assignment_id: String,
    /// Always `true`.
    pub use_native_logic: bool,
    /// Category types of the request.
    pub category_types: Vec<String>,
    /// Number of pre-built variations forwarded.
    pub snippet_variations: usize,
}

/// Result of a test-sync run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSyncResult {
    /// Always `true`; failures are errors.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Aggregated batch results.
    pub results: BatchOutcome,
    /// Request summary.
    pub test_data: TestSyncSummary,
}

/// Status store probe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreProbe {
    /// The store answered.
    pub connected: bool,
    /// The probe record was written.
    pub can_write: bool,
    /// The probe record was read back.
    pub can_read: bool,
}

/// Health of the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineHealth {
    /// `healthy` or `unhealthy`.
    pub status: &'static str,
    /// RFC 3339 time of the check.
    pub timestamp: String,
    /// Status store probe.
    pub status_store: StoreProbe,
    /// Queue length and worker flag.
    pub queue: WorkerStats,
    /// Execution service location.
    pub backend: BackendInfo,
    /// Cause when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Execution service location.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendInfo {
    /// Base URL.
    pub base_url: String,
}

/// Result of the execution service probe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendProbe {
    /// `success` or `error`.
    pub status: &'static str,
    /// Base URL probed.
    pub backend_url: String,
    /// Preview reply on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    /// Cause on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// RFC 3339 time of the probe.
    pub timestamp: String,
}

/// Accepts bulk requests and reports on the pipeline.
#[derive(Debug, Clone)]
pub struct BulkAssignmentService {
    /// Job queue.
    queue: AssignmentQueue,
    /// Job status store.
    status: StatusStore,
    /// Batch executor for test-sync runs.
    executor: BatchExecutor,
    /// Execution service client.
    backend: Arc<dyn AssignmentBackend>,
    /// The queue consumer, for stats.
    worker: Arc<QueueWorker>,
}

impl BulkAssignmentService {
    /// Creates a new bulk assignment service.
    pub fn new(
        queue: AssignmentQueue,
        status: StatusStore,
        executor: BatchExecutor,
        backend: Arc<dyn AssignmentBackend>,
        worker: Arc<QueueWorker>,
    ) -> Self {
        Self {
            queue,
            status,
            executor,
            backend,
            worker,
        }
    }

    /// Records a `PENDING` status and queues the job.
    pub async fn enqueue(&self, ctx: &RequestContext, req: AssignmentRequest) -> AppResult<QueuedAssignment> {
        let job = req.into_job(new_job_id("assignment"), &ctx.user_id);

        self.status
            .set_status(&job.assignment_id, &AssignmentJobStatus::pending())
            .await?;
        self.queue.enqueue(&job).await?;

        info!(
            assignment_id = %job.assignment_id,
            snippet_id = %job.snippet_id,
            user_id = %ctx.user_id,
            "Queued bulk assignment"
        );

        Ok(QueuedAssignment {
            assignment_id: job.assignment_id,
            status: JobState::Pending,
            message: "Assignment queued for processing".to_string(),
        })
    }

    /// Current status of a job.
    pub async fn status(&self, assignment_id: &str) -> AppResult<AssignmentJobStatus> {
        self.status
            .get_status(assignment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Assignment {assignment_id} not found")))
    }

    /// Asks the execution service which pages a request would touch.
    pub async fn preview(&self, req: PreviewAssignmentRequest) -> AppResult<serde_json::Value> {
        let request = PreviewRequest {
            assignments: req.assignments,
            category_types: req.category_types,
            locale: normalize_to_backend(&req.locale),
        };
        self.backend.preview(&request).await
    }

    /// Runs a request straight through the batch executor, without the
    /// queue and without touching assignment rows.
    pub async fn test_sync(&self, ctx: &RequestContext, req: AssignmentRequest) -> AppResult<TestSyncResult> {
        let assignment_id = format!("sync_test_{}", Utc::now().timestamp_millis());
        let job = req.into_job(assignment_id, &ctx.user_id);

        let results = self
            .executor
            .execute(&job)
            .await
            .map_err(|e| AppError::external_service(e.to_string()))?;

        Ok(TestSyncResult {
            success: true,
            message: "Synchronous assignment completed".to_string(),
            results,
            test_data: TestSyncSummary {
                assignment_id: job.assignment_id,
                use_native_logic: true,
                category_types: job.category_types,
                snippet_variations: job.snippet_variations.map_or(0, |v| v.len()),
            },
        })
    }

    /// Queue stats plus a write/read probe of the status store.
    pub async fn health(&self) -> PipelineHealth {
        let timestamp = Utc::now().to_rfc3339();
        let backend = BackendInfo {
            base_url: self.backend.base_url().to_string(),
        };

        match self.probe().await {
            Ok((queue, can_read)) => PipelineHealth {
                status: "healthy",
                timestamp,
                status_store: StoreProbe {
                    connected: true,
                    can_write: true,
                    can_read,
                },
                queue,
                backend,
                error: None,
            },
            Err(e) => {
                error!(error = %e, "Assignment pipeline health check failed");
                PipelineHealth {
                    status: "unhealthy",
                    timestamp,
                    status_store: StoreProbe {
                        connected: false,
                        can_write: false,
                        can_read: false,
                    },
                    queue: WorkerStats {
                        queue_length: 0,
                        is_worker_running: self.worker.is_running(),
                    },
                    backend,
                    error: Some(e.message),
                }
            }
        }
    }

    async fn probe(&self) -> AppResult<(WorkerStats, bool)> {
        if !self.status.ping().await? {
            return Err(AppError::service_unavailable("Status store is not reachable"));
        }
        let stats = self.worker.stats(&self.queue).await?;
        self.status
            .set_status(HEALTH_PROBE_ID, &AssignmentJobStatus::pending())
            .await?;
        let read_back = self.status.get_status(HEALTH_PROBE_ID).await?;
        self.status.clear(HEALTH_PROBE_ID).await?;
        Ok((stats, read_back.is_some()))
    }

    /// Sends a fixed preview to the execution service and reports the outcome.
    pub async fn probe_backend(&self) -> BackendProbe {
        let request = PreviewRequest {
            assignments: vec![WorkItem::new("league", ["test-slug"])],
            category_types: vec!["league".to_string()],
            locale: normalize_to_backend("en-GB"),
        };

        let (status, response, error) = match self.backend.preview(&request).await {
            Ok(body) => ("success", Some(body), None),
            Err(e) => ("error", None, Some(e.message)),
        };

        BackendProbe {
            status,
            backend_url: self.backend.base_url().to_string(),
            response,
            error,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snippet_cache::CacheManager;
    use snippet_client::mock::MockAssignmentBackend;
    use snippet_core::config::worker::WorkerConfig;
    use snippet_core::error::ErrorKind;
    use snippet_database::MemoryAssignmentStore;
    use snippet_entity::job::BulkAssignmentJob;
    use snippet_worker::JobProcessor;
    use std::time::Duration;

    struct Harness {
        service: BulkAssignmentService,
        queue: AssignmentQueue,
        backend: Arc<MockAssignmentBackend>,
    }

    fn harness(backend: MockAssignmentBackend) -> Harness {
        let config = WorkerConfig::default();
        let cache = Arc::new(CacheManager::in_memory());
        let backend = Arc::new(backend);
        let queue = AssignmentQueue::new(cache.clone(), config.queue_key.clone());
        let status = StatusStore::new(cache, config.status_ttl());
        let executor = BatchExecutor::new(backend.clone(), status.clone(), &config);
        let processor = JobProcessor::new(
            Arc::new(MemoryAssignmentStore::new()),
            executor.clone(),
            status.clone(),
            &config,
        );
        let worker = Arc::new(QueueWorker::new(queue.clone(), Arc::new(processor), &config));
        let service = BulkAssignmentService::new(queue.clone(), status, executor, backend.clone(), worker);
        Harness {
            service,
            queue,
            backend,
        }
    }

    fn request() -> AssignmentRequest {
        AssignmentRequest {
            snippet_id: "s1".into(),
            assignments: vec![WorkItem::new("league", ["nba"])],
            category_types: vec!["league".into()],
            snippet_variation_types: Some(vec!["SLIM".into()]),
            locale: "en-GB".into(),
            snippet_variations: Some(vec![serde_json::json!({"title": "CTA"})]),
            total_categories_count: Some(1),
        }
    }

    #[tokio::test]
    async fn enqueue_records_pending_and_queues_job() {
        let h = harness(MockAssignmentBackend::new());
        let queued = h
            .service
            .enqueue(&RequestContext::new("editor"), request())
            .await
            .unwrap();
        assert!(queued.assignment_id.starts_with("assignment_"));
        assert_eq!(queued.status, JobState::Pending);

        let status = h.service.status(&queued.assignment_id).await.unwrap();
        assert_eq!(status.status, JobState::Pending);

        let payload = h
            .queue
            .dequeue_blocking(Duration::from_millis(10))
            .await
            .unwrap()
            .unwrap();
        let job: BulkAssignmentJob = serde_json::from_str(&payload).unwrap();
        assert_eq!(job.assignment_id, queued.assignment_id);
        assert_eq!(job.user_id, "editor");
    }

    #[tokio::test]
    async fn unknown_status_is_not_found() {
        let h = harness(MockAssignmentBackend::new());
        let err = h.service.status("assignment_0_missing").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Assignment assignment_0_missing not found");
    }

    #[tokio::test]
    async fn preview_normalizes_locale() {
        let reply = serde_json::json!({"totalCount": 1});
        let h = harness(MockAssignmentBackend::new().with_preview(reply.clone()));
        let req = PreviewAssignmentRequest {
            snippet_id: "s1".into(),
            assignments: vec![WorkItem::new("league", ["nba"])],
            category_types: vec!["league".into()],
            locale: "de-DE".into(),
        };
        assert_eq!(h.service.preview(req).await.unwrap(), reply);
        assert_eq!(h.backend.previewed().await[0].locale, "de_DE");
    }

    #[tokio::test]
    async fn test_sync_executes_without_queue() {
        let h = harness(MockAssignmentBackend::new());
        let result = h
            .service
            .test_sync(&RequestContext::new("editor"), request())
            .await
            .unwrap();
        assert!(result.test_data.assignment_id.starts_with("sync_test_"));
        assert_eq!(result.test_data.snippet_variations, 1);
        assert_eq!(h.backend.executed().await.len(), 1);
        assert!(h.queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn health_probes_status_store() {
        let h = harness(MockAssignmentBackend::new());
        let health = h.service.health().await;
        assert_eq!(health.status, "healthy");
        assert!(health.status_store.can_read);
        assert!(!health.queue.is_worker_running);
        assert_eq!(health.backend.base_url, "http://mock-backend");
    }

    #[tokio::test]
    async fn backend_probe_reports_failure() {
        let h = harness(MockAssignmentBackend::new());
        let probe = h.service.probe_backend().await;
        assert_eq!(probe.status, "error");
        assert_eq!(probe.error.as_deref(), Some("Failed to preview assignment"));
        assert_eq!(h.backend.previewed().await[0].locale, "en_GB");
    }
}
