//! Job processor: drives one job from `PROCESSING` to a terminal state.

use std::sync::Arc;
use std::time::Duration;

use snippet_core::config::worker::WorkerConfig;
use snippet_core::error::AppError;
use snippet_core::result::AppResult;
use snippet_database::{AssignmentStore, ReconcileOutcome};
use snippet_entity::assignment::{AssignmentStatus, normalize_work_items};
use snippet_entity::job::{AssignmentJobStatus, BulkAssignmentJob, JobState};

use crate::executor::BatchExecutor;
use crate::status::StatusStore;

/// Runs a job end to end: reconcile rows, execute batches, record the
/// outcome on both the job status and the snippet's rows.
#[derive(Debug)]
pub struct JobProcessor {
    store: Arc<dyn AssignmentStore>,
    executor: BatchExecutor,
    status: StatusStore,
    reconcile_timeout: Duration,
}

impl JobProcessor {
    /// Create a processor.
    pub fn new(
        store: Arc<dyn AssignmentStore>,
        executor: BatchExecutor,
        status: StatusStore,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            store,
            executor,
            status,
            reconcile_timeout: config.reconcile_timeout(),
        }
    }

    /// Process one job and return the terminal state it reached.
    ///
    /// Never fails: every error ends in a `FAILED` record. Failures while
    /// recording the outcome are logged.
    pub async fn process(&self, job: &BulkAssignmentJob) -> JobState {
        let id = &job.assignment_id;
        tracing::info!("Processing assignment job '{}' for snippet '{}'", id, job.snippet_id);

        match self.run(job).await {
            Ok(results) => {
                self.finish(id, AssignmentJobStatus::completed(results)).await;
                self.mark_snippet(&job.snippet_id, AssignmentStatus::Active).await;
                tracing::info!("Assignment job '{}' completed", id);
                JobState::Completed
            }
            Err(message) => {
                tracing::error!("Assignment job '{}' failed: {}", id, message);
                self.finish(id, AssignmentJobStatus::failed(message)).await;
                self.mark_snippet(&job.snippet_id, AssignmentStatus::Failed).await;
                JobState::Failed
            }
        }
    }

    /// Everything up to the terminal write. The error is the message
    /// stored on the `FAILED` record.
    async fn run(&self, job: &BulkAssignmentJob) -> Result<serde_json::Value, String> {
        self.status
            .set_status(&job.assignment_id, &AssignmentJobStatus::processing())
            .await
            .map_err(|e| e.message)?;

        let outcome = self.reconcile(job).await.map_err(|e| e.message)?;
        tracing::info!(
            "Reconciled '{}': {} updated, {} created",
            job.assignment_id,
            outcome.updated,
            outcome.created
        );

        let executed = self.executor.execute(job).await.map_err(|e| e.to_string())?;
        serde_json::to_value(&executed).map_err(|e| e.to_string())
    }

    async fn reconcile(&self, job: &BulkAssignmentJob) -> AppResult<ReconcileOutcome> {
        let units = normalize_work_items(&job.assignments, &job.category_types);
        tokio::time::timeout(
            self.reconcile_timeout,
            self.store.reconcile(&job.snippet_id, &units, &job.user_id),
        )
        .await
        .map_err(|_| {
            AppError::timeout(format!(
                "Reconciliation timed out after {}s",
                self.reconcile_timeout.as_secs()
            ))
        })?
    }

    async fn finish(&self, id: &str, status: AssignmentJobStatus) {
        if let Err(e) = self.status.set_status(id, &status).await {
            tracing::error!("Failed to record {} status for '{}': {}", status.status, id, e);
        }
    }

    async fn mark_snippet(&self, snippet_id: &str, status: AssignmentStatus) {
        match self.store.set_snippet_status(snippet_id, status).await {
            Ok(rows) => tracing::info!("Marked {} assignments of '{}' {}", rows, snippet_id, status),
            Err(e) => tracing::error!(
                "Failed to mark assignments of '{}' {}: {}",
                snippet_id,
                status,
                e
            ),
        }
    }
}
