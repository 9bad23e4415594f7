//! Assignment CRUD and synchronous execution.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use snippet_core::error::AppError;
use snippet_core::result::AppResult;
use snippet_core::types::pagination::{PageRequest, PageResponse};
use snippet_database::AssignmentStore;
use snippet_entity::assignment::{
    AssignmentFilter, AssignmentStatus, SnippetAssignment, UpdateAssignment, normalize_work_items,
};
use snippet_entity::job::new_job_id;
use snippet_worker::{BatchExecutor, BatchOutcome};

use super::summary::{DetailedHistory, SnippetAssignments};
use crate::context::RequestContext;
use crate::request::AssignmentRequest;

/// Result of a synchronous assignment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAssignmentResult {
    /// Always `true`; failures are errors.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Aggregated batch results.
    pub results: BatchOutcome,
    /// Rows created by the request.
    pub assignments: Vec<SnippetAssignment>,
}

/// Reply to a delete.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    /// Human-readable outcome.
    pub message: String,
}

/// Manages assignment rows directly, outside the queue.
#[derive(Debug, Clone)]
pub struct AssignmentService {
    /// Assignment store.
    store: Arc<dyn AssignmentStore>,
    /// Batch executor shared with the worker.
    executor: BatchExecutor,
}

impl AssignmentService {
    /// Creates a new assignment service.
    pub fn new(store: Arc<dyn AssignmentStore>, executor: BatchExecutor) -> Self {
        Self { store, executor }
    }

    /// Creates rows for a request, executes it in-line, then activates the
    /// snippet's pending rows.
    ///
    /// Pairs that already exist reject the whole request. Rows stay
    /// `PENDING` when execution fails.
    pub async fn create_and_execute(
        &self,
        ctx: &RequestContext,
        req: AssignmentRequest,
    ) -> AppResult<SyncAssignmentResult> {
        let units = normalize_work_items(&req.assignments, &req.category_types);

        let existing = self.store.find_existing(&req.snippet_id, &units).await?;
        if !existing.is_empty() {
            let duplicates: Vec<String> = existing
                .iter()
                .map(|a| format!("{}/{}", a.cat_type, a.slug))
                .collect();
            return Err(AppError::validation(format!(
                "Assignments already exist: {}",
                duplicates.join(", ")
            )));
        }

        let created = self
            .store
            .create_many(&req.snippet_id, &units, &ctx.user_id)
            .await?;

        let job = req.into_job(new_job_id("sync"), &ctx.user_id);
        info!(
            assignment_id = %job.assignment_id,
            snippet_id = %job.snippet_id,
            rows = created.len(),
            "Executing assignment synchronously"
        );

        let results = self
            .executor
            .execute(&job)
            .await
            .map_err(|e| AppError::validation(format!("Assignment execution failed: {e}")))?;

        self.activate_pending(ctx, &job.snippet_id).await?;

        Ok(SyncAssignmentResult {
            success: true,
            message: "Assignment executed successfully".to_string(),
            results,
            assignments: created,
        })
    }

    /// Moves every `PENDING` row of a snippet to `ACTIVE`, one history entry
    /// each. Individual failures are logged and skipped.
    async fn activate_pending(&self, ctx: &RequestContext, snippet_id: &str) -> AppResult<()> {
        let pending = self
            .store
            .find_by_snippet(snippet_id)
            .await?
            .into_iter()
            .filter(|a| a.status == AssignmentStatus::Pending);

        let activate = UpdateAssignment::status(AssignmentStatus::Active);
        for row in pending {
            if let Err(e) = self.store.update(row.id, &activate, &ctx.user_id).await {
                warn!(assignment_id = %row.id, error = %e, "Failed to activate assignment");
            }
        }
        Ok(())
    }

    /// Lists rows matching `filter`.
    pub async fn list(
        &self,
        filter: &AssignmentFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<SnippetAssignment>> {
        self.store.list(filter, page).await
    }

    /// All rows of a snippet, grouped by category type, with counts.
    pub async fn by_snippet(&self, snippet_id: &str) -> AppResult<SnippetAssignments> {
        let rows = self.store.find_by_snippet(snippet_id).await?;
        Ok(SnippetAssignments::from_rows(rows))
    }

    /// Audit trail of a snippet, newest first, with counts per action.
    pub async fn detailed_history(&self, snippet_id: &str) -> AppResult<DetailedHistory> {
        let history = self.store.history_for_snippet(snippet_id).await?;
        Ok(DetailedHistory::new(snippet_id, history))
    }

    /// Applies a user edit. Renaming onto a slug already used by the same
    /// snippet and category type is rejected.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        changes: UpdateAssignment,
    ) -> AppResult<SnippetAssignment> {
        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Assignment with ID {id} not found")))?;

        if let Some(slug) = changes.slug.as_deref().filter(|s| *s != current.slug) {
            let taken = self
                .store
                .find_by_key(&current.snippet_id, &current.cat_type, slug)
                .await?;
            if taken.is_some() {
                return Err(AppError::validation(format!(
                    "Assignment with slug '{slug}' already exists for this catType"
                )));
            }
        }

        let updated = self.store.update(id, &changes, &ctx.user_id).await?;
        info!(assignment_id = %id, user_id = %ctx.user_id, "Assignment updated");
        Ok(updated)
    }

    /// Deletes a row, recording who did it.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<DeleteResult> {
        self.store.delete(id, &ctx.user_id).await?;
        info!(assignment_id = %id, user_id = %ctx.user_id, "Assignment deleted");
        Ok(DeleteResult {
            message: "Assignment deleted successfully".to_string(),
        })
    }
}
