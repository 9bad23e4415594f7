//! Persistence seam for assignment rows and their history.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use snippet_core::result::AppResult;
use snippet_core::types::pagination::{PageRequest, PageResponse};
use snippet_entity::assignment::{
    AssignmentFilter, AssignmentStatus, AssignmentUnit, SnippetAssignment, UpdateAssignment,
};
use snippet_entity::history::AssignmentHistory;

/// Row counts touched by one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// Existing rows reset to `PENDING`.
    pub updated: u64,
    /// Rows inserted.
    pub created: u64,
}

/// Storage of assignment rows and their append-only history.
///
/// Every mutating operation writes its history entries in the same
/// transaction as the row change.
#[async_trait]
pub trait AssignmentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create-or-update the rows for `units` under one snippet.
    ///
    /// Existing rows go back to `PENDING` with an `UPDATED` entry
    /// (`async_snippet_reassignment`); missing rows are inserted as
    /// `PENDING` with a `CREATED` entry (`async_assignment`). `units` must
    /// already be normalized and unique. Running it twice never duplicates
    /// rows.
    async fn reconcile(
        &self,
        snippet_id: &str,
        units: &[AssignmentUnit],
        user_id: &str,
    ) -> AppResult<ReconcileOutcome>;

    /// Set every row of a snippet to `status`. Returns the number of rows changed.
    async fn set_snippet_status(&self, snippet_id: &str, status: AssignmentStatus) -> AppResult<u64>;

    /// Rows of a snippet matching any of `units`.
    async fn find_existing(
        &self,
        snippet_id: &str,
        units: &[AssignmentUnit],
    ) -> AppResult<Vec<SnippetAssignment>>;

    /// Insert new `PENDING` rows with a `CREATED` entry each (`user_action`).
    async fn create_many(
        &self,
        snippet_id: &str,
        units: &[AssignmentUnit],
        user_id: &str,
    ) -> AppResult<Vec<SnippetAssignment>>;

    /// Look up one row.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SnippetAssignment>>;

    /// Look up one row by its composite identity.
    async fn find_by_key(
        &self,
        snippet_id: &str,
        cat_type: &str,
        slug: &str,
    ) -> AppResult<Option<SnippetAssignment>>;

    /// Filtered page of rows, newest `assigned_at` first.
    async fn list(
        &self,
        filter: &AssignmentFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<SnippetAssignment>>;

    /// All rows of a snippet ordered by `(cat_type, slug)`.
    async fn find_by_snippet(&self, snippet_id: &str) -> AppResult<Vec<SnippetAssignment>>;

    /// Apply a user edit and append an `UPDATED` entry with old/new values.
    /// Fails with not-found when the row does not exist.
    async fn update(
        &self,
        id: Uuid,
        changes: &UpdateAssignment,
        user_id: &str,
    ) -> AppResult<SnippetAssignment>;

    /// Append a `DELETED` entry, then remove the row (its history cascades).
    /// Fails with not-found when the row does not exist.
    async fn delete(&self, id: Uuid, user_id: &str) -> AppResult<()>;

    /// History of every row of a snippet, newest first.
    async fn history_for_snippet(&self, snippet_id: &str) -> AppResult<Vec<AssignmentHistory>>;
}
