//! Assignment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::key::AssignmentKey;
use super::status::AssignmentStatus;

/// A snippet assigned to one category page, identified by `(cat_type, slug)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SnippetAssignment {
    /// Unique row identifier.
    pub id: Uuid,
    /// Owning snippet.
    pub snippet_id: String,
    /// Category type code (e.g. `"league"`, `"city"`).
    pub cat_type: String,
    /// Category page slug.
    pub slug: String,
    /// Current status.
    pub status: AssignmentStatus,
    /// User who first created the row.
    pub created_by: String,
    /// User who last touched the row.
    pub updated_by: Option<String>,
    /// When the row was created.
    pub assigned_at: DateTime<Utc>,
    /// When the row was last modified.
    pub updated_at: DateTime<Utc>,
    /// Metadata reported by the last external sync.
    pub sync_metadata: Option<serde_json::Value>,
    /// When `sync_metadata` was last written.
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl SnippetAssignment {
    /// Composite identity within the owning snippet.
    pub fn key(&self) -> AssignmentKey {
        AssignmentKey::new(&self.cat_type, &self.slug)
    }

    /// `{catType, slug, status}` snapshot stored in history entries.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "catType": self.cat_type,
            "slug": self.slug,
            "status": self.status,
        })
    }

    /// `{slug, status, syncMetadata}` snapshot stored for user edits.
    pub fn edit_snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "slug": self.slug,
            "status": self.status,
            "syncMetadata": self.sync_metadata,
        })
    }
}

/// Field changes applied by a user edit. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAssignment {
    /// New slug.
    pub slug: Option<String>,
    /// New status.
    pub status: Option<AssignmentStatus>,
    /// New sync metadata; also refreshes `last_sync_at`.
    pub sync_metadata: Option<serde_json::Value>,
}

impl UpdateAssignment {
    /// Change only the status.
    pub fn status(status: AssignmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Optional equality filters for listing assignments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentFilter {
    /// Restrict to one snippet.
    pub snippet_id: Option<String>,
    /// Restrict to one category type.
    pub cat_type: Option<String>,
    /// Restrict to one status.
    pub status: Option<AssignmentStatus>,
}

impl AssignmentFilter {
    /// Whether a row passes every set filter.
    pub fn matches(&self, row: &SnippetAssignment) -> bool {
        self.snippet_id.as_ref().is_none_or(|s| *s == row.snippet_id)
            && self.cat_type.as_ref().is_none_or(|c| *c == row.cat_type)
            && self.status.is_none_or(|s| s == row.status)
    }
}
