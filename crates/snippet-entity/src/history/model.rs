//! History entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::action::HistoryAction;

/// An immutable record of one change to an assignment row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentHistory {
    /// Unique entry identifier.
    pub id: Uuid,
    /// The assignment row this entry belongs to.
    pub assignment_id: Uuid,
    /// What happened.
    pub action: HistoryAction,
    /// Who did it.
    pub user_id: String,
    /// Snapshot before the change.
    pub old_values: Option<serde_json::Value>,
    /// Snapshot after the change.
    pub new_values: Option<serde_json::Value>,
    /// `{reason, timestamp}`.
    pub metadata: Option<serde_json::Value>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// Why a history entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryReason {
    /// A user created, edited or removed the row directly.
    UserAction,
    /// A bulk job inserted the row.
    AsyncAssignment,
    /// A bulk job reset an existing row to pending.
    AsyncReassignment,
}

impl HistoryReason {
    /// Return the reason as stored in metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserAction => "user_action",
            Self::AsyncAssignment => "async_assignment",
            Self::AsyncReassignment => "async_snippet_reassignment",
        }
    }
}

/// Data required to append a history entry.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    /// The assignment row.
    pub assignment_id: Uuid,
    /// What happened.
    pub action: HistoryAction,
    /// Who did it.
    pub user_id: String,
    /// Snapshot before the change.
    pub old_values: Option<serde_json::Value>,
    /// Snapshot after the change.
    pub new_values: Option<serde_json::Value>,
    /// Why it happened.
    pub reason: HistoryReason,
}

impl NewHistoryEntry {
    /// `{reason, timestamp}` metadata for this entry, stamped now.
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "reason": self.reason.as_str(),
            "timestamp": Utc::now().to_rfc3339(),
        })
    }
}
