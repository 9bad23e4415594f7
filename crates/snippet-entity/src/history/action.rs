//! History action enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to an assignment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "history_action", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum HistoryAction {
    /// The row was inserted.
    Created,
    /// The row was modified.
    Updated,
    /// The row was removed.
    Deleted,
}

impl HistoryAction {
    /// Return the action as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
