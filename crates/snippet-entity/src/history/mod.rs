//! Append-only audit trail of assignment changes.

pub mod action;
pub mod model;

pub use action::HistoryAction;
pub use model::{AssignmentHistory, HistoryReason, NewHistoryEntry};
