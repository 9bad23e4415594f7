//! Direct assignment management and read views.

pub mod service;
pub mod summary;

pub use service::{AssignmentService, DeleteResult, SyncAssignmentResult};
pub use summary::{AssignmentSummary, DetailedHistory, HistorySummary, SnippetAssignments};
