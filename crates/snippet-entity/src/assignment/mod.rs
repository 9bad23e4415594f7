//! Snippet-to-category assignment entities.

pub mod key;
pub mod model;
pub mod status;

pub use key::{AssignmentKey, AssignmentUnit, WorkItem, expand_work_items, normalize_work_items};
pub use model::{AssignmentFilter, SnippetAssignment, UpdateAssignment};
pub use status::AssignmentStatus;
