//! Bulk assignment job payloads and their transient status records.

pub mod model;
pub mod status;

pub use model::{BulkAssignmentJob, new_job_id};
pub use status::{AssignmentJobStatus, JobProgress, JobState};
