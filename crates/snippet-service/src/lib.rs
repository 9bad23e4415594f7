//! # snippet-service
//!
//! Business logic service layer for the snippet admin backend. Each service
//! orchestrates the assignment store, the job pipeline and the execution
//! service client to implement application-level use cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod assignment;
pub mod bulk;
pub mod context;
pub mod request;

pub use assignment::AssignmentService;
pub use bulk::BulkAssignmentService;
pub use context::RequestContext;
pub use request::{AssignmentRequest, PreviewAssignmentRequest};
