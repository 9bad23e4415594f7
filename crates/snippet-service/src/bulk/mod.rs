//! Bulk assignment pipeline front.

pub mod service;

pub use service::{
    BackendInfo, BackendProbe, BulkAssignmentService, PipelineHealth, QueuedAssignment,
    StoreProbe, TestSyncResult, TestSyncSummary,
};
