//! PostgreSQL repository implementations.

pub mod assignment;
pub mod history;

pub use assignment::PgAssignmentStore;
