//! # snippet-database
//!
//! PostgreSQL connection management, migrations, and the
//! [`AssignmentStore`] implementations (PostgreSQL and in-memory).

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryAssignmentStore;
pub use repositories::PgAssignmentStore;
pub use store::{AssignmentStore, ReconcileOutcome};
