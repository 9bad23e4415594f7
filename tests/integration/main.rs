//! Router-level integration tests over in-memory collaborators.

mod assignment_test;
mod bulk_test;
mod helpers;
