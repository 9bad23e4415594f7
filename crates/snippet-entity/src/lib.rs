//! # snippet-entity
//!
//! Domain entity models for the snippet admin backend. Every struct in this
//! crate represents a database table row or a domain value object. Database
//! entities derive `sqlx::FromRow`; queue and status payloads are plain
//! serde types.

pub mod assignment;
pub mod history;
pub mod job;
