//! # snippet-cache
//!
//! Key/value and list providers for the snippet admin backend. Supports two
//! modes:
//!
//! - **memory**: In-process store using [moka](https://crates.io/crates/moka)
//!   plus a notify-driven list for blocking pops
//! - **redis**: Redis-backed store using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime based on configuration. The job
//! queue and the job status store are both built on top of it.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::CacheManager;
