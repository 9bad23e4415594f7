//! Core traits defined in `snippet-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
