//! Cache Module
//!
//! Provides a bounded in-memory cache with LRI or LRU eviction.

mod entry;
mod list;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use policy::EvictionPolicy;
pub use stats::CacheStats;
pub use store::{Cache, CacheBuilder, OnMiss};
