//! Boundcache - A bounded in-memory cache with memoization helpers
//!
//! Provides a fixed-capacity, thread-safe cache with LRI or LRU eviction and
//! hit/miss statistics, a key composer for call arguments, and wrappers that
//! memoize functions and methods into any cache backend.

pub mod cache;
pub mod config;
pub mod error;
pub mod memo;
pub mod registry;
pub mod sentinel;

pub use cache::{Cache, CacheBuilder, CacheStats, EvictionPolicy, OnMiss};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use memo::{
    make_key, memoize, memoize_method, ArgValue, CacheBackend, CacheKey, CacheSource, CallArgs,
    HasCache, HasInstanceId, InstanceId, MethodCacheSource,
};
pub use registry::{InstanceRegistry, Singleton};
pub use sentinel::Sentinel;
