//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and the memoization layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Bad constructor or decorator parameters
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Cache holds no entries
    #[error("Cache is empty")]
    Empty,

    /// A memoized call's arguments cannot form a key
    #[error("Unhashable argument: {0}")]
    UnhashableArgument(String),

    /// The `on_miss` handler failed; the source error is passed through as is
    #[error(transparent)]
    MissHandler(#[from] anyhow::Error),
}

impl CacheError {
    /// Builds a `KeyNotFound` from any debuggable key.
    pub(crate) fn key_not_found<K: std::fmt::Debug>(key: &K) -> Self {
        CacheError::KeyNotFound(format!("{:?}", key))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
