//! Memoization Module
//!
//! Builds cache keys from call arguments and wraps functions and methods so
//! their results are stored in a cache.

mod backend;
mod builder;
mod function;
mod key;
mod method;

pub use backend::{
    CacheBackend, CacheSource, HasCache, HasInstanceId, InstanceId, MethodCacheSource,
};
pub use builder::{memoize, memoize_method, Memoize};
pub use function::CachedFunction;
pub use key::{make_key, ArgType, ArgValue, CacheKey, CallArgs, HashedKey, KeyFn};
pub use method::{BoundMethod, CachedMethod};
