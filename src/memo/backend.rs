//! Cache Backend Module
//!
//! The mapping-like surface memoized calls store their results in, and the
//! ways a wrapper finds its backend at call time.

use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::Cache;
use crate::error::{CacheError, Result};

// == Cache Backend ==
/// Anything memoized results can be read from and written to.
pub trait CacheBackend<K, V> {
    /// Returns the cached value, `Ok(None)` when absent.
    ///
    /// Errors other than absence (such as a failing `on_miss`) are passed on.
    fn lookup(&self, key: &K) -> Result<Option<V>>;

    fn store(&self, key: K, value: V);
}

impl<K, V> CacheBackend<K, V> for Cache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    fn lookup(&self, key: &K) -> Result<Option<V>> {
        match self.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(CacheError::KeyNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn store(&self, key: K, value: V) {
        self.set(key, value);
    }
}

/// An unbounded map behind a mutex also works as a backend.
impl<K, V, S> CacheBackend<K, V> for Mutex<HashMap<K, V, S>>
where
    K: Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    fn lookup(&self, key: &K) -> Result<Option<V>> {
        Ok(self.lock().get(key).cloned())
    }

    fn store(&self, key: K, value: V) {
        self.lock().insert(key, value);
    }
}

// == Cache Source ==
/// Where a memoized function finds its cache.
pub enum CacheSource<C> {
    /// One cache shared by every call
    Shared(Arc<C>),
    /// Called on every call, for caches whose scope is decided at run time
    Factory(Arc<dyn Fn() -> Arc<C> + Send + Sync>),
}

impl<C> CacheSource<C> {
    pub fn shared(cache: Arc<C>) -> Self {
        CacheSource::Shared(cache)
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<C> + Send + Sync + 'static,
    {
        CacheSource::Factory(Arc::new(factory))
    }

    pub(crate) fn resolve(&self) -> Arc<C> {
        match self {
            CacheSource::Shared(cache) => Arc::clone(cache),
            CacheSource::Factory(factory) => factory(),
        }
    }
}

impl<C> Clone for CacheSource<C> {
    fn clone(&self) -> Self {
        match self {
            CacheSource::Shared(cache) => CacheSource::Shared(Arc::clone(cache)),
            CacheSource::Factory(factory) => CacheSource::Factory(Arc::clone(factory)),
        }
    }
}

impl<C> fmt::Debug for CacheSource<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheSource::Shared(_) => f.write_str("Shared"),
            CacheSource::Factory(_) => f.write_str("Factory"),
        }
    }
}

// == Receiver Identity ==
static NEXT_INSTANCE_ID: AtomicUsize = AtomicUsize::new(1);

/// Identity of a memoized method's receiver, used in scoped keys.
///
/// Ids are never reused, even after the owning receiver is dropped, so a new
/// receiver cannot read entries cached for an old one. Cloning hands out a
/// fresh id: the clone is a different instance.
#[derive(PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

impl InstanceId {
    pub fn new() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InstanceId {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

/// Receivers of memoized methods.
pub trait HasInstanceId {
    fn instance_id(&self) -> &InstanceId;
}

// == Method Cache Source ==
/// Receivers that carry their own cache for memoized methods.
pub trait HasCache<C> {
    fn cache(&self) -> &C;
}

/// Where a memoized method finds its cache.
pub enum MethodCacheSource<R, C> {
    /// One cache shared by every receiver
    Shared(Arc<C>),
    /// Called with the receiver on every call
    Factory(Arc<dyn Fn(&R) -> Arc<C> + Send + Sync>),
    /// The receiver's own cache, reached through [`HasCache`]
    Receiver(fn(&R) -> &C),
}

impl<R, C> MethodCacheSource<R, C> {
    pub fn shared(cache: Arc<C>) -> Self {
        MethodCacheSource::Shared(cache)
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&R) -> Arc<C> + Send + Sync + 'static,
    {
        MethodCacheSource::Factory(Arc::new(factory))
    }

    /// Resolves the cache through the receiver's [`HasCache`] impl.
    pub fn receiver() -> Self
    where
        R: HasCache<C>,
    {
        MethodCacheSource::Receiver(<R as HasCache<C>>::cache)
    }
}

impl<R, C> Clone for MethodCacheSource<R, C> {
    fn clone(&self) -> Self {
        match self {
            MethodCacheSource::Shared(cache) => MethodCacheSource::Shared(Arc::clone(cache)),
            MethodCacheSource::Factory(factory) => MethodCacheSource::Factory(Arc::clone(factory)),
            MethodCacheSource::Receiver(get) => MethodCacheSource::Receiver(*get),
        }
    }
}

impl<R, C> fmt::Debug for MethodCacheSource<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodCacheSource::Shared(_) => f.write_str("Shared"),
            MethodCacheSource::Factory(_) => f.write_str("Factory"),
            MethodCacheSource::Receiver(_) => f.write_str("Receiver"),
        }
    }
}
