//! Instance Registry Module
//!
//! Shared instances created on first use: a single lazily built value, and a
//! keyed registry that hands out the live instance for a key while anyone
//! still holds it.

use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

// == Singleton ==
/// A value built once, on first access, and shared afterwards.
///
/// Usable in a `static`:
///
/// ```
/// use boundcache::{Cache, Singleton};
///
/// static SHARED: Singleton<Cache<String, u64>> = Singleton::new();
///
/// let cache = SHARED.get_or_init(|| Cache::lru(64).unwrap());
/// assert!(std::sync::Arc::ptr_eq(&cache, &SHARED.get_or_init(|| unreachable!())));
/// ```
pub struct Singleton<T> {
    cell: OnceCell<Arc<T>>,
}

impl<T> Singleton<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Returns the instance, building it with `init` if this is the first call.
    ///
    /// Concurrent first calls run `init` once; the others wait for it.
    pub fn get_or_init<F>(&self, init: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        Arc::clone(self.cell.get_or_init(|| Arc::new(init())))
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }
}

impl<T> Default for Singleton<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Singleton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Singleton")
            .field("initialized", &self.cell.get().is_some())
            .finish()
    }
}

// == Instance Registry ==
/// Hands out one live instance per key.
///
/// The registry only holds weak handles: once every caller drops an instance,
/// the next request for its key builds a new one.
pub struct InstanceRegistry<K, T> {
    instances: Mutex<FxHashMap<K, Weak<T>>>,
}

impl<K, T> InstanceRegistry<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    pub fn new() -> Self {
        Self {
            instances: Mutex::new(FxHashMap::default()),
        }
    }

    /// Returns the live instance for `key`, building one with `ctor` if none
    /// is alive.
    ///
    /// `ctor` runs under the registry lock, so it must not call back into
    /// this registry.
    pub fn get_or_create<F>(&self, key: K, ctor: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        let mut instances = self.instances.lock();
        if let Some(existing) = instances.get(&key).and_then(Weak::upgrade) {
            return existing;
        }

        instances.retain(|_, handle| handle.strong_count() > 0);
        debug!(key = ?key, "creating registry instance");
        let instance = Arc::new(ctor());
        instances.insert(key, Arc::downgrade(&instance));
        instance
    }

    /// Returns the live instance for `key`, if any.
    pub fn get(&self, key: &K) -> Option<Arc<T>> {
        self.instances.lock().get(key).and_then(Weak::upgrade)
    }

    /// Number of instances still alive.
    pub fn len(&self) -> usize {
        self.instances
            .lock()
            .values()
            .filter(|handle| handle.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the handles of dead instances, returning how many were removed.
    pub fn purge(&self) -> usize {
        let mut instances = self.instances.lock();
        let before = instances.len();
        instances.retain(|_, handle| handle.strong_count() > 0);
        before - instances.len()
    }
}

impl<K, T> Default for InstanceRegistry<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> fmt::Debug for InstanceRegistry<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("live", &self.len())
            .finish()
    }
}
