//! Cache Store Module
//!
//! Main cache engine combining a hash index with the anchored recency list,
//! guarded by a single mutex per instance.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::cache::entry::NodeId;
use crate::cache::list::RecencyList;
use crate::cache::{CacheStats, EvictionPolicy};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Computes the value for a key that is not cached.
pub type OnMiss<K, V> = Arc<dyn Fn(&K) -> anyhow::Result<V> + Send + Sync>;

// == Cache Core ==
/// Unsynchronized state; every method expects the caller to hold the lock.
struct CacheCore<K, V> {
    index: FxHashMap<K, NodeId>,
    list: RecencyList<K, V>,
    stats: CacheStats,
}

impl<K, V> CacheCore<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    fn new(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            list: RecencyList::with_capacity(capacity),
            stats: CacheStats::new(),
        }
    }

    /// Reads a value, promoting it when the policy says so. No stats.
    fn lookup(&mut self, key: &K, policy: EvictionPolicy) -> Option<V> {
        let id = *self.index.get(key)?;
        if policy.promotes_on_read() {
            self.list.move_to_newest(id);
        }
        self.list.value(id).cloned()
    }

    fn peek(&self, key: &K) -> Option<V> {
        let id = self.index.get(key)?;
        self.list.value(*id).cloned()
    }

    /// Inserts or overwrites; writes always promote.
    fn insert(&mut self, key: K, value: V, capacity: usize) {
        if let Some(&id) = self.index.get(&key) {
            self.list.set_value(id, value);
            self.list.move_to_newest(id);
            return;
        }

        if self.index.len() < capacity {
            let id = self.list.push_newest(key.clone(), value);
            self.index.insert(key, id);
            return;
        }

        let (id, evicted) = self.list.replace_oldest(key.clone(), value);
        if let Some((evicted_key, _)) = evicted {
            trace!(key = ?evicted_key, "evicted oldest entry");
            self.index.remove(&evicted_key);
            self.stats.record_eviction();
        }
        self.index.insert(key, id);
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.index.remove(key)?;
        self.list.unlink(id).map(|(_, value)| value)
    }

    fn clear(&mut self) {
        self.index.clear();
        self.list.reset();
    }

    fn items(&self) -> Vec<(K, V)> {
        self.list
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

// == Cache ==
/// Thread-safe bounded cache with LRI or LRU eviction.
///
/// All operations take `&self`; share the cache between threads with `Arc`.
/// Every operation holds the instance lock for its whole duration except the
/// `on_miss` computation, which runs unlocked.
pub struct Cache<K, V> {
    core: Mutex<CacheCore<K, V>>,
    capacity: usize,
    policy: EvictionPolicy,
    on_miss: Option<OnMiss<K, V>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    // == Constructors ==
    /// Creates an empty cache.
    ///
    /// # Errors
    /// `InvalidArgument` if `capacity` is zero.
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Result<Self> {
        Self::build(capacity, policy, None)
    }

    /// Creates an empty least-recently-used cache.
    pub fn lru(capacity: usize) -> Result<Self> {
        Self::new(capacity, EvictionPolicy::Lru)
    }

    /// Creates an empty least-recently-inserted cache.
    pub fn lri(capacity: usize) -> Result<Self> {
        Self::new(capacity, EvictionPolicy::Lri)
    }

    /// Creates an empty cache sized and configured from `config`.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.max_size, config.policy)
    }

    /// Starts a builder for caches with an `on_miss` handler or initial values.
    pub fn builder(capacity: usize) -> CacheBuilder<K, V> {
        CacheBuilder::new(capacity)
    }

    fn build(
        capacity: usize,
        policy: EvictionPolicy,
        on_miss: Option<OnMiss<K, V>>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidArgument(
                "expected capacity > 0, got 0".to_string(),
            ));
        }
        debug!(capacity, %policy, on_miss = on_miss.is_some(), "cache created");
        Ok(Self {
            core: Mutex::new(CacheCore::new(capacity)),
            capacity,
            policy,
            on_miss,
        })
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A hit promotes the entry under LRU. A miss is counted, then filled
    /// through `on_miss` if one is configured.
    ///
    /// # Errors
    /// `KeyNotFound` on a miss without `on_miss`; the handler's own error if
    /// it fails, in which case nothing is stored.
    pub fn get(&self, key: &K) -> Result<V> {
        {
            let mut core = self.core.lock();
            if let Some(value) = core.lookup(key, self.policy) {
                core.stats.record_hit();
                return Ok(value);
            }
            core.stats.record_miss();
        }
        self.fill(key)
    }

    /// Computes a missing value outside the lock and stores it.
    ///
    /// Two threads missing on the same key may both compute; the last insert wins.
    fn fill(&self, key: &K) -> Result<V> {
        let on_miss = self
            .on_miss
            .as_ref()
            .ok_or_else(|| CacheError::key_not_found(key))?;
        let value = on_miss(key)?;
        self.core
            .lock()
            .insert(key.clone(), value.clone(), self.capacity);
        Ok(value)
    }

    /// Retrieves a value, falling back to `default` instead of failing.
    ///
    /// Goes through the same miss path as [`get`](Self::get). When no value can
    /// be produced the soft miss counter is bumped and `default` returned;
    /// `default` itself is not stored.
    pub fn get_or_default(&self, key: &K, default: V) -> V {
        match self.get(key) {
            Ok(value) => value,
            Err(_) => {
                self.core.lock().stats.record_soft_miss();
                default
            }
        }
    }

    /// Reads a value without promoting it or touching the statistics.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.core.lock().peek(key)
    }

    /// Checks for a key without promoting it or touching the statistics.
    pub fn contains(&self, key: &K) -> bool {
        self.core.lock().index.contains_key(key)
    }

    // == Set ==
    /// Stores a key-value pair.
    ///
    /// Overwrites promote the entry under both policies. A new key on a full
    /// cache evicts the oldest entry first.
    pub fn set(&self, key: K, value: V) {
        self.core.lock().insert(key, value, self.capacity);
    }

    /// Returns the cached value, or stores and returns `default` if absent.
    ///
    /// An absent key counts as both a miss and a soft miss.
    pub fn set_default(&self, key: K, default: V) -> V {
        let mut core = self.core.lock();
        if let Some(value) = core.lookup(&key, self.policy) {
            core.stats.record_hit();
            return value;
        }
        core.stats.record_miss();
        core.stats.record_soft_miss();
        core.insert(key, default.clone(), self.capacity);
        default
    }

    /// Stores every pair in order, as repeated [`set`](Self::set) calls would.
    pub fn update<I>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut core = self.core.lock();
        for (key, value) in pairs {
            core.insert(key, value, self.capacity);
        }
    }

    /// Copies every entry of `other` into this cache, oldest first.
    pub fn update_from(&self, other: &Cache<K, V>) {
        if std::ptr::eq(self, other) {
            return;
        }
        let items = other.items();
        self.update(items);
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// # Errors
    /// `KeyNotFound` if the key is absent.
    pub fn delete(&self, key: &K) -> Result<()> {
        self.core
            .lock()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| CacheError::key_not_found(key))
    }

    /// Removes an entry and returns its value. Statistics are not touched.
    ///
    /// # Errors
    /// `KeyNotFound` if the key is absent.
    pub fn pop(&self, key: &K) -> Result<V> {
        self.core
            .lock()
            .remove(key)
            .ok_or_else(|| CacheError::key_not_found(key))
    }

    /// Removes an entry and returns its value, or `default` if absent.
    pub fn pop_or(&self, key: &K, default: V) -> V {
        self.core.lock().remove(key).unwrap_or(default)
    }

    /// Removes and returns the entry that would be evicted next.
    ///
    /// This is the oldest end of the recency order, unlike a plain map's
    /// `popitem`, which takes the most recently inserted entry.
    ///
    /// # Errors
    /// `Empty` if the cache holds nothing.
    pub fn pop_item(&self) -> Result<(K, V)> {
        let mut core = self.core.lock();
        let id = core.list.oldest().ok_or(CacheError::Empty)?;
        let (key, value) = core.list.unlink(id).ok_or(CacheError::Empty)?;
        core.index.remove(&key);
        Ok((key, value))
    }

    // == Clear ==
    /// Removes every entry. Statistics are kept.
    pub fn clear(&self) {
        let mut core = self.core.lock();
        debug!(entries = core.index.len(), "cache cleared");
        core.clear();
    }

    // == Inspection ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.core.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Snapshot of all entries, least recent first and most recent last.
    pub fn items(&self) -> Vec<(K, V)> {
        self.core.lock().items()
    }

    /// Snapshot of all keys in recency order.
    pub fn keys(&self) -> Vec<K> {
        self.core.lock().list.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Snapshot of all values in recency order.
    pub fn values(&self) -> Vec<V> {
        self.core.lock().list.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Returns a new cache with the same settings and contents and fresh stats.
    pub fn copy(&self) -> Self {
        let items = self.items();
        let mut core = CacheCore::new(self.capacity);
        for (key, value) in items {
            core.insert(key, value, self.capacity);
        }
        Self {
            core: Mutex::new(core),
            capacity: self.capacity,
            policy: self.policy,
            on_miss: self.on_miss.clone(),
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let core = self.core.lock();
        let mut stats = core.stats.clone();
        stats.set_total_entries(core.index.len());
        stats
    }

    pub fn hit_count(&self) -> u64 {
        self.core.lock().stats.hits
    }

    pub fn miss_count(&self) -> u64 {
        self.core.lock().stats.misses
    }

    pub fn soft_miss_count(&self) -> u64 {
        self.core.lock().stats.soft_misses
    }

    #[cfg(test)]
    pub(crate) fn validate(&self) {
        let core = self.core.lock();
        core.list.validate();
        assert_eq!(core.list.len(), core.index.len());
        assert!(core.index.len() <= self.capacity);
        assert!(core.stats.soft_misses <= core.stats.misses);
    }
}

impl<K, V> Clone for Cache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl<K, V> PartialEq for Cache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone + PartialEq,
{
    /// Same length and same key-value contents; order and stats are ignored.
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        // Snapshot one side so the two locks are never held together
        let theirs: FxHashMap<K, V> = other.items().into_iter().collect();
        let core = self.core.lock();
        core.index.len() == theirs.len()
            && core
                .list
                .iter()
                .all(|(k, v)| theirs.get(k).map_or(false, |other_v| other_v == v))
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self.items();
        f.debug_struct("Cache")
            .field("policy", &self.policy)
            .field("capacity", &self.capacity)
            .field("on_miss", &self.on_miss.is_some())
            .field("entries", &DebugEntries(&items))
            .finish()
    }
}

struct DebugEntries<'a, K, V>(&'a [(K, V)]);

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for DebugEntries<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

// == Cache Builder ==
/// Builder for caches that need an `on_miss` handler or initial contents.
pub struct CacheBuilder<K, V> {
    capacity: usize,
    policy: EvictionPolicy,
    on_miss: Option<OnMiss<K, V>>,
    values: Vec<(K, V)>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            policy: EvictionPolicy::default(),
            on_miss: None,
            values: Vec::new(),
        }
    }

    pub fn policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the handler that computes and caches values for missing keys.
    pub fn on_miss<F>(mut self, on_miss: F) -> Self
    where
        F: Fn(&K) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        self.on_miss = Some(Arc::new(on_miss));
        self
    }

    /// Pre-loads pairs in order; later pairs may evict earlier ones.
    pub fn values<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.values.extend(values);
        self
    }

    /// # Errors
    /// `InvalidArgument` if the capacity is zero.
    pub fn build(self) -> Result<Cache<K, V>> {
        let cache = Cache::build(self.capacity, self.policy, self.on_miss)?;
        cache.update(self.values);
        Ok(cache)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn filled(policy: EvictionPolicy) -> Cache<&'static str, &'static str> {
        let cache = Cache::new(2, policy).unwrap();
        cache.set("a", "A");
        cache.set("b", "B");
        cache
    }

    #[test]
    fn test_cache_new_rejects_zero_capacity() {
        let result: Result<Cache<u32, u32>> = Cache::lru(0);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_cache_set_and_get() {
        let cache = Cache::lru(4).unwrap();
        cache.set("key1".to_string(), "value1".to_string());

        assert_eq!(cache.get(&"key1".to_string()).unwrap(), "value1");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hit_count(), 1);
        assert_eq!(cache.miss_count(), 0);
        cache.validate();
    }

    #[test]
    fn test_cache_get_nonexistent() {
        let cache: Cache<&str, i32> = Cache::lru(4).unwrap();
        assert!(matches!(cache.get(&"nope"), Err(CacheError::KeyNotFound(_))));
        assert_eq!(cache.miss_count(), 1);
        assert_eq!(cache.soft_miss_count(), 0);
    }

    #[test]
    fn test_lru_scenario() {
        let cache = filled(EvictionPolicy::Lru);
        for _ in 0..3 {
            assert_eq!(cache.get(&"b").unwrap(), "B");
        }
        cache.set("c", "C");

        assert_eq!(cache.get_or_default(&"a", "none"), "none");
        assert_eq!(
            (cache.hit_count(), cache.miss_count(), cache.soft_miss_count()),
            (3, 1, 1)
        );
        assert_eq!(cache.get(&"b").unwrap(), "B");
        assert_eq!(cache.get(&"c").unwrap(), "C");
        assert!(matches!(cache.get(&"a"), Err(CacheError::KeyNotFound(_))));
        cache.validate();
    }

    #[test]
    fn test_lri_scenario() {
        let cache = filled(EvictionPolicy::Lri);
        for _ in 0..3 {
            assert_eq!(cache.get(&"b").unwrap(), "B");
        }
        cache.set("c", "C");

        assert_eq!(cache.get_or_default(&"a", "none"), "none");
        assert_eq!(
            (cache.hit_count(), cache.miss_count(), cache.soft_miss_count()),
            (3, 1, 1)
        );
        assert!(cache.contains(&"b"));
        assert!(cache.contains(&"c"));
        cache.validate();
    }

    #[test]
    fn test_lri_and_lru_diverge_on_read_of_oldest() {
        let lru = filled(EvictionPolicy::Lru);
        let lri = filled(EvictionPolicy::Lri);

        // Read "a" before the third insert
        lru.get(&"a").unwrap();
        lri.get(&"a").unwrap();
        lru.set("c", "C");
        lri.set("c", "C");

        assert!(lru.contains(&"a"));
        assert!(!lru.contains(&"b"));
        assert!(!lri.contains(&"a"));
        assert!(lri.contains(&"b"));
    }

    #[test]
    fn test_write_promotes_under_both_policies() {
        for policy in [EvictionPolicy::Lri, EvictionPolicy::Lru] {
            let cache = filled(policy);
            cache.set("a", "AA");
            cache.set("c", "C");

            assert_eq!(cache.peek(&"a"), Some("AA"));
            assert!(!cache.contains(&"b"), "policy {policy}");
            cache.validate();
        }
    }

    #[test]
    fn test_eviction_counted() {
        let cache = Cache::lru(1).unwrap();
        cache.set(1, 1);
        cache.set(2, 2);
        cache.set(3, 3);
        assert_eq!(cache.stats().evictions, 2);
        assert_eq!(cache.items(), vec![(3, 3)]);
    }

    #[test]
    fn test_peek_does_not_promote() {
        let cache = filled(EvictionPolicy::Lru);
        assert_eq!(cache.peek(&"a"), Some("A"));
        cache.set("c", "C");
        assert!(!cache.contains(&"a"));
        assert_eq!(cache.hit_count(), 0);
    }

    #[test]
    fn test_on_miss_fills_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cache = Cache::builder(4)
            .on_miss(move |k: &u32| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(k * 10)
            })
            .build()
            .unwrap();

        assert_eq!(cache.get(&3).unwrap(), 30);
        assert_eq!(cache.get(&3).unwrap(), 30);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.miss_count(), 1);
        assert_eq!(cache.hit_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_on_miss_error_propagates_without_caching() {
        let cache: Cache<u32, u32> = Cache::builder(4)
            .on_miss(|k: &u32| Err(anyhow::anyhow!("cannot compute {}", k)))
            .build()
            .unwrap();

        let err = cache.get(&7).unwrap_err();
        assert_eq!(err.to_string(), "cannot compute 7");
        assert!(cache.is_empty());

        assert_eq!(cache.get_or_default(&7, 0), 0);
        assert_eq!(cache.miss_count(), 2);
        assert_eq!(cache.soft_miss_count(), 1);
    }

    #[test]
    fn test_get_or_default_fills_through_on_miss() {
        let cache = Cache::builder(4)
            .on_miss(|k: &u32| Ok(k + 100))
            .build()
            .unwrap();

        assert_eq!(cache.get_or_default(&1, 0), 101);
        assert_eq!(cache.peek(&1), Some(101));
        assert_eq!(cache.miss_count(), 1);
        assert_eq!(cache.soft_miss_count(), 0);
    }

    #[test]
    fn test_copy_keeps_on_miss() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cache = Cache::builder(4)
            .on_miss(move |k: &u32| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(k * 2)
            })
            .build()
            .unwrap();
        cache.set(1, 1);

        let copy = cache.copy();
        assert_eq!(copy.get(&5).unwrap(), 10);
        assert_eq!(copy.get(&1).unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(copy.len(), 2);
        assert!(!cache.contains(&5));

        let cloned = cache.clone();
        assert_eq!(cloned.get_or_default(&6, 0), 12);
        assert_eq!(cloned.soft_miss_count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_set_default() {
        let cache = Cache::lru(2).unwrap();
        assert_eq!(cache.set_default("a", 1), 1);
        assert_eq!(cache.set_default("a", 2), 1);
        assert_eq!(cache.miss_count(), 1);
        assert_eq!(cache.soft_miss_count(), 1);
        assert_eq!(cache.hit_count(), 1);
    }

    #[test]
    fn test_delete() {
        let cache = filled(EvictionPolicy::Lru);
        cache.delete(&"a").unwrap();
        assert_eq!(cache.len(), 1);
        assert!(matches!(cache.delete(&"a"), Err(CacheError::KeyNotFound(_))));
        cache.validate();
    }

    #[test]
    fn test_pop_bypasses_stats() {
        let cache = filled(EvictionPolicy::Lru);
        assert_eq!(cache.pop(&"a").unwrap(), "A");
        assert!(matches!(cache.pop(&"a"), Err(CacheError::KeyNotFound(_))));
        assert_eq!(cache.pop_or(&"a", "fallback"), "fallback");
        assert_eq!(cache.pop_or(&"b", "fallback"), "B");
        assert_eq!(cache.stats(), CacheStats::default());
        cache.validate();
    }

    #[test]
    fn test_pop_item_takes_oldest() {
        let cache = filled(EvictionPolicy::Lru);
        cache.get(&"a").unwrap();
        assert_eq!(cache.pop_item().unwrap(), ("b", "B"));
        assert_eq!(cache.pop_item().unwrap(), ("a", "A"));
        assert!(matches!(cache.pop_item(), Err(CacheError::Empty)));
        cache.validate();
    }

    #[test]
    fn test_clear_keeps_stats() {
        let cache = filled(EvictionPolicy::Lru);
        cache.get(&"a").unwrap();
        let _ = cache.get(&"zzz");

        cache.clear();
        assert_eq!(cache.len(), 0);
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.hit_count(), 1);
        assert_eq!(cache.miss_count(), 1);

        cache.set("c", "C");
        assert_eq!(cache.items(), vec![("c", "C")]);
        cache.validate();
    }

    #[test]
    fn test_items_in_recency_order() {
        let cache = Cache::lru(3).unwrap();
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.get(&"a").unwrap();

        assert_eq!(cache.keys(), vec!["b", "c", "a"]);
        assert_eq!(cache.values(), vec![2, 3, 1]);
    }

    #[test]
    fn test_copy_has_fresh_stats() {
        let cache = filled(EvictionPolicy::Lri);
        cache.get(&"a").unwrap();

        let copy = cache.copy();
        assert_eq!(copy, cache);
        assert_eq!(copy.items(), cache.items());
        assert_eq!(copy.policy(), EvictionPolicy::Lri);
        assert_eq!(copy.capacity(), 2);
        assert_eq!(copy.hit_count(), 0);

        copy.set("c", "C");
        assert_ne!(copy, cache);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_equality_ignores_order_and_stats() {
        let left = Cache::lru(4).unwrap();
        let right = Cache::lri(8).unwrap();
        left.set(1, "one");
        left.set(2, "two");
        right.set(2, "two");
        right.set(1, "one");
        right.get(&1).unwrap();

        assert_eq!(left, right);
        assert_eq!(left, left);
        right.set(3, "three");
        assert_ne!(left, right);
    }

    #[test]
    fn test_update_and_update_from() {
        let cache = Cache::lru(3).unwrap();
        cache.update(vec![("a", 1), ("b", 2)]);
        cache.update_from(&cache);
        assert_eq!(cache.len(), 2);

        let other = Cache::lru(3).unwrap();
        other.set("c", 3);
        other.set("a", 10);
        cache.update_from(&other);
        assert_eq!(cache.items(), vec![("b", 2), ("c", 3), ("a", 10)]);
    }

    #[test]
    fn test_builder_initial_values() {
        let cache = Cache::builder(2)
            .policy(EvictionPolicy::Lri)
            .values(vec![(1, "a"), (2, "b"), (3, "c")])
            .build()
            .unwrap();
        assert_eq!(cache.keys(), vec![2, 3]);
        assert_eq!(cache.policy(), EvictionPolicy::Lri);
    }

    #[test]
    fn test_from_config() {
        let config = CacheConfig::default().with_max_size(3);
        let cache: Cache<u8, u8> = Cache::from_config(&config).unwrap();
        assert_eq!(cache.capacity(), 3);
        assert_eq!(cache.policy(), EvictionPolicy::Lru);

        let config = CacheConfig::default().with_max_size(0);
        assert!(Cache::<u8, u8>::from_config(&config).is_err());
    }

    #[test]
    fn test_debug_output() {
        let cache = Cache::lri(2).unwrap();
        cache.set("a", 1);
        let rendered = format!("{:?}", cache);
        assert_eq!(
            rendered,
            "Cache { policy: Lri, capacity: 2, on_miss: false, entries: {\"a\": 1} }"
        );
    }

    #[test]
    fn test_stats_snapshot() {
        let cache = filled(EvictionPolicy::Lru);
        cache.get(&"a").unwrap();
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.total_entries, 2);
    }
}
