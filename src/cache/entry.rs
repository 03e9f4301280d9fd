//! Cache Entry Module
//!
//! Defines the recency list node that carries a cached key and value.

// == Node Id ==
/// Stable handle to a node in the recency list arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

// == Cache Entry ==
/// A single node of the circular recency list.
///
/// `key` and `value` are `None` only for the anchor and for freed slots.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<K, V> {
    pub(crate) key: Option<K>,
    pub(crate) value: Option<V>,
    pub(crate) prev: NodeId,
    pub(crate) next: NodeId,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructors ==
    /// Creates an anchor node linked to itself.
    pub(crate) fn anchor(id: NodeId) -> Self {
        Self {
            key: None,
            value: None,
            prev: id,
            next: id,
        }
    }

    /// Creates a live node between `prev` and `next`.
    pub(crate) fn linked(key: K, value: V, prev: NodeId, next: NodeId) -> Self {
        Self {
            key: Some(key),
            value: Some(value),
            prev,
            next,
        }
    }

    // == Accessors ==
    /// Returns the value, or None for the anchor.
    pub(crate) fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// True when the node carries no key, as the anchor does.
    pub(crate) fn is_vacant(&self) -> bool {
        self.key.is_none()
    }

    /// Moves the key and value out, leaving the node vacant.
    pub(crate) fn take(&mut self) -> Option<(K, V)> {
        match (self.key.take(), self.value.take()) {
            (Some(key), Some(value)) => Some((key, value)),
            _ => None,
        }
    }
}
