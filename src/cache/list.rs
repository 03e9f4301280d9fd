//! Recency List Module
//!
//! Circular doubly-linked list with a single anchor node, stored in an arena
//! and linked by `NodeId`.
//!
//! Invariants:
//! - exactly one anchor, whose key and value are `None`
//! - the node just before the anchor is the most recently promoted
//! - the node just after the anchor is the least recently promoted
//!
//! Eviction reuses nodes: the anchor takes the incoming key and value and the
//! oldest node becomes the new anchor, so nothing is allocated.

use crate::cache::entry::{CacheEntry, NodeId};

// == Recency List ==
#[derive(Debug, Clone)]
pub(crate) struct RecencyList<K, V> {
    nodes: Vec<CacheEntry<K, V>>,
    /// Slots released by `unlink`, reused before the arena grows
    free: Vec<NodeId>,
    anchor: NodeId,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    // == Constructor ==
    /// Creates an empty list with room for `capacity` nodes plus the anchor.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity + 1);
        nodes.push(CacheEntry::anchor(NodeId(0)));
        Self {
            nodes,
            free: Vec::new(),
            anchor: NodeId(0),
            len: 0,
        }
    }

    // == Reset ==
    /// Drops every node and returns to the single-anchor state.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(CacheEntry::anchor(NodeId(0)));
        self.free.clear();
        self.anchor = NodeId(0);
        self.len = 0;
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Node Access ==
    fn node(&self, id: NodeId) -> &CacheEntry<K, V> {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut CacheEntry<K, V> {
        &mut self.nodes[id.0]
    }

    /// Returns the value held by a live node.
    pub fn value(&self, id: NodeId) -> Option<&V> {
        self.node(id).value()
    }

    /// Replaces the value held by a live node.
    pub fn set_value(&mut self, id: NodeId, value: V) {
        self.node_mut(id).value = Some(value);
    }

    /// Returns the eviction candidate, the node right after the anchor.
    pub fn oldest(&self) -> Option<NodeId> {
        let next = self.node(self.anchor).next;
        (next != self.anchor).then_some(next)
    }

    // == Linking ==
    fn splice_out(&mut self, id: NodeId) {
        let (prev, next) = {
            let node = self.node(id);
            (node.prev, node.next)
        };
        self.node_mut(prev).next = next;
        self.node_mut(next).prev = prev;
    }

    fn link_before_anchor(&mut self, id: NodeId) {
        let anchor = self.anchor;
        let newest = self.node(anchor).prev;
        {
            let node = self.node_mut(id);
            node.prev = newest;
            node.next = anchor;
        }
        self.node_mut(newest).next = id;
        self.node_mut(anchor).prev = id;
    }

    // == Push Newest ==
    /// Adds a node in the most recent position.
    pub fn push_newest(&mut self, key: K, value: V) -> NodeId {
        let anchor = self.anchor;
        let newest = self.node(anchor).prev;
        let entry = CacheEntry::linked(key, value, newest, anchor);
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = entry;
                id
            }
            None => {
                self.nodes.push(entry);
                NodeId(self.nodes.len() - 1)
            }
        };
        self.node_mut(newest).next = id;
        self.node_mut(anchor).prev = id;
        self.len += 1;
        id
    }

    // == Promote ==
    /// Moves a live node to the most recent position.
    pub fn move_to_newest(&mut self, id: NodeId) {
        if self.node(self.anchor).prev == id {
            return;
        }
        self.splice_out(id);
        self.link_before_anchor(id);
    }

    // == Replace Oldest ==
    /// Stores `key`/`value` as the newest entry, evicting the oldest one.
    ///
    /// Returns the node now holding `key` and the evicted pair. On an empty
    /// list nothing is evicted and the entry is pushed normally.
    pub fn replace_oldest(&mut self, key: K, value: V) -> (NodeId, Option<(K, V)>) {
        if self.is_empty() {
            return (self.push_newest(key, value), None);
        }

        let old_anchor = self.anchor;
        {
            let node = self.node_mut(old_anchor);
            node.key = Some(key);
            node.value = Some(value);
        }
        self.anchor = self.node(old_anchor).next;
        let anchor = self.anchor;
        let evicted = self.node_mut(anchor).take();
        (old_anchor, evicted)
    }

    // == Unlink ==
    /// Removes a live node, returning its pair and freeing the slot.
    pub fn unlink(&mut self, id: NodeId) -> Option<(K, V)> {
        if id == self.anchor || self.node(id).is_vacant() {
            return None;
        }
        self.splice_out(id);
        let pair = self.node_mut(id).take();
        self.free.push(id);
        self.len -= 1;
        pair
    }

    // == Iteration ==
    /// Iterates live entries from least to most recently promoted.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.node(self.anchor).next,
        }
    }

    /// Walks the links and checks them against the arena (tests only).
    #[cfg(test)]
    pub(crate) fn validate(&self) {
        let mut count = 0;
        let mut cursor = self.anchor;
        loop {
            let next = self.node(cursor).next;
            assert_eq!(self.node(next).prev, cursor, "broken back link");
            cursor = next;
            if cursor == self.anchor {
                break;
            }
            assert!(!self.node(cursor).is_vacant(), "vacant node in list");
            count += 1;
            assert!(count <= self.len, "cycle without anchor");
        }
        assert_eq!(count, self.len);
        assert!(self.node(self.anchor).is_vacant());
    }
}

// == Iterator ==
pub(crate) struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    cursor: NodeId,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == self.list.anchor {
            return None;
        }
        let node = self.list.node(self.cursor);
        self.cursor = node.next;
        match (node.key.as_ref(), node.value.as_ref()) {
            (Some(key), Some(value)) => Some((key, value)),
            _ => None,
        }
    }
}
