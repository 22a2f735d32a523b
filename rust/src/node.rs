//! Node-level structural queries and key routing.
//!
//! Routing is upper-bound based: keys equal to a separator go to its
//! right, so duplicates are stored after the equal keys already present.

use crate::types::{Node, NULL_NODE};

impl<K> Node<K> {
    /// Creates an empty leaf.
    pub fn leaf() -> Self {
        Self {
            keys: Vec::new(),
            children: Vec::new(),
            is_leaf: true,
            parent: NULL_NODE,
            next: NULL_NODE,
        }
    }

    /// Creates an empty internal node.
    pub fn internal() -> Self {
        Self {
            is_leaf: false,
            ..Self::leaf()
        }
    }

    /// Returns the number of keys in this node.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    pub fn last_key(&self) -> Option<&K> {
        self.keys.last()
    }
}

impl<K: Ord> Node<K> {
    /// Index of the first key not less than `key`.
    pub fn lower_bound(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k < key)
    }

    /// Index of the first key greater than `key`.
    pub fn upper_bound(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k <= key)
    }

    /// Child that an insertion of `key` descends into.
    pub fn child_index(&self, key: &K) -> usize {
        self.upper_bound(key)
    }

    /// Position of the first copy of `key`, if present.
    pub fn find_key(&self, key: &K) -> Option<usize> {
        let index = self.lower_bound(key);
        (self.keys.get(index) == Some(key)).then_some(index)
    }

    /// Insert `key` after any equal keys and return its position.
    pub fn insert_sorted(&mut self, key: K) -> usize {
        let index = self.upper_bound(&key);
        self.keys.insert(index, key);
        index
    }
}
