//! Slot arena that owns every node of a tree.
//!
//! Nodes refer to each other by [`NodeId`]. Freed slots go on a free list
//! and are reused by later allocations, so ids are stable for the lifetime
//! of a node but may be recycled afterwards.

use std::convert::TryFrom;
use std::ops::{Index, IndexMut};

use crate::types::{NodeId, NULL_NODE};

/// Statistics for a node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    pub total_slots: usize,
    pub allocated_count: usize,
    pub free_count: usize,
}

/// Arena allocator with a free list and an allocation mask.
#[derive(Debug, Clone)]
pub struct NodeArena<T> {
    storage: Vec<T>,
    /// Free slot indices for reuse
    free_list: Vec<usize>,
    /// Track which slots are actually allocated
    allocated_mask: Vec<bool>,
    live: usize,
}

impl<T> NodeArena<T> {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            free_list: Vec::new(),
            allocated_mask: Vec::new(),
            live: 0,
        }
    }

    /// Allocate a new item in the arena and return its ID
    #[inline]
    pub fn allocate(&mut self, item: T) -> NodeId {
        let index = if let Some(free_index) = self.free_list.pop() {
            self.storage[free_index] = item;
            self.allocated_mask[free_index] = true;
            free_index
        } else {
            let index = self.storage.len();
            self.storage.push(item);
            self.allocated_mask.push(true);
            index
        };
        self.live += 1;

        NodeId::try_from(index).expect("arena index should fit in NodeId")
    }

    /// Get a reference to an item in the arena
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        let index = self.slot(id)?;
        Some(&self.storage[index])
    }

    /// Get a mutable reference to an item in the arena
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let index = self.slot(id)?;
        Some(&mut self.storage[index])
    }

    /// Check if an ID is valid and allocated
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    fn slot(&self, id: NodeId) -> Option<usize> {
        if id == NULL_NODE {
            return None;
        }
        let index = usize::try_from(id).ok()?;
        self.allocated_mask
            .get(index)
            .copied()
            .unwrap_or(false)
            .then_some(index)
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Get the number of free slots
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Get arena statistics
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            total_slots: self.storage.len(),
            allocated_count: self.live,
            free_count: self.free_list.len(),
        }
    }

    /// Clear all items from the arena
    pub fn clear(&mut self) {
        self.storage.clear();
        self.allocated_mask.clear();
        self.free_list.clear();
        self.live = 0;
    }
}

impl<T: Default> NodeArena<T> {
    /// Free a slot and hand back its contents.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not allocated.
    pub fn remove(&mut self, id: NodeId) -> T {
        let Some(index) = self.slot(id) else {
            panic!("attempted to free unallocated node {}", id);
        };
        self.allocated_mask[index] = false;
        self.free_list.push(index);
        self.live -= 1;
        std::mem::take(&mut self.storage[index])
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<NodeId> for NodeArena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        match self.get(id) {
            Some(item) => item,
            None => panic!("dangling node id {}", id),
        }
    }
}

impl<T> IndexMut<NodeId> for NodeArena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        match self.get_mut(id) {
            Some(item) => item,
            None => panic!("dangling node id {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_basic_operations() {
        let mut arena = NodeArena::new();

        let id1 = arena.allocate(42);
        let id2 = arena.allocate(84);
        let id3 = arena.allocate(126);

        assert_eq!(arena.get(id1), Some(&42));
        assert_eq!(arena[id2], 84);
        assert_eq!(arena[id3], 126);

        assert!(arena.contains(id1));
        assert!(!arena.contains(NULL_NODE));

        let stats = arena.stats();
        assert_eq!(stats.allocated_count, 3);
        assert_eq!(stats.free_count, 0);
    }

    #[test]
    fn test_arena_slot_reuse() {
        let mut arena: NodeArena<i32> = NodeArena::new();

        let id1 = arena.allocate(42);
        let id2 = arena.allocate(84);

        assert_eq!(arena.remove(id1), 42);
        assert!(!arena.contains(id1));
        assert!(arena.contains(id2));
        assert_eq!(arena.len(), 1);

        let id3 = arena.allocate(168);
        assert_eq!(id3, id1);
        assert_eq!(arena[id3], 168);

        let stats = arena.stats();
        assert_eq!(stats.allocated_count, 2);
        assert_eq!(stats.free_count, 0);
        assert_eq!(stats.total_slots, 2);
    }

    #[test]
    fn test_index_mut() {
        let mut arena = NodeArena::new();
        let id = arena.allocate(vec![1]);
        arena[id].push(2);
        assert_eq!(arena[id], vec![1, 2]);
    }

    #[test]
    #[should_panic(expected = "dangling node id")]
    fn test_dangling_index_panics() {
        let mut arena: NodeArena<i32> = NodeArena::new();
        let id = arena.allocate(1);
        arena.remove(id);
        let _ = arena[id];
    }

    #[test]
    fn test_clear() {
        let mut arena = NodeArena::new();
        arena.allocate(1);
        arena.allocate(2);
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.stats().total_slots, 0);
    }
}
