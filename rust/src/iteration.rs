//! Iterators over the stored keys and the leaf level.
//!
//! The leaf-linked layout walks its `next` chain; the classic layout keeps
//! an explicit stack for an in-order traversal.

use std::iter::FusedIterator;

use crate::arena::NodeArena;
use crate::policy::DegreePolicy;
use crate::tree_structure::NodeView;
use crate::types::{KeyLayout, MultiwayTree, Node, NodeId, NULL_NODE};

// ============================================================================
// ITERATOR STRUCTS
// ============================================================================

/// Ascending iterator over every stored key, duplicates included.
pub struct KeyIterator<'a, K> {
    arena: &'a NodeArena<Node<K>>,
    cursor: Cursor,
    remaining: usize,
}

enum Cursor {
    /// Position in the leaf chain.
    Chain { leaf: NodeId, index: usize },
    /// Nodes on the current root-to-leaf path with the next key index of each.
    InOrder { stack: Vec<(NodeId, usize)> },
}

/// Iterator over the leaves, left to right.
pub struct LeafIterator<'a, K> {
    arena: &'a NodeArena<Node<K>>,
    walk: LeafWalk,
}

enum LeafWalk {
    Chain(NodeId),
    DepthFirst(Vec<NodeId>),
}

// ============================================================================
// TREE ITERATOR METHODS
// ============================================================================

impl<K, P: DegreePolicy> MultiwayTree<K, P> {
    /// Returns an iterator over all keys in ascending order.
    ///
    /// ```
    /// use btree_variants::BStarTree;
    ///
    /// let mut tree = BStarTree::new(3).unwrap();
    /// for key in [30, 10, 20, 10] {
    ///     tree.insert(key);
    /// }
    /// assert_eq!(tree.keys().copied().collect::<Vec<_>>(), vec![10, 10, 20, 30]);
    /// ```
    pub fn keys(&self) -> KeyIterator<'_, K> {
        let cursor = match P::LAYOUT {
            KeyLayout::LeafLinked => Cursor::Chain {
                leaf: self.first_leaf_id(),
                index: 0,
            },
            KeyLayout::Classic => {
                let mut stack = Vec::new();
                push_leftmost(&self.arena, &mut stack, self.root);
                Cursor::InOrder { stack }
            }
        };
        KeyIterator {
            arena: &self.arena,
            cursor,
            remaining: self.len,
        }
    }

    /// Returns an iterator over the leaves from left to right.
    pub fn leaves(&self) -> LeafIterator<'_, K> {
        let walk = match P::LAYOUT {
            KeyLayout::LeafLinked => LeafWalk::Chain(self.first_leaf_id()),
            KeyLayout::Classic => LeafWalk::DepthFirst(vec![self.root]),
        };
        LeafIterator {
            arena: &self.arena,
            walk,
        }
    }
}

impl<'a, K, P: DegreePolicy> IntoIterator for &'a MultiwayTree<K, P> {
    type Item = &'a K;
    type IntoIter = KeyIterator<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys()
    }
}

fn push_leftmost<K>(arena: &NodeArena<Node<K>>, stack: &mut Vec<(NodeId, usize)>, from: NodeId) {
    let mut current = from;
    loop {
        stack.push((current, 0));
        match arena[current].children.first() {
            Some(&child) => current = child,
            None => break,
        }
    }
}

// ============================================================================
// KEYITERATOR IMPLEMENTATION
// ============================================================================

impl<'a, K> Iterator for KeyIterator<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        let key = match &mut self.cursor {
            Cursor::Chain { leaf, index } => loop {
                if *leaf == NULL_NODE {
                    return None;
                }
                let node = &arena[*leaf];
                if let Some(key) = node.keys.get(*index) {
                    *index += 1;
                    break key;
                }
                *leaf = node.next;
                *index = 0;
            },
            Cursor::InOrder { stack } => loop {
                let (id, index) = stack.last_mut()?;
                let node = &arena[*id];
                if let Some(key) = node.keys.get(*index) {
                    *index += 1;
                    if let Some(&child) = node.children.get(*index) {
                        push_leftmost(arena, stack, child);
                    }
                    break key;
                }
                stack.pop();
            },
        };
        self.remaining = self.remaining.saturating_sub(1);
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for KeyIterator<'_, K> {}

impl<K> FusedIterator for KeyIterator<'_, K> {}

// ============================================================================
// LEAFITERATOR IMPLEMENTATION
// ============================================================================

impl<'a, K> Iterator for LeafIterator<'a, K> {
    type Item = NodeView<'a, K>;

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        match &mut self.walk {
            LeafWalk::Chain(current) => {
                if *current == NULL_NODE {
                    return None;
                }
                let leaf = *current;
                *current = arena[leaf].next;
                Some(NodeView::new(arena, leaf))
            }
            LeafWalk::DepthFirst(stack) => loop {
                let id = stack.pop()?;
                let node = &arena[id];
                if node.is_leaf {
                    return Some(NodeView::new(arena, id));
                }
                stack.extend(node.children.iter().rev().copied());
            },
        }
    }
}

impl<K> FusedIterator for LeafIterator<'_, K> {}
