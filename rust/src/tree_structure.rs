//! Tree structure queries, snapshot access and statistics.
//!
//! External renderers read the tree through [`NodeView`] (borrowed) or
//! [`TreeSnapshot`] (owned deep copy). Neither can mutate the tree.

use std::fmt::Debug;

use crate::arena::{ArenaStats, NodeArena};
use crate::policy::DegreePolicy;
use crate::trace::{PageCounters, Trace, TraceEventKind, TraceRecorder};
use crate::types::{KeyLayout, MultiwayTree, Node, NodeId, NULL_NODE};

// ============================================================================
// SNAPSHOT TYPES
// ============================================================================

/// Read-only view of one node.
#[derive(Debug)]
pub struct NodeView<'a, K> {
    arena: &'a NodeArena<Node<K>>,
    id: NodeId,
}

impl<K> Clone for NodeView<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for NodeView<'_, K> {}

impl<'a, K> NodeView<'a, K> {
    pub(crate) fn new(arena: &'a NodeArena<Node<K>>, id: NodeId) -> Self {
        Self { arena, id }
    }

    fn node(&self) -> &'a Node<K> {
        &self.arena[self.id]
    }

    /// Arena id of the node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn keys(&self) -> &'a [K] {
        &self.node().keys
    }

    pub fn len(&self) -> usize {
        self.node().len()
    }

    pub fn is_empty(&self) -> bool {
        self.node().is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.node().is_leaf
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    pub fn child(&self, index: usize) -> Option<NodeView<'a, K>> {
        let arena = self.arena;
        self.node()
            .children
            .get(index)
            .map(|&id| NodeView::new(arena, id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeView<'a, K>> + 'a {
        let arena = self.arena;
        self.node()
            .children
            .iter()
            .map(move |&id| NodeView::new(arena, id))
    }

    pub fn parent(&self) -> Option<NodeView<'a, K>> {
        let parent = self.node().parent;
        (parent != NULL_NODE).then(|| NodeView::new(self.arena, parent))
    }

    /// Next leaf in the chain (B+Tree leaves only).
    pub fn next_leaf(&self) -> Option<NodeView<'a, K>> {
        let next = self.node().next;
        (next != NULL_NODE).then(|| NodeView::new(self.arena, next))
    }
}

/// Owned copy of one node and its subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SnapshotNode<K> {
    pub keys: Vec<K>,
    pub is_leaf: bool,
    pub children: Vec<SnapshotNode<K>>,
}

impl<K> SnapshotNode<K> {
    /// Follow a child index path from this node.
    pub fn resolve(&self, path: &[usize]) -> Option<&SnapshotNode<K>> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get(index))
    }

    /// Keys of every leaf, left to right.
    pub fn leaf_keys(&self) -> Vec<&K> {
        if self.is_leaf {
            return self.keys.iter().collect();
        }
        self.children.iter().flat_map(|child| child.leaf_keys()).collect()
    }
}

/// Owned deep copy of a whole tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TreeSnapshot<K> {
    pub root: SnapshotNode<K>,
}

impl<K> TreeSnapshot<K> {
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = &self.root;
        while let Some(child) = node.children.first() {
            node = child;
            height += 1;
        }
        height
    }
}

/// Size and cost figures for a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub keys: usize,
    pub nodes: usize,
    pub leaves: usize,
    pub height: usize,
    pub arena: ArenaStats,
    /// Page accesses accumulated since construction.
    pub io: PageCounters,
}

// ============================================================================
// TREE STRUCTURE OPERATIONS
// ============================================================================

impl<K, P: DegreePolicy> MultiwayTree<K, P> {
    /// Returns the number of keys in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// View of the current root.
    pub fn root(&self) -> NodeView<'_, K> {
        NodeView::new(&self.arena, self.root)
    }

    /// View of an arbitrary live node.
    pub fn node(&self, id: NodeId) -> Option<NodeView<'_, K>> {
        self.arena
            .contains(id)
            .then(|| NodeView::new(&self.arena, id))
    }

    /// Number of levels; a lone leaf root has height 1.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.root;
        while let Some(&child) = self.arena[current].children.first() {
            current = child;
            height += 1;
        }
        height
    }

    /// Child-index path from the root to `id`, rebuilt from parent links.
    pub fn path_to(&self, id: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = id;
        loop {
            let parent = self.arena.get(current)?.parent;
            if parent == NULL_NODE {
                break;
            }
            let index = self.arena.get(parent)?.children.iter().position(|&c| c == current)?;
            path.push(index);
            current = parent;
        }
        (current == self.root).then(|| {
            path.reverse();
            path
        })
    }

    /// Leftmost leaf id.
    pub(crate) fn first_leaf_id(&self) -> NodeId {
        let mut current = self.root;
        while let Some(&child) = self.arena[current].children.first() {
            current = child;
        }
        current
    }

    pub(crate) fn last_leaf_id(&self) -> NodeId {
        let mut current = self.root;
        while let Some(&child) = self.arena[current].children.last() {
            current = child;
        }
        current
    }

    /// Count leaf and internal nodes reachable from the root.
    pub fn count_nodes_in_tree(&self) -> (usize, usize) {
        let mut leaves = 0;
        let mut internal = 0;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.arena[id];
            if node.is_leaf {
                leaves += 1;
            } else {
                internal += 1;
                stack.extend(node.children.iter().copied());
            }
        }
        (leaves, internal)
    }

    pub fn leaf_count(&self) -> usize {
        self.count_nodes_in_tree().0
    }

    /// Page accesses accumulated since construction.
    pub fn io_totals(&self) -> PageCounters {
        self.io
    }

    pub fn stats(&self) -> TreeStats {
        let (leaves, internal) = self.count_nodes_in_tree();
        TreeStats {
            keys: self.len,
            nodes: leaves + internal,
            leaves,
            height: self.height(),
            arena: self.arena.stats(),
            io: self.io,
        }
    }

    /// Remove every key, leaving an empty leaf root.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = self.arena.allocate(Node::leaf());
        self.len = 0;
    }

    /// Sets the `parent` of every child of `id` to `id`.
    pub(crate) fn reparent_children(&mut self, id: NodeId) {
        for index in 0..self.arena[id].children.len() {
            let child = self.arena[id].children[index];
            self.arena[child].parent = id;
        }
    }
}

impl<K: Clone, P: DegreePolicy> MultiwayTree<K, P> {
    /// Owned deep copy of the whole tree.
    pub fn snapshot(&self) -> TreeSnapshot<K> {
        TreeSnapshot {
            root: self.snapshot_node(self.root),
        }
    }

    fn snapshot_node(&self, id: NodeId) -> SnapshotNode<K> {
        let node = &self.arena[id];
        SnapshotNode {
            keys: node.keys.clone(),
            is_leaf: node.is_leaf,
            children: node
                .children
                .iter()
                .map(|&child| self.snapshot_node(child))
                .collect(),
        }
    }
}

impl<K: Ord + Clone + Debug, P: DegreePolicy> MultiwayTree<K, P> {
    /// Returns true if at least one copy of `key` is stored.
    pub fn contains(&self, key: &K) -> bool {
        self.contains_in(self.root, key)
    }

    fn contains_in(&self, id: NodeId, key: &K) -> bool {
        let node = &self.arena[id];
        if node.find_key(key).is_some()
            && (node.is_leaf || P::LAYOUT == KeyLayout::Classic)
        {
            return true;
        }
        if node.is_leaf {
            return false;
        }
        // Separators equal to `key` leave both neighbours as candidates.
        (node.lower_bound(key)..=node.upper_bound(key))
            .any(|index| self.contains_in(node.children[index], key))
    }

    /// Smallest stored key.
    pub fn first(&self) -> Option<&K> {
        self.keys().next()
    }

    /// Largest stored key.
    pub fn last(&self) -> Option<&K> {
        match P::LAYOUT {
            KeyLayout::LeafLinked => self.arena[self.last_leaf_id()].keys.last(),
            KeyLayout::Classic => {
                let mut current = self.root;
                loop {
                    let node = &self.arena[current];
                    match node.children.last() {
                        Some(&child) => current = child,
                        None => return node.keys.last(),
                    }
                }
            }
        }
    }

    /// Record an event, attaching a snapshot when enabled.
    pub(crate) fn emit(
        &self,
        recorder: &mut TraceRecorder<K>,
        kind: TraceEventKind,
        description: String,
        path: &[usize],
    ) {
        let snapshot = self.capture_snapshots.then(|| self.snapshot());
        recorder.record(kind, description, path, snapshot);
    }

    /// Close an operation: emit the completion event and fold its cost
    /// into the lifetime totals.
    pub(crate) fn finish(&mut self, mut recorder: TraceRecorder<K>, description: String) -> Trace<K> {
        self.emit(&mut recorder, TraceEventKind::Complete, description, &[]);
        self.io += recorder.counters();
        recorder.into_trace()
    }
}
