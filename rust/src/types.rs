//! Core types and data structures shared by the three tree variants.
//!
//! This module contains the node record stored in the arena, the tree
//! struct itself, and the small enums a [`DegreePolicy`] uses to describe
//! a variant.
//!
//! [`DegreePolicy`]: crate::policy::DegreePolicy

use std::fmt;
use std::marker::PhantomData;

use crate::arena::NodeArena;
use crate::trace::PageCounters;

// ============================================================================
// TYPE DEFINITIONS
// ============================================================================

/// Node ID type for arena-based allocation
pub type NodeId = u32;

/// Absent node reference (no parent, end of leaf chain).
pub const NULL_NODE: NodeId = u32::MAX;

/// The three supported tree variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Variant {
    BTree,
    BStarTree,
    BPlusTree,
}

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Variant::BTree => "B-Tree",
            Variant::BStarTree => "B*-Tree",
            Variant::BPlusTree => "B+Tree",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a full child is relieved before the insertion descends into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowStrategy {
    /// Split the child in two around its median.
    Split,
    /// Shift a key into a sibling with room; otherwise split two siblings into three.
    RedistributeThenSplit,
}

/// Where keys are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLayout {
    /// Every key lives in exactly one node, internal or leaf.
    Classic,
    /// Keys live in leaves; internal nodes hold copied separators and
    /// leaves form an ascending `next` chain.
    LeafLinked,
}

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// A page-like node.
///
/// `children` is empty for leaves and holds `keys.len() + 1` ids for
/// internal nodes. `parent` and `next` are non-owning annotations; the
/// arena owns every node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<K> {
    pub(crate) keys: Vec<K>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) is_leaf: bool,
    pub(crate) parent: NodeId,
    /// Next leaf in the chain (leaf-linked layout only).
    pub(crate) next: NodeId,
}

impl<K> Default for Node<K> {
    fn default() -> Self {
        Self::leaf()
    }
}

/// Multiway search tree parameterised by a degree policy.
///
/// Use the variant aliases [`BTree`], [`BStarTree`] and [`BPlusTree`]
/// rather than naming the policy directly.
///
/// ```
/// use btree_variants::BTree;
///
/// let mut tree = BTree::new(2).unwrap();
/// for key in [10, 20, 5, 6, 12, 30, 7, 17] {
///     tree.insert(key);
/// }
/// let keys: Vec<_> = tree.keys().copied().collect();
/// assert_eq!(keys, [5, 6, 7, 10, 12, 17, 20, 30]);
/// ```
///
/// [`BTree`]: crate::BTree
/// [`BStarTree`]: crate::BStarTree
/// [`BPlusTree`]: crate::BPlusTree
#[derive(Debug, Clone)]
pub struct MultiwayTree<K, P> {
    /// Minimum degree `t`.
    pub(crate) degree: usize,
    /// Attach a deep snapshot of the tree to every trace event.
    pub(crate) capture_snapshots: bool,
    pub(crate) root: NodeId,
    pub(crate) arena: NodeArena<Node<K>>,
    /// Number of stored keys (leaf entries for the leaf-linked layout).
    pub(crate) len: usize,
    /// Page accesses accumulated over every operation since construction.
    pub(crate) io: PageCounters,
    pub(crate) _policy: PhantomData<P>,
}
