//! Validation and debugging utilities for the tree variants.
//!
//! The checker walks the whole tree once and reports the first broken
//! invariant it meets.

use std::fmt::{Debug, Write as _};

use crate::error::{TreeError, TreeResult};
use crate::policy::DegreePolicy;
use crate::types::{KeyLayout, MultiwayTree, NodeId, NULL_NODE};

/// State carried through one validation walk.
struct Walk {
    leaf_depth: Option<usize>,
    leaves: Vec<NodeId>,
    nodes: usize,
    stored_keys: usize,
}

// ============================================================================
// VALIDATION METHODS
// ============================================================================

impl<K: Ord + Debug, P: DegreePolicy> MultiwayTree<K, P> {
    /// Check every structural invariant.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvariantViolation`] naming the first broken invariant,
    /// or [`TreeError::NodeMissing`] for a dangling child or chain link.
    pub fn check_invariants(&self) -> TreeResult<()> {
        let root = self.arena.get(self.root).ok_or(TreeError::NodeMissing(self.root))?;
        if root.parent != NULL_NODE {
            return Err(TreeError::invariant("Root", "root has a parent"));
        }

        let mut walk = Walk {
            leaf_depth: None,
            leaves: Vec::new(),
            nodes: 0,
            stored_keys: 0,
        };
        self.check_node(self.root, None, None, 1, &mut walk)?;

        if walk.stored_keys != self.len {
            return Err(TreeError::invariant(
                "Length",
                &format!("{} keys stored, length is {}", walk.stored_keys, self.len),
            ));
        }

        let allocated = self.arena.len();
        if walk.nodes != allocated {
            return Err(TreeError::invariant(
                "Arena consistency",
                &format!("{} nodes in tree vs {} in arena", walk.nodes, allocated),
            ));
        }

        if P::LAYOUT == KeyLayout::LeafLinked {
            self.check_leaf_chain(&walk.leaves)?;
        }
        Ok(())
    }

    /// Returns true if [`check_invariants`](Self::check_invariants) passes.
    pub fn is_valid(&self) -> bool {
        self.check_invariants().is_ok()
    }

    fn check_node(
        &self,
        id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        walk: &mut Walk,
    ) -> TreeResult<()> {
        let node = self.arena.get(id).ok_or(TreeError::NodeMissing(id))?;
        let is_root = id == self.root;
        walk.nodes += 1;

        if node.keys.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(TreeError::invariant(
                "Key order",
                &format!("node {} holds unsorted keys {:?}", id, node.keys),
            ));
        }

        let max = P::max_keys(self.degree);
        let min = P::min_keys(self.degree, is_root);
        if node.len() > max || node.len() < min {
            return Err(TreeError::invariant(
                "Occupancy",
                &format!("node {} holds {} keys, allowed {}..={}", id, node.len(), min, max),
            ));
        }

        if let (Some(bound), Some(first)) = (lower, node.keys.first()) {
            if first < bound {
                return Err(TreeError::invariant(
                    "Separator order",
                    &format!("node {} key {:?} is below separator {:?}", id, first, bound),
                ));
            }
        }
        if let (Some(bound), Some(last)) = (upper, node.keys.last()) {
            if last > bound {
                return Err(TreeError::invariant(
                    "Separator order",
                    &format!("node {} key {:?} is above separator {:?}", id, last, bound),
                ));
            }
        }

        if node.is_leaf {
            if !node.children.is_empty() {
                return Err(TreeError::invariant(
                    "Leaf shape",
                    &format!("leaf {} has children", id),
                ));
            }
            if P::LAYOUT == KeyLayout::Classic && node.next != NULL_NODE {
                return Err(TreeError::invariant(
                    "Leaf shape",
                    &format!("leaf {} is chained in a classic tree", id),
                ));
            }
            match walk.leaf_depth {
                None => walk.leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(TreeError::invariant(
                        "Leaf depth",
                        &format!("leaf {} at depth {}, expected {}", id, depth, expected),
                    ));
                }
                Some(_) => {}
            }
            walk.leaves.push(id);
            walk.stored_keys += node.len();
            return Ok(());
        }

        if is_root && node.keys.is_empty() {
            return Err(TreeError::invariant("Root", "internal root has no keys"));
        }
        if node.children.len() != node.keys.len() + 1 {
            return Err(TreeError::invariant(
                "Fan-out",
                &format!(
                    "node {} has {} keys and {} children",
                    id,
                    node.keys.len(),
                    node.children.len()
                ),
            ));
        }
        if P::LAYOUT == KeyLayout::Classic {
            walk.stored_keys += node.len();
        }

        for (index, &child) in node.children.iter().enumerate() {
            let child_node = self.arena.get(child).ok_or(TreeError::NodeMissing(child))?;
            if child_node.parent != id {
                return Err(TreeError::invariant(
                    "Parent link",
                    &format!("child {} of node {} points to {}", child, id, child_node.parent),
                ));
            }
            let child_lower = if index == 0 { lower } else { Some(&node.keys[index - 1]) };
            let child_upper = node.keys.get(index).or(upper);
            self.check_node(child, child_lower, child_upper, depth + 1, walk)?;
        }
        Ok(())
    }

    /// The `next` chain visits exactly the tree's leaves, in order.
    fn check_leaf_chain(&self, leaves: &[NodeId]) -> TreeResult<()> {
        let mut current = self.first_leaf_id();
        for (position, &expected) in leaves.iter().enumerate() {
            if current != expected {
                return Err(TreeError::invariant(
                    "Leaf chain",
                    &format!("link {} reaches node {}, expected leaf {}", position, current, expected),
                ));
            }
            current = self.arena.get(current).ok_or(TreeError::NodeMissing(current))?.next;
        }
        if current != NULL_NODE {
            return Err(TreeError::invariant(
                "Leaf chain",
                &format!("last leaf links on to node {}", current),
            ));
        }
        Ok(())
    }

    // ============================================================================
    // DEBUGGING UTILITIES
    // ============================================================================

    /// Returns the sizes of all leaf nodes, left to right.
    pub fn leaf_sizes(&self) -> Vec<usize> {
        self.leaves().map(|leaf| leaf.len()).collect()
    }

    /// Indented rendering of the tree, one node per line.
    ///
    /// ```
    /// use btree_variants::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// for key in 1..=4 {
    ///     tree.insert(key);
    /// }
    /// assert_eq!(tree.structure_string(), "[2]\n  [1]\n  [3, 4]\n");
    /// ```
    pub fn structure_string(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.arena[id];
            let _ = writeln!(out, "{}{:?}", "  ".repeat(depth), node.keys);
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        out
    }
}
