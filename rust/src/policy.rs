//! Degree policies: per-variant bounds and overflow handling.
//!
//! All three variants share the same engines. A policy only answers
//! questions about bounds for a given minimum degree `t` and names the
//! overflow strategy and key layout the engines dispatch on.

use std::fmt::Debug;

use crate::error::{InitResult, TreeError};
use crate::types::{KeyLayout, Node, OverflowStrategy, Variant};

/// Bounds and strategy selection for one tree variant.
pub trait DegreePolicy: Debug + Copy + Default + 'static {
    const VARIANT: Variant;
    /// Smallest accepted minimum degree.
    const MIN_DEGREE: usize;
    /// Degree used by `Default` and `with_default_degree`.
    const DEFAULT_DEGREE: usize;
    const OVERFLOW: OverflowStrategy;
    const LAYOUT: KeyLayout;

    fn validate_degree(t: usize) -> InitResult<()> {
        if t < Self::MIN_DEGREE {
            Err(TreeError::invalid_degree(Self::VARIANT, t, Self::MIN_DEGREE))
        } else {
            Ok(())
        }
    }

    /// Maximum keys per node.
    fn max_keys(t: usize) -> usize {
        2 * t - 1
    }

    /// Minimum keys per node; the root is exempt.
    fn min_keys(t: usize, is_root: bool) -> usize {
        if is_root {
            0
        } else {
            t - 1
        }
    }

    /// Occupancy the overflow strategy aims for.
    ///
    /// Redistributing variants keep nodes about two thirds full before
    /// they split; splitting variants only guarantee the minimum.
    fn fill_target(t: usize) -> usize {
        match Self::OVERFLOW {
            OverflowStrategy::Split => Self::min_keys(t, false),
            OverflowStrategy::RedistributeThenSplit => (2 * Self::max_keys(t)).div_ceil(3),
        }
    }

    /// The node must be relieved before an insertion descends into it.
    fn is_overfull<K>(node: &Node<K>, t: usize) -> bool {
        node.len() >= Self::max_keys(t)
    }

    /// The node holds fewer keys than allowed.
    fn is_underfull<K>(node: &Node<K>, t: usize, is_root: bool) -> bool {
        node.len() < Self::min_keys(t, is_root)
    }

    /// The node sits at the minimum and must be filled before a deletion
    /// descends into it.
    fn needs_fill<K>(node: &Node<K>, t: usize) -> bool {
        node.len() <= Self::min_keys(t, false)
    }

    /// The node can give a key away and stay within bounds.
    fn can_lend<K>(node: &Node<K>, t: usize) -> bool {
        node.len() > Self::min_keys(t, false)
    }

    /// The node can absorb a redistributed key and still not be full.
    fn can_absorb<K>(node: &Node<K>, t: usize) -> bool {
        node.len() + 1 < Self::max_keys(t)
    }
}

variant_facade! {
    /// Classic B-Tree: keys in every node, median moves up on split.
    ///
    /// ```
    /// use btree_variants::BTree;
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// tree.insert(1);
    /// assert!(tree.contains(&1));
    /// ```
    BTree {
        variant: Variant::BTree,
        min_degree: 2,
        default_degree: 2,
        overflow: OverflowStrategy::Split,
        layout: KeyLayout::Classic,
    }
}

variant_facade! {
    /// B*-Tree: a full child first shifts a key to a sibling; only when
    /// the siblings are full too are two nodes re-cut into three.
    ///
    /// ```
    /// use btree_variants::BStarTree;
    ///
    /// assert!(BStarTree::<i32>::new(2).is_err());
    /// assert!(BStarTree::<i32>::new(3).is_ok());
    /// ```
    BStarTree {
        variant: Variant::BStarTree,
        min_degree: 3,
        default_degree: 3,
        overflow: OverflowStrategy::RedistributeThenSplit,
        layout: KeyLayout::Classic,
    }
}

variant_facade! {
    /// B+Tree: keys live in chained leaves, separators are copied up.
    ///
    /// ```
    /// use btree_variants::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new(3).unwrap();
    /// for key in 1..=7 {
    ///     tree.insert(key);
    /// }
    /// let chained: Vec<i32> = tree.leaves().flat_map(|leaf| leaf.keys().to_vec()).collect();
    /// assert_eq!(chained, (1..=7).collect::<Vec<_>>());
    /// ```
    BPlusTree {
        variant: Variant::BPlusTree,
        min_degree: 2,
        default_degree: 3,
        overflow: OverflowStrategy::Split,
        layout: KeyLayout::LeafLinked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(BTreePolicy::max_keys(2), 3);
        assert_eq!(BTreePolicy::min_keys(2, false), 1);
        assert_eq!(BTreePolicy::min_keys(2, true), 0);
        assert_eq!(BPlusTreePolicy::max_keys(3), 5);
        assert_eq!(BStarTreePolicy::min_keys(3, false), 2);
    }

    #[test]
    fn test_fill_target() {
        assert_eq!(BTreePolicy::fill_target(3), 2);
        assert_eq!(BStarTreePolicy::fill_target(3), 4);
        assert_eq!(BStarTreePolicy::fill_target(4), 5);
    }

    #[test]
    fn test_degree_validation() {
        assert!(BTreePolicy::validate_degree(2).is_ok());
        assert!(BTreePolicy::validate_degree(1).is_err());
        assert!(BPlusTreePolicy::validate_degree(2).is_ok());
        assert_eq!(
            BStarTreePolicy::validate_degree(2),
            Err(TreeError::invalid_degree(Variant::BStarTree, 2, 3))
        );
    }

    #[test]
    fn test_node_predicates() {
        let mut node = Node::<i32>::leaf();
        node.keys = vec![1, 2, 3];
        assert!(BTreePolicy::is_overfull(&node, 2));
        assert!(!BTreePolicy::is_overfull(&node, 3));

        node.keys = vec![1, 2];
        assert!(BStarTreePolicy::needs_fill(&node, 3));
        assert!(!BStarTreePolicy::can_lend(&node, 3));
        assert!(BStarTreePolicy::can_absorb(&node, 3));

        node.keys = vec![1];
        assert!(BStarTreePolicy::is_underfull(&node, 3, false));
        assert!(!BStarTreePolicy::is_underfull(&node, 3, true));

        node.keys = vec![1, 2, 3, 4];
        assert!(!BStarTreePolicy::can_absorb(&node, 3));
        assert!(BStarTreePolicy::can_lend(&node, 3));
    }

    #[test]
    fn test_strategies() {
        assert_eq!(BStarTreePolicy::OVERFLOW, OverflowStrategy::RedistributeThenSplit);
        assert_eq!(BPlusTreePolicy::LAYOUT, KeyLayout::LeafLinked);
        assert_eq!(BTreePolicy::VARIANT, Variant::BTree);
    }
}
