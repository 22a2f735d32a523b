//! INSERT operations for the tree variants.
//!
//! Insertion descends from the root and relieves every full node before
//! entering it, so a leaf always has room by the time it is reached. The
//! way a full node is relieved depends on the policy:
//!
//! - [`OverflowStrategy::Split`]: split around the median. The classic
//!   layout moves the median up; the leaf-linked layout copies the first
//!   key of the new right leaf up and splices the new leaf into the chain.
//! - [`OverflowStrategy::RedistributeThenSplit`]: shift one key through
//!   the parent into a sibling that can take it, otherwise re-cut the full
//!   node and a neighbour into three nodes and promote two keys.
//!
//! A full root is always split in two, growing the tree by one level.

use std::fmt::Debug;

use tracing::debug;

use crate::policy::DegreePolicy;
use crate::trace::{cost, Operation, Trace, TraceEventKind, TraceRecorder};
use crate::types::{KeyLayout, MultiwayTree, Node, NodeId, OverflowStrategy, NULL_NODE};

impl<K: Ord + Clone + Debug, P: DegreePolicy> MultiwayTree<K, P> {
    /// Insert `key`, keeping any equal keys already present.
    ///
    /// Returns the trace of the operation.
    ///
    /// ```
    /// use btree_variants::{BTree, TraceEventKind};
    ///
    /// let mut tree = BTree::new(2).unwrap();
    /// for key in [10, 20, 5] {
    ///     tree.insert(key);
    /// }
    /// let trace = tree.insert(6);
    /// assert_eq!(trace.count(TraceEventKind::NewRoot), 1);
    /// assert_eq!(trace.last().unwrap().kind, TraceEventKind::Complete);
    /// ```
    pub fn insert(&mut self, key: K) -> Trace<K> {
        let mut recorder = TraceRecorder::new(P::VARIANT, Operation::Insert);
        recorder.read(1);

        if P::is_overfull(&self.arena[self.root], self.degree) {
            self.grow_root(&mut recorder);
        }

        let mut current = self.root;
        let mut path = Vec::new();
        loop {
            self.emit(
                &mut recorder,
                TraceEventKind::Examine,
                format!("examining node {:?} to insert {:?}", self.arena[current].keys, key),
                &path,
            );

            if self.arena[current].is_leaf {
                let position = self.arena[current].insert_sorted(key.clone());
                recorder.write(1);
                self.len += 1;
                self.emit(
                    &mut recorder,
                    TraceEventKind::Insert,
                    format!("inserted key {:?} at position {}", key, position),
                    &path,
                );
                break;
            }

            let mut index = self.arena[current].child_index(&key);
            recorder.read(1);
            let child = self.arena[current].children[index];
            if P::is_overfull(&self.arena[child], self.degree) {
                self.resolve_overflow(current, index, &path, &mut recorder);
                index = self.arena[current].child_index(&key);
            }
            path.push(index);
            current = self.arena[current].children[index];
        }

        self.finish(recorder, format!("insertion of {:?} complete", key))
    }

    /// Put a new internal root above the full root and split the old one.
    fn grow_root(&mut self, recorder: &mut TraceRecorder<K>) {
        let old_root = self.root;
        let mut root = Node::internal();
        root.children.push(old_root);
        let new_root = self.arena.allocate(root);
        self.arena[old_root].parent = new_root;
        self.root = new_root;
        recorder.write(cost::NEW_ROOT_WRITES);

        self.split_child(new_root, 0, &[], recorder);
        debug!(variant = P::VARIANT.name(), height = self.height(), "tree grew a level");
        self.emit(
            recorder,
            TraceEventKind::NewRoot,
            format!("new root {:?} created after split", self.arena[new_root].keys),
            &[],
        );
    }

    /// Relieve the full child at `index` of `parent`.
    fn resolve_overflow(
        &mut self,
        parent: NodeId,
        index: usize,
        path: &[usize],
        recorder: &mut TraceRecorder<K>,
    ) {
        match P::OVERFLOW {
            OverflowStrategy::Split => self.split_child(parent, index, path, recorder),
            OverflowStrategy::RedistributeThenSplit => {
                self.redistribute_or_split(parent, index, path, recorder)
            }
        }
    }

    /// Split the full child at `index` of `parent` in two.
    pub(crate) fn split_child(
        &mut self,
        parent: NodeId,
        index: usize,
        path: &[usize],
        recorder: &mut TraceRecorder<K>,
    ) {
        let t = self.degree;
        recorder.write(cost::SPLIT_WRITES);
        let child = self.arena[parent].children[index];
        let copy_up = self.arena[child].is_leaf && P::LAYOUT == KeyLayout::LeafLinked;

        let (separator, mut right) = {
            let node = &mut self.arena[child];
            let right_keys = node.keys.split_off(t);
            let mut right = if node.is_leaf {
                Node::leaf()
            } else {
                Node::internal()
            };
            let separator = if copy_up {
                // Left keeps t keys; the separator stays in the right leaf.
                right.next = node.next;
                right_keys[0].clone()
            } else {
                if !node.is_leaf {
                    right.children = node.children.split_off(t);
                }
                node.keys.remove(t - 1)
            };
            right.keys = right_keys;
            (separator, right)
        };
        right.parent = parent;

        let right_id = self.arena.allocate(right);
        if copy_up {
            self.arena[child].next = right_id;
        } else {
            self.reparent_children(right_id);
        }

        let description = if copy_up {
            format!("split child {}, copied key {:?} up", index, separator)
        } else {
            format!("split child {}, promoted key {:?}", index, separator)
        };
        let node = &mut self.arena[parent];
        node.keys.insert(index, separator);
        node.children.insert(index + 1, right_id);

        debug!(variant = P::VARIANT.name(), child = index, "split");
        self.emit(recorder, TraceEventKind::Split, description, path);
    }

    /// Shift a key into a sibling with room; split two-to-three otherwise.
    fn redistribute_or_split(
        &mut self,
        parent: NodeId,
        index: usize,
        path: &[usize],
        recorder: &mut TraceRecorder<K>,
    ) {
        let t = self.degree;
        let child_count = self.arena[parent].children.len();

        if index + 1 < child_count {
            recorder.read(1);
            let right = self.arena[parent].children[index + 1];
            if P::can_absorb(&self.arena[right], t) {
                self.shift_to_right(parent, index, path, recorder);
                return;
            }
        }
        if index > 0 {
            recorder.read(1);
            let left = self.arena[parent].children[index - 1];
            if P::can_absorb(&self.arena[left], t) {
                self.shift_to_left(parent, index, path, recorder);
                return;
            }
        }

        if index + 1 < child_count {
            self.split_two_to_three(parent, index, path, recorder);
        } else if index > 0 {
            self.split_two_to_three(parent, index - 1, path, recorder);
        } else {
            self.split_child(parent, index, path, recorder);
        }
    }

    /// Rotate the last key of the child at `index` into its right sibling.
    fn shift_to_right(
        &mut self,
        parent: NodeId,
        index: usize,
        path: &[usize],
        recorder: &mut TraceRecorder<K>,
    ) {
        recorder.write(cost::REDISTRIBUTE_WRITES);
        let full = self.arena[parent].children[index];
        let right = self.arena[parent].children[index + 1];

        let last = self.arena[full].keys.len() - 1;
        let moved = self.arena[full].keys.remove(last);
        let separator = std::mem::replace(&mut self.arena[parent].keys[index], moved);
        self.arena[right].keys.insert(0, separator);

        if !self.arena[full].is_leaf {
            let last_child = self.arena[full].children.len() - 1;
            let child = self.arena[full].children.remove(last_child);
            self.arena[right].children.insert(0, child);
            self.arena[child].parent = right;
        }

        self.emit(
            recorder,
            TraceEventKind::Redistribute,
            format!("child {} is full, shifted a key to its right sibling", index),
            path,
        );
    }

    /// Rotate the first key of the child at `index` into its left sibling.
    fn shift_to_left(
        &mut self,
        parent: NodeId,
        index: usize,
        path: &[usize],
        recorder: &mut TraceRecorder<K>,
    ) {
        recorder.write(cost::REDISTRIBUTE_WRITES);
        let full = self.arena[parent].children[index];
        let left = self.arena[parent].children[index - 1];

        let moved = self.arena[full].keys.remove(0);
        let separator = std::mem::replace(&mut self.arena[parent].keys[index - 1], moved);
        self.arena[left].keys.push(separator);

        if !self.arena[full].is_leaf {
            let child = self.arena[full].children.remove(0);
            self.arena[left].children.push(child);
            self.arena[child].parent = left;
        }

        self.emit(
            recorder,
            TraceEventKind::Redistribute,
            format!("child {} is full, shifted a key to its left sibling", index),
            path,
        );
    }

    /// Re-cut the children at `left_index` and `left_index + 1`, plus their
    /// separator, into three nodes and promote two keys.
    fn split_two_to_three(
        &mut self,
        parent: NodeId,
        left_index: usize,
        path: &[usize],
        recorder: &mut TraceRecorder<K>,
    ) {
        recorder.write(cost::TWO_TO_THREE_WRITES);
        let left = self.arena[parent].children[left_index];
        let right = self.arena[parent].children[left_index + 1];
        let is_leaf = self.arena[left].is_leaf;

        let separator = self.arena[parent].keys.remove(left_index);
        let mut keys = std::mem::take(&mut self.arena[left].keys);
        keys.push(separator);
        keys.append(&mut self.arena[right].keys);
        let mut children = std::mem::take(&mut self.arena[left].children);
        children.append(&mut self.arena[right].children);

        // Two keys go up; the rest is spread as evenly as possible.
        let remaining = keys.len() - 2;
        let base = remaining / 3;
        let first_len = base + usize::from(remaining % 3 > 0);
        let second_len = base + usize::from(remaining % 3 > 1);

        let third_keys = keys.split_off(first_len + second_len + 2);
        let second_up = keys.remove(first_len + second_len + 1);
        let second_keys = keys.split_off(first_len + 1);
        let first_up = keys.remove(first_len);

        let (second_children, third_children) = if is_leaf {
            (Vec::new(), Vec::new())
        } else {
            let third = children.split_off(first_len + second_len + 2);
            let second = children.split_off(first_len + 1);
            (second, third)
        };

        self.arena[left].keys = keys;
        self.arena[left].children = children;
        self.arena[right].keys = third_keys;
        self.arena[right].children = third_children;

        let middle = self.arena.allocate(Node {
            keys: second_keys,
            children: second_children,
            is_leaf,
            parent,
            next: NULL_NODE,
        });
        self.reparent_children(middle);
        self.reparent_children(right);

        let description = format!(
            "split children {} and {} two-to-three, promoted {:?} and {:?}",
            left_index,
            left_index + 1,
            first_up,
            second_up
        );
        let node = &mut self.arena[parent];
        node.keys.insert(left_index, first_up);
        node.keys.insert(left_index + 1, second_up);
        node.children.insert(left_index + 1, middle);

        debug!(variant = P::VARIANT.name(), left = left_index, "two-to-three split");
        self.emit(recorder, TraceEventKind::SplitTwoToThree, description, path);
    }
}

#[cfg(test)]
mod tests {
    use crate::{BPlusTree, BStarTree, BTree, TraceEventKind};

    fn leaf_keys<P: crate::DegreePolicy>(tree: &crate::MultiwayTree<i32, P>) -> Vec<Vec<i32>> {
        tree.leaves().map(|leaf| leaf.keys().to_vec()).collect()
    }

    #[test]
    fn test_root_leaf_fills_before_split() {
        let mut tree = BTree::new(2).unwrap();
        for key in [3, 1, 2] {
            let trace = tree.insert(key);
            assert!(!trace.contains(TraceEventKind::Split));
        }
        assert_eq!(tree.root().keys(), &[1, 2, 3]);
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn test_classic_split_moves_median_up() {
        let mut tree = BTree::new(2).unwrap();
        for key in [1, 2, 3, 4] {
            tree.insert(key);
        }
        assert_eq!(tree.root().keys(), &[2]);
        assert_eq!(leaf_keys(&tree), vec![vec![1], vec![3, 4]]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_leaf_linked_split_copies_separator() {
        let mut tree = BPlusTree::new(2).unwrap();
        for key in [1, 2, 3, 4] {
            tree.insert(key);
        }
        assert_eq!(tree.root().keys(), &[3]);
        assert_eq!(leaf_keys(&tree), vec![vec![1, 2], vec![3, 4]]);
        let first = tree.root().child(0).unwrap();
        assert_eq!(first.next_leaf().map(|leaf| leaf.keys().to_vec()), Some(vec![3, 4]));
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_star_redistributes_before_splitting() {
        let mut tree = BStarTree::new(3).unwrap();
        for key in 1..=8 {
            tree.insert(key);
        }
        assert_eq!(tree.root().keys(), &[3]);

        let trace = tree.insert(9);
        assert_eq!(trace.count(TraceEventKind::Redistribute), 1);
        assert!(!trace.contains(TraceEventKind::Split));
        assert_eq!(tree.root().keys(), &[4]);
        assert_eq!(leaf_keys(&tree), vec![vec![1, 2, 3], vec![5, 6, 7, 8, 9]]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_star_two_to_three_split() {
        let mut tree = BStarTree::new(3).unwrap();
        for key in 1..=10 {
            tree.insert(key);
        }
        let trace = tree.insert(11);
        assert_eq!(trace.count(TraceEventKind::SplitTwoToThree), 1);
        assert_eq!(tree.root().keys(), &[4, 8]);
        assert_eq!(
            leaf_keys(&tree),
            vec![vec![1, 2, 3], vec![5, 6, 7], vec![9, 10, 11]]
        );
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_star_internal_two_to_three_keeps_children_aligned() {
        let mut tree = BStarTree::new(3).unwrap();
        for key in 0..400 {
            tree.insert(key);
        }
        assert!(tree.height() >= 3);
        assert!(tree.check_invariants().is_ok());
        let keys: Vec<i32> = tree.keys().copied().collect();
        assert_eq!(keys, (0..400).collect::<Vec<_>>());
    }

    #[test]
    fn test_insert_costs() {
        let mut tree = BTree::new(2).unwrap();
        let trace = tree.insert(1);
        assert_eq!(trace.counters().reads, 1);
        assert_eq!(trace.counters().writes, 1);

        tree.insert(2);
        tree.insert(3);
        // root read, new root write, split, child read, leaf write
        let trace = tree.insert(4);
        assert_eq!(trace.counters().reads, 2);
        assert_eq!(trace.counters().writes, 1 + 3 + 1);
    }
}
