//! DELETE operations for the tree variants.
//!
//! Deletion descends from the root and fills every child that sits at the
//! minimum before entering it: borrow a key from a sibling that can lend,
//! otherwise merge with a sibling (the right one when there is one). A
//! root left without keys is replaced by its only child on the spot.
//!
//! In the classic layout a key found in an internal node is replaced by
//! its predecessor or successor, or the two children around it are merged
//! first. In the leaf-linked layout keys are only removed from leaves and
//! separators are left as they are; they still route correctly.

use std::fmt::Debug;

use tracing::debug;

use crate::policy::DegreePolicy;
use crate::trace::{cost, Operation, Trace, TraceEventKind, TraceRecorder};
use crate::types::{KeyLayout, MultiwayTree, NodeId, NULL_NODE};

impl<K: Ord + Clone + Debug, P: DegreePolicy> MultiwayTree<K, P> {
    /// Remove one copy of `key`.
    ///
    /// Deleting an absent key leaves the tree untouched and records a
    /// [`TraceEventKind::NotFound`] event; no node is rebalanced.
    ///
    /// ```
    /// use btree_variants::{BPlusTree, TraceEventKind};
    ///
    /// let mut tree = BPlusTree::new(3).unwrap();
    /// tree.insert(4);
    /// assert!(tree.delete(&4).found());
    /// let trace = tree.delete(&4);
    /// assert!(trace.contains(TraceEventKind::NotFound));
    /// assert!(tree.is_empty());
    /// ```
    pub fn delete(&mut self, key: &K) -> Trace<K> {
        let mut recorder = TraceRecorder::new(P::VARIANT, Operation::Delete);
        if !self.contains(key) {
            // Probe again with counting so the search cost is still reported.
            self.subtree_holds(self.root, key, &mut recorder);
            self.emit(
                &mut recorder,
                TraceEventKind::NotFound,
                format!("key {:?} not found", key),
                &[],
            );
            return self.finish(recorder, format!("nothing to remove for {:?}", key));
        }

        let removed = match P::LAYOUT {
            KeyLayout::Classic => self.delete_classic(key, &mut recorder),
            KeyLayout::LeafLinked => self.delete_leaf_linked(key, &mut recorder),
        };
        if removed {
            self.len -= 1;
        }
        self.finish(recorder, format!("removal of {:?} complete", key))
    }

    fn delete_classic(&mut self, key: &K, recorder: &mut TraceRecorder<K>) -> bool {
        let t = self.degree;
        let mut target = key.clone();
        let mut current = self.root;
        let mut path = Vec::new();

        loop {
            recorder.read(1);
            self.emit(
                recorder,
                TraceEventKind::Examine,
                format!("examining node {:?} to remove {:?}", self.arena[current].keys, target),
                &path,
            );

            let mut index = self.arena[current].lower_bound(&target);
            let found = self.arena[current].keys.get(index) == Some(&target);

            if self.arena[current].is_leaf {
                return self.remove_from_leaf(current, found.then_some(index), &target, &path, recorder);
            }

            if found {
                let left = self.arena[current].children[index];
                let right = self.arena[current].children[index + 1];

                if P::can_lend(&self.arena[left], t) {
                    let predecessor = self.rightmost_key(left, recorder);
                    self.replace_key(current, index, predecessor.clone(), "predecessor", &path, recorder);
                    target = predecessor;
                    path.push(index);
                    current = left;
                    continue;
                }
                if P::can_lend(&self.arena[right], t) {
                    let successor = self.leftmost_key(right, recorder);
                    self.replace_key(current, index, successor.clone(), "successor", &path, recorder);
                    target = successor;
                    path.push(index + 1);
                    current = right;
                    continue;
                }

                self.merge_children(current, index, &path, recorder);
                if self.collapse_root_if_empty(current, recorder) {
                    current = self.root;
                    path.clear();
                    continue;
                }
                path.push(index);
                current = self.arena[current].children[index];
                continue;
            }

            let child = self.arena[current].children[index];
            if P::needs_fill(&self.arena[child], t) {
                index = self.fill_child(current, index, &path, recorder);
                if self.collapse_root_if_empty(current, recorder) {
                    current = self.root;
                    path.clear();
                    continue;
                }
            }
            path.push(index);
            current = self.arena[current].children[index];
        }
    }

    fn delete_leaf_linked(&mut self, key: &K, recorder: &mut TraceRecorder<K>) -> bool {
        let t = self.degree;
        let mut current = self.root;
        let mut path = Vec::new();

        loop {
            recorder.read(1);
            self.emit(
                recorder,
                TraceEventKind::Examine,
                format!("examining node {:?} to remove {:?}", self.arena[current].keys, key),
                &path,
            );

            if self.arena[current].is_leaf {
                let position = self.arena[current].find_key(key);
                return self.remove_from_leaf(current, position, key, &path, recorder);
            }

            let mut index = self.route_for_delete(current, key, recorder);
            let child = self.arena[current].children[index];
            if P::needs_fill(&self.arena[child], t) {
                index = self.fill_child(current, index, &path, recorder);
                if self.collapse_root_if_empty(current, recorder) {
                    current = self.root;
                    path.clear();
                    continue;
                }
            }
            path.push(index);
            current = self.arena[current].children[index];
        }
    }

    fn remove_from_leaf(
        &mut self,
        leaf: NodeId,
        position: Option<usize>,
        key: &K,
        path: &[usize],
        recorder: &mut TraceRecorder<K>,
    ) -> bool {
        let Some(position) = position else {
            self.emit(
                recorder,
                TraceEventKind::NotFound,
                format!("key {:?} not found", key),
                path,
            );
            return false;
        };
        self.arena[leaf].keys.remove(position);
        recorder.write(1);
        self.emit(
            recorder,
            TraceEventKind::Remove,
            format!("removed key {:?} from leaf", key),
            path,
        );
        true
    }

    /// Child of a leaf-linked internal node that holds `key`.
    ///
    /// Separators equal to `key` make several children candidates; the
    /// first one whose subtree actually stores the key wins.
    fn route_for_delete(&self, id: NodeId, key: &K, recorder: &mut TraceRecorder<K>) -> usize {
        let node = &self.arena[id];
        let low = node.lower_bound(key);
        let high = node.upper_bound(key);
        if low == high {
            return high;
        }
        (low..=high)
            .find(|&index| self.subtree_holds(node.children[index], key, recorder))
            .unwrap_or(high)
    }

    fn subtree_holds(&self, id: NodeId, key: &K, recorder: &mut TraceRecorder<K>) -> bool {
        recorder.read(1);
        let node = &self.arena[id];
        if node.find_key(key).is_some() && (node.is_leaf || P::LAYOUT == KeyLayout::Classic) {
            return true;
        }
        if node.is_leaf {
            return false;
        }
        (node.lower_bound(key)..=node.upper_bound(key))
            .any(|index| self.subtree_holds(node.children[index], key, recorder))
    }

    fn replace_key(
        &mut self,
        id: NodeId,
        index: usize,
        replacement: K,
        role: &str,
        path: &[usize],
        recorder: &mut TraceRecorder<K>,
    ) {
        let replaced = std::mem::replace(&mut self.arena[id].keys[index], replacement);
        recorder.write(1);
        let description = format!(
            "replacing {:?} with {} {:?}",
            replaced, role, self.arena[id].keys[index]
        );
        self.emit(recorder, TraceEventKind::Replace, description, path);
    }

    /// Largest key under `id`.
    fn rightmost_key(&self, id: NodeId, recorder: &mut TraceRecorder<K>) -> K {
        let mut current = id;
        recorder.read(1);
        while let Some(&child) = self.arena[current].children.last() {
            current = child;
            recorder.read(1);
        }
        let keys = &self.arena[current].keys;
        keys[keys.len() - 1].clone()
    }

    /// Smallest key under `id`.
    fn leftmost_key(&self, id: NodeId, recorder: &mut TraceRecorder<K>) -> K {
        let mut current = id;
        recorder.read(1);
        while let Some(&child) = self.arena[current].children.first() {
            current = child;
            recorder.read(1);
        }
        self.arena[current].keys[0].clone()
    }

    /// Bring the child at `index` above the minimum before descending.
    ///
    /// Returns the index the child's keys end up under, which moves one to
    /// the left when the child is merged into its left sibling.
    fn fill_child(
        &mut self,
        parent: NodeId,
        index: usize,
        path: &[usize],
        recorder: &mut TraceRecorder<K>,
    ) -> usize {
        let t = self.degree;
        let child_count = self.arena[parent].children.len();

        if index > 0 {
            let left = self.arena[parent].children[index - 1];
            if P::can_lend(&self.arena[left], t) {
                self.borrow_from_left(parent, index, path, recorder);
                return index;
            }
        }
        if index + 1 < child_count {
            let right = self.arena[parent].children[index + 1];
            if P::can_lend(&self.arena[right], t) {
                self.borrow_from_right(parent, index, path, recorder);
                return index;
            }
        }

        if index + 1 < child_count {
            self.merge_children(parent, index, path, recorder);
            index
        } else {
            self.merge_children(parent, index - 1, path, recorder);
            index - 1
        }
    }

    fn borrow_from_left(
        &mut self,
        parent: NodeId,
        index: usize,
        path: &[usize],
        recorder: &mut TraceRecorder<K>,
    ) {
        recorder.read(cost::BORROW_READS);
        recorder.write(cost::BORROW_WRITES);
        let child = self.arena[parent].children[index];
        let left = self.arena[parent].children[index - 1];

        let last = self.arena[left].keys.len() - 1;
        let moved = self.arena[left].keys.remove(last);

        if self.arena[child].is_leaf && P::LAYOUT == KeyLayout::LeafLinked {
            self.arena[child].keys.insert(0, moved.clone());
            self.arena[parent].keys[index - 1] = moved;
        } else {
            let separator = std::mem::replace(&mut self.arena[parent].keys[index - 1], moved);
            self.arena[child].keys.insert(0, separator);
            if !self.arena[child].is_leaf {
                let last_child = self.arena[left].children.len() - 1;
                let grandchild = self.arena[left].children.remove(last_child);
                self.arena[child].children.insert(0, grandchild);
                self.arena[grandchild].parent = child;
            }
        }

        self.emit(
            recorder,
            TraceEventKind::Borrow,
            format!("child {} borrowed a key from its left sibling", index),
            path,
        );
    }

    fn borrow_from_right(
        &mut self,
        parent: NodeId,
        index: usize,
        path: &[usize],
        recorder: &mut TraceRecorder<K>,
    ) {
        recorder.read(cost::BORROW_READS);
        recorder.write(cost::BORROW_WRITES);
        let child = self.arena[parent].children[index];
        let right = self.arena[parent].children[index + 1];

        let moved = self.arena[right].keys.remove(0);

        if self.arena[child].is_leaf && P::LAYOUT == KeyLayout::LeafLinked {
            self.arena[child].keys.push(moved);
            let separator = self.arena[right].keys[0].clone();
            self.arena[parent].keys[index] = separator;
        } else {
            let separator = std::mem::replace(&mut self.arena[parent].keys[index], moved);
            self.arena[child].keys.push(separator);
            if !self.arena[child].is_leaf {
                let grandchild = self.arena[right].children.remove(0);
                self.arena[child].children.push(grandchild);
                self.arena[grandchild].parent = child;
            }
        }

        self.emit(
            recorder,
            TraceEventKind::Borrow,
            format!("child {} borrowed a key from its right sibling", index),
            path,
        );
    }

    /// Absorb the child at `index + 1` into the child at `index`.
    fn merge_children(
        &mut self,
        parent: NodeId,
        index: usize,
        path: &[usize],
        recorder: &mut TraceRecorder<K>,
    ) {
        recorder.read(cost::MERGE_READS);
        recorder.write(cost::MERGE_WRITES);
        let left = self.arena[parent].children[index];
        let right = self.arena[parent].children[index + 1];

        let separator = self.arena[parent].keys.remove(index);
        self.arena[parent].children.remove(index + 1);
        let mut absorbed = self.arena.remove(right);

        if absorbed.is_leaf && P::LAYOUT == KeyLayout::LeafLinked {
            // The separator is only a copy; the chain skips the absorbed leaf.
            let node = &mut self.arena[left];
            node.keys.append(&mut absorbed.keys);
            node.next = absorbed.next;
        } else {
            let node = &mut self.arena[left];
            node.keys.push(separator);
            node.keys.append(&mut absorbed.keys);
            node.children.append(&mut absorbed.children);
            self.reparent_children(left);
        }

        debug!(variant = P::VARIANT.name(), left = index, "merge");
        self.emit(
            recorder,
            TraceEventKind::Merge,
            format!("merged children {} and {}", index, index + 1),
            path,
        );
    }

    /// Replace an internal root that lost its last key by its only child.
    fn collapse_root_if_empty(&mut self, id: NodeId, recorder: &mut TraceRecorder<K>) -> bool {
        if id != self.root {
            return false;
        }
        let node = &self.arena[id];
        if node.is_leaf || !node.keys.is_empty() {
            return false;
        }

        let child = node.children[0];
        self.arena.remove(id);
        self.arena[child].parent = NULL_NODE;
        self.root = child;
        recorder.read(cost::COLLAPSE_READS);

        debug!(variant = P::VARIANT.name(), height = self.height(), "tree shrank a level");
        self.emit(
            recorder,
            TraceEventKind::CollapseRoot,
            "root emptied, its only child became the root".to_string(),
            &[],
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::{BPlusTree, BStarTree, BTree, TraceEventKind};

    #[test]
    fn test_delete_from_leaf_root() {
        let mut tree = BTree::new(2).unwrap();
        tree.insert(1);
        tree.insert(2);
        let trace = tree.delete(&1);
        assert!(trace.found());
        assert_eq!(tree.root().keys(), &[2]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_delete_absent_key_is_a_reported_no_op() {
        let mut tree = BTree::new(2).unwrap();
        for key in 1..=10 {
            tree.insert(key);
        }
        let before = tree.snapshot();
        let trace = tree.delete(&42);
        assert!(!trace.found());
        assert_eq!(trace.count(TraceEventKind::NotFound), 1);
        assert!(!trace.iter().any(|event| event.kind.is_structural()));
        assert_eq!(tree.snapshot(), before);
        assert_eq!(tree.len(), 10);
    }

    #[test]
    fn test_delete_from_empty_tree() {
        let mut tree = BPlusTree::<i32>::new(3).unwrap();
        let trace = tree.delete(&1);
        assert_eq!(
            trace.kinds(),
            vec![TraceEventKind::NotFound, TraceEventKind::Complete]
        );
        assert_eq!(trace.counters().reads, 1);
    }

    #[test]
    fn test_internal_key_replaced_by_predecessor() {
        let mut tree = BTree::new(2).unwrap();
        for key in [1, 2, 3, 4, 0] {
            tree.insert(key);
        }
        // root [2], leaves [0, 1] and [3, 4]
        assert_eq!(tree.root().keys(), &[2]);
        let trace = tree.delete(&2);
        assert_eq!(trace.count(TraceEventKind::Replace), 1);
        assert_eq!(tree.root().keys(), &[1]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_internal_key_replaced_by_successor() {
        let mut tree = BTree::new(2).unwrap();
        for key in [1, 2, 3, 4] {
            tree.insert(key);
        }
        // root [2], leaves [1] and [3, 4]
        let trace = tree.delete(&2);
        assert!(trace.descriptions().iter().any(|d| d.contains("successor 3")));
        assert_eq!(tree.root().keys(), &[3]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_merge_collapses_root() {
        let mut tree = BTree::new(2).unwrap();
        for key in [1, 2, 3, 4] {
            tree.insert(key);
        }
        tree.delete(&4);
        // root [2], leaves [1] and [3]
        let trace = tree.delete(&2);
        assert_eq!(trace.count(TraceEventKind::Merge), 1);
        assert_eq!(trace.count(TraceEventKind::CollapseRoot), 1);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.root().keys(), &[1, 3]);
        assert_eq!(tree.stats().arena.allocated_count, 1);
    }

    #[test]
    fn test_fill_borrows_from_sibling() {
        let mut tree = BTree::new(2).unwrap();
        for key in [1, 2, 3, 4] {
            tree.insert(key);
        }
        // root [2], leaves [1] and [3, 4]: deleting 1 borrows through the root
        let trace = tree.delete(&1);
        assert_eq!(trace.count(TraceEventKind::Borrow), 1);
        assert_eq!(tree.root().keys(), &[3]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_leaf_linked_merge_rewires_chain() {
        let mut tree = BPlusTree::new(2).unwrap();
        for key in [1, 2, 3, 4] {
            tree.insert(key);
        }
        tree.delete(&4);
        // root [3], leaves [1, 2] and [3]
        let trace = tree.delete(&3);
        assert!(trace.found());
        assert!(tree.check_invariants().is_ok());
        let chained: Vec<i32> = tree.leaves().flat_map(|leaf| leaf.keys().to_vec()).collect();
        assert_eq!(chained, vec![1, 2]);
    }

    #[test]
    fn test_leaf_linked_duplicates_left_of_separator() {
        let mut tree = BPlusTree::new(2).unwrap();
        for _ in 0..6 {
            tree.insert(5);
        }
        for remaining in (0..6).rev() {
            assert!(tree.delete(&5).found());
            assert_eq!(tree.len(), remaining);
            assert!(tree.check_invariants().is_ok());
        }
        assert!(!tree.delete(&5).found());
    }

    #[test]
    fn test_star_tree_drains() {
        let mut tree = BStarTree::new(3).unwrap();
        for key in 0..60 {
            tree.insert(key);
        }
        for key in (0..60).step_by(2) {
            assert!(tree.delete(&key).found());
            assert!(tree.check_invariants().is_ok());
        }
        let keys: Vec<i32> = tree.keys().copied().collect();
        assert_eq!(keys, (1..60).step_by(2).collect::<Vec<_>>());
    }
}
