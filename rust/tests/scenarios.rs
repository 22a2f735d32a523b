//! End-to-end scenarios with known shapes and traces.

mod common;

use btree_variants::{
    BPlusTree, BStarTree, BTree, KeyLayout, OverflowStrategy, Trace, TraceEventKind, TreeConfig,
    TreeError, Variant,
};
use common::{checked_keys, init_tracing};

fn assert_well_formed<K>(trace: &Trace<K>) {
    assert_eq!(trace.count(TraceEventKind::Complete), 1);
    assert_eq!(trace.last().map(|event| event.kind), Some(TraceEventKind::Complete));
    for pair in trace.events().windows(2) {
        assert!(pair[0].counters.reads <= pair[1].counters.reads);
        assert!(pair[0].counters.writes <= pair[1].counters.writes);
    }
}

#[test]
fn btree_grows_one_level() {
    init_tracing();
    let mut tree = BTree::new(2).unwrap();
    let mut new_roots = 0;
    for key in [10, 20, 5, 6, 12, 30, 7, 17] {
        let trace = tree.insert(key);
        assert_well_formed(&trace);
        new_roots += trace.count(TraceEventKind::NewRoot);
    }
    assert_eq!(new_roots, 1);
    assert_eq!(tree.height(), 2);
    assert_eq!(tree.root().keys(), &[10, 20]);
    assert_eq!(checked_keys(&tree), vec![5, 6, 7, 10, 12, 17, 20, 30]);
}

#[test]
fn bplus_copies_separator_up() {
    let mut tree = BPlusTree::new(3).unwrap();
    for key in 1..=5 {
        tree.insert(key);
    }
    assert!(tree.root().is_leaf());

    let trace = tree.insert(6);
    assert!(trace.contains(TraceEventKind::NewRoot));
    assert_eq!(tree.root().keys(), &[4]);

    tree.insert(7);
    let chained: Vec<i32> = tree
        .leaves()
        .flat_map(|leaf| leaf.keys().iter().copied())
        .collect();
    assert_eq!(chained, (1..=7).collect::<Vec<_>>());
    let first = tree.root().child(0).unwrap();
    assert_eq!(first.next_leaf().map(|leaf| leaf.keys().to_vec()), Some(vec![4, 5, 6, 7]));
    assert_eq!(checked_keys(&tree), (1..=7).collect::<Vec<_>>());
}

#[test]
fn bstar_redistributes_then_splits_two_into_three() {
    let mut tree = BStarTree::new(3).unwrap();
    for key in 1..=8 {
        tree.insert(key);
    }

    let trace = tree.insert(9);
    assert!(trace.contains(TraceEventKind::Redistribute));
    assert!(!trace.contains(TraceEventKind::Split));
    assert_eq!(tree.root().keys(), &[4]);

    tree.insert(10);
    let trace = tree.insert(11);
    assert_eq!(trace.count(TraceEventKind::SplitTwoToThree), 1);
    assert_eq!(tree.root().keys(), &[4, 8]);
    assert_eq!(tree.leaf_sizes(), vec![3, 3, 3]);
    assert_eq!(checked_keys(&tree), (1..=11).collect::<Vec<_>>());
}

#[test]
fn delete_of_absent_key_changes_nothing() {
    let mut tree = BStarTree::new(3).unwrap();
    for key in 0..30 {
        tree.insert(key);
    }
    let before = tree.snapshot();
    let trace = tree.delete(&100);
    assert_well_formed(&trace);
    assert!(!trace.found());
    assert_eq!(trace.count(TraceEventKind::NotFound), 1);
    assert_eq!(trace.counters().writes, 0);
    assert_eq!(tree.snapshot(), before);
}

#[test]
fn snapshots_follow_every_event() {
    let config = TreeConfig::new(2).with_snapshots(true);
    let mut tree = BPlusTree::with_config(config).unwrap();
    let mut traces = Vec::new();
    for key in [8, 3, 5, 1, 9, 2, 7] {
        traces.push(tree.insert(key));
    }
    for key in [3, 8, 1] {
        traces.push(tree.delete(&key));
    }

    for trace in &traces {
        assert_well_formed(trace);
        for event in trace {
            let snapshot = event.snapshot.as_ref().expect("snapshot captured");
            assert!(
                snapshot.root.resolve(&event.path).is_some(),
                "{} path {:?} does not resolve",
                event.kind,
                event.path
            );
        }
    }

    let last = traces.last().and_then(|trace| trace.last()).unwrap();
    assert_eq!(last.snapshot.as_ref(), Some(&tree.snapshot()));
}

#[test]
fn snapshots_off_by_default() {
    let mut tree = BTree::new(2).unwrap();
    let trace = tree.insert(1);
    assert!(trace.iter().all(|event| event.snapshot.is_none()));
}

#[test]
fn deletion_shrinks_to_single_leaf() {
    let mut tree = BTree::new(2).unwrap();
    for key in 0..16 {
        tree.insert(key);
    }
    assert!(tree.height() > 2);

    let mut collapses = 0;
    for key in 0..16 {
        let trace = tree.delete(&key);
        assert!(trace.found());
        collapses += trace.count(TraceEventKind::CollapseRoot);
        checked_keys(&tree);
    }
    assert!(collapses >= 2);
    assert!(tree.is_empty());
    assert_eq!(tree.height(), 1);
    assert_eq!(tree.stats().arena.allocated_count, 1);
}

#[test]
fn operations_report_page_costs() {
    let mut tree = BTree::new(2).unwrap();
    let trace = tree.insert(1);
    assert_eq!(trace.counters().reads, 1);
    assert_eq!(trace.counters().writes, 1);

    for key in 2..=3 {
        tree.insert(key);
    }
    let trace = tree.insert(4);
    let split = trace
        .iter()
        .find(|event| event.kind == TraceEventKind::Split)
        .unwrap();
    assert!(split.counters.writes >= 3);
    assert!(trace.counters().total() > split.counters.total());
}

#[test]
fn variant_metadata() {
    let tree = BStarTree::<i32>::default();
    assert_eq!(tree.variant(), Variant::BStarTree);
    assert_eq!(tree.variant().to_string(), "B*-Tree");
    assert_eq!(tree.max_keys(), 5);
    assert_eq!(tree.min_keys(), 2);
    assert_eq!(tree.fill_target(), 4);

    use btree_variants::DegreePolicy;
    assert_eq!(
        btree_variants::BStarTreePolicy::OVERFLOW,
        OverflowStrategy::RedistributeThenSplit
    );
    assert_eq!(btree_variants::BPlusTreePolicy::LAYOUT, KeyLayout::LeafLinked);
}

#[test]
fn bad_degree_is_rejected() {
    assert!(matches!(
        BStarTree::<i32>::new(2),
        Err(TreeError::InvalidDegree { degree: 2, minimum: 3, .. })
    ));
    assert!(BTree::<i32>::with_config(TreeConfig::new(1)).is_err());
}
