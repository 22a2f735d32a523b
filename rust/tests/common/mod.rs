//! Shared helpers for the integration tests.

use std::cmp::Ordering;

use btree_variants::{DegreePolicy, MultiwayTree};

/// Install a test-writer subscriber once; `RUST_LOG` selects what is shown.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Key with a payload that takes no part in ordering.
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub struct Tagged {
    pub key: u32,
    pub tag: u32,
}

impl PartialEq for Tagged {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Tagged {}

impl PartialOrd for Tagged {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tagged {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Collect the keys and validate the structure in one go.
#[allow(dead_code)]
pub fn checked_keys<K, P>(tree: &MultiwayTree<K, P>) -> Vec<K>
where
    K: Ord + Clone + std::fmt::Debug,
    P: DegreePolicy,
{
    if let Err(err) = tree.check_invariants() {
        panic!("{}\n{}", err, tree.structure_string());
    }
    tree.keys().cloned().collect()
}
