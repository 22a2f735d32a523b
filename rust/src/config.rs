//! Construction and configuration of the tree variants.
//!
//! A tree is built from a [`TreeConfig`], which is validated against the
//! variant's [`DegreePolicy`] before any node is allocated.

use std::marker::PhantomData;

use tracing::warn;

use crate::arena::NodeArena;
use crate::error::InitResult;
use crate::policy::DegreePolicy;
use crate::trace::PageCounters;
use crate::types::{MultiwayTree, Node, Variant};

/// Construction parameters shared by all variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Minimum degree `t`.
    pub min_degree: usize,
    /// Attach a whole-tree snapshot to every trace event.
    pub capture_snapshots: bool,
}

impl TreeConfig {
    pub fn new(min_degree: usize) -> Self {
        Self {
            min_degree,
            capture_snapshots: false,
        }
    }

    /// Default configuration for a variant.
    pub fn for_variant<P: DegreePolicy>() -> Self {
        Self::new(P::DEFAULT_DEGREE)
    }

    pub fn with_snapshots(mut self, capture: bool) -> Self {
        self.capture_snapshots = capture;
        self
    }

    /// Check this configuration against a variant's bounds.
    pub fn validate<P: DegreePolicy>(&self) -> InitResult<()> {
        P::validate_degree(self.min_degree)
    }
}

impl<K, P: DegreePolicy> MultiwayTree<K, P> {
    /// Create a tree with minimum degree `t` and an empty leaf root.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidDegree`] when `t` is below the variant's
    /// minimum (2, or 3 for the B*-Tree).
    ///
    /// ```
    /// use btree_variants::{BTree, TreeError};
    ///
    /// let tree = BTree::<i32>::new(3).unwrap();
    /// assert!(tree.is_empty());
    /// assert!(matches!(BTree::<i32>::new(1), Err(TreeError::InvalidDegree { .. })));
    /// ```
    ///
    /// [`TreeError::InvalidDegree`]: crate::TreeError::InvalidDegree
    pub fn new(t: usize) -> InitResult<Self> {
        Self::with_config(TreeConfig::new(t))
    }

    /// Create a tree with the variant's default degree.
    pub fn with_default_degree() -> Self {
        Self::build(TreeConfig::for_variant::<P>())
    }

    /// Create a tree from a full configuration.
    pub fn with_config(config: TreeConfig) -> InitResult<Self> {
        if let Err(err) = config.validate::<P>() {
            warn!(variant = P::VARIANT.name(), degree = config.min_degree, "rejected tree configuration");
            return Err(err);
        }
        Ok(Self::build(config))
    }

    fn build(config: TreeConfig) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.allocate(Node::leaf());

        Self {
            degree: config.min_degree,
            capture_snapshots: config.capture_snapshots,
            root,
            arena,
            len: 0,
            io: PageCounters::default(),
            _policy: PhantomData,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> TreeConfig {
        TreeConfig {
            min_degree: self.degree,
            capture_snapshots: self.capture_snapshots,
        }
    }

    /// Turn per-event snapshots on or off.
    pub fn set_capture_snapshots(&mut self, capture: bool) {
        self.capture_snapshots = capture;
    }

    pub fn variant(&self) -> Variant {
        P::VARIANT
    }

    /// Minimum degree `t`.
    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn max_keys(&self) -> usize {
        P::max_keys(self.degree)
    }

    /// Minimum keys of a non-root node.
    pub fn min_keys(&self) -> usize {
        P::min_keys(self.degree, false)
    }

    pub fn fill_target(&self) -> usize {
        P::fill_target(self.degree)
    }
}

impl<K, P: DegreePolicy> Default for MultiwayTree<K, P> {
    fn default() -> Self {
        Self::with_default_degree()
    }
}
