//! Operation traces and the page-access cost model.
//!
//! Every mutating call returns a [`Trace`]: the finite, ordered list of
//! events the engine recorded while it ran. Each event carries the child
//! index path of the node being acted on and the running read/write
//! counters at that instant. The last event of a trace is always
//! [`TraceEventKind::Complete`].
//!
//! Events are also forwarded to the `tracing` facade under the
//! `btree_variants::trace` target.

use std::fmt;
use std::ops::{Add, AddAssign};

use tracing::trace;

use crate::tree_structure::TreeSnapshot;
use crate::types::Variant;

/// Fixed costs charged on top of the per-node reads and writes.
pub mod cost {
    /// Root growth allocates a new root page.
    pub const NEW_ROOT_WRITES: u64 = 1;
    /// Parent, split node and new sibling.
    pub const SPLIT_WRITES: u64 = 3;
    /// Parent, two old siblings and the new middle sibling.
    pub const TWO_TO_THREE_WRITES: u64 = 4;
    pub const REDISTRIBUTE_WRITES: u64 = 3;
    pub const BORROW_READS: u64 = 2;
    pub const BORROW_WRITES: u64 = 3;
    pub const MERGE_READS: u64 = 2;
    pub const MERGE_WRITES: u64 = 2;
    pub const COLLAPSE_READS: u64 = 1;
}

/// Logical page reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PageCounters {
    pub reads: u64,
    pub writes: u64,
}

impl PageCounters {
    pub fn new(reads: u64, writes: u64) -> Self {
        Self { reads, writes }
    }

    /// Total page touches.
    pub fn total(&self) -> u64 {
        self.reads + self.writes
    }
}

impl Add for PageCounters {
    type Output = PageCounters;

    fn add(self, rhs: PageCounters) -> PageCounters {
        PageCounters {
            reads: self.reads + rhs.reads,
            writes: self.writes + rhs.writes,
        }
    }
}

impl AddAssign for PageCounters {
    fn add_assign(&mut self, rhs: PageCounters) {
        *self = *self + rhs;
    }
}

impl fmt::Display for PageCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} reads, {} writes", self.reads, self.writes)
    }
}

/// What an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TraceEventKind {
    /// A node was read while descending.
    Examine,
    /// A key was placed in a leaf.
    Insert,
    /// A full child was split in two.
    Split,
    /// Two full siblings were re-cut into three.
    SplitTwoToThree,
    /// A key was shifted from a full child into a sibling.
    Redistribute,
    /// The tree grew by one level.
    NewRoot,
    /// A key was removed from a leaf.
    Remove,
    /// An internal key was replaced by its predecessor or successor.
    Replace,
    /// A child took a key from a sibling through the parent.
    Borrow,
    /// Two siblings were merged.
    Merge,
    /// An empty root was replaced by its only child.
    CollapseRoot,
    /// The key to delete is not in the tree.
    NotFound,
    /// The operation finished.
    Complete,
}

impl TraceEventKind {
    pub fn label(&self) -> &'static str {
        match self {
            TraceEventKind::Examine => "examine",
            TraceEventKind::Insert => "insert",
            TraceEventKind::Split => "split",
            TraceEventKind::SplitTwoToThree => "split-2-3",
            TraceEventKind::Redistribute => "redistribute",
            TraceEventKind::NewRoot => "new-root",
            TraceEventKind::Remove => "remove",
            TraceEventKind::Replace => "replace",
            TraceEventKind::Borrow => "borrow",
            TraceEventKind::Merge => "merge",
            TraceEventKind::CollapseRoot => "collapse-root",
            TraceEventKind::NotFound => "not-found",
            TraceEventKind::Complete => "complete",
        }
    }

    /// Returns true for events that change the shape of the tree.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            TraceEventKind::Split
                | TraceEventKind::SplitTwoToThree
                | TraceEventKind::Redistribute
                | TraceEventKind::NewRoot
                | TraceEventKind::Borrow
                | TraceEventKind::Merge
                | TraceEventKind::CollapseRoot
        )
    }
}

impl fmt::Display for TraceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One step of an operation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TraceEvent<K> {
    pub kind: TraceEventKind,
    pub description: String,
    /// Child indices from the root to the node acted on.
    pub path: Vec<usize>,
    /// Counters accumulated so far in this operation.
    pub counters: PageCounters,
    /// Whole-tree snapshot, when the tree captures them.
    pub snapshot: Option<TreeSnapshot<K>>,
}

/// The ordered events of one insert or delete.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Trace<K> {
    variant: Variant,
    events: Vec<TraceEvent<K>>,
}

impl<K> Trace<K> {
    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn events(&self) -> &[TraceEvent<K>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&TraceEvent<K>> {
        self.events.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TraceEvent<K>> {
        self.events.iter()
    }

    /// Final counters of the operation.
    pub fn counters(&self) -> PageCounters {
        self.last().map(|event| event.counters).unwrap_or_default()
    }

    /// Number of events of the given kind.
    pub fn count(&self, kind: TraceEventKind) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }

    pub fn contains(&self, kind: TraceEventKind) -> bool {
        self.count(kind) > 0
    }

    /// Returns true if a deletion removed a key.
    pub fn found(&self) -> bool {
        self.contains(TraceEventKind::Remove)
    }

    /// Event kinds in order.
    pub fn kinds(&self) -> Vec<TraceEventKind> {
        self.events.iter().map(|event| event.kind).collect()
    }

    /// Human-readable descriptions in order.
    pub fn descriptions(&self) -> Vec<&str> {
        self.events
            .iter()
            .map(|event| event.description.as_str())
            .collect()
    }
}

impl<K> IntoIterator for Trace<K> {
    type Item = TraceEvent<K>;
    type IntoIter = std::vec::IntoIter<TraceEvent<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a, K> IntoIterator for &'a Trace<K> {
    type Item = &'a TraceEvent<K>;
    type IntoIter = std::slice::Iter<'a, TraceEvent<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Which public operation a recorder belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Insert,
    Delete,
}

impl Operation {
    fn label(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Delete => "delete",
        }
    }
}

/// Append-only event sink owned by a single operation.
#[derive(Debug)]
pub(crate) struct TraceRecorder<K> {
    variant: Variant,
    operation: Operation,
    counters: PageCounters,
    events: Vec<TraceEvent<K>>,
}

impl<K> TraceRecorder<K> {
    pub(crate) fn new(variant: Variant, operation: Operation) -> Self {
        Self {
            variant,
            operation,
            counters: PageCounters::default(),
            events: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn read(&mut self, pages: u64) {
        self.counters.reads += pages;
    }

    #[inline]
    pub(crate) fn write(&mut self, pages: u64) {
        self.counters.writes += pages;
    }

    pub(crate) fn counters(&self) -> PageCounters {
        self.counters
    }

    pub(crate) fn record(
        &mut self,
        kind: TraceEventKind,
        description: String,
        path: &[usize],
        snapshot: Option<TreeSnapshot<K>>,
    ) {
        trace!(
            target: "btree_variants::trace",
            variant = self.variant.name(),
            operation = self.operation.label(),
            kind = kind.label(),
            ?path,
            reads = self.counters.reads,
            writes = self.counters.writes,
            "{}",
            description
        );
        self.events.push(TraceEvent {
            kind,
            description,
            path: path.to_vec(),
            counters: self.counters,
            snapshot,
        });
    }

    pub(crate) fn into_trace(self) -> Trace<K> {
        Trace {
            variant: self.variant,
            events: self.events,
        }
    }
}
