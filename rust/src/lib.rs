//! B-Tree, B*-Tree and B+Tree with replayable operation traces.
//!
//! The three variants share one arena-backed tree type,
//! [`MultiwayTree`], parameterised by a [`DegreePolicy`]:
//!
//! - [`BTree`] keeps keys in every node and promotes the median on split.
//! - [`BStarTree`] shifts a key into a sibling before splitting and splits
//!   two full nodes into three.
//! - [`BPlusTree`] keeps every key in chained leaves and copies separators
//!   up.
//!
//! Every [`insert`](MultiwayTree::insert) and
//! [`delete`](MultiwayTree::delete) returns a [`Trace`]: the ordered list of
//! steps the operation took, each with the page reads and writes counted so
//! far and, optionally, a snapshot of the tree at that moment.
//!
//! ```
//! use btree_variants::{BTree, TraceEventKind};
//!
//! let mut tree = BTree::new(2).unwrap();
//! for key in [10, 20, 5] {
//!     tree.insert(key);
//! }
//! let trace = tree.insert(6);
//! assert!(trace.contains(TraceEventKind::NewRoot));
//! assert_eq!(trace.last().map(|event| event.kind), Some(TraceEventKind::Complete));
//! assert_eq!(tree.keys().copied().collect::<Vec<_>>(), vec![5, 6, 10, 20]);
//! ```

#[macro_use]
mod macros;

mod arena;
mod config;
mod delete_operations;
mod error;
mod insert_operations;
mod iteration;
mod node;
mod policy;
mod trace;
mod tree_structure;
mod types;
mod validation;

pub use arena::{ArenaStats, NodeArena};
pub use config::TreeConfig;
pub use error::{InitResult, TreeError, TreeResult};
pub use iteration::{KeyIterator, LeafIterator};
pub use policy::{BPlusTree, BPlusTreePolicy, BStarTree, BStarTreePolicy, BTree, BTreePolicy, DegreePolicy};
pub use trace::{cost, PageCounters, Trace, TraceEvent, TraceEventKind};
pub use tree_structure::{NodeView, SnapshotNode, TreeSnapshot, TreeStats};
pub use types::{KeyLayout, MultiwayTree, Node, NodeId, OverflowStrategy, Variant, NULL_NODE};
