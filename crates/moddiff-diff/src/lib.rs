//! Diff engine for moddiff.
//!
//! Computes the minimal structural change between a baseline tree (the
//! target) and a modified tree (the source). Diffing is total: every pair of
//! trees yields a diff, or `None` when nothing changed.
//!
//! # Entry Points
//!
//! - [`diff_nodes`] -- Diff any two nodes
//! - [`diff_objects`] -- Field-wise object diff (type tags are authoritative)
//! - [`diff_arrays`] -- Positional head/tail splice for object arrays
//! - [`diff_lists`] -- The same over bare slices

pub mod array_diff;
pub mod node_diff;

pub use array_diff::{diff_arrays, diff_lists};
pub use node_diff::{diff_nodes, diff_objects};
