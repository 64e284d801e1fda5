//! Foundation types for moddiff.
//!
//! This crate holds the tree model that mod bundles describe changes against,
//! the diff model they store, and the JSON wire format both travel in. Every
//! other moddiff crate depends on `moddiff-types`.
//!
//! # Key Types
//!
//! - [`Node`] -- A value in a game-object tree (object, array, or primitive)
//! - [`DiffNode`] -- The recorded change between two nodes
//! - [`ArrayOp`] -- One positional marker of an array diff
//! - [`NodePath`] -- A location inside a tree, for errors and printing
//! - [`PrimitiveType`] -- Declared primitive slot types and value conversion

pub mod diff_node;
pub mod error;
pub mod node;
pub mod path;
pub mod primitive;
pub mod wire;

pub use diff_node::{ArrayOp, DiffNode, MarkerTag, ObjectDiff};
pub use error::{ConvertError, WireError};
pub use node::{ArrayNode, Node, NodeKind, ObjectNode};
pub use path::{NodePath, PathElement};
pub use primitive::PrimitiveType;
