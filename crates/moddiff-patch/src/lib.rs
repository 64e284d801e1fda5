//! Schema-driven patching of node trees.
//!
//! A [`DiffNode`](moddiff_types::DiffNode) records what changed, but not what
//! the changed slots hold. This crate supplies that knowledge through a
//! [`DescriptorRegistry`] and applies diffs with [`DiffPatcher`].
//!
//! # Modules
//!
//! - [`error`]: [`PatchError`] and the [`PatchResult`] alias
//! - [`registry`]: the [`DescriptorRegistry`] trait and [`FieldKind`]
//! - [`memory`]: [`InMemoryRegistry`] for declared classes, [`SchemalessRegistry`] for plain trees
//! - [`config`]: [`PatchConfig`]
//! - [`patcher`]: [`DiffPatcher`]

pub mod config;
pub mod error;
pub mod memory;
pub mod patcher;
pub mod registry;

pub use config::PatchConfig;
pub use error::{PatchError, PatchResult};
pub use memory::{ClassDescriptor, InMemoryRegistry, SchemalessRegistry};
pub use patcher::DiffPatcher;
pub use registry::{DescriptorRegistry, FieldKind};
