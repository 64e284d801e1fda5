//! High-level moddiff API.
//!
//! [`DiffHandler`] binds the diff engine ([`moddiff_diff`]) and the patcher
//! ([`moddiff_patch`]) to the three resource kinds a bundle can modify:
//! single objects, object lists, and localized text tables. This is the main
//! entry point for applications embedding moddiff.
//!
//! # Key Types
//!
//! - [`DiffHandler`] -- Diff, apply, and chain diffs per resource kind
//! - [`Resource`] / [`ResourceDiff`] -- A resource and its persisted diff, tagged by kind
//! - [`TextEntry`] / [`TextTableDiff`] -- Flat localized text records and their keyed diff
//! - [`HandlerConfig`] -- Handler configuration
//!
//! Diffs render for inspection with [`printer::render`].

pub mod config;
pub mod error;
pub mod handler;
pub mod printer;
pub mod resource;
pub mod text_table;

pub use config::HandlerConfig;
pub use error::{HandlerError, HandlerResult};
pub use handler::DiffHandler;
pub use resource::{Resource, ResourceDiff, ResourceKind};
pub use text_table::{apply_text_table_diff, diff_text_tables, TextChange, TextEntry, TextTableDiff};

// Re-export key types
pub use moddiff_patch::{
    ClassDescriptor, DescriptorRegistry, FieldKind, InMemoryRegistry, PatchConfig, PatchError,
    SchemalessRegistry,
};
pub use moddiff_types::{DiffNode, Node, NodePath};
