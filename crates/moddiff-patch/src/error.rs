//! Error types for patch application.

use moddiff_types::{ConvertError, NodePath};
use thiserror::Error;

/// Errors that can occur while applying a diff.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The registry has no descriptor for a class named by a diff or schema.
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// A diff names a field the class does not declare (strict mode only).
    #[error("unknown field {field:?} on {class} at {path}")]
    UnknownField {
        class: String,
        field: String,
        path: NodePath,
    },

    /// The diff's shape cannot be applied to the slot it addresses.
    #[error("at {path}: expected {expected}, found {found}")]
    ShapeMismatch {
        path: NodePath,
        expected: &'static str,
        found: String,
    },

    /// A marker's adjusted index falls outside the list being patched.
    #[error("at {path}: marker index {index} (offset {offset}) is out of range for length {len}")]
    IndexOutOfRange {
        path: NodePath,
        index: usize,
        offset: isize,
        len: usize,
    },

    /// A raw value could not be stored in a primitive slot.
    #[error("at {path}: {source}")]
    Conversion {
        path: NodePath,
        #[source]
        source: ConvertError,
    },

    /// A class schema failed to parse or validate.
    #[error("invalid schema: {0}")]
    Schema(String),
}

/// Convenience type alias for patch operations.
pub type PatchResult<T> = std::result::Result<T, PatchError>;
