use thiserror::Error;

use crate::node::NodeKind;
use crate::primitive::PrimitiveType;

/// Errors produced while decoding a stored diff.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("array diff element {position} is not a marker")]
    NotAMarker { position: usize },

    #[error("unknown marker tag: {0:?}")]
    UnknownMarkerTag(String),

    #[error("marker {position} ({tag}) is missing `{field}`")]
    MissingField {
        position: usize,
        tag: char,
        field: &'static str,
    },

    #[error("marker {position} has an invalid index: {value}")]
    InvalidIndex { position: usize, value: String },

    #[error("a full-array replacement marker must be the only element and carry an array")]
    InvalidFullReplace,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced when a raw value cannot be stored in a primitive slot.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("cannot convert {found} to {target}")]
    Incompatible {
        target: PrimitiveType,
        found: NodeKind,
    },

    #[error("value {value} is out of range for {target}")]
    OutOfRange { target: PrimitiveType, value: String },

    #[error("cannot parse {value:?} as {target}")]
    Unparsable { target: PrimitiveType, value: String },
}
