//! The recorded change between two [`Node`]s.
//!
//! "No change" is not a variant: producers return `Option<DiffNode>` and use
//! `None` for it, so a `DiffNode` always describes something to do.

use std::collections::BTreeMap;
use std::fmt;

use crate::node::{Node, ObjectNode};

/// A change to apply to one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffNode {
    /// Delete the value. Under an object field this clears the field.
    Removal,
    /// Substitute the value wholesale.
    Replace(Node),
    /// Per-field changes to an object.
    Object(ObjectDiff),
    /// Positional splice of an array, as an ordered marker list.
    Array(Vec<ArrayOp>),
}

/// Field-level changes to an object.
///
/// A field missing from `fields` is unchanged. A field mapped to
/// [`DiffNode::Removal`] is cleared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectDiff {
    /// When set and different from the live instance's type, the instance is
    /// rebuilt as a default instance of this type before fields are applied.
    pub type_tag: Option<String>,
    pub fields: BTreeMap<String, DiffNode>,
}

/// One marker of an array diff.
///
/// Indices are recorded against the array the diff was computed from; the
/// patcher keeps a running offset to map them onto the list it is mutating.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayOp {
    /// Append an item.
    Added { item: Node },
    /// Insert an item before the element originally at `index`.
    Inserted { index: usize, item: Node },
    /// Remove the element originally at `index`.
    Removed { index: usize },
    /// Apply a nested diff to the element at `index`.
    Changed { index: usize, diff: DiffNode },
}

/// The one-character operation tag carried by array markers on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerTag {
    Added,
    Changed,
    Inserted,
    Removed,
    /// Whole-array replacement. Never produced; accepted when decoding.
    FullArrayReplace,
}

impl MarkerTag {
    pub fn as_char(self) -> char {
        match self {
            Self::Added => 'a',
            Self::Changed => 'c',
            Self::Inserted => 'i',
            Self::Removed => 'r',
            Self::FullArrayReplace => 'f',
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "a" => Some(Self::Added),
            "c" => Some(Self::Changed),
            "i" => Some(Self::Inserted),
            "r" => Some(Self::Removed),
            "f" => Some(Self::FullArrayReplace),
            _ => None,
        }
    }
}

impl fmt::Display for MarkerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl ArrayOp {
    pub fn tag(&self) -> MarkerTag {
        match self {
            Self::Added { .. } => MarkerTag::Added,
            Self::Inserted { .. } => MarkerTag::Inserted,
            Self::Removed { .. } => MarkerTag::Removed,
            Self::Changed { .. } => MarkerTag::Changed,
        }
    }

    /// The recorded index, if the marker carries one.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Added { .. } => None,
            Self::Inserted { index, .. }
            | Self::Removed { index }
            | Self::Changed { index, .. } => Some(*index),
        }
    }
}

impl ObjectDiff {
    /// Create an empty object diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Express a full object value as a field diff that sets every field.
    ///
    /// `Null` field values become [`DiffNode::Removal`], which is what the
    /// wire format makes of them anyway.
    pub fn from_node(object: &ObjectNode) -> Self {
        let fields = object
            .fields
            .iter()
            .map(|(name, value)| {
                let diff = match value {
                    Node::Null => DiffNode::Removal,
                    other => DiffNode::Replace(other.clone()),
                };
                (name.clone(), diff)
            })
            .collect();
        Self {
            type_tag: object.type_tag.clone(),
            fields,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl DiffNode {
    /// Returns `true` if this diff substitutes the whole value.
    pub fn is_replacement(&self) -> bool {
        matches!(self, Self::Replace(_))
    }

    /// Number of `Added`/`Inserted` markers in the whole diff tree.
    pub fn additions(&self) -> usize {
        self.count(
            &|op: &ArrayOp| matches!(op, ArrayOp::Added { .. } | ArrayOp::Inserted { .. }),
            false,
            false,
        )
    }

    /// Number of `Removed` markers and `Removal` nodes in the whole diff tree.
    pub fn removals(&self) -> usize {
        self.count(&|op: &ArrayOp| matches!(op, ArrayOp::Removed { .. }), true, false)
    }

    /// Number of value substitutions in the whole diff tree.
    pub fn changes(&self) -> usize {
        self.count(&|_: &ArrayOp| false, false, true)
    }

    fn count(&self, marker: &dyn Fn(&ArrayOp) -> bool, removal: bool, replace: bool) -> usize {
        match self {
            Self::Removal => usize::from(removal),
            Self::Replace(_) => usize::from(replace),
            Self::Object(diff) => diff
                .fields
                .values()
                .map(|d| d.count(marker, removal, replace))
                .sum(),
            Self::Array(ops) => ops
                .iter()
                .map(|op| {
                    let own = usize::from(marker(op));
                    let nested = match op {
                        ArrayOp::Changed { diff, .. } => diff.count(marker, removal, replace),
                        _ => 0,
                    };
                    own + nested
                })
                .sum(),
        }
    }
}
