//! The [`DescriptorRegistry`] trait: what the patcher needs to know about the
//! classes it patches.
//!
//! Stored diffs carry no schema. Every decision that depends on a field's
//! declared type (whether a removal zeroes a number, whether a list element
//! is an object to be constructed, whether a field exists at all) goes
//! through a registry.

use moddiff_types::{ConvertError, Node, PrimitiveType};
use serde::{Deserialize, Serialize};

use crate::error::PatchResult;

/// The declared kind of a field or list element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// A nested object. `class` is the declared type, used when a fresh
    /// instance must be built and the value carries no type tag of its own.
    Object {
        #[serde(default)]
        class: Option<String>,
    },
    /// A list whose elements are all of kind `element`.
    Array { element: Box<FieldKind> },
    /// A localized text reference.
    Text,
    /// A typed scalar.
    Primitive {
        #[serde(rename = "type")]
        primitive: PrimitiveType,
    },
    /// No declared type; values are taken as they are.
    Dynamic,
}

pub(crate) static DYNAMIC: FieldKind = FieldKind::Dynamic;

impl FieldKind {
    pub fn object(class: impl Into<String>) -> Self {
        Self::Object {
            class: Some(class.into()),
        }
    }

    pub fn array_of(element: FieldKind) -> Self {
        Self::Array {
            element: Box::new(element),
        }
    }

    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self::Primitive { primitive }
    }

    /// The value a freshly constructed slot of this kind holds.
    pub fn default_value(&self) -> Node {
        match self {
            Self::Array { .. } => Node::from(Vec::<Node>::new()),
            Self::Primitive { primitive } => primitive.zero(),
            Self::Object { .. } | Self::Text | Self::Dynamic => Node::Null,
        }
    }
}

/// Class metadata consulted while applying a diff.
///
/// `class` is `None` for untyped objects; registries should resolve their
/// fields dynamically.
pub trait DescriptorRegistry {
    /// The declared kind of `field` on `class`, or `None` if the class does
    /// not declare it.
    fn resolve_field(&self, class: Option<&str>, field: &str) -> Option<&FieldKind>;

    /// Build a default instance of `class`.
    fn default_instance(&self, class: &str) -> PatchResult<Node>;

    /// Convert a raw wire value for a primitive slot.
    fn convert(&self, primitive: PrimitiveType, raw: &Node) -> Result<Node, ConvertError> {
        primitive.convert(raw)
    }
}

impl<R: DescriptorRegistry + ?Sized> DescriptorRegistry for &R {
    fn resolve_field(&self, class: Option<&str>, field: &str) -> Option<&FieldKind> {
        (**self).resolve_field(class, field)
    }

    fn default_instance(&self, class: &str) -> PatchResult<Node> {
        (**self).default_instance(class)
    }

    fn convert(&self, primitive: PrimitiveType, raw: &Node) -> Result<Node, ConvertError> {
        (**self).convert(primitive, raw)
    }
}
