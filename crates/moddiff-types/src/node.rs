//! The tree model diffed and patched by the engine.
//!
//! A [`Node`] is one value in a game-object tree: a primitive, an object with
//! an optional polymorphic type tag, or an array with an optional element
//! type tag. Type tags are lifted out of the wire representation (`$type`,
//! `{"$array": .., "items": ..}`) so the engine never treats them as ordinary
//! fields.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Number;

/// A value in a tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Object(ObjectNode),
    Array(ArrayNode),
}

/// The shape of a [`Node`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Bool,
    Number,
    String,
    Object,
    Array,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool => write!(f, "bool"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
            Self::Object => write!(f, "object"),
            Self::Array => write!(f, "array"),
        }
    }
}

/// An object: named fields plus an optional dynamic type tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectNode {
    /// The runtime class of the object (`$type` on the wire).
    pub type_tag: Option<String>,
    /// Field values keyed by name.
    pub fields: BTreeMap<String, Node>,
}

/// An array: ordered items plus an optional element type tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrayNode {
    /// The declared element type (`$array` envelope on the wire).
    pub element_type: Option<String>,
    /// The elements, in order.
    pub items: Vec<Node>,
}

impl Node {
    /// The shape of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Null => NodeKind::Null,
            Self::Bool(_) => NodeKind::Bool,
            Self::Number(_) => NodeKind::Number,
            Self::String(_) => NodeKind::String,
            Self::Object(_) => NodeKind::Object,
            Self::Array(_) => NodeKind::Array,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for null, bool, number and string nodes.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Object(_) | Self::Array(_))
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ObjectNode> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayNode> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut ArrayNode> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The `$type` tag when this node is a typed object.
    pub fn type_tag(&self) -> Option<&str> {
        self.as_object().and_then(|o| o.type_tag.as_deref())
    }
}

impl From<bool> for Node {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Node {
    fn from(v: i64) -> Self {
        Self::Number(v.into())
    }
}

impl From<u64> for Node {
    fn from(v: u64) -> Self {
        Self::Number(v.into())
    }
}

impl From<f64> for Node {
    /// Non-finite floats have no number representation and become `Null`.
    fn from(v: f64) -> Self {
        Number::from_f64(v).map_or(Self::Null, Self::Number)
    }
}

impl From<&str> for Node {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Node {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<ObjectNode> for Node {
    fn from(v: ObjectNode) -> Self {
        Self::Object(v)
    }
}

impl From<ArrayNode> for Node {
    fn from(v: ArrayNode) -> Self {
        Self::Array(v)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Self::Array(ArrayNode::new(items))
    }
}

impl ObjectNode {
    /// An untyped, empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty object tagged with `type_tag`.
    pub fn typed(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: Some(type_tag.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Node>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.fields.get_mut(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Node) -> Option<Node> {
        self.fields.insert(name.into(), value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl ArrayNode {
    /// An untagged array holding `items`.
    pub fn new(items: Vec<Node>) -> Self {
        Self {
            element_type: None,
            items,
        }
    }

    /// An array carrying an element type envelope.
    pub fn typed(element_type: impl Into<String>, items: Vec<Node>) -> Self {
        Self {
            element_type: Some(element_type.into()),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Node::Null.kind(), NodeKind::Null);
        assert_eq!(Node::from(true).kind(), NodeKind::Bool);
        assert_eq!(Node::from(3i64).kind(), NodeKind::Number);
        assert_eq!(Node::from("x").kind(), NodeKind::String);
        assert_eq!(Node::from(ObjectNode::new()).kind(), NodeKind::Object);
        assert_eq!(Node::from(vec![Node::Null]).kind(), NodeKind::Array);
    }

    #[test]
    fn non_finite_float_becomes_null() {
        assert_eq!(Node::from(f64::NAN), Node::Null);
        assert_eq!(Node::from(f64::INFINITY), Node::Null);
        assert!(matches!(Node::from(1.5), Node::Number(_)));
    }

    #[test]
    fn object_builder() {
        let obj = ObjectNode::typed("Weapon").with("damage", 12i64).with("name", "axe");
        assert_eq!(obj.type_tag.as_deref(), Some("Weapon"));
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.get("name").and_then(Node::as_str), Some("axe"));
        assert_eq!(Node::from(obj).type_tag(), Some("Weapon"));
    }

    #[test]
    fn primitive_classification() {
        assert!(Node::Null.is_primitive());
        assert!(Node::from("s").is_primitive());
        assert!(!Node::from(ObjectNode::new()).is_primitive());
        assert!(!Node::from(Vec::<Node>::new()).is_primitive());
    }
}
