//! JSON wire format for nodes and stored diffs.
//!
//! - Object type tags travel as a `"$type"` string property.
//! - Array element types travel as an envelope `{"$array": "T", "items": [..]}`.
//! - Array diffs are lists of markers
//!   `{"$t": "a"|"c"|"i"|"r"|"f", "$index": n, "$item": ..}`.
//! - `Removal` is `null`, both at the top level and under an object field.
//! - A replacement by an untagged object carries `"$type": null`, so it is not
//!   read back as a field diff. A replacement by a tagged object decodes as a
//!   [`DiffNode::Object`] carrying the tag and every field, which the patcher
//!   applies to a fresh instance of that type.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::diff_node::{ArrayOp, DiffNode, MarkerTag, ObjectDiff};
use crate::error::WireError;
use crate::node::{ArrayNode, Node, ObjectNode};

pub const TYPE_KEY: &str = "$type";
pub const ARRAY_KEY: &str = "$array";
pub const ITEMS_KEY: &str = "items";
pub const MARKER_TAG_KEY: &str = "$t";
pub const MARKER_INDEX_KEY: &str = "$index";
pub const MARKER_ITEM_KEY: &str = "$item";

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

impl Node {
    /// Build a node from JSON, lifting `$type` and `$array` envelopes.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => {
                Self::Array(ArrayNode::new(items.into_iter().map(Self::from_json).collect()))
            }
            Value::Object(map) => match split_envelope(map) {
                Ok((element_type, items)) => Self::Array(ArrayNode {
                    element_type: Some(element_type),
                    items: items.into_iter().map(Self::from_json).collect(),
                }),
                Err(mut map) => {
                    let type_tag = take_type_tag(&mut map);
                    let fields = map
                        .into_iter()
                        .map(|(k, v)| (k, Self::from_json(v)))
                        .collect();
                    Self::Object(ObjectNode { type_tag, fields })
                }
            },
        }
    }

    /// Render this node as JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Object(obj) => {
                let mut map: Map<String, Value> = obj
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                if let Some(tag) = &obj.type_tag {
                    map.insert(TYPE_KEY.to_string(), Value::String(tag.clone()));
                }
                Value::Object(map)
            }
            Self::Array(arr) => {
                let items: Vec<Value> = arr.items.iter().map(Node::to_json).collect();
                match &arr.element_type {
                    Some(element_type) => {
                        let mut map = Map::new();
                        map.insert(ARRAY_KEY.to_string(), Value::String(element_type.clone()));
                        map.insert(ITEMS_KEY.to_string(), Value::Array(items));
                        Value::Object(map)
                    }
                    None => Value::Array(items),
                }
            }
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}

/// Unwrap `{"$array": "T", "items": [..]}`; anything else is handed back.
fn split_envelope(map: Map<String, Value>) -> Result<(String, Vec<Value>), Map<String, Value>> {
    let is_envelope = map.len() == 2
        && matches!(map.get(ARRAY_KEY), Some(Value::String(_)))
        && matches!(map.get(ITEMS_KEY), Some(Value::Array(_)));
    if !is_envelope {
        return Err(map);
    }
    let mut map = map;
    match (map.remove(ARRAY_KEY), map.remove(ITEMS_KEY)) {
        (Some(Value::String(element_type)), Some(Value::Array(items))) => Ok((element_type, items)),
        _ => Err(map),
    }
}

/// Remove a string `$type` property. Non-string values stay ordinary fields.
fn take_type_tag(map: &mut Map<String, Value>) -> Option<String> {
    match map.get(TYPE_KEY) {
        Some(Value::String(_)) => match map.remove(TYPE_KEY) {
            Some(Value::String(tag)) => Some(tag),
            _ => None,
        },
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// DiffNode
// ---------------------------------------------------------------------------

impl DiffNode {
    /// Render this diff in the stored JSON format.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Removal => Value::Null,
            Self::Replace(node) => {
                let mut value = node.to_json();
                if let (Node::Object(obj), Value::Object(map)) = (node, &mut value) {
                    if obj.type_tag.is_none() {
                        map.insert(TYPE_KEY.to_string(), Value::Null);
                    }
                }
                value
            }
            Self::Object(diff) => {
                let mut map: Map<String, Value> = diff
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                if let Some(tag) = &diff.type_tag {
                    map.insert(TYPE_KEY.to_string(), Value::String(tag.clone()));
                }
                Value::Object(map)
            }
            Self::Array(ops) => Value::Array(ops.iter().map(marker_to_json).collect()),
        }
    }

    /// Decode a stored diff.
    pub fn from_json(value: &Value) -> Result<Self, WireError> {
        match value {
            Value::Null => Ok(Self::Removal),
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                Ok(Self::Replace(Node::from_json(value.clone())))
            }
            Value::Array(items) => match items.first() {
                Some(first) if is_marker(first) => decode_markers(items),
                _ => Ok(Self::Replace(Node::from_json(value.clone()))),
            },
            Value::Object(map) => {
                if map.len() == 2 && map.contains_key(ARRAY_KEY) && map.contains_key(ITEMS_KEY) {
                    return Ok(Self::Replace(Node::from_json(value.clone())));
                }
                if matches!(map.get(TYPE_KEY), Some(Value::Null)) {
                    let mut map = map.clone();
                    map.remove(TYPE_KEY);
                    return Ok(Self::Replace(Node::from_json(Value::Object(map))));
                }
                let mut diff = ObjectDiff::new();
                for (key, field) in map {
                    if key == TYPE_KEY {
                        if let Value::String(tag) = field {
                            diff.type_tag = Some(tag.clone());
                            continue;
                        }
                    }
                    diff.fields.insert(key.clone(), Self::from_json(field)?);
                }
                Ok(Self::Object(diff))
            }
        }
    }

    /// Decode a stored diff from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, WireError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }
}

impl Serialize for DiffNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DiffNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

fn is_marker(value: &Value) -> bool {
    matches!(
        value.as_object().and_then(|m| m.get(MARKER_TAG_KEY)),
        Some(Value::String(_))
    )
}

fn marker_to_json(op: &ArrayOp) -> Value {
    let mut map = Map::new();
    map.insert(
        MARKER_TAG_KEY.to_string(),
        Value::String(op.tag().to_string()),
    );
    if let Some(index) = op.index() {
        map.insert(MARKER_INDEX_KEY.to_string(), Value::from(index));
    }
    match op {
        ArrayOp::Added { item } | ArrayOp::Inserted { item, .. } => {
            map.insert(MARKER_ITEM_KEY.to_string(), item.to_json());
        }
        ArrayOp::Changed { diff, .. } => {
            map.insert(MARKER_ITEM_KEY.to_string(), diff.to_json());
        }
        ArrayOp::Removed { .. } => {}
    }
    Value::Object(map)
}

fn decode_markers(items: &[Value]) -> Result<DiffNode, WireError> {
    let mut ops = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let map = match item.as_object() {
            Some(map) if is_marker(item) => map,
            _ => return Err(WireError::NotAMarker { position }),
        };
        let tag_text = map
            .get(MARKER_TAG_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let tag = MarkerTag::from_tag(tag_text)
            .ok_or_else(|| WireError::UnknownMarkerTag(tag_text.to_string()))?;

        let op = match tag {
            MarkerTag::FullArrayReplace => {
                return match (items.len(), map.get(MARKER_ITEM_KEY)) {
                    (1, Some(array @ Value::Array(_))) => {
                        Ok(DiffNode::Replace(Node::from_json(array.clone())))
                    }
                    _ => Err(WireError::InvalidFullReplace),
                };
            }
            MarkerTag::Added => ArrayOp::Added {
                item: Node::from_json(marker_item(map, position, tag)?.clone()),
            },
            MarkerTag::Inserted => ArrayOp::Inserted {
                index: marker_index(map, position, tag)?,
                item: Node::from_json(marker_item(map, position, tag)?.clone()),
            },
            MarkerTag::Removed => ArrayOp::Removed {
                index: marker_index(map, position, tag)?,
            },
            MarkerTag::Changed => ArrayOp::Changed {
                index: marker_index(map, position, tag)?,
                diff: DiffNode::from_json(marker_item(map, position, tag)?)?,
            },
        };
        ops.push(op);
    }
    Ok(DiffNode::Array(ops))
}

fn marker_item<'a>(
    map: &'a Map<String, Value>,
    position: usize,
    tag: MarkerTag,
) -> Result<&'a Value, WireError> {
    map.get(MARKER_ITEM_KEY).ok_or(WireError::MissingField {
        position,
        tag: tag.as_char(),
        field: MARKER_ITEM_KEY,
    })
}

fn marker_index(
    map: &Map<String, Value>,
    position: usize,
    tag: MarkerTag,
) -> Result<usize, WireError> {
    let value = map.get(MARKER_INDEX_KEY).ok_or(WireError::MissingField {
        position,
        tag: tag.as_char(),
        field: MARKER_INDEX_KEY,
    })?;
    value
        .as_u64()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| WireError::InvalidIndex {
            position,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_tag_is_lifted_out_of_fields() {
        let node = Node::from_json(json!({"$type": "Sword", "damage": 4}));
        let obj = node.as_object().unwrap();
        assert_eq!(obj.type_tag.as_deref(), Some("Sword"));
        assert!(obj.get(TYPE_KEY).is_none());
        assert_eq!(node.to_json(), json!({"$type": "Sword", "damage": 4}));
    }

    #[test]
    fn non_string_type_stays_a_field() {
        let node = Node::from_json(json!({"$type": 3}));
        let obj = node.as_object().unwrap();
        assert!(obj.type_tag.is_none());
        assert_eq!(obj.get(TYPE_KEY), Some(&Node::from(3i64)));
    }

    #[test]
    fn array_envelope_is_unwrapped() {
        let node = Node::from_json(json!({"$array": "Item", "items": [{"id": 1}]}));
        let arr = node.as_array().unwrap();
        assert_eq!(arr.element_type.as_deref(), Some("Item"));
        assert_eq!(arr.len(), 1);
        assert_eq!(
            node.to_json(),
            json!({"$array": "Item", "items": [{"id": 1}]})
        );
    }

    #[test]
    fn envelope_with_extra_keys_is_an_object() {
        let node = Node::from_json(json!({"$array": "Item", "items": [], "x": 1}));
        assert!(node.as_object().is_some());
    }

    #[test]
    fn removal_encodes_as_null() {
        assert_eq!(DiffNode::Removal.to_json(), Value::Null);
        assert_eq!(DiffNode::from_json(&Value::Null).unwrap(), DiffNode::Removal);
    }

    #[test]
    fn markers_encode_with_tags() {
        let diff = DiffNode::Array(vec![
            ArrayOp::Changed {
                index: 1,
                diff: DiffNode::Replace(Node::from(9i64)),
            },
            ArrayOp::Removed { index: 3 },
            ArrayOp::Inserted {
                index: 0,
                item: Node::from("x"),
            },
            ArrayOp::Added {
                item: Node::from(true),
            },
        ]);
        let value = diff.to_json();
        assert_eq!(
            value,
            json!([
                {"$t": "c", "$index": 1, "$item": 9},
                {"$t": "r", "$index": 3},
                {"$t": "i", "$index": 0, "$item": "x"},
                {"$t": "a", "$item": true},
            ])
        );
        assert_eq!(DiffNode::from_json(&value).unwrap(), diff);
    }

    #[test]
    fn unannotated_array_is_full_replacement() {
        let decoded = DiffNode::from_json(&json!([1, 2, 3])).unwrap();
        assert_eq!(
            decoded,
            DiffNode::Replace(Node::from(vec![
                Node::from(1i64),
                Node::from(2i64),
                Node::from(3i64)
            ]))
        );
    }

    #[test]
    fn field_null_is_removal_and_absent_is_unchanged() {
        let decoded = DiffNode::from_json(&json!({"name": null, "hp": 3})).unwrap();
        let DiffNode::Object(diff) = decoded else {
            panic!("expected object diff");
        };
        assert_eq!(diff.fields.get("name"), Some(&DiffNode::Removal));
        assert_eq!(diff.fields.get("hp"), Some(&DiffNode::Replace(3i64.into())));
        assert!(diff.fields.get("level").is_none());
    }

    #[test]
    fn object_diff_keeps_type_tag() {
        let decoded = DiffNode::from_json(&json!({"$type": "Axe", "hp": 1})).unwrap();
        let DiffNode::Object(diff) = decoded else {
            panic!("expected object diff");
        };
        assert_eq!(diff.type_tag.as_deref(), Some("Axe"));
        assert_eq!(diff.len(), 1);
    }

    #[test]
    fn untagged_object_replacement_is_marked() {
        let replace = DiffNode::Replace(Node::from_json(json!({"x": 1, "inner": {"y": 2}})));
        let encoded = replace.to_json();
        assert_eq!(encoded, json!({"$type": null, "x": 1, "inner": {"y": 2}}));
        assert_eq!(DiffNode::from_json(&encoded).unwrap(), replace);

        let tagged = DiffNode::Replace(Node::from_json(json!({"$type": "A", "x": 1})));
        assert_eq!(tagged.to_json(), json!({"$type": "A", "x": 1}));
    }

    #[test]
    fn mixed_marker_list_is_rejected() {
        let err = DiffNode::from_json(&json!([{"$t": "a", "$item": 1}, 2])).unwrap_err();
        assert!(matches!(err, WireError::NotAMarker { position: 1 }));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = DiffNode::from_json(&json!([{"$t": "z"}])).unwrap_err();
        assert!(matches!(err, WireError::UnknownMarkerTag(t) if t == "z"));
    }

    #[test]
    fn missing_index_is_rejected() {
        let err = DiffNode::from_json(&json!([{"$t": "r"}])).unwrap_err();
        assert!(matches!(
            err,
            WireError::MissingField { position: 0, tag: 'r', .. }
        ));
        let err = DiffNode::from_json(&json!([{"$t": "r", "$index": -1}])).unwrap_err();
        assert!(matches!(err, WireError::InvalidIndex { position: 0, .. }));
    }

    #[test]
    fn full_array_replace_marker_is_accepted() {
        let decoded = DiffNode::from_json(&json!([{"$t": "f", "$item": [1]}])).unwrap();
        assert_eq!(decoded, DiffNode::Replace(Node::from(vec![Node::from(1i64)])));

        let err = DiffNode::from_json(&json!([{"$t": "f", "$item": 1}])).unwrap_err();
        assert!(matches!(err, WireError::InvalidFullReplace));
    }

    #[test]
    fn serde_round_trip() {
        let text = r#"{"stats":{"hp":10},"tags":[{"$index":0,"$t":"r"}]}"#;
        let diff: DiffNode = serde_json::from_str(text).unwrap();
        let back = serde_json::to_string(&diff).unwrap();
        assert_eq!(back, text);
    }

    #[test]
    fn serde_rejects_malformed_diff() {
        let result: Result<DiffNode, _> = serde_json::from_str(r#"[{"$t":"q"}]"#);
        assert!(result.is_err());
    }
}
