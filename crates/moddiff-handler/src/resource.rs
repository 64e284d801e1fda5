//! Resource kinds and their persisted diffs.

use std::fmt;

use moddiff_types::{DiffNode, Node, WireError};
use serde::{Deserialize, Serialize};

use crate::error::HandlerResult;
use crate::text_table::{TextEntry, TextTableDiff};

/// A resource a bundle can modify.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Resource {
    /// A single tree-shaped object.
    Object(Node),
    /// A list of tree-shaped objects.
    List(Vec<Node>),
    /// A table of localized text entries.
    TextTable(Vec<TextEntry>),
}

/// The diff of a [`Resource`], tagged with the kind it applies to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "diff", rename_all = "snake_case")]
pub enum ResourceDiff {
    Object(DiffNode),
    List(DiffNode),
    TextTable(TextTableDiff),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Object,
    List,
    TextTable,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::List => "list",
            Self::TextTable => "text table",
        };
        f.write_str(name)
    }
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Object(_) => ResourceKind::Object,
            Self::List(_) => ResourceKind::List,
            Self::TextTable(_) => ResourceKind::TextTable,
        }
    }
}

impl ResourceDiff {
    /// Decode a stored resource diff.
    pub fn from_json_str(text: &str) -> HandlerResult<Self> {
        let diff = serde_json::from_str(text).map_err(WireError::from)?;
        Ok(diff)
    }

    /// Encode for storage.
    pub fn to_json_string(&self) -> HandlerResult<String> {
        let text = serde_json::to_string(self).map_err(WireError::from)?;
        Ok(text)
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Object(_) => ResourceKind::Object,
            Self::List(_) => ResourceKind::List,
            Self::TextTable(_) => ResourceKind::TextTable,
        }
    }

    /// Total number of added elements or entries.
    pub fn additions(&self) -> usize {
        match self {
            Self::Object(d) | Self::List(d) => d.additions(),
            Self::TextTable(d) => d.additions(),
        }
    }

    /// Total number of removed fields, elements or entries.
    pub fn removals(&self) -> usize {
        match self {
            Self::Object(d) | Self::List(d) => d.removals(),
            Self::TextTable(d) => d.removals(),
        }
    }

    /// Total number of in-place changes.
    pub fn changes(&self) -> usize {
        match self {
            Self::Object(d) | Self::List(d) => d.changes(),
            Self::TextTable(d) => d.modifications(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use serde_json::json;

    #[test]
    fn resources_are_tagged_by_kind() {
        let r: Resource = serde_json::from_value(json!({
            "kind": "list",
            "value": [{"id": 1}, {"id": 2}],
        }))
        .unwrap();
        assert_eq!(r.kind(), ResourceKind::List);
        let Resource::List(items) = &r else {
            panic!("expected list, got {r:?}");
        };
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn malformed_stored_diff_is_a_wire_error() {
        let err = ResourceDiff::from_json_str(r#"{"kind": "list", "diff": [{"$t": "q"}]}"#)
            .unwrap_err();
        assert!(matches!(err, HandlerError::Wire(_)));

        let err = ResourceDiff::from_json_str(r#"{"kind": "chart", "diff": null}"#).unwrap_err();
        assert!(matches!(err, HandlerError::Wire(WireError::Json(_))));
    }

    #[test]
    fn stored_text_round_trips() {
        let diff = ResourceDiff::Object(DiffNode::Replace(Node::from_json(json!({"x": 1}))));
        let text = diff.to_json_string().unwrap();
        assert_eq!(ResourceDiff::from_json_str(&text).unwrap(), diff);
    }

    #[test]
    fn diff_envelope_keeps_wire_format() {
        let diff = ResourceDiff::Object(DiffNode::Removal);
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!({"kind": "object", "diff": null})
        );

        let back: ResourceDiff = serde_json::from_value(json!({
            "kind": "list",
            "diff": [{"$t": "r", "$index": 0}],
        }))
        .unwrap();
        assert_eq!(back.kind(), ResourceKind::List);
        assert_eq!(back.removals(), 1);
    }
}
