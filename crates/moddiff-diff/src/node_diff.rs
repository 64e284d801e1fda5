//! Node-level diff: dispatch on the shapes of target and source, and the
//! field-wise object diff.
//!
//! The target is the baseline tree, the source the modified one. A `None`
//! result means applying nothing to the target already yields the source.

use moddiff_types::{DiffNode, Node, ObjectDiff, ObjectNode};
use tracing::debug;

use crate::array_diff::diff_arrays;

/// Compute the change that turns `target` into `source`.
///
/// Rules, first match wins:
/// 1. null target: no change if the source is null too, else the source.
/// 2. null source: [`DiffNode::Removal`].
/// 3. two objects: [`diff_objects`]; two arrays: [`diff_arrays`].
/// 4. different kinds: the source, wholesale.
/// 5. two primitives: the source if they differ.
///
/// Array envelopes are already unwrapped into [`Node::Array`] by the wire
/// layer, so an enveloped array on either side takes the array rule.
pub fn diff_nodes(target: &Node, source: &Node) -> Option<DiffNode> {
    match (target, source) {
        (Node::Null, Node::Null) => None,
        (Node::Null, _) => Some(DiffNode::Replace(source.clone())),
        (_, Node::Null) => Some(DiffNode::Removal),
        (Node::Object(t), Node::Object(s)) => diff_objects(t, s),
        (Node::Array(t), Node::Array(s)) => diff_arrays(t, s),
        _ if target.kind() != source.kind() => Some(DiffNode::Replace(source.clone())),
        _ => (target != source).then(|| DiffNode::Replace(source.clone())),
    }
}

/// Field-wise diff of two objects.
///
/// Only the source's fields are visited: a field the source omits is left
/// alone, while a field the source sets to `null` is recorded as a
/// [`DiffNode::Removal`]. Differing type tags replace the whole object.
pub fn diff_objects(target: &ObjectNode, source: &ObjectNode) -> Option<DiffNode> {
    if target.type_tag != source.type_tag {
        debug!(
            from = ?target.type_tag,
            to = ?source.type_tag,
            "type tag changed; replacing object"
        );
        return Some(DiffNode::Replace(Node::Object(source.clone())));
    }

    let mut diff = ObjectDiff::new();
    for (name, value) in &source.fields {
        let field = match (target.fields.get(name), value) {
            (None, Node::Null) => Some(DiffNode::Removal),
            (None, value) => Some(DiffNode::Replace(value.clone())),
            (Some(Node::Null), Node::Null) => None,
            (Some(_), Node::Null) => Some(DiffNode::Removal),
            (Some(current), value) => diff_nodes(current, value),
        };
        if let Some(field) = field {
            diff.fields.insert(name.clone(), field);
        }
    }

    (!diff.is_empty()).then_some(DiffNode::Object(diff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> Node {
        Node::from_json(value)
    }

    fn diff(target: serde_json::Value, source: serde_json::Value) -> Option<DiffNode> {
        diff_nodes(&node(target), &node(source))
    }

    #[test]
    fn null_propagation() {
        assert_eq!(diff(json!(null), json!(null)), None);
        assert_eq!(
            diff(json!(null), json!({"a": 1})),
            Some(DiffNode::Replace(node(json!({"a": 1}))))
        );
        assert_eq!(diff(json!({"a": 1}), json!(null)), Some(DiffNode::Removal));
        assert_eq!(diff(json!(3), json!(null)), Some(DiffNode::Removal));
    }

    #[test]
    fn kind_mismatch_replaces() {
        assert_eq!(
            diff(json!({"a": 1}), json!([1])),
            Some(DiffNode::Replace(node(json!([1]))))
        );
        assert_eq!(
            diff(json!("5"), json!(5)),
            Some(DiffNode::Replace(node(json!(5))))
        );
    }

    #[test]
    fn primitives_compare_structurally() {
        assert_eq!(diff(json!(1), json!(1)), None);
        assert_eq!(diff(json!("a"), json!("a")), None);
        assert_eq!(
            diff(json!(true), json!(false)),
            Some(DiffNode::Replace(Node::Bool(false)))
        );
    }

    #[test]
    fn identical_trees_have_no_diff() {
        let tree = json!({
            "$type": "Unit",
            "name": "archer",
            "alias": null,
            "stats": {"hp": 10, "tags": ["a", "b"]},
            "loadout": [{"id": 1}, {"id": 2}],
        });
        assert_eq!(diff(tree.clone(), tree), None);
    }

    #[test]
    fn omitted_field_is_untouched_and_null_field_is_removed() {
        let d = diff(
            json!({"name": "a", "title": "sir", "level": 3}),
            json!({"name": "a", "title": null}),
        )
        .unwrap();
        let DiffNode::Object(obj) = d else {
            panic!("expected object diff, got {d:?}");
        };
        assert_eq!(obj.fields.len(), 1);
        assert_eq!(obj.fields["title"], DiffNode::Removal);
        assert!(!obj.fields.contains_key("level"));
    }

    #[test]
    fn new_fields_are_cloned() {
        let d = diff(json!({}), json!({"extra": {"x": 1}, "gone": null})).unwrap();
        let DiffNode::Object(obj) = d else {
            panic!("expected object diff, got {d:?}");
        };
        assert_eq!(obj.fields["extra"], DiffNode::Replace(node(json!({"x": 1}))));
        assert_eq!(obj.fields["gone"], DiffNode::Removal);
    }

    #[test]
    fn nested_changes_keep_only_changed_fields() {
        let d = diff(
            json!({"stats": {"hp": 10, "mp": 5}, "name": "a"}),
            json!({"stats": {"hp": 12, "mp": 5}, "name": "a"}),
        )
        .unwrap();
        assert_eq!(d.to_json(), json!({"stats": {"hp": 12}}));
    }

    #[test]
    fn type_tag_change_forces_replacement() {
        let source = json!({"$type": "Bow", "damage": 4, "range": 10});
        let d = diff(json!({"$type": "Sword", "damage": 4, "range": 1}), source.clone()).unwrap();
        assert_eq!(d, DiffNode::Replace(node(source)));
    }

    #[test]
    fn gaining_a_type_tag_forces_replacement() {
        let d = diff(json!({"a": 1}), json!({"$type": "T", "a": 1})).unwrap();
        assert!(d.is_replacement());
    }
}
