//! Human-readable rendering of diffs.
//!
//! Output is one `path: value` line per change, depth-first, indented by
//! nesting depth. Containers get a header line and their children follow one
//! level deeper. Array markers render as `path[+]` (appended),
//! `path[+i]` (inserted before target index `i`) and `path[i]` (removed or
//! changed element `i`).

use moddiff_types::{ArrayOp, DiffNode, NodePath, PathElement};

use crate::resource::ResourceDiff;
use crate::text_table::{TextChange, TextTableDiff};

const INDENT: &str = "  ";

/// Render a diff tree.
pub fn render(diff: &DiffNode) -> String {
    let mut lines = Vec::new();
    let mut path = NodePath::root();
    write_diff(&mut lines, &mut path, diff, 0);
    lines.join("\n")
}

/// Render any resource diff.
pub fn render_resource(diff: &ResourceDiff) -> String {
    match diff {
        ResourceDiff::Object(d) | ResourceDiff::List(d) => render(d),
        ResourceDiff::TextTable(d) => render_text_table(d),
    }
}

pub fn render_text_table(diff: &TextTableDiff) -> String {
    let mut lines = Vec::new();
    for change in &diff.changes {
        match change {
            TextChange::Added { entry } => {
                lines.push(format!("{}: <added> guid={}", entry.key, entry.guid));
                for (lang, text) in &entry.text {
                    lines.push(format!("{INDENT}{}.{lang}: {text:?}", entry.key));
                }
            }
            TextChange::Removed { key } => lines.push(format!("{key}: <removed>")),
            TextChange::Modified { key, guid, text } => {
                lines.push(format!("{key}: <modified>"));
                if let Some(guid) = guid {
                    lines.push(format!("{INDENT}{key}.guid: {guid}"));
                }
                for (lang, value) in text {
                    match value {
                        Some(value) => lines.push(format!("{INDENT}{key}.{lang}: {value:?}")),
                        None => lines.push(format!("{INDENT}{key}.{lang}: <removed>")),
                    }
                }
            }
        }
    }
    lines.join("\n")
}

fn write_diff(lines: &mut Vec<String>, path: &mut NodePath, diff: &DiffNode, depth: usize) {
    let indent = INDENT.repeat(depth);
    match diff {
        DiffNode::Removal => lines.push(format!("{indent}{path}: <removed>")),
        DiffNode::Replace(node) => lines.push(format!("{indent}{path}: {}", node.to_json())),
        DiffNode::Object(object) => {
            match &object.type_tag {
                Some(tag) => lines.push(format!("{indent}{path}: object <{tag}>")),
                None => lines.push(format!("{indent}{path}: object")),
            }
            for (name, field) in &object.fields {
                path.push(PathElement::Field(name.clone()));
                write_diff(lines, path, field, depth + 1);
                path.pop();
            }
        }
        DiffNode::Array(ops) => {
            lines.push(format!("{indent}{path}: array ({} markers)", ops.len()));
            let inner = INDENT.repeat(depth + 1);
            for op in ops {
                match op {
                    ArrayOp::Added { item } => {
                        lines.push(format!("{inner}{path}[+]: {}", item.to_json()));
                    }
                    ArrayOp::Inserted { index, item } => {
                        lines.push(format!("{inner}{path}[+{index}]: {}", item.to_json()));
                    }
                    ArrayOp::Removed { index } => {
                        lines.push(format!("{inner}{path}[{index}]: <removed>"));
                    }
                    ArrayOp::Changed { index, diff } => {
                        path.push(PathElement::Index(*index));
                        write_diff(lines, path, diff, depth + 1);
                        path.pop();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_nested_paths() {
        let diff = DiffNode::from_json(&json!({
            "name": null,
            "stats": {"hp": 12},
            "items": [
                {"$t": "c", "$index": 1, "$item": {"count": 3}},
                {"$t": "r", "$index": 2},
                {"$t": "a", "$item": {"id": 7}},
            ],
        }))
        .unwrap();

        let expected = [
            "$: object",
            "  items: array (3 markers)",
            "    items[1]: object",
            "      items[1].count: 3",
            "    items[2]: <removed>",
            "    items[+]: {\"id\":7}",
            "  name: <removed>",
            "  stats: object",
            "    stats.hp: 12",
        ]
        .join("\n");
        assert_eq!(render(&diff), expected);
    }

    #[test]
    fn renders_top_level_values() {
        assert_eq!(render(&DiffNode::Removal), "$: <removed>");
        assert_eq!(
            render(&DiffNode::from_json(&json!([1, 2])).unwrap()),
            "$: [1,2]"
        );
    }

    #[test]
    fn renders_text_tables() {
        let diff = TextTableDiff {
            changes: vec![
                TextChange::Removed { key: "old".into() },
                TextChange::Modified {
                    key: "greet".into(),
                    guid: None,
                    text: [("en".to_string(), Some("Hi".to_string()))].into(),
                },
            ],
        };
        assert_eq!(
            render_text_table(&diff),
            "old: <removed>\ngreet: <modified>\n  greet.en: \"Hi\""
        );
    }
}
