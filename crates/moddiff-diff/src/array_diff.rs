//! Array diff: positional splice of object arrays, all-or-nothing for the
//! rest.
//!
//! Object arrays are compared by position. The longest matching prefix
//! (head) and suffix (tail) are skipped, then one of three splices is
//! recorded:
//!
//! - **Shrink**: every source element is matched, so the unmatched middle of
//!   the target is removed.
//! - **Grow**: every target element is matched, so the unmatched middle of the
//!   source is appended (no tail) or inserted before the tail.
//! - **Rewrite**: overlapping positions past the head are changed in place,
//!   then the surplus target elements are removed or the surplus source
//!   elements appended.
//!
//! Marker indices refer to positions in the target array. Elements carry no
//! stable identity, so a moved element is a removal plus an addition.

use moddiff_types::{ArrayNode, ArrayOp, DiffNode, Node};
use tracing::{debug, trace};

use crate::node_diff::diff_nodes;

/// Compute the change that turns the `target` array into `source`.
///
/// The element-type tag is authoritative, like an object's `$type`. Arrays
/// whose tags differ, including a tagged array against an untagged one, are
/// replaced whole even when their items are equal. Splicing the items alone
/// would leave the target's tag in place after patching.
pub fn diff_arrays(target: &ArrayNode, source: &ArrayNode) -> Option<DiffNode> {
    if target.element_type != source.element_type {
        debug!(
            from = ?target.element_type,
            to = ?source.element_type,
            "array element type changed; replacing array"
        );
        return Some(replace(source));
    }

    diff_items(&target.items, &source.items, || replace(source))
}

/// Compute the change that turns a bare `target` list into `source`.
///
/// Same rules as [`diff_arrays`] for lists that carry no element type.
pub fn diff_lists(target: &[Node], source: &[Node]) -> Option<DiffNode> {
    diff_items(target, source, || {
        DiffNode::Replace(Node::Array(ArrayNode::new(source.to_vec())))
    })
}

fn diff_items(t: &[Node], s: &[Node], replace: impl FnOnce() -> DiffNode) -> Option<DiffNode> {
    if t.is_empty() {
        return (!s.is_empty()).then(replace);
    }
    if !all_objects(t) || !all_objects(s) {
        return (t != s).then(replace);
    }

    let ops = splice(t, s);
    (!ops.is_empty()).then_some(DiffNode::Array(ops))
}

fn replace(source: &ArrayNode) -> DiffNode {
    DiffNode::Replace(Node::Array(source.clone()))
}

fn all_objects(items: &[Node]) -> bool {
    items.iter().all(|item| matches!(item, Node::Object(_)))
}

fn same_element(target: &Node, source: &Node) -> bool {
    diff_nodes(target, source).is_none()
}

fn splice(t: &[Node], s: &[Node]) -> Vec<ArrayOp> {
    let (n, m) = (t.len(), s.len());
    let shortest = n.min(m);

    let head = (0..shortest).take_while(|&i| same_element(&t[i], &s[i])).count();
    let tail = (0..shortest - head)
        .take_while(|&j| same_element(&t[n - 1 - j], &s[m - 1 - j]))
        .count();

    let mut ops = Vec::new();

    if head + tail == m {
        debug!(head, tail, removed = n - m, "array shrink");
        ops.extend((head..n - tail).map(|index| ArrayOp::Removed { index }));
    } else if head + tail == n {
        debug!(head, tail, added = m - n, "array grow");
        ops.extend(s[head..m - tail].iter().map(|item| {
            if tail == 0 {
                ArrayOp::Added { item: item.clone() }
            } else {
                ArrayOp::Inserted {
                    index: head,
                    item: item.clone(),
                }
            }
        }));
    } else {
        debug!(head, tail, target_len = n, source_len = m, "array rewrite");
        for index in head..shortest {
            if let Some(diff) = diff_nodes(&t[index], &s[index]) {
                ops.push(ArrayOp::Changed { index, diff });
            }
        }
        if n > m {
            ops.extend((m..n).map(|index| ArrayOp::Removed { index }));
        } else {
            ops.extend(s[n..].iter().map(|item| ArrayOp::Added { item: item.clone() }));
        }
    }

    for op in &ops {
        trace!(tag = %op.tag(), index = ?op.index(), "array marker");
    }
    ops
}
