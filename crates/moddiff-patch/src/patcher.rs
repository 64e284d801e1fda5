//! [`DiffPatcher`]: apply a [`DiffNode`] to a live tree.
//!
//! Patching walks the diff and the target together. At every slot the
//! registry says what the slot holds, and the slot's kind decides what a
//! removal or replacement means there:
//!
//! | slot kind   | removal                  | replacement                      |
//! |-------------|--------------------------|----------------------------------|
//! | object      | null                     | fresh instance, then filled in   |
//! | array       | emptied                  | cleared and repopulated          |
//! | text        | kept (or null if config) | the new text                     |
//! | primitive   | zero                     | converted to the declared type   |
//! | dynamic     | null                     | the value as given               |
//!
//! Array markers are applied in order. Their indices refer to the target as
//! it was before patching, so a running offset tracks how far earlier
//! insertions and removals have shifted the list.

use moddiff_types::{
    ArrayNode, ArrayOp, DiffNode, Node, NodePath, ObjectDiff, ObjectNode, PathElement,
    PrimitiveType,
};
use tracing::{debug, trace};

use crate::config::PatchConfig;
use crate::error::{PatchError, PatchResult};
use crate::registry::{DescriptorRegistry, FieldKind};

/// Applies diffs using the class metadata in a [`DescriptorRegistry`].
#[derive(Debug)]
pub struct DiffPatcher<'r, R: ?Sized> {
    registry: &'r R,
    config: PatchConfig,
}

impl<'r, R: DescriptorRegistry + ?Sized> DiffPatcher<'r, R> {
    pub fn new(registry: &'r R) -> Self {
        Self::with_config(registry, PatchConfig::default())
    }

    pub fn with_config(registry: &'r R, config: PatchConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Apply `diff` to a whole tree in place.
    ///
    /// `class` is the declared type of the root, used when the root must be
    /// rebuilt from scratch. With no class the root is treated as dynamic.
    pub fn apply(
        &self,
        target: &mut Node,
        diff: &DiffNode,
        class: Option<&str>,
    ) -> PatchResult<()> {
        let kind = match class {
            Some(class) => FieldKind::object(class),
            None => FieldKind::Dynamic,
        };
        let mut path = NodePath::root();
        self.apply_slot(target, diff, &kind, &mut path)
    }

    /// Apply an object diff to `instance`.
    ///
    /// If the diff carries a type tag different from the instance's, the
    /// instance is first replaced by a default instance of the diff's type.
    /// Fields the class does not declare are skipped, or rejected under
    /// [`PatchConfig::strict_fields`].
    pub fn apply_object_diff(
        &self,
        instance: &mut Node,
        diff: &ObjectDiff,
        class: Option<&str>,
    ) -> PatchResult<()> {
        let mut path = NodePath::root();
        self.patch_object(instance, diff, class, &mut path)
    }

    /// Apply an array diff to `list`, whose elements are of kind `element`.
    pub fn apply_array_diff(
        &self,
        list: &mut Vec<Node>,
        diff: &DiffNode,
        element: &FieldKind,
    ) -> PatchResult<()> {
        let mut path = NodePath::root();
        self.patch_list(list, diff, element, &mut path)
    }

    /// Build a fresh value of kind `kind` from a raw node.
    pub fn materialize(&self, raw: &Node, kind: &FieldKind) -> PatchResult<Node> {
        let mut path = NodePath::root();
        self.materialize_at(raw, kind, &mut path)
    }

    fn apply_slot(
        &self,
        slot: &mut Node,
        diff: &DiffNode,
        kind: &FieldKind,
        path: &mut NodePath,
    ) -> PatchResult<()> {
        match kind {
            FieldKind::Dynamic => self.patch_dynamic(slot, diff, path),
            FieldKind::Object { class } => {
                self.patch_object_slot(slot, diff, class.as_deref(), path)
            }
            FieldKind::Array { element } => self.patch_array_slot(slot, diff, element, path),
            FieldKind::Text => self.patch_text(slot, diff, path),
            FieldKind::Primitive { primitive } => {
                self.patch_primitive(slot, diff, *primitive, path)
            }
        }
    }

    fn patch_dynamic(
        &self,
        slot: &mut Node,
        diff: &DiffNode,
        path: &mut NodePath,
    ) -> PatchResult<()> {
        match diff {
            DiffNode::Removal => *slot = Node::Null,
            DiffNode::Replace(value) => *slot = value.clone(),
            DiffNode::Object(object) => self.patch_object(slot, object, None, path)?,
            DiffNode::Array(ops) => {
                let found = slot.kind();
                let Node::Array(array) = slot else {
                    return Err(mismatch(path, "array", found));
                };
                self.patch_markers(&mut array.items, ops, &FieldKind::Dynamic, path)?;
            }
        }
        Ok(())
    }

    fn patch_object_slot(
        &self,
        slot: &mut Node,
        diff: &DiffNode,
        class: Option<&str>,
        path: &mut NodePath,
    ) -> PatchResult<()> {
        match diff {
            DiffNode::Removal | DiffNode::Replace(Node::Null) => *slot = Node::Null,
            DiffNode::Replace(value @ Node::Object(_)) => {
                *slot = self.materialize_object(value, class, path)?;
            }
            DiffNode::Replace(other) => return Err(mismatch(path, "object", other.kind())),
            DiffNode::Object(object) => self.patch_object(slot, object, class, path)?,
            DiffNode::Array(_) => return Err(mismatch(path, "object", "array markers")),
        }
        Ok(())
    }

    fn patch_object(
        &self,
        instance: &mut Node,
        diff: &ObjectDiff,
        declared: Option<&str>,
        path: &mut NodePath,
    ) -> PatchResult<()> {
        let reset = match (&*instance, &diff.type_tag) {
            (Node::Object(current), Some(tag)) => current.type_tag.as_deref() != Some(tag.as_str()),
            (Node::Object(_), None) => false,
            _ => true,
        };
        if reset {
            let class = diff.type_tag.as_deref().or(declared);
            debug!(
                path = %path,
                from = ?instance.type_tag(),
                to = ?class,
                "constructing default instance"
            );
            *instance = self.construct(class)?;
        }

        let found = instance.kind();
        let Node::Object(object) = instance else {
            return Err(mismatch(path, "object", found));
        };
        let class = object
            .type_tag
            .clone()
            .or_else(|| declared.map(str::to_owned));

        for (name, field_diff) in &diff.fields {
            let Some(kind) = self.registry.resolve_field(class.as_deref(), name) else {
                if self.config.strict_fields {
                    return Err(PatchError::UnknownField {
                        class: class.clone().unwrap_or_default(),
                        field: name.clone(),
                        path: path.clone(),
                    });
                }
                debug!(path = %path, class = ?class, field = %name, "skipping undeclared field");
                continue;
            };

            path.push(PathElement::Field(name.clone()));
            let slot = object.fields.entry(name.clone()).or_insert(Node::Null);
            self.apply_slot(slot, field_diff, kind, path)?;
            path.pop();
        }
        Ok(())
    }

    fn patch_array_slot(
        &self,
        slot: &mut Node,
        diff: &DiffNode,
        element: &FieldKind,
        path: &mut NodePath,
    ) -> PatchResult<()> {
        if let DiffNode::Replace(Node::Array(source)) = diff {
            let mut items = Vec::with_capacity(source.items.len());
            self.repopulate(&mut items, &source.items, element, path)?;
            *slot = Node::Array(ArrayNode {
                element_type: source.element_type.clone(),
                items,
            });
            return Ok(());
        }

        if slot.is_null() {
            *slot = Node::Array(ArrayNode::default());
        }
        let found = slot.kind();
        let Node::Array(array) = slot else {
            return Err(mismatch(path, "array", found));
        };
        self.patch_list(&mut array.items, diff, element, path)
    }

    fn patch_list(
        &self,
        list: &mut Vec<Node>,
        diff: &DiffNode,
        element: &FieldKind,
        path: &mut NodePath,
    ) -> PatchResult<()> {
        match diff {
            DiffNode::Removal | DiffNode::Replace(Node::Null) => list.clear(),
            DiffNode::Replace(Node::Array(source)) => {
                self.repopulate(list, &source.items, element, path)?;
            }
            DiffNode::Replace(other) => return Err(mismatch(path, "array", other.kind())),
            DiffNode::Array(ops) => self.patch_markers(list, ops, element, path)?,
            DiffNode::Object(_) => return Err(mismatch(path, "array", "object diff")),
        }
        Ok(())
    }

    fn repopulate(
        &self,
        list: &mut Vec<Node>,
        source: &[Node],
        element: &FieldKind,
        path: &mut NodePath,
    ) -> PatchResult<()> {
        list.clear();
        for (index, item) in source.iter().enumerate() {
            path.push(PathElement::Index(index));
            list.push(self.materialize_at(item, element, path)?);
            path.pop();
        }
        Ok(())
    }

    fn patch_markers(
        &self,
        list: &mut Vec<Node>,
        ops: &[ArrayOp],
        element: &FieldKind,
        path: &mut NodePath,
    ) -> PatchResult<()> {
        let mut offset: isize = 0;
        for op in ops {
            trace!(path = %path, tag = %op.tag(), index = ?op.index(), offset, "applying marker");
            match op {
                ArrayOp::Added { item } => {
                    path.push(PathElement::Index(list.len()));
                    let value = self.materialize_at(item, element, path)?;
                    path.pop();
                    list.push(value);
                }
                ArrayOp::Changed { index, diff } => {
                    let at = position(*index, offset, list.len(), path)?;
                    path.push(PathElement::Index(at));
                    self.apply_slot(&mut list[at], diff, element, path)?;
                    path.pop();
                }
                ArrayOp::Inserted { index, item } => {
                    let at = position(*index, offset, list.len() + 1, path)?;
                    path.push(PathElement::Index(at));
                    let value = self.materialize_at(item, element, path)?;
                    path.pop();
                    list.insert(at, value);
                    offset += 1;
                }
                ArrayOp::Removed { index } => {
                    let at = position(*index, offset, list.len(), path)?;
                    list.remove(at);
                    offset -= 1;
                }
            }
        }
        Ok(())
    }

    fn patch_text(&self, slot: &mut Node, diff: &DiffNode, path: &mut NodePath) -> PatchResult<()> {
        match diff {
            DiffNode::Removal | DiffNode::Replace(Node::Null) => {
                if self.config.clear_removed_text {
                    *slot = Node::Null;
                } else {
                    trace!(path = %path, "keeping text on removal");
                }
            }
            DiffNode::Replace(value) => *slot = text_value(value, path)?,
            DiffNode::Object(_) => return Err(mismatch(path, "text", "object diff")),
            DiffNode::Array(_) => return Err(mismatch(path, "text", "array markers")),
        }
        Ok(())
    }

    fn patch_primitive(
        &self,
        slot: &mut Node,
        diff: &DiffNode,
        primitive: PrimitiveType,
        path: &mut NodePath,
    ) -> PatchResult<()> {
        match diff {
            DiffNode::Removal => *slot = primitive.zero(),
            DiffNode::Replace(raw) => *slot = self.convert(primitive, raw, path)?,
            DiffNode::Object(_) => return Err(mismatch(path, "primitive", "object diff")),
            DiffNode::Array(_) => return Err(mismatch(path, "primitive", "array markers")),
        }
        Ok(())
    }

    fn materialize_at(
        &self,
        raw: &Node,
        kind: &FieldKind,
        path: &mut NodePath,
    ) -> PatchResult<Node> {
        match kind {
            FieldKind::Dynamic => Ok(raw.clone()),
            FieldKind::Object { .. } if raw.is_null() => Ok(Node::Null),
            FieldKind::Object { class } => self.materialize_object(raw, class.as_deref(), path),
            FieldKind::Array { element } => match raw {
                Node::Null => Ok(Node::Null),
                Node::Array(source) => {
                    let mut items = Vec::with_capacity(source.items.len());
                    self.repopulate(&mut items, &source.items, element, path)?;
                    Ok(Node::Array(ArrayNode {
                        element_type: source.element_type.clone(),
                        items,
                    }))
                }
                other => Err(mismatch(path, "array", other.kind())),
            },
            FieldKind::Text => text_value(raw, path),
            FieldKind::Primitive { primitive } => self.convert(*primitive, raw, path),
        }
    }

    /// A fresh instance of the value's own type (or `class` when untagged),
    /// with every field of `raw` patched in.
    fn materialize_object(
        &self,
        raw: &Node,
        class: Option<&str>,
        path: &mut NodePath,
    ) -> PatchResult<Node> {
        let Node::Object(source) = raw else {
            return Err(mismatch(path, "object", raw.kind()));
        };
        let mut instance = self.construct(source.type_tag.as_deref().or(class))?;
        self.patch_object(&mut instance, &ObjectDiff::from_node(source), class, path)?;
        Ok(instance)
    }

    fn construct(&self, class: Option<&str>) -> PatchResult<Node> {
        match class {
            Some(class) => self.registry.default_instance(class),
            None => Ok(Node::Object(ObjectNode::new())),
        }
    }

    fn convert(&self, primitive: PrimitiveType, raw: &Node, path: &NodePath) -> PatchResult<Node> {
        self.registry
            .convert(primitive, raw)
            .map_err(|source| PatchError::Conversion {
                path: path.clone(),
                source,
            })
    }
}

fn position(index: usize, offset: isize, bound: usize, path: &NodePath) -> PatchResult<usize> {
    isize::try_from(index)
        .ok()
        .and_then(|i| i.checked_add(offset))
        .and_then(|at| usize::try_from(at).ok())
        .filter(|&at| at < bound)
        .ok_or_else(|| PatchError::IndexOutOfRange {
            path: path.clone(),
            index,
            offset,
            len: bound,
        })
}

fn text_value(raw: &Node, path: &NodePath) -> PatchResult<Node> {
    match raw {
        Node::Null | Node::String(_) => Ok(raw.clone()),
        Node::Bool(b) => Ok(Node::String(b.to_string())),
        Node::Number(n) => Ok(Node::String(n.to_string())),
        other => Err(mismatch(path, "text", other.kind())),
    }
}

fn mismatch(path: &NodePath, expected: &'static str, found: impl ToString) -> PatchError {
    PatchError::ShapeMismatch {
        path: path.clone(),
        expected,
        found: found.to_string(),
    }
}
