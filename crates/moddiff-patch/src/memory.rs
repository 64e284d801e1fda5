//! In-memory registries.
//!
//! [`InMemoryRegistry`] holds class descriptors in a `BTreeMap`, either
//! registered in code or loaded from a JSON schema document.
//! [`SchemalessRegistry`] declares nothing and treats every field as
//! dynamic, which is what plain JSON trees need.

use std::collections::{BTreeMap, BTreeSet};

use moddiff_types::{Node, ObjectNode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PatchError, PatchResult};
use crate::registry::{DescriptorRegistry, FieldKind, DYNAMIC};

/// One class: its fields, their defaults, and an optional parent class whose
/// fields it inherits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldKind>,
    /// Per-field defaults overriding [`FieldKind::default_value`].
    #[serde(default)]
    pub defaults: BTreeMap<String, Node>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    pub fn default_for(mut self, name: impl Into<String>, value: impl Into<Node>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }
}

#[derive(Deserialize)]
struct SchemaDocument {
    classes: Vec<ClassDescriptor>,
}

/// A registry of explicitly declared classes.
///
/// Untyped objects (no class) resolve every field as dynamic. A typed object
/// resolves only the fields its class or one of its ancestors declares.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRegistry {
    classes: BTreeMap<String, ClassDescriptor>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, returning the descriptor it replaced.
    pub fn register(&mut self, class: ClassDescriptor) -> Option<ClassDescriptor> {
        self.classes.insert(class.name.clone(), class)
    }

    pub fn with_class(mut self, class: ClassDescriptor) -> Self {
        self.register(class);
        self
    }

    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Load and validate a schema document of the form
    /// `{"classes": [{"name": ..., "parent": ..., "fields": {...}}]}`.
    pub fn from_json_str(text: &str) -> PatchResult<Self> {
        let doc: SchemaDocument =
            serde_json::from_str(text).map_err(|e| PatchError::Schema(e.to_string()))?;
        let mut registry = Self::new();
        for class in doc.classes {
            if let Some(previous) = registry.register(class) {
                return Err(PatchError::Schema(format!(
                    "class {} is declared twice",
                    previous.name
                )));
            }
        }
        registry.validate()?;
        debug!(classes = registry.len(), "loaded class schema");
        Ok(registry)
    }

    /// Check that every parent exists and no inheritance chain loops.
    pub fn validate(&self) -> PatchResult<()> {
        for class in self.classes.values() {
            let mut seen = BTreeSet::new();
            let mut current = Some(class);
            while let Some(c) = current {
                if !seen.insert(c.name.as_str()) {
                    return Err(PatchError::Schema(format!(
                        "inheritance cycle through {}",
                        c.name
                    )));
                }
                current = match &c.parent {
                    Some(parent) => Some(self.classes.get(parent).ok_or_else(|| {
                        PatchError::Schema(format!(
                            "{} extends unknown class {parent}",
                            c.name
                        ))
                    })?),
                    None => None,
                };
            }
        }
        Ok(())
    }

    /// The class and its ancestors, most derived first. Stops at a missing
    /// parent and never visits more classes than are registered.
    fn lineage<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a ClassDescriptor> + 'a {
        let first = self.classes.get(name);
        std::iter::successors(first, move |c| {
            c.parent.as_deref().and_then(|p| self.classes.get(p))
        })
        .take(self.classes.len())
    }
}

impl DescriptorRegistry for InMemoryRegistry {
    fn resolve_field(&self, class: Option<&str>, field: &str) -> Option<&FieldKind> {
        match class {
            None => Some(&DYNAMIC),
            Some(class) => self.lineage(class).find_map(|c| c.fields.get(field)),
        }
    }

    fn default_instance(&self, class: &str) -> PatchResult<Node> {
        let chain: Vec<&ClassDescriptor> = self.lineage(class).collect();
        if chain.is_empty() {
            return Err(PatchError::UnknownClass(class.to_string()));
        }

        let mut object = ObjectNode::typed(class);
        for descriptor in chain.iter().rev() {
            for (name, kind) in &descriptor.fields {
                let value = descriptor
                    .defaults
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| kind.default_value());
                object.insert(name.clone(), value);
            }
        }
        Ok(Node::Object(object))
    }
}

/// A registry that declares nothing: every field is dynamic and every class
/// starts out as an empty object carrying its type tag.
#[derive(Clone, Copy, Debug, Default)]
pub struct SchemalessRegistry;

impl DescriptorRegistry for SchemalessRegistry {
    fn resolve_field(&self, _class: Option<&str>, _field: &str) -> Option<&FieldKind> {
        Some(&DYNAMIC)
    }

    fn default_instance(&self, class: &str) -> PatchResult<Node> {
        Ok(Node::Object(ObjectNode::typed(class)))
    }
}
