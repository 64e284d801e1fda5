//! Locations inside a tree, rendered as `items[2].stats.hp`.

use std::fmt;

/// One step from a node to one of its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathElement {
    Field(String),
    Index(usize),
}

/// A path from the root of a tree. The empty path is the root itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<PathElement>);

impl NodePath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, element: PathElement) {
        self.0.push(element);
    }

    pub fn pop(&mut self) -> Option<PathElement> {
        self.0.pop()
    }

    /// A copy of this path extended by a field step.
    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.push(PathElement::Field(name.into()));
        child
    }

    /// A copy of this path extended by an index step.
    pub fn index(&self, index: usize) -> Self {
        let mut child = self.clone();
        child.push(PathElement::Index(index));
        child
    }
}

impl FromIterator<PathElement> for NodePath {
    fn from_iter<I: IntoIterator<Item = PathElement>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$");
        }
        for (i, element) in self.0.iter().enumerate() {
            match element {
                PathElement::Field(name) if i > 0 => write!(f, ".{name}")?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_as_dollar() {
        assert_eq!(NodePath::root().to_string(), "$");
    }

    #[test]
    fn mixed_path_rendering() {
        let path = NodePath::root().field("items").index(2).field("stats").field("hp");
        assert_eq!(path.to_string(), "items[2].stats.hp");
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn push_and_pop() {
        let mut path = NodePath::root();
        path.push(PathElement::Index(0));
        assert_eq!(path.to_string(), "[0]");
        assert_eq!(path.pop(), Some(PathElement::Index(0)));
        assert!(path.is_root());
    }
}
