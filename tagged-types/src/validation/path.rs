//! Locations inside a candidate value, for diagnostics.

use std::fmt;

use crate::format::quote;

/// One step from a container into a child value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Declared field of an instance or shape
    Field(String),
    /// Position in a sequence
    Index(usize),
    /// Key in a keyed collection
    Key(String),
}

/// Path from the value under construction to a nested value.
///
/// Renders as `items[2].owner` or `accounts["acc_1"].balance`; the empty
/// path renders as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn field(&self, name: &str) -> Self {
        self.child(PathSegment::Field(name.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    pub fn key(&self, key: &str) -> Self {
        self.child(PathSegment::Key(key.to_string()))
    }

    /// `other` appended below `self`.
    pub fn join(&self, other: &FieldPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend_from_slice(&other.segments);
        Self { segments }
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) => write!(f, "[{}]", quote(key))?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(FieldPath::root().to_string(), "<root>");
        assert!(FieldPath::root().is_root());
    }

    #[test]
    fn test_nested_display() {
        let path = FieldPath::root().field("items").index(2).field("owner");
        assert_eq!(path.to_string(), "items[2].owner");

        let keyed = FieldPath::root().field("accounts").key("acc_1").field("balance");
        assert_eq!(keyed.to_string(), r#"accounts["acc_1"].balance"#);
    }

    #[test]
    fn test_child_does_not_mutate_parent() {
        let parent = FieldPath::root().field("a");
        let _child = parent.index(0);
        assert_eq!(parent.segments().len(), 1);
    }
}
