//! Field type IR definitions.
//!
//! A [`FieldTypeIR`] is the canonical, parsed form of one field's type
//! constraint. The acceptance rule lives in a single [`FieldKind`]; the
//! `optional` flag and `array_depth` are orthogonal modifiers applied on top
//! of it, so an IR can never carry two competing rules.

use std::fmt;

use super::pattern::{FieldRegex, NamedPattern};

/// The representation family a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    String,
    Number,
    Boolean,
    Object,
    Date,
    Any,
    TaggedReference,
    KeyedCollection,
}

impl BaseType {
    /// The DSL keyword for primitive base types.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Self::String => Some("String"),
            Self::Number => Some("Number"),
            Self::Boolean => Some("Boolean"),
            Self::Object => Some("Object"),
            Self::Date => Some("Date"),
            Self::Any => Some("Any"),
            Self::TaggedReference | Self::KeyedCollection => None,
        }
    }

    /// Look a primitive keyword up.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "String" => Some(Self::String),
            "Number" => Some(Self::Number),
            "Boolean" => Some(Self::Boolean),
            "Object" => Some(Self::Object),
            "Date" => Some(Self::Date),
            "Any" => Some(Self::Any),
            _ => None,
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaggedReference => f.write_str("TaggedReference"),
            Self::KeyedCollection => f.write_str("KeyedCollection"),
            other => f.write_str(other.keyword().unwrap_or_default()),
        }
    }
}

/// The single rule deciding whether a scalar value is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    // ==========================================================================
    // Primitives
    // ==========================================================================
    String,
    Number,
    Boolean,
    Object,
    Date,
    Any,

    // ==========================================================================
    // Constrained strings
    // ==========================================================================
    /// String that must fully match an inline regex
    Regex(FieldRegex),

    /// String that must fully match a shared named pattern
    Pattern(NamedPattern),

    // ==========================================================================
    // References
    // ==========================================================================
    /// Instance of another declared type
    Tagged { type_name: String },

    /// Collection of instances of another type, keyed by `id_field`.
    ///
    /// `id_field` is `None` until the registry derives it from the
    /// referenced type's identity field.
    Keyed {
        type_name: String,
        id_field: Option<String>,
    },
}

impl FieldKind {
    /// The base type this rule belongs to.
    pub fn base_type(&self) -> BaseType {
        match self {
            Self::String | Self::Regex(_) | Self::Pattern(_) => BaseType::String,
            Self::Number => BaseType::Number,
            Self::Boolean => BaseType::Boolean,
            Self::Object => BaseType::Object,
            Self::Date => BaseType::Date,
            Self::Any => BaseType::Any,
            Self::Tagged { .. } => BaseType::TaggedReference,
            Self::Keyed { .. } => BaseType::KeyedCollection,
        }
    }

    /// Primitive kind for a base type, when it has one.
    pub fn primitive(base: BaseType) -> Option<Self> {
        match base {
            BaseType::String => Some(Self::String),
            BaseType::Number => Some(Self::Number),
            BaseType::Boolean => Some(Self::Boolean),
            BaseType::Object => Some(Self::Object),
            BaseType::Date => Some(Self::Date),
            BaseType::Any => Some(Self::Any),
            BaseType::TaggedReference | BaseType::KeyedCollection => None,
        }
    }

    /// Check if this is a primitive rule.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Number | Self::Boolean | Self::Object | Self::Date | Self::Any
        )
    }

    /// Check if this rule points at another declared type.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Tagged { .. } | Self::Keyed { .. })
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(regex) => write!(f, "{regex}"),
            // Named patterns have no textual form; they render as their regex
            Self::Pattern(pattern) => write!(f, "{}", pattern.regex),
            Self::Tagged { type_name } => f.write_str(type_name),
            Self::Keyed {
                type_name,
                id_field: Some(id),
            } => write!(f, "{{{type_name}:{id}}}"),
            Self::Keyed {
                type_name,
                id_field: None,
            } => write!(f, "{{{type_name}}}"),
            primitive => write!(f, "{}", primitive.base_type()),
        }
    }
}

/// Canonical description of one field's required shape.
#[derive(Debug, Clone)]
pub struct FieldTypeIR {
    /// The acceptance rule for scalar values
    pub kind: FieldKind,

    /// Whether an absent value is accepted
    pub optional: bool,

    /// Sequence nesting depth; 0 means scalar
    pub array_depth: usize,

    /// The expression this IR was parsed from (for diagnostics)
    pub original: Option<String>,
}

impl FieldTypeIR {
    /// Create a required scalar IR with the given kind.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            optional: false,
            array_depth: 0,
            original: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    /// String field constrained by an inline regex.
    pub fn regex(regex: FieldRegex) -> Self {
        Self::new(FieldKind::Regex(regex))
    }

    /// String field constrained by a named pattern.
    pub fn pattern(pattern: NamedPattern) -> Self {
        Self::new(FieldKind::Pattern(pattern))
    }

    /// Reference to another declared type.
    pub fn tagged(type_name: impl Into<String>) -> Self {
        Self::new(FieldKind::Tagged {
            type_name: type_name.into(),
        })
    }

    /// Keyed collection of another declared type.
    pub fn keyed(type_name: impl Into<String>, id_field: Option<String>) -> Self {
        Self::new(FieldKind::Keyed {
            type_name: type_name.into(),
            id_field,
        })
    }

    /// Set the optional flag.
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Set the array nesting depth.
    pub fn with_array_depth(mut self, depth: usize) -> Self {
        self.array_depth = depth;
        self
    }

    /// Record the expression this IR came from.
    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original = Some(original.into());
        self
    }

    pub fn base_type(&self) -> BaseType {
        self.kind.base_type()
    }

    /// The regex a string value must match, inline or from a named pattern.
    pub fn regex_constraint(&self) -> Option<&FieldRegex> {
        match &self.kind {
            FieldKind::Regex(regex) => Some(regex),
            FieldKind::Pattern(pattern) => Some(&pattern.regex),
            _ => None,
        }
    }

    /// Name of the shared pattern this field refers to.
    pub fn type_reference(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Pattern(pattern) => Some(&pattern.name),
            _ => None,
        }
    }

    /// Name of the declared type this field refers to.
    pub fn tagged_type(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Tagged { type_name } | FieldKind::Keyed { type_name, .. } => {
                Some(type_name)
            }
            _ => None,
        }
    }

    /// Key field of a keyed collection, once known.
    pub fn id_field(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Keyed { id_field, .. } => id_field.as_deref(),
            _ => None,
        }
    }

    /// Canonical text of the shape expected at `depth` levels of nesting,
    /// without the optional marker.
    pub fn describe_at_depth(&self, depth: usize) -> String {
        format!("{}{}{}", "[".repeat(depth), self.kind, "]".repeat(depth))
    }
}

/// Two IRs are equal when they describe the same rule; the source
/// expression is ignored.
impl PartialEq for FieldTypeIR {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.optional == other.optional
            && self.array_depth == other.array_depth
    }
}

impl Eq for FieldTypeIR {}

/// Renders canonical DSL text, e.g. `[[Number]]?` or `{Account:id}`.
impl fmt::Display for FieldTypeIR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe_at_depth(self.array_depth))?;
        if self.optional {
            f.write_str("?")?;
        }
        Ok(())
    }
}
