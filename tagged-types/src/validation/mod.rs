//! Field validation.
//!
//! The [`Validator`] decides, for one field IR and one candidate value,
//! whether the value is accepted. On failure it reports a single
//! [`Rejection`]: the first failing location in declaration order, with the
//! expected shape and a rendering of what was found instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use tagged_types::validation::{FieldPath, Validator};
//!
//! let validator = Validator::new(&registry);
//! let ir = tagged_types::parser::parse("[[Number]]")?;
//! let result = validator.validate(&ir, Some(&candidate), &FieldPath::root());
//! if let Some(rejection) = result.rejection() {
//!     println!("{rejection}"); // at [1][0]: expected Number, got "x"
//! }
//! ```

pub mod engine;
pub mod path;

pub use engine::Validator;
pub use path::{FieldPath, PathSegment};

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

use crate::value::Value;

/// Why a value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// Required value is absent
    Missing,
    /// Value has the wrong representation kind
    WrongKind,
    /// String does not fully match the field's pattern
    PatternMismatch,
    /// Instance of a different declared type
    WrongType,
    /// Keyed-collection key disagrees with the member's identity field
    KeyMismatch,
    /// Union shape names no declared variant
    UnknownVariant,
    /// Referenced type is not in the registry
    Unresolved,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::WrongKind => "wrong_kind",
            Self::PatternMismatch => "pattern_mismatch",
            Self::WrongType => "wrong_type",
            Self::KeyMismatch => "key_mismatch",
            Self::UnknownVariant => "unknown_variant",
            Self::Unresolved => "unresolved",
        }
    }
}

/// The first failing location of a candidate value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Where the failing value sits
    pub path: FieldPath,
    /// Failure category
    pub kind: RejectionKind,
    /// Expected shape, as canonical field-type text
    pub expected: String,
    /// Rendering of the value found (`absent` when missing)
    pub actual: String,
}

impl Rejection {
    pub fn new(
        path: &FieldPath,
        kind: RejectionKind,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            path: path.clone(),
            kind,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// A required value is absent.
    pub fn missing(path: &FieldPath, expected: impl Into<String>) -> Self {
        Self::new(path, RejectionKind::Missing, expected, "absent")
    }

    /// `found` is not of the expected representation kind.
    pub fn wrong_kind(path: &FieldPath, expected: impl Into<String>, found: &Value) -> Self {
        Self::new(path, RejectionKind::WrongKind, expected, found.to_string())
    }

    /// `found` does not fully match the expected pattern.
    pub fn pattern_mismatch(path: &FieldPath, expected: impl Into<String>, found: &Value) -> Self {
        Self::new(path, RejectionKind::PatternMismatch, expected, found.to_string())
    }

    /// The field name of the outermost failing field, if any.
    pub fn field(&self) -> Option<&str> {
        match self.path.segments().first() {
            Some(PathSegment::Field(name)) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RejectionKind::Missing => write!(
                f,
                "at {}: missing required value (expected {})",
                self.path, self.expected
            ),
            _ => write!(
                f,
                "at {}: expected {}, got {}",
                self.path, self.expected, self.actual
            ),
        }
    }
}

/// Outcome of validating one value against one field IR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Accepted,
    Rejected(Rejection),
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn ok() -> Self {
        trace!("validation passed");
        Self::Accepted
    }

    /// Create a failed validation result
    pub fn fail(rejection: Rejection) -> Self {
        debug!(
            path = %rejection.path,
            kind = rejection.kind.as_str(),
            "validation failed"
        );
        Self::Rejected(rejection)
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Accepted => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }

    /// Convert to a `Result` for `?` chaining.
    pub fn into_result(self) -> Result<(), Rejection> {
        match self {
            Self::Accepted => Ok(()),
            Self::Rejected(rejection) => Err(rejection),
        }
    }
}
