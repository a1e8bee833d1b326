//! Error types for type declaration and runtime operations.
//!
//! Errors fall into two groups:
//!
//! - **Declaration errors** ([`ErrorCode::is_declaration_error`]) surface while
//!   parsing field expressions or building a [`TypeRegistry`](crate::TypeRegistry).
//!   They should halt whatever step declared the types.
//! - **Call-time errors** surface from construction, decoding and matching.
//!   They are ordinary domain errors the embedding application handles.
//!
//! # Example
//! ```rust,ignore
//! use tagged_types::{ErrorCode, TypeError};
//!
//! match point.construct([Some(1.into()), Some("2".into())]) {
//!     Err(err) => assert_eq!(err.code(), ErrorCode::ValidationRejected),
//!     Ok(_) => unreachable!(),
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::validation::Rejection;

/// Result type alias for engine operations.
pub type TypeResult<T> = Result<T, TypeError>;

/// Stable error codes, serialized as SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // Declaration errors
    /// A field-type expression could not be parsed
    MalformedFieldType,
    /// A field references a type that was never declared
    UnresolvedReference,
    /// Two definitions share a name
    DuplicateType,
    /// A definition is structurally invalid (duplicate field, empty union...)
    InvalidDefinition,
    /// A keyed collection has no usable identity field
    MissingIdField,
    /// A declarative document has the wrong shape
    InvalidDocument,

    // Call-time errors
    /// A value failed its field's rule during construction
    ValidationRejected,
    /// A match call omitted a handler for a declared variant
    ExhaustivenessViolation,
    /// The named type is not registered
    UnknownType,
    /// The named variant is not declared by the union
    UnknownVariant,
    /// The named field is not declared by the type
    UnknownField,
    /// More positional arguments than declared fields
    ArityMismatch,
    /// An instance of one type was handed to another type's operation
    TypeMismatch,
    /// Encoding or decoding a persisted shape failed
    Codec,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedFieldType => "MALFORMED_FIELD_TYPE",
            Self::UnresolvedReference => "UNRESOLVED_REFERENCE",
            Self::DuplicateType => "DUPLICATE_TYPE",
            Self::InvalidDefinition => "INVALID_DEFINITION",
            Self::MissingIdField => "MISSING_ID_FIELD",
            Self::InvalidDocument => "INVALID_DOCUMENT",
            Self::ValidationRejected => "VALIDATION_REJECTED",
            Self::ExhaustivenessViolation => "EXHAUSTIVENESS_VIOLATION",
            Self::UnknownType => "UNKNOWN_TYPE",
            Self::UnknownVariant => "UNKNOWN_VARIANT",
            Self::UnknownField => "UNKNOWN_FIELD",
            Self::ArityMismatch => "ARITY_MISMATCH",
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::Codec => "CODEC",
        }
    }

    /// Returns true for errors raised while declaring types.
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedFieldType
                | Self::UnresolvedReference
                | Self::DuplicateType
                | Self::InvalidDefinition
                | Self::MissingIdField
                | Self::InvalidDocument
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field-type expression that does not belong to the DSL grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed field type `{expression}`: {reason}")]
pub struct MalformedFieldType {
    /// The offending expression, as written (or serialized, for structured input)
    pub expression: String,
    /// Why it was rejected
    pub reason: String,
}

impl MalformedFieldType {
    /// Create a new diagnostic for `expression`.
    pub fn new(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// Every failure the engine reports.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum TypeError {
    #[error(transparent)]
    MalformedFieldType(#[from] MalformedFieldType),

    #[error("{type_name} rejected {rejection} (signature: {signature})")]
    ValidationRejected {
        type_name: String,
        signature: String,
        rejection: Rejection,
    },

    #[error("non-exhaustive match on {type_name}: no handler for variant '{variant}'")]
    ExhaustivenessViolation { type_name: String, variant: String },

    #[error("field '{field}' of {type_name} references undeclared type '{reference}'")]
    UnresolvedReference {
        type_name: String,
        field: String,
        reference: String,
    },

    #[error("type '{name}' is declared more than once")]
    DuplicateType { name: String },

    #[error("invalid definition of '{type_name}': {reason}")]
    InvalidDefinition { type_name: String, reason: String },

    #[error("no identity field '{id_field}' on '{type_name}' (required by {required_by})")]
    MissingIdField {
        type_name: String,
        id_field: String,
        required_by: String,
    },

    #[error("invalid definition document: {reason}")]
    InvalidDocument { reason: String },

    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    #[error("'{variant}' is not a variant of {type_name}")]
    UnknownVariant { type_name: String, variant: String },

    #[error("'{field}' is not a field of {type_name}")]
    UnknownField { type_name: String, field: String },

    #[error("{type_name} takes {expected} argument(s), got {got}")]
    ArityMismatch {
        type_name: String,
        expected: usize,
        got: usize,
    },

    #[error("expected an instance of {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("codec error for {type_name}: {message}")]
    Codec { type_name: String, message: String },
}

impl TypeError {
    /// The stable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedFieldType(_) => ErrorCode::MalformedFieldType,
            Self::ValidationRejected { .. } => ErrorCode::ValidationRejected,
            Self::ExhaustivenessViolation { .. } => ErrorCode::ExhaustivenessViolation,
            Self::UnresolvedReference { .. } => ErrorCode::UnresolvedReference,
            Self::DuplicateType { .. } => ErrorCode::DuplicateType,
            Self::InvalidDefinition { .. } => ErrorCode::InvalidDefinition,
            Self::MissingIdField { .. } => ErrorCode::MissingIdField,
            Self::InvalidDocument { .. } => ErrorCode::InvalidDocument,
            Self::UnknownType { .. } => ErrorCode::UnknownType,
            Self::UnknownVariant { .. } => ErrorCode::UnknownVariant,
            Self::UnknownField { .. } => ErrorCode::UnknownField,
            Self::ArityMismatch { .. } => ErrorCode::ArityMismatch,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::Codec { .. } => ErrorCode::Codec,
        }
    }

    /// The validation rejection carried by this error, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::ValidationRejected { rejection, .. } => Some(rejection),
            _ => None,
        }
    }

    pub(crate) fn invalid_definition(type_name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_document(reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            reason: reason.into(),
        }
    }

    pub(crate) fn codec(type_name: &str, message: impl Into<String>) -> Self {
        Self::Codec {
            type_name: type_name.to_string(),
            message: message.into(),
        }
    }
}
