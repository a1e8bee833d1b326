//! Intermediate Representation (IR) module.
//!
//! This module defines the canonical, parsed form of field-type expressions.
//! The parser produces it, type definitions store it, and the validation
//! engine and codec consume it.

pub mod field_type;
pub mod pattern;

pub use field_type::{BaseType, FieldKind, FieldTypeIR};
pub use pattern::{FieldRegex, NamedPattern, PatternError, PatternLibrary};
