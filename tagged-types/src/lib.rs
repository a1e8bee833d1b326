//! # tagged-types
//!
//! Runtime-validated record types ("tagged") and closed discriminated unions
//! ("tagged sums") declared from compact field-type expressions.
//!
//! ## Overview
//!
//! A type is declared as a map of field names to field-type expressions.
//! Every expression is parsed into one canonical [`FieldTypeIR`]; a built
//! [`TypeRegistry`] then hands out type handles whose construction validates
//! every field before an [`Instance`] exists.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tagged_types::{Handlers, TypeRegistry, Value};
//!
//! let registry = TypeRegistry::builder()
//!     .record("Point", [("x", "Number"), ("y", "Number")])?
//!     .union("Shape", [
//!         ("Circle", vec![("radius", "Number")]),
//!         ("Square", vec![("side", "Number")]),
//!     ])?
//!     .build()?;
//!
//! let point = registry.record("Point")?;
//! let p = point.construct([Value::from(1), Value::from(2)])?;
//! assert_eq!(p.to_string(), "Point(x: 1, y: 2)");
//!
//! // Rejected: `y` is not a Number
//! assert!(point.construct([Value::from(1), Value::from("2")]).is_err());
//!
//! let shape = registry.union("Shape")?;
//! let circle = shape.variant("Circle")?.construct([Value::from(1)])?;
//! let name = shape.match_on(&circle, &Handlers::new()
//!     .on("Circle", |_| "circle")
//!     .on("Square", |_| "square"))?;
//! assert_eq!(name, "circle");
//! ```
//!
//! ## Field-Type Expressions
//!
//! | Expression | Meaning |
//! |------------|---------|
//! | `String`, `Number`, `Boolean`, `Object`, `Date`, `Any` | primitive kinds |
//! | `/^[a-z]+$/i` | string fully matching a regex (`i`, `m`, `s`, `u` flags) |
//! | `Account` | instance of another declared type, or a named pattern |
//! | `{Account:id}` | keyed collection of `Account`, keyed by `id` |
//! | `[T]`, `[[T]]` | nested sequences of `T` |
//! | `T?` | optional; an absent value is accepted |
//!
//! ## Modules
//!
//! - [`ir`]: canonical field-type representation
//! - [`parser`]: expression parsing
//! - [`model`]: type definitions and declarative documents
//! - [`registry`]: the frozen set of declared types
//! - [`validation`]: the validation engine
//! - [`synthesis`]: record and union handles
//! - [`codec`]: persistence hooks
//! - [`format`]: textual rendering

pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod ir;
pub mod model;
pub mod parser;
pub mod registry;
pub mod synthesis;
pub mod validation;
pub mod value;

pub use codec::{decode_fields, encode_fields, Codec, DefaultCodec};
pub use config::{CodecConfig, EngineConfig, FormatConfig};
pub use error::{ErrorCode, MalformedFieldType, TypeError, TypeResult};
pub use format::Formatter;
pub use ir::{BaseType, FieldKind, FieldRegex, FieldTypeIR, NamedPattern, PatternLibrary};
pub use model::{DefinitionDocument, TypeDefinition, TypeKind};
pub use parser::{parse_reference, FieldExpression, FieldParser, FieldReference};
pub use registry::{TypeRegistry, TypeRegistryBuilder};
pub use synthesis::{Handlers, RecordType, UnionType, VariantType};
pub use validation::{FieldPath, Rejection, RejectionKind, ValidationResult, Validator};
pub use value::{AsInstance, Instance, Value};
