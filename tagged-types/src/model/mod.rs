//! Type-definition model.

pub mod definition;
pub mod document;

pub use definition::{DefinitionBody, FieldMap, TypeDefinition, TypeKind};
pub use document::DefinitionDocument;
