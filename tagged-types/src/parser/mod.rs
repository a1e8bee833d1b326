//! Field-type expression parsing.
//!
//! Turns textual shorthand (`[Number]?`, `/^[a-z]+$/i`, `{Account:id}`) and
//! structured references into [`FieldTypeIR`](crate::ir::FieldTypeIR).

pub mod field_parser;
pub mod reference_parser;

pub use field_parser::FieldParser;
pub use reference_parser::{
    parse_reference, parse_reference_value, FieldExpression, FieldReference,
};

pub(crate) use field_parser::is_identifier;

/// Parse a textual field-type expression.
pub fn parse(expression: &str) -> Result<crate::ir::FieldTypeIR, crate::error::MalformedFieldType> {
    FieldParser::parse(expression)
}
