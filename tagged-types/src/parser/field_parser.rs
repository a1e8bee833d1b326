//! Textual field-type expression parsing.
//!
//! Recognition order, each step stripping its marker before the next runs:
//!
//! 1. trailing `?` marks the field optional
//! 2. `{TypeName:keyField}` / `{TypeName}` is a keyed collection
//! 3. `[ ... ]` pairs are stripped, one array level each
//! 4. `/pattern/flags` is a regex-constrained string
//! 5. `String`, `Number`, `Boolean`, `Object`, `Date`, `Any` keywords
//! 6. anything else names another declared type

use crate::error::MalformedFieldType;
use crate::ir::{BaseType, FieldKind, FieldRegex, FieldTypeIR};

const OPTIONAL_MARKER: char = '?';

/// Parses textual field-type expressions into IR.
pub struct FieldParser;

impl FieldParser {
    /// Parse a field-type expression.
    pub fn parse(expression: &str) -> Result<FieldTypeIR, MalformedFieldType> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(MalformedFieldType::new(expression, "empty expression"));
        }

        let (body, optional) = match trimmed.strip_suffix(OPTIONAL_MARKER) {
            Some(rest) => (rest.trim_end(), true),
            None => (trimmed, false),
        };
        if body.is_empty() {
            return Err(MalformedFieldType::new(
                expression,
                "optional marker without a type",
            ));
        }

        let ir = match Self::keyed_body(body) {
            Some(inner) => Self::parse_keyed(expression, inner)?,
            None => Self::parse_nested(expression, body)?,
        };

        Ok(ir.with_optional(optional).with_original(trimmed))
    }

    fn keyed_body(body: &str) -> Option<&str> {
        body.strip_prefix('{')?.strip_suffix('}')
    }

    /// Parse the inside of `{TypeName:keyField}`.
    fn parse_keyed(expression: &str, inner: &str) -> Result<FieldTypeIR, MalformedFieldType> {
        let (type_name, id_field) = match inner.split_once(':') {
            Some((name, key)) => (name.trim(), Some(key.trim())),
            None => (inner.trim(), None),
        };

        if !is_identifier(type_name) {
            return Err(MalformedFieldType::new(
                expression,
                format!("keyed collection needs a type name, got '{type_name}'"),
            ));
        }
        if let Some(key) = id_field {
            if !is_identifier(key) {
                return Err(MalformedFieldType::new(
                    expression,
                    format!("keyed collection needs a key field name, got '{key}'"),
                ));
            }
        }

        Ok(FieldTypeIR::keyed(type_name, id_field.map(str::to_string)))
    }

    /// Strip array brackets, then parse the depth-0 remainder.
    fn parse_nested(expression: &str, body: &str) -> Result<FieldTypeIR, MalformedFieldType> {
        let mut rest = body;
        let mut depth = 0;

        while let Some(inner) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            rest = inner.trim();
            depth += 1;
        }

        if rest.is_empty() {
            return Err(MalformedFieldType::new(expression, "empty array element type"));
        }
        if rest.starts_with('[') || rest.ends_with(']') {
            return Err(MalformedFieldType::new(
                expression,
                "unbalanced array brackets",
            ));
        }
        if rest.starts_with('{') || rest.ends_with('}') {
            return Err(MalformedFieldType::new(
                expression,
                "keyed collections cannot be nested in arrays",
            ));
        }
        if rest.ends_with(OPTIONAL_MARKER) {
            return Err(MalformedFieldType::new(
                expression,
                "optional marker must be the last character of the expression",
            ));
        }

        let kind = Self::parse_core(expression, rest)?;
        Ok(FieldTypeIR::new(kind).with_array_depth(depth))
    }

    /// Regex literal, primitive keyword, or type name.
    fn parse_core(expression: &str, core: &str) -> Result<FieldKind, MalformedFieldType> {
        if let Some(literal) = core.strip_prefix('/') {
            return Self::parse_regex_literal(expression, literal).map(FieldKind::Regex);
        }

        if let Some(base) = BaseType::from_keyword(core) {
            if let Some(kind) = FieldKind::primitive(base) {
                return Ok(kind);
            }
        }

        if is_identifier(core) {
            return Ok(FieldKind::Tagged {
                type_name: core.to_string(),
            });
        }

        Err(MalformedFieldType::new(
            expression,
            format!("'{core}' is neither a primitive, a regex literal nor a type name"),
        ))
    }

    /// Parse `pattern/flags` (the opening slash already consumed).
    fn parse_regex_literal(
        expression: &str,
        literal: &str,
    ) -> Result<FieldRegex, MalformedFieldType> {
        let close = literal
            .rfind('/')
            .ok_or_else(|| MalformedFieldType::new(expression, "unterminated regex literal"))?;

        let (source, flags) = (&literal[..close], &literal[close + 1..]);
        if source.is_empty() {
            return Err(MalformedFieldType::new(expression, "empty regex literal"));
        }

        FieldRegex::with_flags(source, flags)
            .map_err(|e| MalformedFieldType::new(expression, e.to_string()))
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
