//! Structured field-type input.
//!
//! Some callers already hold a compiled regex or a resolved named pattern
//! rather than its textual form. [`parse_reference`] turns those into IR
//! directly; [`parse_reference_value`] accepts the JSON rendering used by
//! declarative documents.

use serde_json::Value as Json;

use super::field_parser::FieldParser;
use crate::error::MalformedFieldType;
use crate::ir::{FieldRegex, FieldTypeIR, NamedPattern, PatternLibrary};

/// An already-structured field-type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldReference {
    /// Inline regex-constrained string
    Regex(FieldRegex),
    /// Shared named pattern
    Pattern(NamedPattern),
    /// Named pattern wrapped one level deeper, carrying its own optionality
    Wrapped { pattern: NamedPattern, optional: bool },
}

/// Either textual shorthand or a structured reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldExpression {
    Text(String),
    Reference(FieldReference),
}

impl FieldExpression {
    /// Normalize the expression into IR.
    pub fn parse(&self) -> Result<FieldTypeIR, MalformedFieldType> {
        match self {
            Self::Text(text) => FieldParser::parse(text),
            Self::Reference(reference) => Ok(parse_reference(reference)),
        }
    }

    /// Read a field expression from a declarative document entry: either a
    /// string in DSL shorthand or a structured reference object.
    pub fn parse_json(
        value: &Json,
        patterns: &PatternLibrary,
    ) -> Result<FieldTypeIR, MalformedFieldType> {
        match value {
            Json::String(text) => FieldParser::parse(text),
            other => parse_reference_value(other, patterns),
        }
    }
}

impl From<&str> for FieldExpression {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for FieldExpression {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<FieldReference> for FieldExpression {
    fn from(reference: FieldReference) -> Self {
        Self::Reference(reference)
    }
}

impl From<FieldRegex> for FieldExpression {
    fn from(regex: FieldRegex) -> Self {
        Self::Reference(FieldReference::Regex(regex))
    }
}

impl From<NamedPattern> for FieldExpression {
    fn from(pattern: NamedPattern) -> Self {
        Self::Reference(FieldReference::Pattern(pattern))
    }
}

/// Convert a structured reference to IR without going through text.
pub fn parse_reference(reference: &FieldReference) -> FieldTypeIR {
    match reference {
        FieldReference::Regex(regex) => FieldTypeIR::regex(regex.clone()),
        FieldReference::Pattern(pattern) => FieldTypeIR::pattern(pattern.clone()),
        FieldReference::Wrapped { pattern, optional } => {
            FieldTypeIR::pattern(pattern.clone()).with_optional(*optional)
        }
    }
}

/// Convert the JSON form of a structured reference to IR.
///
/// Accepted shapes:
///
/// - `{"regex": "src", "flags"?: "i"}`
/// - `{"pattern": "Name"}` resolved against `patterns`
/// - `{"pattern": "Name", "optional": true}`
/// - `{"pattern": {"name": "Name", "regex": "src"}, "optional"?: bool}`
pub fn parse_reference_value(
    value: &Json,
    patterns: &PatternLibrary,
) -> Result<FieldTypeIR, MalformedFieldType> {
    let serialized = value.to_string();
    let fail = |reason: String| MalformedFieldType::new(serialized.clone(), reason);

    let object = value
        .as_object()
        .ok_or_else(|| fail("expected a string or a reference object".into()))?;

    let optional = match object.get("optional") {
        None => None,
        Some(Json::Bool(flag)) => Some(*flag),
        Some(_) => return Err(fail("'optional' must be a boolean".into())),
    };

    if let Some(source) = object.get("regex") {
        if object.contains_key("pattern") || optional.is_some() {
            return Err(fail("unrecognized reference shape".into()));
        }
        let source = source
            .as_str()
            .ok_or_else(|| fail("'regex' must be a string".into()))?;
        let flags = match object.get("flags") {
            None => "",
            Some(Json::String(flags)) => flags.as_str(),
            Some(_) => return Err(fail("'flags' must be a string".into())),
        };
        let regex = FieldRegex::with_flags(source, flags).map_err(|e| fail(e.to_string()))?;
        return Ok(parse_reference(&FieldReference::Regex(regex)));
    }

    let pattern = match object.get("pattern") {
        Some(Json::String(name)) => patterns
            .get(name)
            .cloned()
            .ok_or_else(|| fail(format!("unknown named pattern '{name}'")))?,
        Some(Json::Object(inline)) => {
            let name = inline.get("name").and_then(Json::as_str);
            let source = inline.get("regex").and_then(Json::as_str);
            match (name, source) {
                (Some(name), Some(source)) => {
                    NamedPattern::compile(name, source).map_err(|e| fail(e.to_string()))?
                }
                _ => return Err(fail("inline pattern needs 'name' and 'regex'".into())),
            }
        }
        _ => return Err(fail("unrecognized reference shape".into())),
    };

    let reference = match optional {
        Some(optional) => FieldReference::Wrapped { pattern, optional },
        None => FieldReference::Pattern(pattern),
    };
    Ok(parse_reference(&reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::BaseType;
    use serde_json::json;

    fn library() -> PatternLibrary {
        let mut library = PatternLibrary::new();
        library.insert(NamedPattern::compile("AccountId", "acc_[a-f0-9]{12}").unwrap());
        library
    }

    #[test]
    fn test_regex_reference() {
        let regex = FieldRegex::new("[0-9]+").unwrap();
        let ir = parse_reference(&FieldReference::Regex(regex.clone()));
        assert_eq!(ir.base_type(), BaseType::String);
        assert_eq!(ir.regex_constraint(), Some(&regex));
        assert!(!ir.optional);
    }

    #[test]
    fn test_wrapped_reference_carries_optional() {
        let pattern = NamedPattern::compile("Zip", "[0-9]{5}").unwrap();
        let ir = parse_reference(&FieldReference::Wrapped {
            pattern,
            optional: true,
        });
        assert!(ir.optional);
        assert_eq!(ir.type_reference(), Some("Zip"));
    }

    #[test]
    fn test_structured_and_text_forms_agree() {
        let regex = FieldRegex::with_flags("usd|eur", "i").unwrap();
        let structured = FieldExpression::from(regex).parse().unwrap();
        let text = FieldExpression::from("/usd|eur/i").parse().unwrap();
        assert_eq!(structured, text);
    }

    #[test]
    fn test_json_named_pattern() {
        let ir = parse_reference_value(&json!({"pattern": "AccountId"}), &library()).unwrap();
        assert_eq!(ir.type_reference(), Some("AccountId"));
        assert!(ir.regex_constraint().unwrap().is_full_match("acc_0123456789ab"));
    }

    #[test]
    fn test_json_wrapped_pattern() {
        let ir = parse_reference_value(
            &json!({"pattern": "AccountId", "optional": true}),
            &library(),
        )
        .unwrap();
        assert!(ir.optional);

        let inline = parse_reference_value(
            &json!({"pattern": {"name": "Zip", "regex": "[0-9]{5}"}, "optional": false}),
            &PatternLibrary::new(),
        )
        .unwrap();
        assert_eq!(inline.type_reference(), Some("Zip"));
        assert!(!inline.optional);
    }

    #[test]
    fn test_json_regex_with_flags() {
        let ir = parse_reference_value(&json!({"regex": "abc", "flags": "i"}), &library()).unwrap();
        assert!(ir.regex_constraint().unwrap().is_full_match("ABC"));
    }

    #[test]
    fn test_unrecognized_shape_includes_serialized_input() {
        let err = parse_reference_value(&json!({"kind": "weird"}), &library()).unwrap_err();
        assert_eq!(err.expression, r#"{"kind":"weird"}"#);
        assert_eq!(err.reason, "unrecognized reference shape");

        let err = parse_reference_value(&json!(42), &library()).unwrap_err();
        assert_eq!(err.expression, "42");
    }

    #[test]
    fn test_unknown_named_pattern() {
        let err = parse_reference_value(&json!({"pattern": "Nope"}), &library()).unwrap_err();
        assert!(err.reason.contains("'Nope'"));
    }

    #[test]
    fn test_parse_json_accepts_text() {
        let ir = FieldExpression::parse_json(&json!("[Number]?"), &library()).unwrap();
        assert_eq!(ir.array_depth, 1);
        assert!(ir.optional);
    }
}
