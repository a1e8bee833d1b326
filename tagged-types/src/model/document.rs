//! Declarative definition documents.
//!
//! A document declares named patterns and types in one JSON value (TOML
//! files are converted to the same shape by the caller):
//!
//! ```json
//! {
//!   "patterns": { "AccountId": "^acc_[a-f0-9]{12}$" },
//!   "types": {
//!     "Account": { "id_field": "id", "fields": { "id": "AccountId", "name": "String" } },
//!     "Shape": { "variants": { "Circle": { "radius": "Number" }, "Square": { "side": "Number" } } }
//!   }
//! }
//! ```
//!
//! Field entries are DSL strings or structured references (see
//! [`parse_reference_value`](crate::parser::parse_reference_value)).

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use super::definition::{FieldMap, TypeDefinition};
use crate::error::{TypeError, TypeResult};
use crate::ir::{FieldRegex, NamedPattern, PatternLibrary};
use crate::parser::FieldExpression;

const TOP_LEVEL_KEYS: &[&str] = &["patterns", "types"];
const TYPE_KEYS: &[&str] = &["fields", "variants", "id_field"];

/// The parsed content of one definition document.
#[derive(Debug, Clone, Default)]
pub struct DefinitionDocument {
    /// Named patterns, in document order
    pub patterns: Vec<NamedPattern>,
    /// Type definitions, in document order
    pub definitions: Vec<TypeDefinition>,
}

impl DefinitionDocument {
    /// Parse a document. Structured pattern references may name patterns
    /// from `known` as well as the document's own.
    pub fn from_json(document: &Json, known: &PatternLibrary) -> TypeResult<Self> {
        let root = as_object(document, "document")?;
        reject_unknown_keys(root, TOP_LEVEL_KEYS, "document")?;

        let mut library = known.clone();
        let mut parsed = Self::default();

        if let Some(patterns) = root.get("patterns") {
            for (name, source) in as_object(patterns, "patterns")? {
                let pattern = parse_pattern(name, source)?;
                library.insert(pattern.clone());
                parsed.patterns.push(pattern);
            }
        }

        if let Some(types) = root.get("types") {
            for (name, body) in as_object(types, "types")? {
                parsed.definitions.push(parse_type(name, body, &library)?);
            }
        }

        Ok(parsed)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.definitions.is_empty()
    }
}

fn parse_pattern(name: &str, source: &Json) -> TypeResult<NamedPattern> {
    let location = format!("patterns.{name}");
    let (regex, flags) = match source {
        Json::String(regex) => (regex.as_str(), ""),
        Json::Object(object) => {
            reject_unknown_keys(object, &["regex", "flags"], &location)?;
            let regex = object
                .get("regex")
                .and_then(Json::as_str)
                .ok_or_else(|| TypeError::invalid_document(format!("{location}: 'regex' must be a string")))?;
            let flags = match object.get("flags") {
                None => "",
                Some(Json::String(flags)) => flags.as_str(),
                Some(_) => {
                    return Err(TypeError::invalid_document(format!(
                        "{location}: 'flags' must be a string"
                    )))
                }
            };
            (regex, flags)
        }
        _ => {
            return Err(TypeError::invalid_document(format!(
                "{location}: expected a regex string or {{\"regex\", \"flags\"}}"
            )))
        }
    };

    let regex = FieldRegex::with_flags(regex, flags)
        .map_err(|e| TypeError::invalid_document(format!("{location}: {e}")))?;
    Ok(NamedPattern::new(name, regex))
}

fn parse_type(name: &str, body: &Json, patterns: &PatternLibrary) -> TypeResult<TypeDefinition> {
    let location = format!("types.{name}");
    let body = as_object(body, &location)?;
    reject_unknown_keys(body, TYPE_KEYS, &location)?;

    let definition = match (body.get("fields"), body.get("variants")) {
        (Some(fields), None) => {
            let fields = parse_field_map(fields, &format!("{location}.fields"), patterns)?;
            TypeDefinition::record_ir(name, fields)?
        }
        (None, Some(variants)) => {
            let variants_location = format!("{location}.variants");
            let mut parsed = IndexMap::new();
            for (variant, fields) in as_object(variants, &variants_location)? {
                let fields =
                    parse_field_map(fields, &format!("{variants_location}.{variant}"), patterns)?;
                parsed.insert(variant.clone(), fields);
            }
            TypeDefinition::union_ir(name, parsed)?
        }
        _ => {
            return Err(TypeError::invalid_document(format!(
                "{location}: exactly one of 'fields' or 'variants' is required"
            )))
        }
    };

    match body.get("id_field") {
        None => Ok(definition),
        Some(Json::String(id)) => Ok(definition.with_id_field(id.as_str())),
        Some(_) => Err(TypeError::invalid_document(format!(
            "{location}.id_field: expected a string"
        ))),
    }
}

fn parse_field_map(fields: &Json, location: &str, patterns: &PatternLibrary) -> TypeResult<FieldMap> {
    let mut parsed = FieldMap::new();
    for (field, expression) in as_object(fields, location)? {
        parsed.insert(field.clone(), FieldExpression::parse_json(expression, patterns)?);
    }
    Ok(parsed)
}

fn as_object<'a>(value: &'a Json, location: &str) -> TypeResult<&'a Map<String, Json>> {
    value
        .as_object()
        .ok_or_else(|| TypeError::invalid_document(format!("{location}: expected an object")))
}

fn reject_unknown_keys(object: &Map<String, Json>, allowed: &[&str], location: &str) -> TypeResult<()> {
    match object.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(TypeError::invalid_document(format!(
            "{location}: unexpected key '{key}'"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::model::TypeKind;
    use serde_json::json;

    #[test]
    fn test_parse_full_document() {
        let doc = json!({
            "patterns": { "AccountId": "^acc_[a-f0-9]{12}$" },
            "types": {
                "Account": {
                    "id_field": "id",
                    "fields": { "id": {"pattern": "AccountId"}, "name": "String" }
                },
                "Shape": {
                    "variants": { "Circle": {"radius": "Number"}, "Square": {"side": "Number"} }
                }
            }
        });

        let parsed = DefinitionDocument::from_json(&doc, &PatternLibrary::new()).unwrap();
        assert_eq!(parsed.patterns.len(), 1);
        assert_eq!(parsed.definitions.len(), 2);

        let account = &parsed.definitions[0];
        assert_eq!(account.declared_id_field(), Some("id"));
        let id = &account.fields().unwrap()["id"];
        assert_eq!(id.type_reference(), Some("AccountId"));

        assert_eq!(parsed.definitions[1].kind(), TypeKind::Union);
    }

    #[test]
    fn test_pattern_with_flags() {
        let doc = json!({"patterns": {"Currency": {"regex": "usd|eur", "flags": "i"}}});
        let parsed = DefinitionDocument::from_json(&doc, &PatternLibrary::new()).unwrap();
        assert!(parsed.patterns[0].regex.is_full_match("EUR"));
    }

    #[test]
    fn test_both_fields_and_variants_rejected() {
        let doc = json!({"types": {"Odd": {"fields": {}, "variants": {}}}});
        let err = DefinitionDocument::from_json(&doc, &PatternLibrary::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDocument);
        assert!(err.to_string().contains("types.Odd"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let doc = json!({"typos": {}});
        let err = DefinitionDocument::from_json(&doc, &PatternLibrary::new()).unwrap_err();
        assert!(err.to_string().contains("unexpected key 'typos'"));
    }

    #[test]
    fn test_malformed_expression_propagates() {
        let doc = json!({"types": {"Grid": {"fields": {"cells": "[[Number]"}}}});
        let err = DefinitionDocument::from_json(&doc, &PatternLibrary::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedFieldType);
    }
}
