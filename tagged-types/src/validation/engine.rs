//! The validation engine.
//!
//! Validation is coercion that may fail: accepted values come back
//! normalized, with plain object shapes adapted into instances of the
//! referenced type (recursively through arrays and keyed collections).
//! Construction stores that normalized value, so every nested reference in
//! an instance is itself a validated instance.

use indexmap::IndexMap;
use tracing::trace;

use super::path::FieldPath;
use super::{Rejection, RejectionKind, ValidationResult};
use crate::format::{format_number, quote};
use crate::ir::{FieldKind, FieldTypeIR};
use crate::model::{DefinitionBody, FieldMap};
use crate::registry::{RegisteredType, TypeRegistry};
use crate::value::{AsInstance, Instance, Value};

/// Validates candidate values against field IRs of one registry.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Check `value` (`None` when absent) against `ir`.
    pub fn validate(&self, ir: &FieldTypeIR, value: Option<&Value>, path: &FieldPath) -> ValidationResult {
        match self.coerce(ir, value.cloned(), path) {
            Ok(_) => ValidationResult::ok(),
            Err(rejection) => ValidationResult::fail(rejection),
        }
    }

    /// Validate and normalize one field value.
    pub(crate) fn coerce(
        &self,
        ir: &FieldTypeIR,
        value: Option<Value>,
        path: &FieldPath,
    ) -> Result<Option<Value>, Rejection> {
        match value {
            None if ir.optional => Ok(None),
            None => Err(Rejection::missing(path, ir.describe_at_depth(ir.array_depth))),
            Some(value) => self.coerce_depth(ir, value, ir.array_depth, path).map(Some),
        }
    }

    /// Validate every declared field in declaration order; the first
    /// failing field wins. `take` hands out the candidate for a field name.
    pub(crate) fn coerce_fields(
        &self,
        fields: &FieldMap,
        mut take: impl FnMut(&str) -> Option<Value>,
        path: &FieldPath,
    ) -> Result<IndexMap<String, Value>, Rejection> {
        let mut out = IndexMap::with_capacity(fields.len());
        for (name, ir) in fields {
            if let Some(value) = self.coerce(ir, take(name), &path.field(name))? {
                out.insert(name.clone(), value);
            }
        }
        Ok(out)
    }

    /// Adapt a plain object shape into an instance of `entry`.
    ///
    /// Union shapes select their variant through the configured variant key.
    pub(crate) fn adapt_shape(
        &self,
        entry: &RegisteredType,
        mut shape: IndexMap<String, Value>,
        path: &FieldPath,
    ) -> Result<Instance, Rejection> {
        match entry.definition().body() {
            DefinitionBody::Record(fields) => {
                let fields = self.coerce_fields(fields, |name| shape.shift_remove(name), path)?;
                Ok(Instance::new(entry.tag().clone(), None, fields))
            }
            DefinitionBody::Union(variants) => {
                let key = &self.registry.config().codec.variant_key;
                let expected = variants.keys().map(String::as_str).collect::<Vec<_>>().join(" | ");
                let key_path = path.field(key);

                let unknown = |actual: String| {
                    Rejection::new(&key_path, RejectionKind::UnknownVariant, expected.clone(), actual)
                };

                let (variant_tag, fields) = match shape.shift_remove(key.as_str()) {
                    Some(Value::String(name)) => {
                        entry.variant(&name).ok_or_else(|| unknown(quote(&name)))?
                    }
                    Some(other) => return Err(unknown(other.to_string())),
                    None => return Err(Rejection::missing(&key_path, expected.clone())),
                };
                let fields = self.coerce_fields(fields, |name| shape.shift_remove(name), path)?;
                Ok(Instance::new(entry.tag().clone(), Some(variant_tag.clone()), fields))
            }
        }
    }

    fn coerce_depth(
        &self,
        ir: &FieldTypeIR,
        value: Value,
        depth: usize,
        path: &FieldPath,
    ) -> Result<Value, Rejection> {
        if depth == 0 {
            return self.coerce_scalar(ir, value, path);
        }

        match value {
            // An empty sequence has no element to violate the rule
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| self.coerce_depth(ir, item, depth - 1, &path.index(i)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Err(Rejection::wrong_kind(path, ir.describe_at_depth(depth), &other)),
        }
    }

    fn coerce_scalar(&self, ir: &FieldTypeIR, value: Value, path: &FieldPath) -> Result<Value, Rejection> {
        match &ir.kind {
            FieldKind::Tagged { type_name } => return self.coerce_tagged(type_name, value, path),
            FieldKind::Keyed {
                type_name,
                id_field,
            } => return self.coerce_keyed(type_name, id_field.as_deref(), value, path),
            _ => {}
        }

        let accepted = match (&ir.kind, &value) {
            (FieldKind::Any, _)
            | (FieldKind::String, Value::String(_))
            | (FieldKind::Number, Value::Number(_))
            | (FieldKind::Boolean, Value::Bool(_))
            | (FieldKind::Date, Value::Date(_))
            | (FieldKind::Object, Value::Object(_) | Value::Instance(_)) => true,

            (FieldKind::Regex(_) | FieldKind::Pattern(_), Value::String(s)) => {
                let matched = ir.regex_constraint().is_some_and(|re| re.is_full_match(s));
                if !matched {
                    return Err(Rejection::pattern_mismatch(path, ir.kind.to_string(), &value));
                }
                true
            }

            _ => false,
        };

        if accepted {
            Ok(value)
        } else {
            Err(Rejection::wrong_kind(path, ir.kind.to_string(), &value))
        }
    }

    /// Accept an instance carrying the type's tag, or adapt a plain shape.
    fn coerce_tagged(&self, type_name: &str, value: Value, path: &FieldPath) -> Result<Value, Rejection> {
        let entry = self.registry.entry(type_name).ok_or_else(|| {
            Rejection::new(path, RejectionKind::Unresolved, type_name, "undeclared type")
        })?;

        match value {
            Value::Instance(instance) if entry.owns(&instance) => Ok(Value::Instance(instance)),
            Value::Instance(instance) => Err(Rejection::new(
                path,
                RejectionKind::WrongType,
                type_name,
                instance.to_string(),
            )),
            Value::Object(shape) => self.adapt_shape(entry, shape, path).map(Value::Instance),
            other => Err(Rejection::wrong_kind(path, type_name, &other)),
        }
    }

    /// Every member must be an instance of `type_name` whose identity
    /// field renders to the member's key.
    fn coerce_keyed(
        &self,
        type_name: &str,
        id_field: Option<&str>,
        value: Value,
        path: &FieldPath,
    ) -> Result<Value, Rejection> {
        let expected = match id_field {
            Some(id) => format!("{{{type_name}:{id}}}"),
            None => format!("{{{type_name}}}"),
        };
        let id_field = id_field.ok_or_else(|| {
            Rejection::new(path, RejectionKind::Unresolved, expected.clone(), "no identity field")
        })?;

        let members = match value {
            Value::Object(members) => members,
            other => return Err(Rejection::wrong_kind(path, expected, &other)),
        };

        let mut out = IndexMap::with_capacity(members.len());
        for (key, member) in members {
            let member_path = path.key(&key);
            let member = self.coerce_tagged(type_name, member, &member_path)?;

            let id_text = member
                .as_instance()
                .and_then(|instance| instance.get(id_field))
                .and_then(key_text);
            if id_text.as_deref() != Some(key.as_str()) {
                return Err(Rejection::new(
                    &member_path.field(id_field),
                    RejectionKind::KeyMismatch,
                    quote(&key),
                    id_text.map_or_else(|| "absent".to_string(), |id| quote(&id)),
                ));
            }
            out.insert(key, member);
        }

        trace!(type_name, members = out.len(), "keyed collection accepted");
        Ok(Value::Object(out))
    }
}

/// Text a keyed collection files a member under: strings verbatim,
/// numbers in canonical form. Other kinds cannot be keys.
pub(crate) fn key_text(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(format_number(*n)),
        _ => None,
    }
}
