//! Persistence codec.
//!
//! A [`Codec`] turns instances into JSON shapes and back. The default
//! behaviour copies every declared field; a type can override it by
//! registering its own codec on the
//! [`TypeRegistryBuilder`](crate::TypeRegistryBuilder). Nested instances
//! always go back through the registry, so an override applies wherever
//! its type appears.
//!
//! Decoding never bypasses validation: the decoded fields are handed to
//! the same construction path positional arguments use.
//!
//! # Example
//!
//! ```rust,ignore
//! struct Versioned;
//!
//! impl Codec for Versioned {
//!     fn encode(&self, registry: &TypeRegistry, instance: &Instance) -> TypeResult<Json> {
//!         let mut shape = encode_fields(registry, instance)?;
//!         shape["version"] = 2.into();
//!         Ok(shape)
//!     }
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as Json};

use crate::error::{TypeError, TypeResult};
use crate::format::quote;
use crate::ir::{FieldKind, FieldTypeIR};
use crate::model::{FieldMap, TypeDefinition};
use crate::registry::TypeRegistry;
use crate::synthesis::construct_instance;
use crate::validation::engine::key_text;
use crate::validation::{FieldPath, Rejection, RejectionKind};
use crate::value::{Instance, Value};

/// Encoding and decoding hooks for one type.
pub trait Codec: Send + Sync {
    /// Encode an instance into a persistence shape.
    fn encode(&self, registry: &TypeRegistry, instance: &Instance) -> TypeResult<Json> {
        encode_fields(registry, instance)
    }

    /// Decode a persistence shape into a validated instance of `type_name`.
    fn decode(&self, registry: &TypeRegistry, type_name: &str, shape: &Json) -> TypeResult<Instance> {
        decode_fields(registry, type_name, shape)
    }
}

/// Copies every declared field.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCodec;

impl Codec for DefaultCodec {}

/// Encode all present fields of `instance` in declaration order. Union
/// instances get the configured variant key first.
pub fn encode_fields(registry: &TypeRegistry, instance: &Instance) -> TypeResult<Json> {
    let type_name = instance.type_name();
    let fields = declared_fields(registry, type_name, instance.variant())?;

    let mut shape = Map::new();
    if let Some(variant) = instance.variant() {
        shape.insert(
            registry.config().codec.variant_key.clone(),
            Json::String(variant.to_string()),
        );
    }

    for (name, ir) in fields {
        if let Some(value) = instance.get(name) {
            let encoded = encode_field(registry, type_name, name, ir, value, ir.array_depth)?;
            shape.insert(name.clone(), encoded);
        }
    }
    Ok(Json::Object(shape))
}

/// Decode declared fields from `shape` and construct an instance.
pub fn decode_fields(registry: &TypeRegistry, type_name: &str, shape: &Json) -> TypeResult<Instance> {
    let object = shape
        .as_object()
        .ok_or_else(|| TypeError::codec(type_name, format!("expected a JSON object, got {shape}")))?;
    let config = &registry.config().codec;

    let definition = registry.lookup(type_name)?.definition();
    let variant = match definition.variants() {
        None => None,
        Some(_) => {
            let variant = object
                .get(&config.variant_key)
                .and_then(Json::as_str)
                .ok_or_else(|| {
                    TypeError::codec(type_name, format!("missing variant key '{}'", config.variant_key))
                })?;
            Some(variant)
        }
    };
    let fields = declared_fields(registry, type_name, variant)?;

    let mut decoded = IndexMap::with_capacity(fields.len());
    for (name, ir) in fields {
        match object.get(name) {
            None => {}
            // A required `Any` field may legitimately hold null
            Some(Json::Null) if config.null_as_absent && ir.optional => {}
            Some(raw) => {
                let path = FieldPath::root().field(name);
                let value = decode_field(registry, ir, raw, ir.array_depth, &path)
                    .map_err(|e| reattribute(e, definition, variant))?;
                decoded.insert(name.clone(), value);
            }
        }
    }

    construct_instance(registry, type_name, variant, |name| decoded.shift_remove(name))
}

fn declared_fields<'r>(
    registry: &'r TypeRegistry,
    type_name: &str,
    variant: Option<&str>,
) -> TypeResult<&'r FieldMap> {
    let definition = registry.lookup(type_name)?.definition();
    match (variant, definition.fields()) {
        (None, Some(fields)) => Ok(fields),
        (Some(variant), None) => definition.variant(variant).ok_or_else(|| TypeError::UnknownVariant {
            type_name: type_name.to_string(),
            variant: variant.to_string(),
        }),
        (None, None) => Err(TypeError::codec(type_name, "union instance without a variant")),
        (Some(variant), Some(_)) => Err(TypeError::codec(
            type_name,
            format!("record instance carries variant '{variant}'"),
        )),
    }
}

fn encode_field(
    registry: &TypeRegistry,
    owner: &str,
    field: &str,
    ir: &FieldTypeIR,
    value: &Value,
    depth: usize,
) -> TypeResult<Json> {
    match (value, &ir.kind) {
        (Value::Array(items), _) if depth > 0 => items
            .iter()
            .map(|item| encode_field(registry, owner, field, ir, item, depth - 1))
            .collect::<TypeResult<Vec<_>>>()
            .map(Json::Array),
        // Keyed members persist as a list; keys are derived again on decode
        (Value::Object(members), FieldKind::Keyed { .. }) if depth == 0 => members
            .values()
            .map(|member| encode_value(registry, owner, member))
            .collect::<TypeResult<Vec<_>>>()
            .map(Json::Array),
        (_, FieldKind::Any | FieldKind::Object) => encode_untyped(registry, owner, field, value),
        _ => encode_value(registry, owner, value),
    }
}

/// Untyped content persists as plain JSON. A date or an instance in it
/// would decode as a string or a plain object, so neither is encoded.
fn encode_untyped(registry: &TypeRegistry, owner: &str, field: &str, value: &Value) -> TypeResult<Json> {
    match value {
        Value::Date(_) | Value::Instance(_) => Err(TypeError::codec(
            owner,
            format!(
                "field '{field}' holds a {} inside an untyped value, which cannot be decoded back",
                value.kind_name()
            ),
        )),
        Value::Array(items) => items
            .iter()
            .map(|item| encode_untyped(registry, owner, field, item))
            .collect::<TypeResult<Vec<_>>>()
            .map(Json::Array),
        Value::Object(map) => {
            let mut object = Map::new();
            for (key, item) in map {
                object.insert(key.clone(), encode_untyped(registry, owner, field, item)?);
            }
            Ok(Json::Object(object))
        }
        other => encode_value(registry, owner, other),
    }
}

/// Encode a value with no field type guidance.
fn encode_value(registry: &TypeRegistry, owner: &str, value: &Value) -> TypeResult<Json> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => encode_number(owner, *n)?,
        Value::String(s) => Json::String(s.clone()),
        Value::Date(d) => Json::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        Value::Array(items) => Json::Array(
            items
                .iter()
                .map(|item| encode_value(registry, owner, item))
                .collect::<TypeResult<_>>()?,
        ),
        Value::Object(map) => {
            let mut object = Map::new();
            for (key, item) in map {
                object.insert(key.clone(), encode_value(registry, owner, item)?);
            }
            Json::Object(object)
        }
        Value::Instance(instance) => registry.encode(instance)?,
    })
}

/// Integral numbers encode as JSON integers.
fn encode_number(owner: &str, n: f64) -> TypeResult<Json> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    if n.fract() == 0.0 && n.abs() <= MAX_EXACT {
        return Ok(Json::from(n as i64));
    }
    Number::from_f64(n)
        .map(Json::Number)
        .ok_or_else(|| TypeError::codec(owner, format!("cannot encode non-finite number {n}")))
}

fn decode_field(
    registry: &TypeRegistry,
    ir: &FieldTypeIR,
    raw: &Json,
    depth: usize,
    path: &FieldPath,
) -> TypeResult<Value> {
    if depth > 0 {
        return match raw {
            Json::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    values.push(decode_field(registry, ir, item, depth - 1, &path.index(i))?);
                }
                Ok(Value::Array(values))
            }
            // Let validation report the wrong kind
            other => Ok(Value::from_json(other)),
        };
    }

    match (&ir.kind, raw) {
        (FieldKind::Date, Json::String(text)) => Ok(DateTime::parse_from_rfc3339(text)
            .map(|date| Value::Date(date.with_timezone(&Utc)))
            .unwrap_or_else(|_| Value::String(text.clone()))),

        (FieldKind::Tagged { type_name }, Json::Object(_)) => {
            decode_nested(registry, type_name, raw, path).map(Value::Instance)
        }

        (FieldKind::Keyed { type_name, id_field }, Json::Array(members)) => {
            let id_field = id_field.as_deref().unwrap_or(crate::registry::DEFAULT_ID_FIELD);
            let mut keyed = IndexMap::with_capacity(members.len());
            for (i, member) in members.iter().enumerate() {
                let instance = decode_nested(registry, type_name, member, &path.index(i))?;
                let key = instance.get(id_field).and_then(key_text).ok_or_else(|| {
                    TypeError::codec(
                        type_name,
                        format!("member has no usable '{id_field}' to key it by"),
                    )
                })?;
                if keyed.contains_key(&key) {
                    return Err(duplicate_key(registry, type_name, &path.index(i).field(id_field), &key));
                }
                keyed.insert(key, Value::Instance(instance));
            }
            Ok(Value::Object(keyed))
        }

        (FieldKind::Keyed { type_name, .. }, Json::Object(members)) => {
            let mut keyed = IndexMap::with_capacity(members.len());
            for (key, member) in members {
                let instance = decode_nested(registry, type_name, member, &path.key(key))?;
                keyed.insert(key.clone(), Value::Instance(instance));
            }
            Ok(Value::Object(keyed))
        }

        (_, other) => Ok(Value::from_json(other)),
    }
}

/// Decode a nested instance; a rejection inside it is moved under `path`.
fn decode_nested(
    registry: &TypeRegistry,
    type_name: &str,
    raw: &Json,
    path: &FieldPath,
) -> TypeResult<Instance> {
    registry.decode(type_name, raw).map_err(|e| match e {
        TypeError::ValidationRejected {
            type_name,
            signature,
            mut rejection,
        } => {
            rejection.path = path.join(&rejection.path);
            TypeError::ValidationRejected {
                type_name,
                signature,
                rejection,
            }
        }
        other => other,
    })
}

/// Two persisted members share a key; keeping either would drop the other.
fn duplicate_key(registry: &TypeRegistry, type_name: &str, path: &FieldPath, key: &str) -> TypeError {
    TypeError::ValidationRejected {
        type_name: type_name.to_string(),
        signature: registry
            .definition(type_name)
            .map(TypeDefinition::signature)
            .unwrap_or_default(),
        rejection: Rejection::new(path, RejectionKind::KeyMismatch, "a unique key", quote(key)),
    }
}

/// Report a nested rejection against the type being decoded.
fn reattribute(error: TypeError, definition: &TypeDefinition, variant: Option<&str>) -> TypeError {
    match error {
        TypeError::ValidationRejected { rejection, .. } => {
            let (type_name, signature) = match variant {
                Some(variant) => (
                    format!("{}.{variant}", definition.name()),
                    definition.variant_signature(variant).unwrap_or_default(),
                ),
                None => (definition.name().to_string(), definition.signature()),
            };
            TypeError::ValidationRejected {
                type_name,
                signature,
                rejection,
            }
        }
        other => other,
    }
}
