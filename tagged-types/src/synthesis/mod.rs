//! Type handles.
//!
//! A [`RecordType`] or [`UnionType`] is obtained from a built
//! [`TypeRegistry`] and offers the runtime surface of one declared type:
//! construction, identity checks, shape adaptation, updates, rendering,
//! persistence and (for unions) exhaustive matching.
//!
//! Every path that produces an [`Instance`] goes through
//! [`construct_instance`] or [`adapt_instance`], so no partially validated
//! instance can exist.

pub mod handlers;
pub mod record;
pub mod union;

pub use handlers::Handlers;
pub use record::RecordType;
pub use union::{UnionType, VariantType};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{TypeError, TypeResult};
use crate::model::FieldMap;
use crate::registry::{RegisteredType, TypeRegistry};
use crate::validation::{FieldPath, Rejection};
use crate::value::{Instance, Value};

/// Validate the fields handed out by `take` and build an instance of
/// `type_name` (or of one of its variants).
pub(crate) fn construct_instance(
    registry: &TypeRegistry,
    type_name: &str,
    variant: Option<&str>,
    take: impl FnMut(&str) -> Option<Value>,
) -> TypeResult<Instance> {
    let entry = registry.lookup(type_name)?;
    let definition = entry.definition();

    let (variant_tag, fields, signature) = match variant {
        None => {
            let fields = definition.fields().ok_or_else(|| TypeError::TypeMismatch {
                expected: format!("a variant of {type_name}"),
                actual: "no variant".to_string(),
            })?;
            (None, fields, definition.signature())
        }
        Some(variant) => {
            let (tag, fields) = entry.variant(variant).ok_or_else(|| TypeError::UnknownVariant {
                type_name: type_name.to_string(),
                variant: variant.to_string(),
            })?;
            let signature = definition.variant_signature(variant).unwrap_or_default();
            (Some(tag.clone()), fields, signature)
        }
    };

    let qualified = match variant {
        Some(variant) => format!("{type_name}.{variant}"),
        None => type_name.to_string(),
    };

    let fields = registry
        .validator()
        .coerce_fields(fields, take, &FieldPath::root())
        .map_err(|rejection| rejected(&qualified, signature, rejection))?;

    Ok(Instance::new(entry.tag().clone(), variant_tag, fields))
}

/// Adapt a plain object shape (or an instance read by field name) into an
/// instance of `entry`.
pub(crate) fn adapt_instance(
    registry: &TypeRegistry,
    entry: &RegisteredType,
    shape: &Value,
) -> TypeResult<Instance> {
    let definition = entry.definition();
    let map = match shape {
        Value::Object(map) => map.clone(),
        Value::Instance(instance) if entry.owns(instance) => return Ok(instance.clone()),
        Value::Instance(instance) => instance.field_map().clone(),
        other => {
            let rejection = Rejection::wrong_kind(&FieldPath::root(), "Object", other);
            return Err(rejected(definition.name(), definition.signature(), rejection));
        }
    };

    registry
        .validator()
        .adapt_shape(entry, map, &FieldPath::root())
        .map_err(|rejection| rejected(definition.name(), definition.signature(), rejection))
}

/// Pair positional arguments with declared field names.
pub(crate) fn positional<A>(
    type_name: &str,
    declared: &FieldMap,
    args: impl IntoIterator<Item = A>,
) -> TypeResult<IndexMap<String, Option<Value>>>
where
    A: Into<Option<Value>>,
{
    let expected = declared.len();
    let args: Vec<Option<Value>> = args.into_iter().map(Into::into).collect();
    if args.len() > expected {
        return Err(TypeError::ArityMismatch {
            type_name: type_name.to_string(),
            expected,
            got: args.len(),
        });
    }

    let mut args = args.into_iter();
    Ok(declared
        .keys()
        .map(|name| (name.clone(), args.next().flatten()))
        .collect())
}

/// Merge `changes` over the present fields of `instance`, rejecting names
/// the shape does not declare.
pub(crate) fn merge_changes<K, A>(
    type_name: &str,
    declared: &FieldMap,
    instance: &Instance,
    changes: impl IntoIterator<Item = (K, A)>,
) -> TypeResult<IndexMap<String, Value>>
where
    K: Into<String>,
    A: Into<Option<Value>>,
{
    let mut merged = instance.field_map().clone();
    for (field, value) in changes {
        let field: String = field.into();
        if !declared.contains_key(&field) {
            return Err(TypeError::UnknownField {
                type_name: type_name.to_string(),
                field,
            });
        }
        match value.into() {
            Some(value) => merged.insert(field, value),
            None => merged.shift_remove(&field),
        };
    }
    Ok(merged)
}

fn rejected(type_name: &str, signature: String, rejection: Rejection) -> TypeError {
    debug!(
        type_name,
        path = %rejection.path,
        kind = rejection.kind.as_str(),
        "construction rejected"
    );
    TypeError::ValidationRejected {
        type_name: type_name.to_string(),
        signature,
        rejection,
    }
}
