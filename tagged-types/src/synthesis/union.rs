//! Closed union handles and exhaustive matching.

use serde_json::Value as Json;
use std::sync::Arc;
use tracing::{debug, trace};

use super::handlers::Handlers;
use super::{adapt_instance, construct_instance, merge_changes, positional};
use crate::error::{TypeError, TypeResult};
use crate::model::{FieldMap, TypeDefinition};
use crate::registry::TypeRegistry;
use crate::validation::{FieldPath, Rejection};
use crate::value::{AsInstance, Instance, Value};

/// Runtime surface of one declared closed union.
#[derive(Debug, Clone)]
pub struct UnionType {
    registry: Arc<TypeRegistry>,
    definition: Arc<TypeDefinition>,
    tag: Arc<str>,
}

impl UnionType {
    pub(crate) fn new(registry: Arc<TypeRegistry>, entry: &crate::registry::RegisteredType) -> Self {
        Self {
            definition: Arc::clone(entry.definition()),
            tag: Arc::clone(entry.tag()),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &TypeDefinition {
        &self.definition
    }

    /// `Name = A(..) | B(..)`
    pub fn signature(&self) -> String {
        self.definition.signature()
    }

    /// Handle for one variant.
    pub fn variant(&self, name: &str) -> TypeResult<VariantType> {
        let entry = self.registry.lookup(self.name())?;
        let (variant_tag, _) = entry.variant(name).ok_or_else(|| TypeError::UnknownVariant {
            type_name: self.name().to_string(),
            variant: name.to_string(),
        })?;

        Ok(VariantType {
            union: self.clone(),
            variant_tag: Arc::clone(variant_tag),
        })
    }

    /// Handles for every variant, in declaration order.
    pub fn variants(&self) -> Vec<VariantType> {
        self.variant_names()
            .filter_map(|name| self.variant(name).ok())
            .collect()
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.definition
            .variants()
            .into_iter()
            .flat_map(|variants| variants.keys().map(String::as_str))
    }

    /// True when `value` was built by any variant of this union.
    pub fn is(&self, value: &impl AsInstance) -> bool {
        value
            .as_instance()
            .is_some_and(|instance| Arc::ptr_eq(&self.tag, instance.type_tag()))
    }

    /// Build an instance from a shape carrying the variant key.
    pub fn from_shape(&self, shape: &Value) -> TypeResult<Instance> {
        let entry = self.registry.lookup(self.name())?;
        adapt_instance(&self.registry, entry, shape)
    }

    /// Dispatch `value` to the handler of its variant.
    ///
    /// Handlers are checked for exhaustiveness before anything else: a
    /// missing handler fails even when the value's own variant is covered.
    /// Handlers for names the union does not declare are ignored.
    pub fn match_on<R>(&self, value: &impl AsInstance, handlers: &Handlers<'_, R>) -> TypeResult<R> {
        if let Some(missing) = self.variant_names().find(|variant| !handlers.contains(variant)) {
            debug!(
                type_name = self.name(),
                variant = missing,
                "non-exhaustive match"
            );
            return Err(TypeError::ExhaustivenessViolation {
                type_name: self.name().to_string(),
                variant: missing.to_string(),
            });
        }

        let instance = self.owned(value)?;
        let variant = instance.variant().unwrap_or_default();
        let handler = handlers.get(variant).ok_or_else(|| TypeError::UnknownVariant {
            type_name: self.name().to_string(),
            variant: variant.to_string(),
        })?;

        trace!(type_name = self.name(), variant, "dispatching match");
        Ok(handler(instance))
    }

    /// A new validated instance of the same variant with some fields replaced.
    pub fn update<K, A>(&self, instance: &Instance, changes: impl IntoIterator<Item = (K, A)>) -> TypeResult<Instance>
    where
        K: Into<String>,
        A: Into<Option<Value>>,
    {
        let instance = self.owned(instance)?;
        self.variant(instance.variant().unwrap_or_default())?
            .update(instance, changes)
    }

    /// Textual form, e.g. `Shape.Circle(radius: 1)`.
    pub fn render(&self, instance: &Instance) -> TypeResult<String> {
        let instance = self.owned(instance)?;
        Ok(self.registry.render(instance))
    }

    pub fn encode(&self, instance: &Instance) -> TypeResult<Json> {
        let instance = self.owned(instance)?;
        self.registry.encode(instance)
    }

    pub fn decode(&self, shape: &Json) -> TypeResult<Instance> {
        self.registry.decode(self.name(), shape)
    }

    fn owned<'v>(&self, value: &'v impl AsInstance) -> TypeResult<&'v Instance> {
        match value.as_instance() {
            Some(instance) if self.is(instance) => Ok(instance),
            Some(instance) => Err(TypeError::TypeMismatch {
                expected: self.name().to_string(),
                actual: instance.qualified_name(),
            }),
            None => Err(TypeError::TypeMismatch {
                expected: self.name().to_string(),
                actual: "a plain value".to_string(),
            }),
        }
    }
}

/// Runtime surface of one variant of a closed union.
#[derive(Debug, Clone)]
pub struct VariantType {
    union: UnionType,
    variant_tag: Arc<str>,
}

impl VariantType {
    /// Variant name.
    pub fn name(&self) -> &str {
        &self.variant_tag
    }

    pub fn union_name(&self) -> &str {
        self.union.name()
    }

    /// `Union.Variant`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.union.name(), self.name())
    }

    /// `Union.Variant(field: Expr, ...)`
    pub fn signature(&self) -> String {
        self.union
            .definition
            .variant_signature(self.name())
            .unwrap_or_default()
    }

    /// Declared fields of this variant.
    pub fn fields(&self) -> TypeResult<&FieldMap> {
        self.union
            .definition
            .variant(self.name())
            .ok_or_else(|| TypeError::UnknownVariant {
                type_name: self.union.name().to_string(),
                variant: self.name().to_string(),
            })
    }

    /// Build an instance of this variant from positional arguments.
    pub fn construct<A>(&self, args: impl IntoIterator<Item = A>) -> TypeResult<Instance>
    where
        A: Into<Option<Value>>,
    {
        let mut named = positional(&self.qualified_name(), self.fields()?, args)?;
        construct_instance(
            &self.union.registry,
            self.union.name(),
            Some(self.name()),
            |name| named.shift_remove(name).flatten(),
        )
    }

    /// Build an instance of this variant from a named shape. The variant
    /// key, if present, is ignored like any other unknown key.
    pub fn from_shape(&self, shape: &Value) -> TypeResult<Instance> {
        let fields = match shape {
            Value::Object(map) => map,
            Value::Instance(instance) if self.is(instance) => return Ok(instance.clone()),
            Value::Instance(instance) => instance.field_map(),
            other => {
                return Err(TypeError::ValidationRejected {
                    type_name: self.qualified_name(),
                    signature: self.signature(),
                    rejection: Rejection::wrong_kind(&FieldPath::root(), "Object", other),
                })
            }
        };

        construct_instance(
            &self.union.registry,
            self.union.name(),
            Some(self.name()),
            |name| fields.get(name).cloned(),
        )
    }

    /// True only for instances built by this variant, even when another
    /// variant declares the same fields.
    pub fn is(&self, value: &impl AsInstance) -> bool {
        value.as_instance().is_some_and(|instance| {
            self.union.is(instance)
                && instance
                    .variant_tag()
                    .is_some_and(|tag| Arc::ptr_eq(tag, &self.variant_tag))
        })
    }

    /// A new validated instance of this variant with some fields replaced.
    pub fn update<K, A>(&self, instance: &Instance, changes: impl IntoIterator<Item = (K, A)>) -> TypeResult<Instance>
    where
        K: Into<String>,
        A: Into<Option<Value>>,
    {
        if !self.is(instance) {
            return Err(TypeError::TypeMismatch {
                expected: self.qualified_name(),
                actual: instance.qualified_name(),
            });
        }
        let mut merged = merge_changes(&self.qualified_name(), self.fields()?, instance, changes)?;
        construct_instance(
            &self.union.registry,
            self.union.name(),
            Some(self.name()),
            |name| merged.shift_remove(name),
        )
    }
}
