//! Record type handles.

use serde_json::Value as Json;
use std::sync::Arc;

use super::{adapt_instance, construct_instance, merge_changes, positional};
use crate::error::{TypeError, TypeResult};
use crate::model::{FieldMap, TypeDefinition};
use crate::registry::{RegisteredType, TypeRegistry};
use crate::value::{AsInstance, Instance, Value};

/// Runtime surface of one declared record type.
///
/// ```rust,ignore
/// let point = registry.record("Point")?;
/// let p = point.construct([Value::from(1), Value::from(2)])?;
/// assert!(point.is(&p));
/// assert_eq!(point.render(&p)?, "Point(x: 1, y: 2)");
/// ```
#[derive(Debug, Clone)]
pub struct RecordType {
    registry: Arc<TypeRegistry>,
    definition: Arc<TypeDefinition>,
    tag: Arc<str>,
}

impl RecordType {
    pub(crate) fn new(registry: Arc<TypeRegistry>, entry: &RegisteredType) -> Self {
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

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// `Name(field: Expr, ...)`
    pub fn signature(&self) -> String {
        self.definition.signature()
    }

    /// Build an instance from positional arguments in declaration order.
    ///
    /// Missing trailing arguments are absent; each argument may be a
    /// [`Value`] or an `Option<Value>` (`None` for an absent optional).
    pub fn construct<A>(&self, args: impl IntoIterator<Item = A>) -> TypeResult<Instance>
    where
        A: Into<Option<Value>>,
    {
        let mut named = positional(self.name(), self.fields()?, args)?;
        construct_instance(&self.registry, self.name(), None, |name| {
            named.shift_remove(name).flatten()
        })
    }

    /// Build an instance from a named shape, reading declared fields by
    /// name and ignoring unknown keys.
    pub fn from_shape(&self, shape: &Value) -> TypeResult<Instance> {
        adapt_instance(&self.registry, self.entry()?, shape)
    }

    /// True when `value` was built by this type.
    pub fn is(&self, value: &impl AsInstance) -> bool {
        value
            .as_instance()
            .is_some_and(|instance| Arc::ptr_eq(&self.tag, instance.type_tag()))
    }

    /// A new validated instance with some fields replaced. `None` clears an
    /// optional field.
    pub fn update<K, A>(&self, instance: &Instance, changes: impl IntoIterator<Item = (K, A)>) -> TypeResult<Instance>
    where
        K: Into<String>,
        A: Into<Option<Value>>,
    {
        self.check_owned(instance)?;
        let mut merged = merge_changes(self.name(), self.fields()?, instance, changes)?;
        construct_instance(&self.registry, self.name(), None, |name| merged.shift_remove(name))
    }

    /// Textual form, e.g. `Point(x: 1, y: 2)`.
    pub fn render(&self, instance: &Instance) -> TypeResult<String> {
        self.check_owned(instance)?;
        Ok(self.registry.render(instance))
    }

    pub fn encode(&self, instance: &Instance) -> TypeResult<Json> {
        self.check_owned(instance)?;
        self.registry.encode(instance)
    }

    pub fn decode(&self, shape: &Json) -> TypeResult<Instance> {
        self.registry.decode(self.name(), shape)
    }

    fn fields(&self) -> TypeResult<&FieldMap> {
        self.definition.fields().ok_or_else(|| TypeError::TypeMismatch {
            expected: format!("record {}", self.name()),
            actual: format!("union {}", self.name()),
        })
    }

    fn entry(&self) -> TypeResult<&RegisteredType> {
        self.registry.lookup(self.name())
    }

    fn check_owned(&self, instance: &Instance) -> TypeResult<()> {
        if self.is(instance) {
            Ok(())
        } else {
            Err(TypeError::TypeMismatch {
                expected: self.name().to_string(),
                actual: instance.qualified_name(),
            })
        }
    }
}
