//! Dynamic values.
//!
//! Candidate data handed to construction, the fields of an [`Instance`] and
//! decoded persistence shapes are all expressed as [`Value`]. Absence is not
//! a value: an absent field is `None` at the call site, which is distinct
//! from a present [`Value::Null`].

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;

use crate::format::Formatter;

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    Instance(Instance),
}

impl Value {
    /// Short name of the representation kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Boolean",
            Self::Number(_) => "Number",
            Self::String(_) => "String",
            Self::Date(_) => "Date",
            Self::Array(_) => "Array",
            Self::Object(_) => "Object",
            Self::Instance(_) => "Instance",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Build an object value from key/value pairs, keeping their order.
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Plain conversion from JSON. Strings stay strings; dates are only
    /// recognized by the codec, where the field type asks for one.
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(*b),
            Json::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Json::String(s) => Self::String(s.clone()),
            Json::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Json::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Formatter::default().render_value(self))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self::Object(map)
    }
}

impl From<&Json> for Value {
    fn from(json: &Json) -> Self {
        Self::from_json(json)
    }
}

/// An immutable, validated value of a declared type.
///
/// The type tag (and, for unions, the variant tag) are struct members, not
/// fields: they never show up in [`Instance::fields`]. Instances are only
/// created by the type handles in [`crate::synthesis`], so every instance
/// has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    type_tag: Arc<str>,
    variant_tag: Option<Arc<str>>,
    fields: IndexMap<String, Value>,
}

impl Instance {
    pub(crate) fn new(
        type_tag: Arc<str>,
        variant_tag: Option<Arc<str>>,
        fields: IndexMap<String, Value>,
    ) -> Self {
        Self {
            type_tag,
            variant_tag,
            fields,
        }
    }

    /// Name of the type this instance belongs to.
    pub fn type_name(&self) -> &str {
        &self.type_tag
    }

    /// Variant name, for union instances.
    pub fn variant(&self) -> Option<&str> {
        self.variant_tag.as_deref()
    }

    /// `Type` for records, `Union.Variant` for union instances.
    pub fn qualified_name(&self) -> String {
        match &self.variant_tag {
            Some(variant) => format!("{}.{}", self.type_tag, variant),
            None => self.type_tag.to_string(),
        }
    }

    /// Read a field. Absent optional fields return `None`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Present fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn type_tag(&self) -> &Arc<str> {
        &self.type_tag
    }

    pub(crate) fn variant_tag(&self) -> Option<&Arc<str>> {
        self.variant_tag.as_ref()
    }

    pub(crate) fn field_map(&self) -> &IndexMap<String, Value> {
        &self.fields
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<(&str, &Value)> = self.fields().collect();
        f.write_str(&Formatter::default().render(&self.qualified_name(), &fields))
    }
}

/// Anything an identity check or match can look inside.
pub trait AsInstance {
    fn as_instance(&self) -> Option<&Instance>;
}

impl AsInstance for Instance {
    fn as_instance(&self) -> Option<&Instance> {
        Some(self)
    }
}

impl AsInstance for Value {
    fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }
}

impl<T: AsInstance> AsInstance for Option<T> {
    fn as_instance(&self) -> Option<&Instance> {
        self.as_ref().and_then(AsInstance::as_instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_order() {
        let value = Value::from_json(&json!({"b": 1, "a": [true, null, "x"]}));
        let map = value.as_object().unwrap();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(
            map["a"],
            Value::Array(vec![Value::Bool(true), Value::Null, Value::from("x")])
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::from(1).kind_name(), "Number");
        assert_eq!(Value::from("x").kind_name(), "String");
        assert_eq!(Value::Null.kind_name(), "Null");
    }

    #[test]
    fn test_instance_tags_are_not_fields() {
        let mut fields = IndexMap::new();
        fields.insert("radius".to_string(), Value::from(1));
        let instance = Instance::new(Arc::from("Shape"), Some(Arc::from("Circle")), fields);

        assert_eq!(instance.qualified_name(), "Shape.Circle");
        assert_eq!(instance.field_names().collect::<Vec<_>>(), vec!["radius"]);
        assert!(!instance.contains("type"));
        assert_eq!(instance.to_string(), "Shape.Circle(radius: 1)");
    }

    #[test]
    fn test_as_instance() {
        let instance = Instance::new(Arc::from("Unit"), None, IndexMap::new());
        assert!(Value::from(instance.clone()).as_instance().is_some());
        assert!(Value::Null.as_instance().is_none());
        assert!(Some(instance).as_instance().is_some());
    }
}
