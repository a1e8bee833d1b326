//! Type registry for declared definitions and named patterns.
//!
//! Types are declared on a [`TypeRegistryBuilder`]. [`TypeRegistryBuilder::build`]
//! resolves every cross-type reference once, after all declarations are
//! known, so the order in which types are declared never matters. The
//! resulting [`TypeRegistry`] is immutable and shared behind an [`Arc`];
//! type handles hold a clone of that `Arc`.

use indexmap::IndexMap;
use serde_json::Value as Json;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::codec::{Codec, DefaultCodec};
use crate::config::EngineConfig;
use crate::error::{TypeError, TypeResult};
use crate::format::Formatter;
use crate::ir::{FieldKind, FieldTypeIR, NamedPattern, PatternLibrary};
use crate::model::{DefinitionDocument, FieldMap, TypeDefinition, TypeKind};
use crate::synthesis::{RecordType, UnionType};
use crate::validation::Validator;
use crate::value::Instance;

/// Field name used as the identity of keyed members when nothing else is declared.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Collects definitions, patterns and codec overrides before freezing them.
#[derive(Default)]
pub struct TypeRegistryBuilder {
    patterns: PatternLibrary,
    definitions: Vec<TypeDefinition>,
    codecs: Vec<(String, Arc<dyn Codec>)>,
    config: EngineConfig,
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the engine configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a named pattern fields can refer to by name.
    pub fn pattern(mut self, pattern: NamedPattern) -> Self {
        self.patterns.insert(pattern);
        self
    }

    /// Add a type definition.
    pub fn define(mut self, definition: TypeDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Declare a record from `(field, expression)` pairs.
    pub fn record<K, E>(self, name: &str, fields: impl IntoIterator<Item = (K, E)>) -> TypeResult<Self>
    where
        K: Into<String>,
        E: Into<crate::parser::FieldExpression>,
    {
        Ok(self.define(TypeDefinition::record(name, fields)?))
    }

    /// Declare a closed union from `(variant, fields)` pairs.
    pub fn union<V, F, K, E>(self, name: &str, variants: impl IntoIterator<Item = (V, F)>) -> TypeResult<Self>
    where
        V: Into<String>,
        F: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: Into<crate::parser::FieldExpression>,
    {
        Ok(self.define(TypeDefinition::union(name, variants)?))
    }

    /// Add every pattern and type of a declarative document.
    pub fn document(mut self, document: &Json) -> TypeResult<Self> {
        let parsed = DefinitionDocument::from_json(document, &self.patterns)?;
        for pattern in parsed.patterns {
            self.patterns.insert(pattern);
        }
        self.definitions.extend(parsed.definitions);
        Ok(self)
    }

    /// Override how instances of `type_name` are encoded and decoded.
    pub fn codec(mut self, type_name: impl Into<String>, codec: impl Codec + 'static) -> Self {
        self.codecs.push((type_name.into(), Arc::new(codec)));
        self
    }

    /// Resolve references and freeze the registry.
    pub fn build(self) -> TypeResult<Arc<TypeRegistry>> {
        let Self {
            patterns,
            definitions,
            codecs,
            config,
        } = self;

        let mut declared: IndexMap<String, TypeDefinition> = IndexMap::with_capacity(definitions.len());
        for definition in definitions {
            let name = definition.name().to_string();
            if patterns.get(&name).is_some() || declared.contains_key(&name) {
                return Err(TypeError::DuplicateType { name });
            }
            declared.insert(name, definition);
        }

        let mut types = IndexMap::with_capacity(declared.len());
        for (name, definition) in &declared {
            let resolved = definition
                .clone()
                .try_map_fields(|field, ir| resolve_field(name, field, ir, &declared, &patterns))?;
            types.insert(name.clone(), RegisteredType::new(resolved));
        }

        for (type_name, codec) in codecs {
            let entry: &mut RegisteredType = types
                .get_mut(&type_name)
                .ok_or_else(|| TypeError::UnknownType { name: type_name.clone() })?;
            entry.codec = codec;
        }

        debug!(
            types = types.len(),
            patterns = patterns.len(),
            "type registry built"
        );

        Ok(Arc::new(TypeRegistry {
            types,
            patterns,
            config,
        }))
    }
}

/// Resolve one field IR of `owner` against the full declaration set.
fn resolve_field(
    owner: &str,
    field: &str,
    mut ir: FieldTypeIR,
    declared: &IndexMap<String, TypeDefinition>,
    patterns: &PatternLibrary,
) -> TypeResult<FieldTypeIR> {
    let unresolved = |reference: &str| TypeError::UnresolvedReference {
        type_name: owner.to_string(),
        field: field.to_string(),
        reference: reference.to_string(),
    };

    ir.kind = match ir.kind {
        FieldKind::Tagged { type_name } => {
            if declared.contains_key(&type_name) {
                FieldKind::Tagged { type_name }
            } else if let Some(pattern) = patterns.get(&type_name) {
                // A bare name may refer to a shared pattern instead of a type
                FieldKind::Pattern(pattern.clone())
            } else {
                return Err(unresolved(&type_name));
            }
        }
        FieldKind::Keyed { type_name, id_field } => {
            let target = declared.get(&type_name).ok_or_else(|| unresolved(&type_name))?;
            let id_field = id_field
                .or_else(|| target.declared_id_field().map(str::to_string))
                .unwrap_or_else(|| DEFAULT_ID_FIELD.to_string());

            if !target.has_field_everywhere(&id_field) {
                return Err(TypeError::MissingIdField {
                    type_name,
                    id_field,
                    required_by: format!("{owner}.{field}"),
                });
            }
            FieldKind::Keyed {
                type_name,
                id_field: Some(id_field),
            }
        }
        other => other,
    };
    Ok(ir)
}

/// A frozen definition with its identity tags and codec.
pub(crate) struct RegisteredType {
    tag: Arc<str>,
    definition: Arc<TypeDefinition>,
    variant_tags: IndexMap<String, Arc<str>>,
    pub(crate) codec: Arc<dyn Codec>,
}

impl RegisteredType {
    fn new(definition: TypeDefinition) -> Self {
        let variant_tags = definition
            .variants()
            .map(|variants| {
                variants
                    .keys()
                    .map(|name| (name.clone(), Arc::from(name.as_str())))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            tag: Arc::from(definition.name()),
            definition: Arc::new(definition),
            variant_tags,
            codec: Arc::new(DefaultCodec),
        }
    }

    pub(crate) fn tag(&self) -> &Arc<str> {
        &self.tag
    }

    pub(crate) fn definition(&self) -> &Arc<TypeDefinition> {
        &self.definition
    }

    /// Variant tag and fields of a union variant.
    pub(crate) fn variant(&self, name: &str) -> Option<(&Arc<str>, &FieldMap)> {
        let tag = self.variant_tags.get(name)?;
        let fields = self.definition.variant(name)?;
        Some((tag, fields))
    }

    /// True when `instance` was built by this exact registered type.
    pub(crate) fn owns(&self, instance: &Instance) -> bool {
        Arc::ptr_eq(&self.tag, instance.type_tag())
    }
}

/// Immutable set of declared types. Cheap to share across threads.
pub struct TypeRegistry {
    types: IndexMap<String, RegisteredType>,
    patterns: PatternLibrary,
    config: EngineConfig,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    /// Handle for a declared record type.
    pub fn record(self: &Arc<Self>, name: &str) -> TypeResult<RecordType> {
        let entry = self.lookup(name)?;
        if entry.definition.kind() != TypeKind::Record {
            return Err(TypeError::TypeMismatch {
                expected: format!("record {name}"),
                actual: format!("union {name}"),
            });
        }
        Ok(RecordType::new(Arc::clone(self), entry))
    }

    /// Handle for a declared union type.
    pub fn union(self: &Arc<Self>, name: &str) -> TypeResult<UnionType> {
        let entry = self.lookup(name)?;
        if entry.definition.kind() != TypeKind::Union {
            return Err(TypeError::TypeMismatch {
                expected: format!("union {name}"),
                actual: format!("record {name}"),
            });
        }
        Ok(UnionType::new(Arc::clone(self), entry))
    }

    /// Get a definition by name.
    pub fn definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name).map(|entry| entry.definition.as_ref())
    }

    /// All definitions, in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values().map(|entry| entry.definition.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A validator bound to this registry.
    pub fn validator(&self) -> Validator<'_> {
        Validator::new(self)
    }

    /// A formatter using this registry's layout policy.
    pub fn formatter(&self) -> Formatter {
        Formatter::new(self.config.format.clone())
    }

    /// Render an instance with this registry's layout policy.
    pub fn render(&self, instance: &Instance) -> String {
        self.formatter().render_instance(instance)
    }

    /// Encode an instance through its type's codec.
    pub fn encode(&self, instance: &Instance) -> TypeResult<Json> {
        let entry = self.lookup(instance.type_name())?;
        if !entry.owns(instance) {
            return Err(TypeError::TypeMismatch {
                expected: entry.definition.name().to_string(),
                actual: format!("{} from another registry", instance.qualified_name()),
            });
        }
        entry.codec.encode(self, instance)
    }

    /// Decode a persisted shape into an instance of `type_name`.
    pub fn decode(&self, type_name: &str, shape: &Json) -> TypeResult<Instance> {
        let entry = self.lookup(type_name)?;
        entry.codec.decode(self, type_name, shape)
    }

    /// Type names ordered so that every type comes after the types it
    /// references. Types in a reference cycle keep declaration order
    /// relative to each other.
    pub fn dependency_order(&self) -> Vec<&str> {
        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(self.types.len());
        for name in self.types.keys() {
            self.visit(name, &mut visited, &mut order);
        }
        order
    }

    fn visit<'a>(&'a self, name: &'a str, visited: &mut HashSet<&'a str>, order: &mut Vec<&'a str>) {
        if !visited.insert(name) {
            return;
        }
        if let Some(entry) = self.types.get(name) {
            for dependency in entry.definition.references() {
                self.visit(dependency, visited, order);
            }
        }
        order.push(name);
    }

    /// Find a cycle of required, scalar references (`A.b: B`, `B.a: A`).
    ///
    /// Such types can never be constructed: every instance would need an
    /// already existing instance of the other. Optional, array and keyed
    /// references break the chain.
    pub fn required_cycle(&self) -> Option<Vec<String>> {
        let mut done = HashSet::new();
        let mut path = Vec::new();
        self.types
            .keys()
            .find_map(|name| self.find_required_cycle(name, &mut done, &mut path))
    }

    fn find_required_cycle<'a>(
        &'a self,
        name: &'a str,
        done: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        if let Some(start) = path.iter().position(|n| *n == name) {
            let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
            cycle.push(name.to_string());
            return Some(cycle);
        }
        if done.contains(name) {
            return None;
        }

        path.push(name);
        let found = self.types.get(name).and_then(|entry| {
            required_references(&entry.definition)
                .into_iter()
                .find_map(|dependency| self.find_required_cycle(dependency, done, path))
        });
        path.pop();
        done.insert(name);
        found
    }

    pub(crate) fn entry(&self, name: &str) -> Option<&RegisteredType> {
        self.types.get(name)
    }

    pub(crate) fn lookup(&self, name: &str) -> TypeResult<&RegisteredType> {
        self.entry(name).ok_or_else(|| TypeError::UnknownType {
            name: name.to_string(),
        })
    }
}

/// References every instance of `definition` must hold. For unions, only
/// references shared by every variant count.
fn required_references(definition: &TypeDefinition) -> Vec<&str> {
    match (definition.fields(), definition.variants()) {
        (Some(fields), _) => required_in(fields),
        (None, Some(variants)) => {
            let mut shapes = variants.values().map(required_in);
            let first = shapes.next().unwrap_or_default();
            shapes.fold(first, |acc, next| {
                acc.into_iter().filter(|name| next.contains(name)).collect()
            })
        }
        (None, None) => Vec::new(),
    }
}

fn required_in(fields: &FieldMap) -> Vec<&str> {
    fields
        .values()
        .filter(|ir| !ir.optional && ir.array_depth == 0)
        .filter_map(|ir| match &ir.kind {
            FieldKind::Tagged { type_name } => Some(type_name.as_str()),
            _ => None,
        })
        .collect()
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("patterns", &self.patterns.len())
            .field("config", &self.config)
            .finish()
    }
}

impl fmt::Debug for TypeRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistryBuilder")
            .field("definitions", &self.definitions.len())
            .field("patterns", &self.patterns.len())
            .field("codecs", &self.codecs.len())
            .finish()
    }
}
