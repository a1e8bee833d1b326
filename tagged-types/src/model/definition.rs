//! Type definitions: named records and closed unions of field IRs.

use indexmap::IndexMap;
use std::fmt;

use crate::error::{TypeError, TypeResult};
use crate::ir::FieldTypeIR;
use crate::parser::{is_identifier, FieldExpression};

/// Field name to IR, in declaration order.
pub type FieldMap = IndexMap<String, FieldTypeIR>;

/// Whether a definition is a single shape or a closed union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Record,
    Union,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record => f.write_str("record"),
            Self::Union => f.write_str("union"),
        }
    }
}

/// The declared shape of a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionBody {
    Record(FieldMap),
    Union(IndexMap<String, FieldMap>),
}

/// A named record or union with its field IRs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    name: String,
    body: DefinitionBody,
    id_field: Option<String>,
}

impl TypeDefinition {
    /// Declare a record from `(field, expression)` pairs.
    ///
    /// ```rust,ignore
    /// let point = TypeDefinition::record("Point", [("x", "Number"), ("y", "Number")])?;
    /// ```
    pub fn record<K, E>(name: &str, fields: impl IntoIterator<Item = (K, E)>) -> TypeResult<Self>
    where
        K: Into<String>,
        E: Into<FieldExpression>,
    {
        let fields = parse_fields(name, fields)?;
        Self::record_ir(name, fields)
    }

    /// Declare a record from already parsed IR.
    pub fn record_ir(name: &str, fields: FieldMap) -> TypeResult<Self> {
        check_name(name, name, "type")?;
        for field in fields.keys() {
            check_field_name(name, field)?;
        }
        Ok(Self {
            name: name.to_string(),
            body: DefinitionBody::Record(fields),
            id_field: None,
        })
    }

    /// Declare a closed union from `(variant, fields)` pairs.
    ///
    /// ```rust,ignore
    /// let shape = TypeDefinition::union("Shape", [
    ///     ("Circle", vec![("radius", "Number")]),
    ///     ("Square", vec![("side", "Number")]),
    /// ])?;
    /// ```
    pub fn union<V, F, K, E>(name: &str, variants: impl IntoIterator<Item = (V, F)>) -> TypeResult<Self>
    where
        V: Into<String>,
        F: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: Into<FieldExpression>,
    {
        let mut parsed = IndexMap::new();
        for (variant, fields) in variants {
            let variant: String = variant.into();
            let fields = parse_fields(&format!("{name}.{variant}"), fields)?;
            if parsed.insert(variant.clone(), fields).is_some() {
                return Err(TypeError::invalid_definition(
                    name,
                    format!("variant '{variant}' is declared more than once"),
                ));
            }
        }
        Self::union_ir(name, parsed)
    }

    /// Declare a union from already parsed IR.
    pub fn union_ir(name: &str, variants: IndexMap<String, FieldMap>) -> TypeResult<Self> {
        check_name(name, name, "type")?;
        if variants.is_empty() {
            return Err(TypeError::invalid_definition(name, "a union needs at least one variant"));
        }
        for (variant, fields) in &variants {
            check_name(name, variant, "variant")?;
            for field in fields.keys() {
                check_field_name(name, field)?;
            }
        }
        Ok(Self {
            name: name.to_string(),
            body: DefinitionBody::Union(variants),
            id_field: None,
        })
    }

    /// Declare the identity field keyed collections of this type use.
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        match self.body {
            DefinitionBody::Record(_) => TypeKind::Record,
            DefinitionBody::Union(_) => TypeKind::Union,
        }
    }

    pub fn body(&self) -> &DefinitionBody {
        &self.body
    }

    /// Record fields; `None` for unions.
    pub fn fields(&self) -> Option<&FieldMap> {
        match &self.body {
            DefinitionBody::Record(fields) => Some(fields),
            DefinitionBody::Union(_) => None,
        }
    }

    /// Union variants; `None` for records.
    pub fn variants(&self) -> Option<&IndexMap<String, FieldMap>> {
        match &self.body {
            DefinitionBody::Record(_) => None,
            DefinitionBody::Union(variants) => Some(variants),
        }
    }

    pub fn variant(&self, name: &str) -> Option<&FieldMap> {
        self.variants().and_then(|variants| variants.get(name))
    }

    pub fn declared_id_field(&self) -> Option<&str> {
        self.id_field.as_deref()
    }

    /// True when `field` exists on every shape of this type.
    pub fn has_field_everywhere(&self, field: &str) -> bool {
        match &self.body {
            DefinitionBody::Record(fields) => fields.contains_key(field),
            DefinitionBody::Union(variants) => {
                variants.values().all(|fields| fields.contains_key(field))
            }
        }
    }

    /// Every field IR with a location label (`field` or `Variant.field`).
    pub fn all_fields(&self) -> Vec<(String, &FieldTypeIR)> {
        match &self.body {
            DefinitionBody::Record(fields) => {
                fields.iter().map(|(name, ir)| (name.clone(), ir)).collect()
            }
            DefinitionBody::Union(variants) => variants
                .iter()
                .flat_map(|(variant, fields)| {
                    fields
                        .iter()
                        .map(move |(name, ir)| (format!("{variant}.{name}"), ir))
                })
                .collect(),
        }
    }

    /// Names of the declared types this definition refers to, deduplicated.
    pub fn references(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (_, ir) in self.all_fields() {
            if let Some(name) = ir.tagged_type() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// `Point(x: Number, y: Number)` or
    /// `Shape = Circle(radius: Number) | Square(side: Number)`.
    pub fn signature(&self) -> String {
        match &self.body {
            DefinitionBody::Record(fields) => shape_signature(&self.name, fields),
            DefinitionBody::Union(variants) => {
                let shapes: Vec<String> = variants
                    .iter()
                    .map(|(variant, fields)| shape_signature(variant, fields))
                    .collect();
                format!("{} = {}", self.name, shapes.join(" | "))
            }
        }
    }

    /// `Shape.Circle(radius: Number)`.
    pub fn variant_signature(&self, variant: &str) -> Option<String> {
        self.variant(variant)
            .map(|fields| shape_signature(&format!("{}.{variant}", self.name), fields))
    }

    /// Rebuild every field IR through `resolve`, keeping order.
    pub(crate) fn try_map_fields(
        mut self,
        mut resolve: impl FnMut(&str, FieldTypeIR) -> TypeResult<FieldTypeIR>,
    ) -> TypeResult<Self> {
        fn map_all(
            label_prefix: Option<&str>,
            fields: FieldMap,
            resolve: &mut impl FnMut(&str, FieldTypeIR) -> TypeResult<FieldTypeIR>,
        ) -> TypeResult<FieldMap> {
            fields
                .into_iter()
                .map(|(name, ir)| {
                    let label = match label_prefix {
                        Some(prefix) => format!("{prefix}.{name}"),
                        None => name.clone(),
                    };
                    resolve(&label, ir).map(|ir| (name, ir))
                })
                .collect()
        }

        self.body = match self.body {
            DefinitionBody::Record(fields) => DefinitionBody::Record(map_all(None, fields, &mut resolve)?),
            DefinitionBody::Union(variants) => DefinitionBody::Union(
                variants
                    .into_iter()
                    .map(|(variant, fields)| {
                        map_all(Some(&variant), fields, &mut resolve).map(|fields| (variant, fields))
                    })
                    .collect::<TypeResult<_>>()?,
            ),
        };
        Ok(self)
    }
}

fn shape_signature(name: &str, fields: &FieldMap) -> String {
    let params: Vec<String> = fields
        .iter()
        .map(|(field, ir)| format!("{field}: {ir}"))
        .collect();
    format!("{name}({})", params.join(", "))
}

fn parse_fields<K, E>(owner: &str, fields: impl IntoIterator<Item = (K, E)>) -> TypeResult<FieldMap>
where
    K: Into<String>,
    E: Into<FieldExpression>,
{
    let mut parsed = FieldMap::new();
    for (field, expression) in fields {
        let field: String = field.into();
        let expression: FieldExpression = expression.into();
        let ir = expression.parse()?;
        if parsed.insert(field.clone(), ir).is_some() {
            return Err(TypeError::invalid_definition(
                owner,
                format!("field '{field}' is declared more than once"),
            ));
        }
    }
    Ok(parsed)
}

fn check_name(owner: &str, name: &str, what: &str) -> TypeResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(TypeError::invalid_definition(
            owner,
            format!("'{name}' is not a valid {what} name"),
        ))
    }
}

fn check_field_name(owner: &str, field: &str) -> TypeResult<()> {
    if field.trim().is_empty() {
        Err(TypeError::invalid_definition(owner, "field names cannot be empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn shape() -> TypeDefinition {
        TypeDefinition::union(
            "Shape",
            [
                ("Circle", vec![("radius", "Number")]),
                ("Square", vec![("side", "Number")]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_record_keeps_declaration_order() {
        let def = TypeDefinition::record("Point", [("y", "Number"), ("x", "Number")]).unwrap();
        let names: Vec<_> = def.fields().unwrap().keys().cloned().collect();
        assert_eq!(names, vec!["y", "x"]);
        assert_eq!(def.kind(), TypeKind::Record);
    }

    #[test]
    fn test_signatures() {
        let point = TypeDefinition::record("Point", [("x", "Number"), ("y", "Number?")]).unwrap();
        assert_eq!(point.signature(), "Point(x: Number, y: Number?)");

        let shape = shape();
        assert_eq!(
            shape.signature(),
            "Shape = Circle(radius: Number) | Square(side: Number)"
        );
        assert_eq!(
            shape.variant_signature("Square").as_deref(),
            Some("Shape.Square(side: Number)")
        );
        assert!(shape.variant_signature("Triangle").is_none());
    }

    #[test]
    fn test_malformed_field_fails_declaration() {
        let err = TypeDefinition::record("Bad", [("x", "[[Number]")]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedFieldType);
    }

    #[test]
    fn test_duplicate_field_and_variant() {
        let err = TypeDefinition::record("P", [("x", "Number"), ("x", "String")]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDefinition);

        let err = TypeDefinition::union(
            "U",
            [("A", vec![("x", "Number")]), ("A", vec![("y", "Number")])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("variant 'A'"));
    }

    #[test]
    fn test_empty_union_rejected() {
        let variants: Vec<(&str, Vec<(&str, &str)>)> = Vec::new();
        let err = TypeDefinition::union("Nothing", variants).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDefinition);
    }

    #[test]
    fn test_invalid_names() {
        assert!(TypeDefinition::record("not a name", [("x", "Number")]).is_err());
        assert!(TypeDefinition::union("U", [("bad-variant", vec![("x", "Number")])]).is_err());
    }

    #[test]
    fn test_references_are_deduplicated() {
        let def = TypeDefinition::record(
            "Ledger",
            [
                ("owner", "Account"),
                ("accounts", "{Account:id}"),
                ("audit", "[Entry]?"),
            ],
        )
        .unwrap();
        assert_eq!(def.references(), vec!["Account", "Entry"]);
    }

    #[test]
    fn test_has_field_everywhere() {
        let def = TypeDefinition::union(
            "Event",
            [
                ("Created", vec![("id", "String"), ("at", "Date")]),
                ("Deleted", vec![("id", "String")]),
            ],
        )
        .unwrap();
        assert!(def.has_field_everywhere("id"));
        assert!(!def.has_field_everywhere("at"));
    }
}
