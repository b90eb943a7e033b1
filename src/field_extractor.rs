//! Field extraction strategies for record types.
//!
//! Each [`FieldExtractor`] knows one object model. The resolver tries them in order and the first
//! one that claims a type provides its fields.

use crate::schema::{Schema, SchemaType};
use crate::types::{IterableKind, RecordModel, RecordType, ScalarKind, TypeDescription};
use crate::validation::{model_schema, strip_optional};
use log::debug;
use serde_json::{Map, Value};

/// One named field of a record, as seen by the resolver
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    /// Declared type, or a schema built from the model's constraints
    pub ty: TypeDescription,
}

impl FieldInfo {
    pub fn new(name: &str, ty: TypeDescription) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

/// Strategy extracting the fields of one family of record types
pub trait FieldExtractor: Send + Sync {
    /// Whether this extractor is responsible for the given type
    fn handles_type(&self, ty: &TypeDescription) -> bool;

    /// Fields of a type this extractor handles, in declaration order
    fn fields(&self, ty: &TypeDescription) -> Vec<FieldInfo>;
}

/// The built-in extractors, in priority order
pub fn default_extractors() -> Vec<Box<dyn FieldExtractor>> {
    vec![
        Box::new(PlainRecordExtractor),
        Box::new(ValidatedModelExtractor),
    ]
}

fn record_of(ty: &TypeDescription) -> Option<&RecordType> {
    match ty {
        TypeDescription::Record(record) => Some(record),
        TypeDescription::Generic { base, .. } => Some(base),
        _ => None,
    }
}

/// Fixed-field aggregates: fields come straight from the declarations
pub struct PlainRecordExtractor;

impl FieldExtractor for PlainRecordExtractor {
    fn handles_type(&self, ty: &TypeDescription) -> bool {
        matches!(ty, TypeDescription::Record(record) if record.model == RecordModel::Plain)
    }

    fn fields(&self, ty: &TypeDescription) -> Vec<FieldInfo> {
        record_of(ty)
            .map(|record| {
                record
                    .declared_fields()
                    .iter()
                    .map(|field| FieldInfo::new(&field.name, field.ty.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Validation models: fields come from the model's schema introspection
///
/// Generic instantiations of a validation model are not claimed; the resolver's generic path
/// handles them with the type arguments in scope.
pub struct ValidatedModelExtractor;

impl ValidatedModelExtractor {
    fn property_to_type(
        &self,
        declared: Option<&TypeDescription>,
        property: &Map<String, Value>,
    ) -> TypeDescription {
        let allow_none = declared.is_some_and(|ty| strip_optional(ty).1);

        if property.contains_key("$ref") {
            return declared.cloned().unwrap_or(TypeDescription::Any);
        }

        let nullable = if allow_none { Some(true) } else { None };
        let schema = match property.get("type").and_then(Value::as_str) {
            Some("string") => Schema {
                min_length: property.get("minLength").and_then(Value::as_u64),
                max_length: property.get("maxLength").and_then(Value::as_u64),
                format: property
                    .get("format")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                nullable,
                ..Schema::of_type(SchemaType::String)
            },
            Some("boolean") => {
                let boolean = TypeDescription::Scalar(ScalarKind::Boolean);
                return wrap_optional(boolean, allow_none);
            }
            Some("file") => Schema::with_format(SchemaType::String, "binary"),
            Some("number") => Schema {
                nullable,
                ..bounded(property, SchemaType::Number, "float")
            },
            Some("integer") => Schema {
                nullable,
                ..bounded(property, SchemaType::Integer, "int64")
            },
            Some("array") => {
                return match declared {
                    Some(ty) => ty.clone(),
                    None => TypeDescription::Iterable {
                        kind: IterableKind::List,
                        element: None,
                    },
                };
            }
            _ => Schema::default(),
        };

        debug!("Mapped validated property to inline schema: {:?}", schema.schema_type);
        wrap_optional(TypeDescription::schema(schema), allow_none)
    }
}

fn wrap_optional(ty: TypeDescription, allow_none: bool) -> TypeDescription {
    if allow_none {
        TypeDescription::optional(ty)
    } else {
        ty
    }
}

/// Numeric schema with the bounds found in a model property
fn bounded(property: &Map<String, Value>, schema_type: SchemaType, format: &str) -> Schema {
    let number = |key: &str| match property.get(key) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    };

    let mut schema = Schema::with_format(schema_type, format);
    if let Some(min) = number("exclusiveMinimum") {
        schema.minimum = Some(min);
        schema.exclusive_minimum = Some(true);
    } else {
        schema.minimum = number("minimum");
    }
    if let Some(max) = number("exclusiveMaximum") {
        schema.maximum = Some(max);
        schema.exclusive_maximum = Some(true);
    } else {
        schema.maximum = number("maximum");
    }
    schema
}

impl FieldExtractor for ValidatedModelExtractor {
    fn handles_type(&self, ty: &TypeDescription) -> bool {
        matches!(ty, TypeDescription::Record(record) if record.model == RecordModel::Validated)
    }

    fn fields(&self, ty: &TypeDescription) -> Vec<FieldInfo> {
        let Some(record) = record_of(ty) else {
            return Vec::new();
        };

        let schema = model_schema(record);
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return Vec::new();
        };

        properties
            .iter()
            .map(|(name, property)| {
                let declared = record.field(name).map(|field| &field.ty);
                let ty = match property.as_object() {
                    Some(property) => self.property_to_type(declared, property),
                    None => TypeDescription::schema(Schema::default()),
                };
                FieldInfo::new(name, ty)
            })
            .collect()
    }
}
