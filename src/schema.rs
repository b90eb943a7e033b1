//! Schema and reference values placed in the generated document.
//!
//! A [`Schema`] is a value object: once handed to the registry it is never changed. A
//! [`Reference`] points at a named entry of `components.schemas` and is what operations and
//! other schemas hold instead of repeating a record's structure.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Prefix of every component schema reference
pub const SCHEMAS_PREFIX: &str = "#/components/schemas/";

/// JSON Schema value types used by OpenAPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
}

/// OpenAPI Schema object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    /// Format for primitive types (e.g., "int32", "int64", "float", "uuid")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Properties for object types, in declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaOrRef>>,
    /// Required field names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaOrRef>>,
    /// Literal values of enumerations
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<bool>,
}

impl Schema {
    /// Create a schema of the given type with no further constraints
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    /// Create a schema of the given type and format
    pub fn with_format(schema_type: SchemaType, format: &str) -> Self {
        Self {
            schema_type: Some(schema_type),
            format: Some(format.to_string()),
            ..Self::default()
        }
    }

    /// Create an array schema
    pub fn array(items: SchemaOrRef) -> Self {
        Self {
            schema_type: Some(SchemaType::Array),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// Create an object schema; an empty `required` list is omitted
    pub fn object(properties: IndexMap<String, SchemaOrRef>, required: Vec<String>) -> Self {
        Self {
            schema_type: Some(SchemaType::Object),
            properties: Some(properties),
            required: if required.is_empty() {
                None
            } else {
                Some(required)
            },
            ..Self::default()
        }
    }

    /// Whether this schema places no constraint at all on the value
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }
}

/// OpenAPI Reference object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub ref_path: String,
}

impl Reference {
    /// Create a reference to a component schema
    pub fn to_schema(name: &str) -> Self {
        Self {
            ref_path: format!("{}{}", SCHEMAS_PREFIX, name),
        }
    }

    /// Name of the referenced component schema
    pub fn schema_name(&self) -> &str {
        self.ref_path
            .strip_prefix(SCHEMAS_PREFIX)
            .unwrap_or(&self.ref_path)
    }
}

/// Either an inline schema or a reference to a component schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    Ref(Reference),
    Schema(Box<Schema>),
}

impl SchemaOrRef {
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            SchemaOrRef::Ref(reference) => Some(reference),
            SchemaOrRef::Schema(_) => None,
        }
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            SchemaOrRef::Schema(schema) => Some(schema),
            SchemaOrRef::Ref(_) => None,
        }
    }

    /// Mark an inline schema as nullable; references are left untouched
    pub fn into_nullable(self) -> Self {
        match self {
            SchemaOrRef::Schema(mut schema) => {
                schema.nullable = Some(true);
                SchemaOrRef::Schema(schema)
            }
            reference => reference,
        }
    }
}

impl From<Schema> for SchemaOrRef {
    fn from(schema: Schema) -> Self {
        SchemaOrRef::Schema(Box::new(schema))
    }
}

impl From<Reference> for SchemaOrRef {
    fn from(reference: Reference) -> Self {
        SchemaOrRef::Ref(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_path_and_name() {
        let reference = Reference::to_schema("User");
        assert_eq!(reference.ref_path, "#/components/schemas/User");
        assert_eq!(reference.schema_name(), "User");
    }

    #[test]
    fn test_reference_serializes_as_dollar_ref() {
        let value = serde_json::to_value(SchemaOrRef::from(Reference::to_schema("User"))).unwrap();
        assert_eq!(value, json!({ "$ref": "#/components/schemas/User" }));
    }

    #[test]
    fn test_schema_skips_empty_fields() {
        let schema = Schema::with_format(SchemaType::Integer, "int64");
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value, json!({ "type": "integer", "format": "int64" }));
    }

    #[test]
    fn test_object_without_required_fields_omits_required() {
        let schema = Schema::object(IndexMap::new(), Vec::new());
        assert!(schema.required.is_none());
        assert_eq!(schema.schema_type, Some(SchemaType::Object));
    }

    #[test]
    fn test_into_nullable_only_touches_inline_schemas() {
        let inline = SchemaOrRef::from(Schema::of_type(SchemaType::String)).into_nullable();
        assert_eq!(inline.as_schema().unwrap().nullable, Some(true));

        let reference = SchemaOrRef::from(Reference::to_schema("User")).into_nullable();
        assert_eq!(reference.as_reference().unwrap().schema_name(), "User");
    }

    #[test]
    fn test_camel_case_constraint_keys() {
        let schema = Schema {
            min_length: Some(1),
            exclusive_minimum: Some(true),
            ..Schema::of_type(SchemaType::String)
        };
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["minLength"], 1);
        assert_eq!(value["exclusiveMinimum"], true);
    }

    #[test]
    fn test_untagged_round_trip_prefers_reference() {
        let parsed: SchemaOrRef =
            serde_json::from_value(json!({ "$ref": "#/components/schemas/Pet" })).unwrap();
        assert!(parsed.as_reference().is_some());
    }
}
