//! Validation models and their schema introspection.
//!
//! Records deriving `Validate` carry per-field rules (`#[validate(length(..))]`,
//! `#[validate(range(..))]`, `#[validate(email)]`, ...). [`model_schema`] renders such a model the
//! way the validation library describes it: a JSON-Schema-like object whose `properties` carry the
//! constraints inline. The validated-model field extractor reads fields back from this output.

use crate::types::{RecordType, ScalarKind, TypeDescription};
use serde_json::{json, Map, Number, Value};

/// A validation rule attached to a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRule {
    Length {
        min: Option<u64>,
        max: Option<u64>,
    },
    Range {
        min: Option<Number>,
        max: Option<Number>,
        exclusive_min: Option<Number>,
        exclusive_max: Option<Number>,
    },
    /// String format such as `email` or `uri`
    Format(String),
}

impl FieldRule {
    pub fn length(min: Option<u64>, max: Option<u64>) -> Self {
        FieldRule::Length { min, max }
    }

    pub fn range(min: Option<Number>, max: Option<Number>) -> Self {
        FieldRule::Range {
            min,
            max,
            exclusive_min: None,
            exclusive_max: None,
        }
    }

    pub fn exclusive_range(min: Option<Number>, max: Option<Number>) -> Self {
        FieldRule::Range {
            min: None,
            max: None,
            exclusive_min: min,
            exclusive_max: max,
        }
    }
}

/// Schema introspection output of a validated model
pub fn model_schema(record: &RecordType) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in record.declared_fields() {
        let (inner, allow_none) = strip_optional(&field.ty);
        let mut property = type_schema(inner);

        if let Value::Object(ref mut object) = property {
            for rule in &field.rules {
                apply_rule(object, rule);
            }
        }

        if !allow_none {
            required.push(Value::String(field.name.clone()));
        }
        properties.insert(field.name.clone(), property);
    }

    let mut schema = json!({
        "title": record.name,
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = Value::Array(required);
    }
    schema
}

/// Unwrap `Union([T, Absent])`, reporting whether absence is allowed
pub(crate) fn strip_optional(ty: &TypeDescription) -> (&TypeDescription, bool) {
    if let TypeDescription::Union(members) = ty {
        if members.len() == 2 && members.iter().any(TypeDescription::is_absent) {
            if let Some(inner) = members.iter().find(|m| !m.is_absent()) {
                return (inner, true);
            }
        }
    }
    (ty, false)
}

fn type_schema(ty: &TypeDescription) -> Value {
    match ty {
        TypeDescription::Scalar(kind) => match kind {
            ScalarKind::String => json!({ "type": "string" }),
            ScalarKind::Uuid => json!({ "type": "string", "format": "uuid" }),
            ScalarKind::Date => json!({ "type": "string", "format": "date" }),
            ScalarKind::DateTime => json!({ "type": "string", "format": "date-time" }),
            ScalarKind::Binary => json!({ "type": "file" }),
            ScalarKind::Int32 | ScalarKind::Int64 => json!({ "type": "integer" }),
            ScalarKind::Float32 | ScalarKind::Float64 => json!({ "type": "number" }),
            ScalarKind::Boolean => json!({ "type": "boolean" }),
        },
        TypeDescription::Iterable { element, .. } => match element {
            Some(element) => json!({ "type": "array", "items": type_schema(element) }),
            None => json!({ "type": "array" }),
        },
        TypeDescription::Record(record) => definition_ref(&record.name),
        TypeDescription::Generic { base, .. } => definition_ref(&base.name),
        TypeDescription::Enum(enum_type) => definition_ref(&enum_type.name),
        TypeDescription::ForwardRef(name) => definition_ref(name),
        _ => json!({}),
    }
}

fn definition_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/definitions/{}", name) })
}

fn apply_rule(object: &mut Map<String, Value>, rule: &FieldRule) {
    match rule {
        FieldRule::Length { min, max } => {
            if let Some(min) = min {
                object.insert("minLength".to_string(), json!(min));
            }
            if let Some(max) = max {
                object.insert("maxLength".to_string(), json!(max));
            }
        }
        FieldRule::Range {
            min,
            max,
            exclusive_min,
            exclusive_max,
        } => {
            let bounds = [
                ("minimum", min),
                ("maximum", max),
                ("exclusiveMinimum", exclusive_min),
                ("exclusiveMaximum", exclusive_max),
            ];
            for (key, bound) in bounds {
                if let Some(bound) = bound {
                    object.insert(key.to_string(), Value::Number(bound.clone()));
                }
            }
        }
        FieldRule::Format(format) => {
            object.insert("format".to_string(), json!(format));
        }
    }
}
