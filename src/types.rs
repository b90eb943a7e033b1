//! Type descriptions handed to the resolver.
//!
//! A [`TypeDescription`] is an immutable handle on a type of the documented service. Records and
//! enums are shared behind `Arc` and identified by their qualified `path`; everything else is a
//! plain value. The only places that look inside a record are [`RecordType::declared_fields`],
//! [`RecordType::type_parameters`], [`TypeDescription::type_arguments`] and
//! [`TypeNamespace::evaluate`].

use crate::schema::Schema;
use crate::validation::FieldRule;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type variable bindings of a generic instantiation (parameter name -> bound type)
pub type Bindings = HashMap<String, TypeDescription>;

/// Scalar kinds with a fixed schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Int32,
    Int64,
    Float32,
    Float64,
    Boolean,
    Uuid,
    Date,
    DateTime,
    Binary,
}

impl ScalarKind {
    /// Name used when the scalar appears in a synthesized generic name
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Int32 => "Int32",
            ScalarKind::Int64 => "Int64",
            ScalarKind::Float32 => "Float32",
            ScalarKind::Float64 => "Float64",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Uuid => "Uuid",
            ScalarKind::Date => "Date",
            ScalarKind::DateTime => "DateTime",
            ScalarKind::Binary => "Binary",
        }
    }
}

/// Kinds of iterable containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterableKind {
    List,
    Set,
    Tuple,
    Sequence,
}

impl IterableKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            IterableKind::List => "List",
            IterableKind::Set => "Set",
            IterableKind::Tuple => "Tuple",
            IterableKind::Sequence => "Sequence",
        }
    }
}

/// Object model a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordModel {
    /// Fixed-field aggregate; fields are read from the declarations
    Plain,
    /// Validation model; fields are read from the model's schema introspection
    Validated,
}

/// One declared field of a record
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeDescription,
    /// Validation rules, only meaningful for validated models
    pub rules: Vec<FieldRule>,
}

impl FieldDecl {
    pub fn new(name: &str, ty: TypeDescription) -> Self {
        Self {
            name: name.to_string(),
            ty,
            rules: Vec::new(),
        }
    }

    pub fn with_rules(mut self, rules: Vec<FieldRule>) -> Self {
        self.rules = rules;
        self
    }
}

/// A user-defined record type
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    /// Schema name candidate
    pub name: String,
    /// Qualified identity, e.g. `billing::Invoice`
    pub path: String,
    pub model: RecordModel,
    pub type_parameters: Vec<String>,
    pub fields: Vec<FieldDecl>,
}

impl RecordType {
    /// Create a plain record whose path equals its name
    pub fn plain(name: &str, fields: Vec<FieldDecl>) -> Self {
        Self {
            name: name.to_string(),
            path: name.to_string(),
            model: RecordModel::Plain,
            type_parameters: Vec::new(),
            fields,
        }
    }

    /// Create a validated model whose path equals its name
    pub fn validated(name: &str, fields: Vec<FieldDecl>) -> Self {
        Self {
            model: RecordModel::Validated,
            ..Self::plain(name, fields)
        }
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn with_type_parameters(mut self, parameters: &[&str]) -> Self {
        self.type_parameters = parameters.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn declared_fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn type_parameters(&self) -> &[String] {
        &self.type_parameters
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Module part of the qualified path, empty for top-level records
    pub fn module(&self) -> &str {
        self.path
            .rsplit_once("::")
            .map(|(module, _)| module)
            .unwrap_or("")
    }
}

/// Literal member values of an enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumMembers {
    Integer(Vec<i64>),
    Text(Vec<String>),
}

/// A user-defined enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub path: String,
    pub members: EnumMembers,
}

impl EnumType {
    pub fn integer(name: &str, values: Vec<i64>) -> Self {
        Self {
            name: name.to_string(),
            path: name.to_string(),
            members: EnumMembers::Integer(values),
        }
    }

    pub fn text(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            path: name.to_string(),
            members: EnumMembers::Text(values.iter().map(|v| v.to_string()).collect()),
        }
    }
}

/// Description of a type of the documented service
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescription {
    /// A schema built by the caller, used as-is
    Schema(Box<Schema>),
    /// The absence marker
    Absent,
    Union(Vec<TypeDescription>),
    Scalar(ScalarKind),
    Iterable {
        kind: IterableKind,
        element: Option<Box<TypeDescription>>,
    },
    Record(Arc<RecordType>),
    Generic {
        base: Arc<RecordType>,
        args: Vec<TypeDescription>,
    },
    Enum(Arc<EnumType>),
    /// A type variable declared by a generic record
    Parameter(String),
    /// A type known only by name where it was declared
    ForwardRef(String),
    /// A named type nothing else is known about
    Opaque(String),
    Any,
}

impl TypeDescription {
    /// `T` or absent
    pub fn optional(inner: TypeDescription) -> Self {
        TypeDescription::Union(vec![inner, TypeDescription::Absent])
    }

    pub fn list_of(element: TypeDescription) -> Self {
        TypeDescription::Iterable {
            kind: IterableKind::List,
            element: Some(Box::new(element)),
        }
    }

    pub fn record(record: RecordType) -> Self {
        TypeDescription::Record(Arc::new(record))
    }

    pub fn enumeration(enum_type: EnumType) -> Self {
        TypeDescription::Enum(Arc::new(enum_type))
    }

    pub fn generic(base: &Arc<RecordType>, args: Vec<TypeDescription>) -> Self {
        TypeDescription::Generic {
            base: Arc::clone(base),
            args,
        }
    }

    pub fn schema(schema: Schema) -> Self {
        TypeDescription::Schema(Box::new(schema))
    }

    /// Type arguments of a generic instantiation or a parameterized iterable
    pub fn type_arguments(&self) -> Vec<&TypeDescription> {
        match self {
            TypeDescription::Generic { args, .. } => args.iter().collect(),
            TypeDescription::Iterable {
                element: Some(element),
                ..
            } => vec![element.as_ref()],
            _ => Vec::new(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, TypeDescription::Absent)
    }

    /// Replace bound type variables, at any depth, by their bindings
    pub fn substitute(&self, bindings: &Bindings) -> TypeDescription {
        if bindings.is_empty() {
            return self.clone();
        }
        match self {
            TypeDescription::Parameter(name) => bindings
                .get(name)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeDescription::Union(members) => {
                TypeDescription::Union(members.iter().map(|m| m.substitute(bindings)).collect())
            }
            TypeDescription::Iterable { kind, element } => TypeDescription::Iterable {
                kind: *kind,
                element: element.as_ref().map(|e| Box::new(e.substitute(bindings))),
            },
            TypeDescription::Generic { base, args } => TypeDescription::Generic {
                base: Arc::clone(base),
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            other => other.clone(),
        }
    }

    /// Whether a forward reference appears anywhere in this type
    pub fn contains_forward_ref(&self) -> bool {
        self.any_nested(&|ty| matches!(ty, TypeDescription::ForwardRef(_)))
    }

    /// Whether a type variable appears anywhere in this type
    pub fn contains_parameter(&self) -> bool {
        self.any_nested(&|ty| matches!(ty, TypeDescription::Parameter(_)))
    }

    fn any_nested(&self, predicate: &dyn Fn(&TypeDescription) -> bool) -> bool {
        if predicate(self) {
            return true;
        }
        match self {
            TypeDescription::Union(members) => members.iter().any(|m| m.any_nested(predicate)),
            TypeDescription::Iterable {
                element: Some(element),
                ..
            } => element.any_nested(predicate),
            TypeDescription::Generic { args, .. } => args.iter().any(|a| a.any_nested(predicate)),
            _ => false,
        }
    }
}

impl fmt::Display for TypeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescription::Schema(_) => write!(f, "<schema>"),
            TypeDescription::Absent => write!(f, "None"),
            TypeDescription::Union(members) => {
                write!(f, "Union<")?;
                for (index, member) in members.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, ">")
            }
            TypeDescription::Scalar(kind) => write!(f, "{}", kind.type_name()),
            TypeDescription::Iterable { kind, element } => match element {
                Some(element) => write!(f, "{}<{}>", kind.type_name(), element),
                None => write!(f, "{}", kind.type_name()),
            },
            TypeDescription::Record(record) => write!(f, "{}", record.path),
            TypeDescription::Generic { base, args } => {
                write!(f, "{}<", base.path)?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            TypeDescription::Enum(enum_type) => write!(f, "{}", enum_type.path),
            TypeDescription::Parameter(name) => write!(f, "{}", name),
            TypeDescription::ForwardRef(name) => write!(f, "'{}'", name),
            TypeDescription::Opaque(name) => write!(f, "{}", name),
            TypeDescription::Any => write!(f, "Any"),
        }
    }
}

/// Named types of the documented service, used to evaluate forward references
#[derive(Debug, Clone, Default)]
pub struct TypeNamespace {
    types: IndexMap<String, TypeDescription>,
}

impl TypeNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under its qualified path and, unless taken, its bare name
    pub fn insert(&mut self, path: &str, ty: TypeDescription) {
        let bare = path.rsplit("::").next().unwrap_or(path).to_string();
        self.types.entry(bare).or_insert_with(|| ty.clone());
        self.types.insert(path.to_string(), ty);
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescription> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Evaluate a forward reference declared inside `enclosing`
    ///
    /// Names are looked up in the enclosing record's module first, then globally.
    pub fn evaluate(&self, enclosing: &RecordType, name: &str) -> Option<&TypeDescription> {
        let module = enclosing.module();
        if !module.is_empty() {
            if let Some(ty) = self.types.get(&format!("{}::{}", module, name)) {
                return Some(ty);
            }
        }
        self.types.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_builds_union_with_absent() {
        let ty = TypeDescription::optional(TypeDescription::Scalar(ScalarKind::Int64));
        match ty {
            TypeDescription::Union(members) => {
                assert_eq!(members.len(), 2);
                assert!(members[1].is_absent());
            }
            other => panic!("Expected union, got {:?}", other),
        }
    }

    #[test]
    fn test_substitute_nested_parameter() {
        let ty = TypeDescription::list_of(TypeDescription::Parameter("T".to_string()));
        let mut bindings = Bindings::new();
        bindings.insert("T".to_string(), TypeDescription::Scalar(ScalarKind::String));

        let substituted = ty.substitute(&bindings);
        assert_eq!(
            substituted,
            TypeDescription::list_of(TypeDescription::Scalar(ScalarKind::String))
        );
    }

    #[test]
    fn test_nested_forward_ref_and_parameter() {
        let children = TypeDescription::list_of(TypeDescription::optional(
            TypeDescription::ForwardRef("Tree".to_string()),
        ));
        assert!(children.contains_forward_ref());
        assert!(!children.contains_parameter());

        let labelled = Arc::new(RecordType::plain("Labelled", vec![]).with_type_parameters(&["T"]));
        let tag = TypeDescription::generic(
            &labelled,
            vec![TypeDescription::list_of(TypeDescription::Parameter("T".to_string()))],
        );
        assert!(tag.contains_parameter());
        assert!(!tag.contains_forward_ref());
        assert!(!TypeDescription::Scalar(ScalarKind::String).contains_parameter());
    }

    #[test]
    fn test_type_arguments_of_generic() {
        let base = Arc::new(RecordType::plain("Page", vec![]).with_type_parameters(&["T"]));
        let ty = TypeDescription::generic(&base, vec![TypeDescription::Scalar(ScalarKind::Int32)]);
        assert_eq!(ty.type_arguments().len(), 1);
        assert!(TypeDescription::Any.type_arguments().is_empty());
    }

    #[test]
    fn test_record_module() {
        let record = RecordType::plain("Item", vec![]).with_path("billing::Item");
        assert_eq!(record.module(), "billing");
        assert_eq!(RecordType::plain("Item", vec![]).module(), "");
    }

    #[test]
    fn test_namespace_prefers_enclosing_module() {
        let mut namespace = TypeNamespace::new();
        let global = TypeDescription::record(RecordType::plain("Item", vec![]));
        let billing =
            TypeDescription::record(RecordType::plain("Item", vec![]).with_path("billing::Item"));
        namespace.insert("Item", global.clone());
        namespace.insert("billing::Item", billing.clone());

        let invoice = RecordType::plain("Invoice", vec![]).with_path("billing::Invoice");
        assert_eq!(namespace.evaluate(&invoice, "Item"), Some(&billing));

        let order = RecordType::plain("Order", vec![]);
        assert_eq!(namespace.evaluate(&order, "Item"), Some(&global));
        assert!(namespace.evaluate(&order, "Missing").is_none());
    }

    #[test]
    fn test_display_union() {
        let ty = TypeDescription::Union(vec![
            TypeDescription::Scalar(ScalarKind::Int32),
            TypeDescription::Scalar(ScalarKind::String),
        ]);
        assert_eq!(ty.to_string(), "Union<Int32, String>");
    }
}
