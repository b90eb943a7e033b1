use crate::error::{Error, Result};
use crate::field_extractor::{default_extractors, FieldExtractor, FieldInfo};
use crate::registry::ReferenceRegistry;
use crate::schema::{Reference, Schema, SchemaOrRef, SchemaType};
use crate::types::{
    Bindings, EnumMembers, EnumType, RecordType, ScalarKind, TypeDescription, TypeNamespace,
};
use indexmap::IndexMap;
use log::{debug, warn};
use std::sync::Arc;

/// Type resolver - maps type descriptions to schemas or component references
///
/// One resolver serves one document generation pass: it owns the [`ReferenceRegistry`] whose
/// schemas end up in `components.schemas`. Records and generic instantiations are registered once
/// and referenced everywhere else; scalars, iterables and enums are inlined.
pub struct TypeResolver {
    registry: ReferenceRegistry,
    /// Record field extractors, in priority order
    extractors: Vec<Box<dyn FieldExtractor>>,
    /// Named types used to evaluate forward references
    namespace: Arc<TypeNamespace>,
    /// Degradations that did not stop the pass
    warnings: Vec<String>,
}

impl TypeResolver {
    /// Create a resolver with the built-in extractors and an empty namespace
    pub fn new() -> Self {
        Self::with_namespace(Arc::new(TypeNamespace::new()))
    }

    /// Create a resolver evaluating forward references against `namespace`
    pub fn with_namespace(namespace: Arc<TypeNamespace>) -> Self {
        debug!("Initializing TypeResolver with {} named types", namespace.len());
        Self {
            registry: ReferenceRegistry::new(),
            extractors: default_extractors(),
            namespace,
            warnings: Vec::new(),
        }
    }

    /// Replace the record field extractors
    pub fn with_extractors(mut self, extractors: Vec<Box<dyn FieldExtractor>>) -> Self {
        self.extractors = extractors;
        self
    }

    /// Resolve a type to an inline schema or a component reference
    pub fn resolve(
        &mut self,
        ty: &TypeDescription,
        bindings: Option<&Bindings>,
    ) -> Result<SchemaOrRef> {
        Ok(self.resolve_with_optionality(ty, bindings)?.0)
    }

    /// Resolve a type, also reporting whether it was an optional wrapper
    pub fn resolve_with_optionality(
        &mut self,
        ty: &TypeDescription,
        bindings: Option<&Bindings>,
    ) -> Result<(SchemaOrRef, bool)> {
        if let TypeDescription::Schema(schema) = ty {
            return Ok((SchemaOrRef::Schema(schema.clone()), false));
        }

        if let TypeDescription::Parameter(name) = ty {
            if let Some(bound) = bindings.and_then(|b| b.get(name)) {
                return self.resolve_with_optionality(bound, bindings);
            }
            debug!("Type parameter {} is not bound, using an empty schema", name);
            return Ok((Schema::default().into(), false));
        }

        if let Some(inner) = optional_inner(ty)? {
            let (resolved, _) = self.resolve_with_optionality(inner, bindings)?;
            return Ok((resolved.into_nullable(), true));
        }

        if let Some(reference) = self.stored_reference(ty, bindings) {
            debug!("Reusing {} for {}", reference.ref_path, ty);
            return Ok((reference.into(), false));
        }

        if let TypeDescription::Record(record) = ty {
            if let Some(fields) = self.extract_fields(ty) {
                return Ok((self.record_schema(record, fields)?.into(), false));
            }
        }

        let resolved = match ty {
            TypeDescription::Scalar(kind) => scalar_schema(*kind).into(),
            TypeDescription::Iterable { element: None, .. } => {
                Schema::array(Schema::of_type(SchemaType::String).into()).into()
            }
            TypeDescription::Iterable {
                element: Some(element),
                ..
            } => {
                let (items, _) = self.resolve_with_optionality(element, bindings)?;
                Schema::array(items).into()
            }
            TypeDescription::Generic { .. } => match self.generic_schema(ty, bindings)? {
                Some(reference) => reference.into(),
                None => Schema::default().into(),
            },
            TypeDescription::Enum(enum_type) => enum_schema(enum_type).into(),
            TypeDescription::ForwardRef(name) => match self.namespace.get(name).cloned() {
                Some(evaluated) => return self.resolve_with_optionality(&evaluated, bindings),
                None => {
                    debug!("Forward reference {} could not be evaluated", name);
                    Schema::default().into()
                }
            },
            TypeDescription::Record(record) => {
                debug!("No field extractor claims {}, treating it as opaque", record.path);
                Schema::of_type(SchemaType::Object).into()
            }
            _ => Schema::default().into(),
        };
        Ok((resolved, false))
    }

    /// Register a type as a named component, even if it would normally be inlined
    pub fn register_type(&mut self, ty: &TypeDescription) -> Result<Reference> {
        if let Some(reference) = self.stored_reference(ty, None) {
            return Ok(reference);
        }
        match self.resolve(ty, None)? {
            SchemaOrRef::Ref(reference) => Ok(reference),
            SchemaOrRef::Schema(schema) => {
                let name = type_name(ty, None)?;
                let reference = self.registry.register(*schema, &name);
                self.registry
                    .remember(identity_key(ty).as_deref(), &name, &reference);
                Ok(reference)
            }
        }
    }

    pub fn registry(&self) -> &ReferenceRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> ReferenceRegistry {
        self.registry
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn extract_fields(&self, ty: &TypeDescription) -> Option<Vec<FieldInfo>> {
        self.extractors
            .iter()
            .find(|extractor| extractor.handles_type(ty))
            .map(|extractor| extractor.fields(ty))
    }

    fn stored_reference(
        &self,
        ty: &TypeDescription,
        bindings: Option<&Bindings>,
    ) -> Option<Reference> {
        match ty {
            TypeDescription::Generic { .. } => {
                let concrete = match bindings {
                    Some(bindings) => ty.substitute(bindings),
                    None => ty.clone(),
                };
                if concrete.contains_parameter() {
                    return None;
                }
                let name = type_name(&concrete, None).ok();
                self.registry
                    .lookup(identity_key(&concrete).as_deref(), name.as_deref())
            }
            _ => identity_key(ty).and_then(|identity| self.registry.lookup(Some(&identity), None)),
        }
    }

    /// Build and register the object schema of a record
    ///
    /// The reference is reserved before any field is resolved, so a field pointing back at the
    /// record (directly or through other records) finds it in the registry.
    fn record_schema(&mut self, record: &RecordType, fields: Vec<FieldInfo>) -> Result<Reference> {
        debug!("Generating object schema for {}", record.path);

        let reference = self.registry.reserve(&record.name);
        self.registry
            .remember(Some(&record.path), &record.name, &reference);

        let mut properties = IndexMap::new();
        let mut required = Vec::new();

        for field in fields {
            let field_ty = match field.ty {
                TypeDescription::ForwardRef(name) => {
                    match self.namespace.evaluate(record, &name).cloned() {
                        Some(evaluated) => evaluated,
                        None => {
                            warn!(
                                "Field {} of {} refers to unknown type {}",
                                field.name, record.path, name
                            );
                            TypeDescription::ForwardRef(name)
                        }
                    }
                }
                other => other,
            };

            let (schema, optional) = self.resolve_with_optionality(&field_ty, None)?;
            if !optional {
                required.push(field.name.clone());
            }
            properties.insert(field.name, schema);
        }

        self.registry
            .complete(&reference, Schema::object(properties, required));
        Ok(reference)
    }

    /// Build and register the object schema of a generic instantiation
    ///
    /// Returns `None` when a field of the generic record mentions a forward reference, which cannot
    /// be evaluated together with type arguments, or when an argument is still an unbound type
    /// variable; the instantiation is then left undocumented.
    fn generic_schema(
        &mut self,
        ty: &TypeDescription,
        bindings: Option<&Bindings>,
    ) -> Result<Option<Reference>> {
        let TypeDescription::Generic { base, args } = ty else {
            return Ok(None);
        };

        let args: Vec<TypeDescription> = match bindings {
            Some(bindings) => args.iter().map(|arg| arg.substitute(bindings)).collect(),
            None => args.clone(),
        };
        if args.iter().any(TypeDescription::contains_parameter) {
            debug!("{} has unbound type parameters, using an empty schema", ty);
            return Ok(None);
        }
        let local: Bindings = base
            .type_parameters()
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();

        let fields = self
            .extract_fields(&TypeDescription::Record(Arc::clone(base)))
            .unwrap_or_default();

        let forward = fields.iter().find(|field| field.ty.contains_forward_ref());
        if let Some(field) = forward {
            let message = format!(
                "The type {} contains a forward reference for {}. Forward references in generic \
                 types are not supported for automatic generation of OpenAPI documentation.",
                ty, field.name
            );
            warn!("{}", message);
            self.warnings.push(message);
            return Ok(None);
        }

        let concrete = TypeDescription::Generic {
            base: Arc::clone(base),
            args,
        };
        let name = type_name(&concrete, None)?;
        debug!("Generating object schema for generic {} as {}", concrete, name);

        let reference = self.registry.reserve(&name);
        self.registry
            .remember(identity_key(&concrete).as_deref(), &name, &reference);

        let mut properties = IndexMap::new();
        let mut required = Vec::new();

        for field in fields {
            let (schema, optional) = self.resolve_with_optionality(&field.ty, Some(&local))?;
            if !optional {
                required.push(field.name.clone());
            }
            properties.insert(field.name, schema);
        }

        self.registry
            .complete(&reference, Schema::object(properties, required));
        Ok(Some(reference))
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Inner type of an optional wrapper, or `None` for any other type
///
/// Unions are only supported as "one type or absent"; any other shape is an error.
pub fn optional_inner(ty: &TypeDescription) -> Result<Option<&TypeDescription>> {
    let TypeDescription::Union(members) = ty else {
        return Ok(None);
    };
    if members.len() != 2 || !members.iter().any(TypeDescription::is_absent) {
        return Err(Error::UnsupportedUnionShape(ty.to_string()));
    }
    match members.iter().find(|member| !member.is_absent()) {
        Some(inner) => Ok(Some(inner)),
        None => Err(Error::UnsupportedUnionShape(ty.to_string())),
    }
}

/// Name of a type as used for component schemas
///
/// Generic instantiations get a name made of the base name and the argument names, e.g.
/// `PageOfUser` or `PairOfUserAndOrder`, so distinct argument combinations never share a name.
/// Optional arguments are named after their inner type, e.g. `PageOfOptionalString`.
pub fn type_name(ty: &TypeDescription, bindings: Option<&Bindings>) -> Result<String> {
    match ty {
        TypeDescription::Parameter(name) => match bindings.and_then(|b| b.get(name)) {
            Some(bound) => type_name(bound, bindings),
            None => Err(Error::UnnameableType(ty.to_string())),
        },
        TypeDescription::Record(record) => Ok(record.name.clone()),
        TypeDescription::Enum(enum_type) => Ok(enum_type.name.clone()),
        TypeDescription::Scalar(kind) => Ok(kind.type_name().to_string()),
        TypeDescription::Opaque(name) | TypeDescription::ForwardRef(name) => Ok(name.clone()),
        TypeDescription::Iterable {
            kind,
            element: None,
        } => Ok(kind.type_name().to_string()),
        TypeDescription::Iterable {
            kind,
            element: Some(element),
        } => Ok(format!(
            "{}Of{}",
            kind.type_name(),
            type_name(element, bindings)?
        )),
        TypeDescription::Generic { base, args } => {
            let args_repr = args
                .iter()
                .map(|arg| type_name(arg, bindings))
                .collect::<Result<Vec<_>>>()?
                .join("And");
            Ok(format!("{}Of{}", base.name, args_repr))
        }
        TypeDescription::Union(_) => match optional_inner(ty) {
            Ok(Some(inner)) => Ok(format!("Optional{}", type_name(inner, bindings)?)),
            _ => Err(Error::UnnameableType(ty.to_string())),
        },
        TypeDescription::Schema(_) | TypeDescription::Absent | TypeDescription::Any => {
            Err(Error::UnnameableType(ty.to_string()))
        }
    }
}

fn identity_key(ty: &TypeDescription) -> Option<String> {
    match ty {
        TypeDescription::Record(_) | TypeDescription::Generic { .. } | TypeDescription::Enum(_) => {
            Some(ty.to_string())
        }
        _ => None,
    }
}

/// Fixed schema of a scalar kind
pub fn scalar_schema(kind: ScalarKind) -> Schema {
    match kind {
        ScalarKind::String => Schema::of_type(SchemaType::String),
        ScalarKind::Int32 => Schema::with_format(SchemaType::Integer, "int32"),
        ScalarKind::Int64 => Schema::with_format(SchemaType::Integer, "int64"),
        ScalarKind::Float32 => Schema::with_format(SchemaType::Number, "float"),
        ScalarKind::Float64 => Schema::with_format(SchemaType::Number, "double"),
        ScalarKind::Boolean => Schema::of_type(SchemaType::Boolean),
        ScalarKind::Uuid => Schema::with_format(SchemaType::String, "uuid"),
        ScalarKind::Date => Schema::with_format(SchemaType::String, "date"),
        ScalarKind::DateTime => Schema::with_format(SchemaType::String, "date-time"),
        ScalarKind::Binary => Schema::with_format(SchemaType::String, "binary"),
    }
}

fn enum_schema(enum_type: &EnumType) -> Schema {
    match &enum_type.members {
        EnumMembers::Integer(values) => Schema {
            enum_values: Some(values.iter().map(|v| serde_json::Value::from(*v)).collect()),
            ..Schema::of_type(SchemaType::Integer)
        },
        EnumMembers::Text(values) => Schema {
            enum_values: Some(values.iter().map(|v| serde_json::Value::from(v.as_str())).collect()),
            ..Schema::of_type(SchemaType::String)
        },
    }
}
