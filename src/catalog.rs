//! Source-backed type catalog.
//!
//! Indexes the `struct`, `enum` and `fn` items of parsed source files and turns them into
//! [`TypeDescription`] values on demand. Descriptions are cached per qualified path, so a record
//! reached from several routes is one shared `Arc`.

use crate::docstring::{doc_text, parse_docstring};
use crate::error::{Error, Result};
use crate::parser::ParsedFile;
use crate::routes::DocstringInfo;
use crate::types::{
    EnumType, FieldDecl, IterableKind, RecordType, ScalarKind, TypeDescription, TypeNamespace,
};
use crate::validation::FieldRule;
use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Number;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Wrapper types whose first type argument is the documented type
const TRANSPARENT_WRAPPERS: &[&str] = &[
    "Json", "Path", "Query", "Form", "Header", "Box", "Arc", "Rc", "Cow", "Data", "Extension",
];

#[derive(Debug, Clone)]
enum CatalogItem {
    Struct(syn::ItemStruct),
    Enum(syn::ItemEnum),
}

/// An indexed item and the module it was declared in
#[derive(Debug, Clone)]
struct CatalogEntry {
    module: String,
    item: CatalogItem,
}

impl CatalogEntry {
    fn name(&self) -> String {
        match &self.item {
            CatalogItem::Struct(item) => item.ident.to_string(),
            CatalogItem::Enum(item) => item.ident.to_string(),
        }
    }
}

/// Type catalog built from source files
#[derive(Debug, Default)]
pub struct SourceCatalog {
    /// Items by qualified path (`models::User`, or `User` at the crate root)
    items: IndexMap<String, CatalogEntry>,
    /// Qualified paths by bare name
    by_name: HashMap<String, Vec<String>>,
    /// Doc comments of free functions by name
    functions: HashMap<String, Vec<syn::Attribute>>,
    /// Described items by qualified path
    described: HashMap<String, TypeDescription>,
    /// Track types currently being described to detect circular references
    resolving_stack: HashSet<String>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the items of parsed files
    pub fn from_files(files: &[ParsedFile]) -> Self {
        let mut catalog = Self::new();
        for file in files {
            catalog.add_items(&file.module_path, &file.syntax_tree.items);
        }
        debug!(
            "Catalog holds {} types and {} functions",
            catalog.items.len(),
            catalog.functions.len()
        );
        catalog
    }

    /// Index the items of a source string declared in `module`
    pub fn add_source(&mut self, module: &str, source: &str) -> Result<()> {
        let file = syn::parse_file(source).map_err(|err| Error::Parse {
            file: Path::new(module).to_path_buf(),
            message: err.to_string(),
        })?;
        self.add_items(module, &file.items);
        Ok(())
    }

    fn add_items(&mut self, module: &str, items: &[syn::Item]) {
        for item in items {
            let (name, catalog_item) = match item {
                syn::Item::Struct(item) => (item.ident.to_string(), CatalogItem::Struct(item.clone())),
                syn::Item::Enum(item) => (item.ident.to_string(), CatalogItem::Enum(item.clone())),
                syn::Item::Fn(item) => {
                    self.functions
                        .insert(item.sig.ident.to_string(), item.attrs.clone());
                    continue;
                }
                syn::Item::Mod(item) => {
                    if let Some((_, content)) = &item.content {
                        let nested = qualify(module, &item.ident.to_string());
                        self.add_items(&nested, content);
                    }
                    continue;
                }
                _ => continue,
            };

            let path = qualify(module, &name);
            debug!("Indexed type {}", path);
            self.by_name.entry(name).or_default().push(path.clone());
            self.items.insert(
                path,
                CatalogEntry {
                    module: module.to_string(),
                    item: catalog_item,
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Describe a Rust type expression such as `Json<Page<User>>`
    pub fn describe_str(&mut self, ty: &str) -> Result<TypeDescription> {
        let parsed: syn::Type = syn::parse_str(ty)
            .map_err(|err| Error::InvalidArgument(format!("invalid type `{}`: {}", ty, err)))?;
        Ok(self.describe_type(&parsed, &TypeScope::root()))
    }

    /// Documentation of a free function, read from its doc comments
    pub fn docstring(&self, function: &str) -> Option<DocstringInfo> {
        let attrs = self.functions.get(function)?;
        doc_text(attrs).and_then(|text| parse_docstring(&text))
    }

    /// Describe every indexed type, keyed by qualified path and bare name
    pub fn namespace(&mut self) -> TypeNamespace {
        let mut namespace = TypeNamespace::new();
        let paths: Vec<String> = self.items.keys().cloned().collect();
        for path in paths {
            let description = self.describe_item(&path);
            namespace.insert(&path, description);
        }
        namespace
    }

    fn describe_type(&mut self, ty: &syn::Type, scope: &TypeScope) -> TypeDescription {
        match ty {
            syn::Type::Path(type_path) => self.describe_path(&type_path.path, scope),
            syn::Type::Reference(reference) => self.describe_type(&reference.elem, scope),
            syn::Type::Paren(paren) => self.describe_type(&paren.elem, scope),
            syn::Type::Group(group) => self.describe_type(&group.elem, scope),
            syn::Type::Slice(slice) => {
                TypeDescription::list_of(self.describe_type(&slice.elem, scope))
            }
            syn::Type::Array(array) => {
                TypeDescription::list_of(self.describe_type(&array.elem, scope))
            }
            syn::Type::Tuple(tuple) if tuple.elems.is_empty() => TypeDescription::Absent,
            syn::Type::Tuple(tuple) => {
                let elements: Vec<TypeDescription> = tuple
                    .elems
                    .iter()
                    .map(|elem| self.describe_type(elem, scope))
                    .collect();
                let homogeneous = elements.windows(2).all(|pair| pair[0] == pair[1]);
                TypeDescription::Iterable {
                    kind: IterableKind::Tuple,
                    element: homogeneous
                        .then(|| elements.into_iter().next())
                        .flatten()
                        .map(Box::new),
                }
            }
            _ => TypeDescription::Any,
        }
    }

    fn describe_path(&mut self, path: &syn::Path, scope: &TypeScope) -> TypeDescription {
        let Some(segment) = path.segments.last() else {
            return TypeDescription::Any;
        };
        let name = segment.ident.to_string();
        let args: Vec<TypeDescription> = match &segment.arguments {
            syn::PathArguments::AngleBracketed(arguments) => arguments
                .args
                .iter()
                .filter_map(|arg| match arg {
                    syn::GenericArgument::Type(ty) => Some(self.describe_type(ty, scope)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        if path.segments.len() == 1 && args.is_empty() && scope.parameters.contains(&name) {
            return TypeDescription::Parameter(name);
        }

        let first = || args.first().cloned();
        match name.as_str() {
            wrapper if TRANSPARENT_WRAPPERS.contains(&wrapper) => {
                return first().unwrap_or(TypeDescription::Any)
            }
            "Result" => return first().unwrap_or(TypeDescription::Any),
            "Option" => {
                return first()
                    .map(TypeDescription::optional)
                    .unwrap_or(TypeDescription::Any)
            }
            "Vec" | "VecDeque" | "LinkedList" => return iterable(IterableKind::List, first()),
            "HashSet" | "BTreeSet" | "IndexSet" => return iterable(IterableKind::Set, first()),
            "HashMap" | "BTreeMap" | "IndexMap" => return TypeDescription::Opaque(name),
            "Value" => return TypeDescription::Any,
            _ => {}
        }

        if let Some(kind) = scalar_kind(&name) {
            return TypeDescription::Scalar(kind);
        }

        let segments: Vec<String> = path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();
        let Some(qualified) = self.lookup(&segments, &scope.module) else {
            debug!("Type {} is not declared in the scanned sources", name);
            return TypeDescription::Opaque(name);
        };

        match self.describe_item(&qualified) {
            TypeDescription::Record(base) if !base.type_parameters.is_empty() && !args.is_empty() => {
                TypeDescription::Generic { base, args }
            }
            described => described,
        }
    }

    /// Qualified path of a referenced type: as written, next to the referencing code, then anywhere
    fn lookup(&self, segments: &[String], module: &str) -> Option<String> {
        let written: Vec<&str> = segments
            .iter()
            .map(String::as_str)
            .filter(|segment| !matches!(*segment, "crate" | "self" | "super"))
            .collect();
        let written = written.join("::");
        if self.items.contains_key(&written) {
            return Some(written);
        }

        let name = segments.last()?;
        let local = qualify(module, name);
        if self.items.contains_key(&local) {
            return Some(local);
        }

        let candidates = self.by_name.get(name)?;
        if candidates.len() > 1 {
            debug!(
                "Type name {} is ambiguous, using {}",
                name, candidates[0]
            );
        }
        candidates.first().cloned()
    }

    fn describe_item(&mut self, path: &str) -> TypeDescription {
        if let Some(described) = self.described.get(path) {
            return described.clone();
        }
        let Some(entry) = self.items.get(path).cloned() else {
            return TypeDescription::Opaque(path.to_string());
        };

        if self.resolving_stack.contains(path) {
            debug!("Circular reference detected for type: {}", path);
            return TypeDescription::ForwardRef(entry.name());
        }
        self.resolving_stack.insert(path.to_string());

        let described = match &entry.item {
            CatalogItem::Struct(item) => self.describe_struct(path, &entry.module, item),
            CatalogItem::Enum(item) => describe_enum(path, item),
        };

        self.resolving_stack.remove(path);
        self.described.insert(path.to_string(), described.clone());
        described
    }

    fn describe_struct(
        &mut self,
        path: &str,
        module: &str,
        item: &syn::ItemStruct,
    ) -> TypeDescription {
        let name = item.ident.to_string();
        debug!("Parsing struct definition: {}", path);

        let parameters: Vec<String> = item
            .generics
            .type_params()
            .map(|param| param.ident.to_string())
            .collect();
        let scope = TypeScope {
            module: module.to_string(),
            parameters: parameters.clone(),
        };

        let named = match &item.fields {
            syn::Fields::Named(named) => named,
            syn::Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                // newtype: documented as the wrapped type
                return self.describe_type(&unnamed.unnamed[0].ty, &scope);
            }
            _ => return TypeDescription::Opaque(name),
        };

        let container = SerdeAttributes::parse(&item.attrs);
        let mut fields = Vec::new();
        for field in &named.named {
            let Some(ident) = &field.ident else {
                continue;
            };
            let serde_attrs = SerdeAttributes::parse(&field.attrs);
            if serde_attrs.skip {
                debug!("Skipping field {} of {}", ident, path);
                continue;
            }
            if serde_attrs.flatten {
                warn!(
                    "Flattened field {} of {} is documented as a nested object",
                    ident, path
                );
            }

            let field_name = match (&serde_attrs.rename, &container.rename_all) {
                (Some(rename), _) => rename.clone(),
                (None, Some(rule)) => rule.apply_to_field(&ident.to_string()),
                (None, None) => ident.to_string(),
            };
            let ty = self.describe_type(&field.ty, &scope);
            fields.push(FieldDecl::new(&field_name, ty).with_rules(validation_rules(&field.attrs)));
        }

        let record = if derives(&item.attrs, "Validate") {
            RecordType::validated(&name, fields)
        } else {
            RecordType::plain(&name, fields)
        };
        let record = RecordType {
            path: path.to_string(),
            type_parameters: parameters,
            ..record
        };
        TypeDescription::Record(Arc::new(record))
    }
}

/// Names visible while describing a type
struct TypeScope {
    module: String,
    /// Type parameters of the enclosing generic item
    parameters: Vec<String>,
}

impl TypeScope {
    fn root() -> Self {
        Self {
            module: String::new(),
            parameters: Vec::new(),
        }
    }
}

fn qualify(module: &str, name: &str) -> String {
    if module.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", module, name)
    }
}

fn iterable(kind: IterableKind, element: Option<TypeDescription>) -> TypeDescription {
    TypeDescription::Iterable {
        kind,
        element: element.map(Box::new),
    }
}

/// Parse a primitive or well-known type name
fn scalar_kind(name: &str) -> Option<ScalarKind> {
    match name {
        "String" | "str" | "char" => Some(ScalarKind::String),
        "i8" | "i16" | "i32" | "u8" | "u16" => Some(ScalarKind::Int32),
        "i64" | "i128" | "isize" | "u32" | "u64" | "u128" | "usize" => Some(ScalarKind::Int64),
        "f32" => Some(ScalarKind::Float32),
        "f64" | "Decimal" => Some(ScalarKind::Float64),
        "bool" => Some(ScalarKind::Boolean),
        "Uuid" => Some(ScalarKind::Uuid),
        "NaiveDate" | "Date" => Some(ScalarKind::Date),
        "DateTime" | "NaiveDateTime" | "OffsetDateTime" | "PrimitiveDateTime" | "SystemTime" => {
            Some(ScalarKind::DateTime)
        }
        "Bytes" => Some(ScalarKind::Binary),
        _ => None,
    }
}

fn describe_enum(path: &str, item: &syn::ItemEnum) -> TypeDescription {
    let name = item.ident.to_string();
    debug!("Parsing enum definition: {}", path);

    if item
        .variants
        .iter()
        .any(|variant| !matches!(variant.fields, syn::Fields::Unit))
    {
        debug!("Enum {} carries data, documenting it as opaque", path);
        return TypeDescription::Opaque(name);
    }

    let discriminants: Option<Vec<i64>> = item
        .variants
        .iter()
        .map(|variant| {
            variant
                .discriminant
                .as_ref()
                .and_then(|(_, expr)| integer_literal(expr))
        })
        .collect();

    let mut enum_type = match discriminants {
        Some(values) if !values.is_empty() => EnumType::integer(&name, values),
        _ => {
            let container = SerdeAttributes::parse(&item.attrs);
            let values: Vec<String> = item
                .variants
                .iter()
                .map(|variant| {
                    let variant_attrs = SerdeAttributes::parse(&variant.attrs);
                    match (variant_attrs.rename, &container.rename_all) {
                        (Some(rename), _) => rename,
                        (None, Some(rule)) => rule.apply_to_variant(&variant.ident.to_string()),
                        (None, None) => variant.ident.to_string(),
                    }
                })
                .collect();
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            EnumType::text(&name, &values)
        }
    };
    enum_type.path = path.to_string();
    TypeDescription::Enum(Arc::new(enum_type))
}

fn integer_literal(expr: &syn::Expr) -> Option<i64> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(value),
            ..
        }) => value.base10_parse().ok(),
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => integer_literal(expr).map(|value| -value),
        _ => None,
    }
}

fn number_literal(expr: &syn::Expr) -> Option<Number> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Float(value),
            ..
        }) => value.base10_parse::<f64>().ok().and_then(Number::from_f64),
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(value),
            ..
        }) => value.base10_parse::<i64>().ok().map(Number::from),
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => {
            let number = number_literal(expr)?;
            match number.as_i64() {
                Some(value) => Some(Number::from(-value)),
                None => number.as_f64().and_then(|value| Number::from_f64(-value)),
            }
        }
        _ => None,
    }
}

/// Whether the item derives a trait with the given name
fn derives(attrs: &[syn::Attribute], trait_name: &str) -> bool {
    let mut found = false;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta
                .path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == trait_name)
            {
                found = true;
            }
            Ok(())
        });
        if let Err(err) = parsed {
            debug!("Unreadable derive attribute: {}", err);
        }
    }
    found
}

/// Consume the value or nested list of a meta item that is not interpreted
fn skip_meta(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta(&inner))?;
    }
    Ok(())
}

/// Validation rules of a field, from `#[validate(...)]` attributes
fn validation_rules(attrs: &[syn::Attribute]) -> Vec<FieldRule> {
    let mut rules = Vec::new();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("validate")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("length") {
                let mut bounds: (Option<u64>, Option<u64>) = (None, None);
                meta.parse_nested_meta(|bound| {
                    let expr: syn::Expr = bound.value()?.parse()?;
                    let value = integer_literal(&expr).and_then(|v| u64::try_from(v).ok());
                    if bound.path.is_ident("min") {
                        bounds.0 = value;
                    } else if bound.path.is_ident("max") {
                        bounds.1 = value;
                    } else if bound.path.is_ident("equal") {
                        bounds = (value, value);
                    }
                    Ok(())
                })?;
                rules.push(FieldRule::length(bounds.0, bounds.1));
            } else if meta.path.is_ident("range") {
                let mut rule = FieldRule::range(None, None);
                meta.parse_nested_meta(|bound| {
                    let expr: syn::Expr = bound.value()?.parse()?;
                    let value = number_literal(&expr);
                    if let FieldRule::Range {
                        min,
                        max,
                        exclusive_min,
                        exclusive_max,
                    } = &mut rule
                    {
                        if bound.path.is_ident("min") {
                            *min = value;
                        } else if bound.path.is_ident("max") {
                            *max = value;
                        } else if bound.path.is_ident("exclusive_min") {
                            *exclusive_min = value;
                        } else if bound.path.is_ident("exclusive_max") {
                            *exclusive_max = value;
                        }
                    }
                    Ok(())
                })?;
                rules.push(rule);
            } else if meta.path.is_ident("email") {
                rules.push(FieldRule::Format("email".to_string()));
                skip_meta(&meta)?;
            } else if meta.path.is_ident("url") {
                rules.push(FieldRule::Format("uri".to_string()));
                skip_meta(&meta)?;
            } else {
                skip_meta(&meta)?;
            }
            Ok(())
        });
        if let Err(err) = parsed {
            warn!("Could not read validation attribute: {}", err);
        }
    }
    rules
}

/// Serde attributes of a container, field or variant
#[derive(Debug, Clone, Default)]
struct SerdeAttributes {
    /// Renamed field name
    rename: Option<String>,
    rename_all: Option<RenameRule>,
    /// Whether to skip this field during serialization
    skip: bool,
    /// Whether to flatten this field
    flatten: bool,
}

impl SerdeAttributes {
    fn parse(attrs: &[syn::Attribute]) -> Self {
        let mut serde_attrs = Self::default();

        for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") && meta.input.peek(syn::Token![=]) {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    serde_attrs.rename = Some(value.value());
                } else if meta.path.is_ident("rename_all") && meta.input.peek(syn::Token![=]) {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    serde_attrs.rename_all = RenameRule::from_str(&value.value());
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    serde_attrs.skip = true;
                } else if meta.path.is_ident("flatten") {
                    serde_attrs.flatten = true;
                } else {
                    skip_meta(&meta)?;
                }
                Ok(())
            });
            if let Err(err) = parsed {
                debug!("Unreadable serde attribute: {}", err);
            }
        }

        serde_attrs
    }
}

/// Case conversions of `#[serde(rename_all = "...")]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn from_str(rule: &str) -> Option<Self> {
        match rule {
            "lowercase" => Some(RenameRule::Lower),
            "UPPERCASE" => Some(RenameRule::Upper),
            "PascalCase" => Some(RenameRule::Pascal),
            "camelCase" => Some(RenameRule::Camel),
            "snake_case" => Some(RenameRule::Snake),
            "SCREAMING_SNAKE_CASE" => Some(RenameRule::ScreamingSnake),
            "kebab-case" => Some(RenameRule::Kebab),
            "SCREAMING-KEBAB-CASE" => Some(RenameRule::ScreamingKebab),
            _ => {
                warn!("Unknown serde rename rule {}", rule);
                None
            }
        }
    }

    /// Apply to a PascalCase variant name
    fn apply_to_variant(&self, variant: &str) -> String {
        match self {
            RenameRule::Pascal => variant.to_string(),
            RenameRule::Lower => variant.to_ascii_lowercase(),
            RenameRule::Upper => variant.to_ascii_uppercase(),
            RenameRule::Camel => {
                let mut chars = variant.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            }
            _ => {
                let mut snake = String::new();
                for (index, ch) in variant.char_indices() {
                    if index > 0 && ch.is_uppercase() {
                        snake.push('_');
                    }
                    snake.push(ch.to_ascii_lowercase());
                }
                self.apply_to_field(&snake)
            }
        }
    }

    /// Apply to a snake_case field name
    fn apply_to_field(&self, field: &str) -> String {
        match self {
            RenameRule::Lower | RenameRule::Snake => field.to_string(),
            RenameRule::Upper | RenameRule::ScreamingSnake => field.to_ascii_uppercase(),
            RenameRule::Pascal => field
                .split('_')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                        None => String::new(),
                    }
                })
                .collect(),
            RenameRule::Camel => {
                let pascal = RenameRule::Pascal.apply_to_field(field);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            }
            RenameRule::Kebab => field.replace('_', "-"),
            RenameRule::ScreamingKebab => field.replace('_', "-").to_ascii_uppercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnumMembers, RecordModel};
    use pretty_assertions::assert_eq;

    fn catalog_from(module: &str, source: &str) -> SourceCatalog {
        let mut catalog = SourceCatalog::new();
        catalog.add_source(module, source).unwrap();
        catalog
    }

    fn record(ty: &TypeDescription) -> &RecordType {
        match ty {
            TypeDescription::Record(record) => record,
            other => panic!("Expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_describe_primitives_and_containers() {
        let mut catalog = SourceCatalog::new();
        let cases = vec![
            ("String", TypeDescription::Scalar(ScalarKind::String)),
            ("&str", TypeDescription::Scalar(ScalarKind::String)),
            ("u32", TypeDescription::Scalar(ScalarKind::Int64)),
            ("i16", TypeDescription::Scalar(ScalarKind::Int32)),
            ("f64", TypeDescription::Scalar(ScalarKind::Float64)),
            ("uuid::Uuid", TypeDescription::Scalar(ScalarKind::Uuid)),
            ("chrono::DateTime<Utc>", TypeDescription::Scalar(ScalarKind::DateTime)),
            ("()", TypeDescription::Absent),
            ("serde_json::Value", TypeDescription::Any),
            (
                "Option<bool>",
                TypeDescription::optional(TypeDescription::Scalar(ScalarKind::Boolean)),
            ),
            (
                "Json<Vec<i64>>",
                TypeDescription::list_of(TypeDescription::Scalar(ScalarKind::Int64)),
            ),
            (
                "Result<Json<String>, AppError>",
                TypeDescription::Scalar(ScalarKind::String),
            ),
            (
                "HashMap<String, i32>",
                TypeDescription::Opaque("HashMap".to_string()),
            ),
            ("Widget", TypeDescription::Opaque("Widget".to_string())),
        ];

        for (source, expected) in cases {
            assert_eq!(catalog.describe_str(source).unwrap(), expected, "{}", source);
        }

        match catalog.describe_str("HashSet<String>").unwrap() {
            TypeDescription::Iterable { kind, element } => {
                assert_eq!(kind, IterableKind::Set);
                assert_eq!(
                    element.as_deref(),
                    Some(&TypeDescription::Scalar(ScalarKind::String))
                );
            }
            other => panic!("Expected set, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_type_string() {
        let mut catalog = SourceCatalog::new();
        assert!(matches!(
            catalog.describe_str("Vec<"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_struct_with_serde_attributes() {
        let mut catalog = catalog_from(
            "",
            r#"
            #[derive(Serialize)]
            #[serde(rename_all = "camelCase")]
            pub struct User {
                pub user_id: u64,
                #[serde(rename = "fullName")]
                pub name: String,
                #[serde(skip)]
                pub password_hash: String,
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub email: Option<String>,
            }
            "#,
        );

        let ty = catalog.describe_str("User").unwrap();
        let user = record(&ty);
        assert_eq!(user.model, RecordModel::Plain);
        let names: Vec<&str> = user.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["userId", "fullName", "email"]);
        assert_eq!(
            user.fields[2].ty,
            TypeDescription::optional(TypeDescription::Scalar(ScalarKind::String))
        );
    }

    #[test]
    fn test_validated_struct_rules() {
        let mut catalog = catalog_from(
            "",
            r#"
            #[derive(Deserialize, validator::Validate)]
            pub struct SignUp {
                #[validate(length(min = 3, max = 32))]
                pub username: String,
                #[validate(email)]
                pub email: String,
                #[validate(range(min = 18, max = 130), custom(function = "check_age"))]
                pub age: u8,
                #[validate(range(exclusive_min = -1.5))]
                pub balance: f64,
            }
            "#,
        );

        let ty = catalog.describe_str("Json<SignUp>").unwrap();
        let signup = record(&ty);
        assert_eq!(signup.model, RecordModel::Validated);
        assert_eq!(signup.fields[0].rules, vec![FieldRule::length(Some(3), Some(32))]);
        assert_eq!(
            signup.fields[1].rules,
            vec![FieldRule::Format("email".to_string())]
        );
        assert_eq!(
            signup.fields[2].rules,
            vec![FieldRule::range(Some(18.into()), Some(130.into()))]
        );
        assert_eq!(
            signup.fields[3].rules,
            vec![FieldRule::exclusive_range(Number::from_f64(-1.5), None)]
        );
    }

    #[test]
    fn test_generic_struct_instantiation() {
        let mut catalog = catalog_from(
            "",
            r#"
            pub struct Page<T> {
                pub items: Vec<T>,
                pub total: u64,
            }
            pub struct User { pub id: u64 }
            "#,
        );

        match catalog.describe_str("Page<User>").unwrap() {
            TypeDescription::Generic { base, args } => {
                assert_eq!(base.type_parameters(), &["T".to_string()]);
                assert_eq!(
                    base.fields[0].ty,
                    TypeDescription::list_of(TypeDescription::Parameter("T".to_string()))
                );
                assert_eq!(record(&args[0]).name, "User");
            }
            other => panic!("Expected generic, got {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_becomes_forward_ref() {
        let mut catalog = catalog_from(
            "",
            r#"
            pub struct Category {
                pub name: String,
                pub parent: Option<Box<Category>>,
            }
            "#,
        );

        let ty = catalog.describe_str("Category").unwrap();
        assert_eq!(
            record(&ty).fields[1].ty,
            TypeDescription::optional(TypeDescription::ForwardRef("Category".to_string()))
        );
        // cached: the same shared record on every use
        match (&ty, &catalog.describe_str("Category").unwrap()) {
            (TypeDescription::Record(first), TypeDescription::Record(second)) => {
                assert!(Arc::ptr_eq(first, second))
            }
            _ => panic!("Expected records"),
        }
    }

    #[test]
    fn test_enums() {
        let mut catalog = catalog_from(
            "",
            r#"
            pub enum Priority { Low = 1, Medium = 2, High = 3 }

            #[serde(rename_all = "snake_case")]
            pub enum OrderStatus { Pending, InTransit, #[serde(rename = "done")] Delivered }

            pub enum Event { Created { id: u64 }, Deleted(u64) }
            "#,
        );

        match catalog.describe_str("Priority").unwrap() {
            TypeDescription::Enum(priority) => {
                assert_eq!(priority.members, EnumMembers::Integer(vec![1, 2, 3]))
            }
            other => panic!("Expected enum, got {:?}", other),
        }
        match catalog.describe_str("OrderStatus").unwrap() {
            TypeDescription::Enum(status) => assert_eq!(
                status.members,
                EnumMembers::Text(vec![
                    "pending".to_string(),
                    "in_transit".to_string(),
                    "done".to_string()
                ])
            ),
            other => panic!("Expected enum, got {:?}", other),
        }
        assert_eq!(
            catalog.describe_str("Event").unwrap(),
            TypeDescription::Opaque("Event".to_string())
        );
    }

    #[test]
    fn test_modules_and_qualified_lookup() {
        let mut catalog = catalog_from(
            "",
            r#"
            pub mod billing {
                pub struct Item { pub price: f64 }
                pub struct Invoice { pub items: Vec<Item> }
            }
            pub mod catalog {
                pub struct Item { pub sku: String }
            }
            "#,
        );

        let invoice = catalog.describe_str("billing::Invoice").unwrap();
        let invoice = record(&invoice);
        assert_eq!(invoice.path, "billing::Invoice");
        match &invoice.fields[0].ty {
            TypeDescription::Iterable {
                element: Some(element),
                ..
            } => assert_eq!(record(element).path, "billing::Item"),
            other => panic!("Expected list, got {:?}", other),
        }

        let item = catalog.describe_str("crate::catalog::Item").unwrap();
        assert_eq!(record(&item).path, "catalog::Item");
    }

    #[test]
    fn test_newtype_struct() {
        let mut catalog = catalog_from("", "pub struct UserId(uuid::Uuid);");
        assert_eq!(
            catalog.describe_str("UserId").unwrap(),
            TypeDescription::Scalar(ScalarKind::Uuid)
        );
    }

    #[test]
    fn test_namespace_contains_every_type() {
        let mut catalog = catalog_from(
            "shop",
            r#"
            pub struct User { pub id: u64 }
            pub enum Role { Admin, Member }
            "#,
        );

        let namespace = catalog.namespace();
        assert!(namespace.get("shop::User").is_some());
        assert!(namespace.get("User").is_some());
        assert!(namespace.get("Role").is_some());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_function_docstrings() {
        let catalog = catalog_from(
            "",
            r#"
            /// Get a user.
            ///
            /// # Arguments
            ///
            /// * `id` - The user id
            pub async fn get_user(id: u64) {}

            pub fn undocumented() {}
            "#,
        );

        let docstring = catalog.docstring("get_user").unwrap();
        assert_eq!(docstring.summary.as_deref(), Some("Get a user."));
        assert_eq!(docstring.parameters["id"].description, "The user id");
        assert!(catalog.docstring("undocumented").is_none());
        assert!(catalog.docstring("missing").is_none());
    }

    #[test]
    fn test_rename_rules() {
        assert_eq!(RenameRule::Snake.apply_to_variant("InTransit"), "in_transit");
        assert_eq!(
            RenameRule::ScreamingKebab.apply_to_variant("InTransit"),
            "IN-TRANSIT"
        );
        assert_eq!(RenameRule::Camel.apply_to_variant("InTransit"), "inTransit");
        assert_eq!(RenameRule::Pascal.apply_to_field("created_at"), "CreatedAt");
        assert_eq!(RenameRule::Camel.apply_to_field("created_at"), "createdAt");
        assert_eq!(RenameRule::Kebab.apply_to_field("created_at"), "created-at");
    }
}
