//! Route metadata and documentation overrides.
//!
//! This is the snapshot the document builder works from: one [`RouteInfo`] per registered route,
//! with the handler's binders (how each parameter is read from the request), its return type and
//! the optional [`EndpointDocs`] attached by the framework layer.

use crate::document::{Operation, ParameterLocation};
use crate::error::{Error, Result};
use crate::operation_builder::OperationBuilder;
use crate::types::TypeDescription;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Content type used when a body or response does not name one
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// HTTP methods that can carry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    /// Get the HTTP method as an upper-case string
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "OPTIONS" => Ok(HttpMethod::Options),
            "HEAD" => Ok(HttpMethod::Head),
            "TRACE" => Ok(HttpMethod::Trace),
            _ => Err(Error::InvalidArgument(format!("unknown HTTP method {}", s))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered route
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub method: HttpMethod,
    /// The URL path pattern (e.g., "/users/:id" or "/users/{id}")
    pub path: String,
    pub handler: HandlerInfo,
}

impl RouteInfo {
    pub fn new(method: HttpMethod, path: &str, handler: HandlerInfo) -> Self {
        Self {
            method,
            path: path.to_string(),
            handler,
        }
    }
}

/// The handler serving a route
#[derive(Debug, Clone, Default)]
pub struct HandlerInfo {
    /// Handler identifier, used as `operationId`
    pub name: String,
    /// Declared return type; `None` when the handler has no annotation
    pub return_type: Option<TypeDescription>,
    pub binders: Vec<Binder>,
    pub docs: Option<EndpointDocs>,
    /// Documentation read from the handler's doc comments
    pub docstring: Option<DocstringInfo>,
}

impl HandlerInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_return_type(mut self, ty: TypeDescription) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn with_binder(mut self, binder: Binder) -> Self {
        self.binders.push(binder);
        self
    }

    pub fn with_docs(mut self, docs: EndpointDocs) -> Self {
        self.docs = Some(docs);
        self
    }

    pub fn with_docstring(mut self, docstring: DocstringInfo) -> Self {
        self.docstring = Some(docstring);
        self
    }
}

/// Where a binder reads its value from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinderKind {
    Path,
    Query,
    Header,
    Cookie,
    Body { content_type: String },
    /// Injected by the application, never part of the request
    Service,
}

impl BinderKind {
    /// A JSON request body
    pub fn json_body() -> Self {
        BinderKind::Body {
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }

    /// Parameter location of a documentable binder
    pub fn location(&self) -> Option<ParameterLocation> {
        match self {
            BinderKind::Path => Some(ParameterLocation::Path),
            BinderKind::Query => Some(ParameterLocation::Query),
            BinderKind::Header => Some(ParameterLocation::Header),
            BinderKind::Cookie => Some(ParameterLocation::Cookie),
            BinderKind::Body { .. } | BinderKind::Service => None,
        }
    }

    pub fn is_body(&self) -> bool {
        matches!(self, BinderKind::Body { .. })
    }
}

/// How one handler parameter is extracted from the request
#[derive(Debug, Clone, PartialEq)]
pub struct Binder {
    pub parameter_name: String,
    pub expected_type: TypeDescription,
    pub required: bool,
    pub default: Option<Value>,
    pub kind: BinderKind,
}

impl Binder {
    /// Create a required binder without default
    pub fn new(parameter_name: &str, kind: BinderKind, expected_type: TypeDescription) -> Self {
        Self {
            parameter_name: parameter_name.to_string(),
            expected_type,
            required: true,
            default: None,
            kind,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Callback run on every operation created for a route
#[derive(Clone)]
pub struct OperationHook(Arc<dyn Fn(&OperationBuilder<'_>, &mut Operation) + Send + Sync>);

impl OperationHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&OperationBuilder<'_>, &mut Operation) + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub fn call(&self, builder: &OperationBuilder<'_>, operation: &mut Operation) {
        (self.0)(builder, operation)
    }
}

impl fmt::Debug for OperationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OperationHook")
    }
}

/// Documentation of a parameter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterInfo {
    pub description: String,
    /// Schema source for parameters with no binder
    pub value_type: Option<TypeDescription>,
    pub required: Option<bool>,
    /// Location for parameters with no binder, query when unset
    pub source: Option<ParameterLocation>,
    pub example: Option<Value>,
}

impl ParameterInfo {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            ..Self::default()
        }
    }
}

/// A documented example value
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleInfo {
    pub name: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub value: Value,
}

impl ExampleInfo {
    pub fn new(value: Value) -> Self {
        Self {
            name: None,
            summary: None,
            description: None,
            value,
        }
    }
}

/// Documentation of the request body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBodyInfo {
    pub description: Option<String>,
    pub examples: Vec<ExampleInfo>,
}

/// One media type of a documented response
#[derive(Debug, Clone, PartialEq)]
pub struct ContentInfo {
    pub ty: TypeDescription,
    pub content_type: String,
    pub examples: Vec<ExampleInfo>,
}

impl ContentInfo {
    /// JSON content of the given type
    pub fn new(ty: TypeDescription) -> Self {
        Self {
            ty,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            examples: Vec::new(),
        }
    }
}

/// Documentation of a response header
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderInfo {
    pub description: Option<String>,
    pub ty: TypeDescription,
}

/// Documentation of a response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseInfo {
    pub description: String,
    pub content: Vec<ContentInfo>,
    pub headers: IndexMap<String, HeaderInfo>,
}

impl From<&str> for ResponseInfo {
    fn from(description: &str) -> Self {
        Self {
            description: description.to_string(),
            ..Self::default()
        }
    }
}

/// Route-level documentation overrides
#[derive(Debug, Clone, Default)]
pub struct EndpointDocs {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: IndexMap<String, ParameterInfo>,
    pub request_body: Option<RequestBodyInfo>,
    /// Responses by status code
    pub responses: IndexMap<String, ResponseInfo>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub on_created: Option<OperationHook>,
}

/// Documentation extracted from a handler's doc comments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocstringInfo {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: IndexMap<String, DocstringParameter>,
}

/// A parameter described in a doc comment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocstringParameter {
    pub description: String,
    pub value_type: Option<TypeDescription>,
    pub required: Option<bool>,
    pub source: Option<ParameterLocation>,
}
