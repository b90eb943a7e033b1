//! Route manifests.
//!
//! A manifest snapshots what the routing layer knows about an application: the registered routes,
//! how each handler reads its parameters and the documentation attached to each endpoint. Type names
//! in a manifest are Rust type expressions, described through a [`SourceCatalog`].
//!
//! Status codes are map keys and must be quoted in YAML (`"200": OK`).

use crate::catalog::SourceCatalog;
use crate::document::{Info, ParameterLocation, Response, Server};
use crate::error::{Error, Result};
use crate::openapi_builder::DocsConfig;
use crate::routes::{
    Binder, BinderKind, ContentInfo, EndpointDocs, ExampleInfo, HandlerInfo, HeaderInfo,
    HttpMethod, ParameterInfo, RequestBodyInfo, ResponseInfo, RouteInfo, DEFAULT_CONTENT_TYPE,
};
use crate::types::TypeDescription;
use anyhow::Context;
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A route manifest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub info: Option<Info>,
    pub servers: Vec<Server>,
    pub options: ManifestOptions,
    pub common_responses: IndexMap<String, Response>,
    pub routes: Vec<RouteEntry>,
}

/// Generation options; unset values keep the [`DocsConfig`] defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ManifestOptions {
    pub handle_optional_response_with_404: Option<bool>,
    pub use_docstrings: Option<bool>,
    pub reserved_parameter_names: Option<Vec<String>>,
    pub default_content_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteEntry {
    pub method: String,
    pub path: String,
    pub handler: String,
    /// Return type of the handler; `None` when the handler has no annotation
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default)]
    pub binders: Vec<BinderEntry>,
    #[serde(default)]
    pub docs: Option<DocsEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinderEntryKind {
    Path,
    Query,
    Header,
    Cookie,
    Body,
    Service,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinderEntry {
    pub name: String,
    pub kind: BinderEntryKind,
    /// Expected type; unconstrained when omitted
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    /// Body content type, the configured default when omitted
    #[serde(default)]
    pub content_type: Option<String>,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocsEntry {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub parameters: IndexMap<String, ParameterEntry>,
    pub request_body: Option<RequestBodyEntry>,
    pub responses: IndexMap<String, ResponseEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParameterEntry {
    pub description: String,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub required: Option<bool>,
    #[serde(rename = "in")]
    pub source: Option<ParameterLocation>,
    pub example: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestBodyEntry {
    pub description: Option<String>,
    pub examples: Vec<ExampleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExampleEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub value: Value,
}

/// A documented response: a bare description or a detailed entry
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResponseEntry {
    Description(String),
    Detailed(DetailedResponse),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailedResponse {
    pub description: String,
    #[serde(default)]
    pub content: Vec<ContentEntry>,
    #[serde(default)]
    pub headers: IndexMap<String, HeaderEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub examples: Vec<ExampleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderEntry {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
}

impl Manifest {
    /// Load a manifest file, as JSON for `.json` files and as YAML otherwise
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        debug!("Loading manifest: {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let manifest = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        };
        manifest.with_context(|| format!("Invalid manifest: {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Generation settings described by the manifest
    pub fn config(&self) -> DocsConfig {
        let mut config = DocsConfig::default();
        if let Some(info) = &self.info {
            config.info = info.clone();
        }
        config.servers = self.servers.clone();
        config.common_responses = self.common_responses.clone();

        let options = &self.options;
        if let Some(value) = options.handle_optional_response_with_404 {
            config.handle_optional_response_with_404 = value;
        }
        if let Some(value) = options.use_docstrings {
            config.use_docstrings = value;
        }
        if let Some(names) = &options.reserved_parameter_names {
            config.reserved_parameter_names = names.clone();
        }
        if let Some(content_type) = &options.default_content_type {
            config.default_content_type = content_type.clone();
        }
        config
    }

    /// Describe every route, resolving type names through the catalog
    ///
    /// Handlers found in the catalog get their doc comments attached.
    pub fn routes(&self, catalog: &mut SourceCatalog) -> Result<Vec<RouteInfo>> {
        let default_content_type = self
            .options
            .default_content_type
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_TYPE);

        self.routes
            .iter()
            .map(|entry| route_info(entry, catalog, default_content_type))
            .collect()
    }
}

fn route_info(
    entry: &RouteEntry,
    catalog: &mut SourceCatalog,
    default_content_type: &str,
) -> Result<RouteInfo> {
    let method: HttpMethod = entry.method.parse()?;
    let mut handler = HandlerInfo::new(&entry.handler);

    if let Some(returns) = &entry.returns {
        handler.return_type = Some(describe(catalog, returns, &entry.handler)?);
    }

    for binder in &entry.binders {
        let kind = match binder.kind {
            BinderEntryKind::Path => BinderKind::Path,
            BinderEntryKind::Query => BinderKind::Query,
            BinderEntryKind::Header => BinderKind::Header,
            BinderEntryKind::Cookie => BinderKind::Cookie,
            BinderEntryKind::Service => BinderKind::Service,
            BinderEntryKind::Body => BinderKind::Body {
                content_type: binder
                    .content_type
                    .clone()
                    .unwrap_or_else(|| default_content_type.to_string()),
            },
        };
        let expected_type = match &binder.ty {
            Some(ty) => describe(catalog, ty, &entry.handler)?,
            None => TypeDescription::Any,
        };

        let mut described = Binder::new(&binder.name, kind, expected_type);
        described.required = binder.required;
        described.default = binder.default.clone();
        handler.binders.push(described);
    }

    if let Some(docs) = &entry.docs {
        handler.docs = Some(endpoint_docs(docs, catalog, &entry.handler, default_content_type)?);
    }

    if let Some(docstring) = catalog.docstring(&entry.handler) {
        handler.docstring = Some(docstring);
    }

    debug!(
        "Manifest route {} {} -> {} ({} binders)",
        method,
        entry.path,
        entry.handler,
        handler.binders.len()
    );
    Ok(RouteInfo::new(method, &entry.path, handler))
}

fn endpoint_docs(
    docs: &DocsEntry,
    catalog: &mut SourceCatalog,
    handler: &str,
    default_content_type: &str,
) -> Result<EndpointDocs> {
    let mut parameters = IndexMap::new();
    for (name, parameter) in &docs.parameters {
        let value_type = match &parameter.ty {
            Some(ty) => Some(describe(catalog, ty, handler)?),
            None => None,
        };
        parameters.insert(
            name.clone(),
            ParameterInfo {
                description: parameter.description.clone(),
                value_type,
                required: parameter.required,
                source: parameter.source,
                example: parameter.example.clone(),
            },
        );
    }

    let mut responses = IndexMap::new();
    for (status, response) in &docs.responses {
        let info = match response {
            ResponseEntry::Description(description) => ResponseInfo::from(description.as_str()),
            ResponseEntry::Detailed(detailed) => {
                let mut content = Vec::with_capacity(detailed.content.len());
                for entry in &detailed.content {
                    content.push(ContentInfo {
                        ty: describe(catalog, &entry.ty, handler)?,
                        content_type: entry
                            .content_type
                            .clone()
                            .unwrap_or_else(|| default_content_type.to_string()),
                        examples: examples(&entry.examples),
                    });
                }
                let mut headers = IndexMap::new();
                for (name, header) in &detailed.headers {
                    headers.insert(
                        name.clone(),
                        HeaderInfo {
                            description: header.description.clone(),
                            ty: describe(catalog, &header.ty, handler)?,
                        },
                    );
                }
                ResponseInfo {
                    description: detailed.description.clone(),
                    content,
                    headers,
                }
            }
        };
        responses.insert(status.clone(), info);
    }

    Ok(EndpointDocs {
        summary: docs.summary.clone(),
        description: docs.description.clone(),
        parameters,
        request_body: docs.request_body.as_ref().map(|body| RequestBodyInfo {
            description: body.description.clone(),
            examples: examples(&body.examples),
        }),
        responses,
        tags: docs.tags.clone(),
        deprecated: docs.deprecated,
        on_created: None,
    })
}

fn examples(entries: &[ExampleEntry]) -> Vec<ExampleInfo> {
    entries
        .iter()
        .map(|entry| ExampleInfo {
            name: entry.name.clone(),
            summary: entry.summary.clone(),
            description: entry.description.clone(),
            value: entry.value.clone(),
        })
        .collect()
}

fn describe(catalog: &mut SourceCatalog, ty: &str, handler: &str) -> Result<TypeDescription> {
    catalog.describe_str(ty).map_err(|err| {
        Error::InvalidArgument(format!("type {:?} of handler {}: {}", ty, handler, err))
    })
}
