use crate::document::{
    Example, Header, MediaType, Operation, Parameter, ParameterLocation, RequestBody, Response,
};
use crate::error::{Error, Result};
use crate::openapi_builder::DocsConfig;
use crate::routes::{
    BinderKind, ContentInfo, EndpointDocs, ExampleInfo, HandlerInfo, HeaderInfo, ParameterInfo,
    RequestBodyInfo, ResponseInfo, RouteInfo,
};
use crate::schema::Schema;
use crate::type_resolver::{optional_inner, TypeResolver};
use crate::types::TypeDescription;
use indexmap::IndexMap;
use log::debug;

/// Builds the operation of one route
///
/// Documentation overrides are merged with the handler's doc comments once, on construction, into
/// a private copy; the route itself is never modified.
pub struct OperationBuilder<'a> {
    route: &'a RouteInfo,
    config: &'a DocsConfig,
    resolver: &'a mut TypeResolver,
    docs: Option<EndpointDocs>,
}

impl<'a> OperationBuilder<'a> {
    pub fn new(route: &'a RouteInfo, config: &'a DocsConfig, resolver: &'a mut TypeResolver) -> Self {
        let docs = merged_docs(&route.handler, config);
        Self {
            route,
            config,
            resolver,
            docs,
        }
    }

    pub fn route(&self) -> &RouteInfo {
        self.route
    }

    pub fn config(&self) -> &DocsConfig {
        self.config
    }

    /// Documentation overrides after the doc comment merge
    pub fn docs(&self) -> Option<&EndpointDocs> {
        self.docs.as_ref()
    }

    /// Build the operation and run the route's `on_created` hook on it
    pub fn build(mut self) -> Result<Operation> {
        debug!(
            "Building operation for {} {}",
            self.route.method, self.route.path
        );

        let parameters = self.parameters()?;
        let request_body = self.request_body()?;
        let responses = self.responses()?;

        let docs = self.docs.as_ref();
        let mut operation = Operation {
            tags: docs.map(|d| d.tags.clone()).unwrap_or_default(),
            summary: docs.and_then(|d| d.summary.clone()),
            description: docs.and_then(|d| d.description.clone()),
            operation_id: Some(self.route.handler.name.clone()),
            parameters,
            request_body,
            responses,
            deprecated: docs.filter(|d| d.deprecated).map(|_| true),
        };

        if let Some(hook) = docs.and_then(|d| d.on_created.clone()) {
            hook.call(&self, &mut operation);
        }
        Ok(operation)
    }

    /// Parameters from the documentable binders, then from overrides that match no binder
    pub fn parameters(&mut self) -> Result<Vec<Parameter>> {
        let mut parameters: IndexMap<String, Parameter> = IndexMap::new();
        let overrides = self
            .docs
            .as_ref()
            .map(|docs| docs.parameters.clone())
            .unwrap_or_default();

        for binder in &self.route.handler.binders {
            let Some(location) = binder.kind.location() else {
                continue;
            };
            if self.config.is_reserved(&binder.parameter_name) {
                continue;
            }

            let required = match location {
                ParameterLocation::Path => true,
                _ => binder.required && binder.default.is_none(),
            };
            let info = overrides.get(&binder.parameter_name);

            parameters.insert(
                binder.parameter_name.clone(),
                Parameter {
                    name: binder.parameter_name.clone(),
                    location,
                    description: info.map(|info| info.description.clone()),
                    required: required.then_some(true),
                    deprecated: None,
                    schema: self.resolver.resolve(&binder.expected_type, None)?,
                    example: info.and_then(|info| info.example.clone()),
                },
            );
        }

        for (name, info) in &overrides {
            if parameters.contains_key(name) {
                continue;
            }
            let schema = match &info.value_type {
                Some(ty) => self.resolver.resolve(ty, None)?,
                None => Schema::default().into(),
            };
            parameters.insert(
                name.clone(),
                Parameter {
                    name: name.clone(),
                    location: info.source.unwrap_or(ParameterLocation::Query),
                    description: Some(info.description.clone()),
                    required: info.required,
                    deprecated: None,
                    schema,
                    example: info.example.clone(),
                },
            );
        }

        Ok(parameters.into_values().collect())
    }

    /// Request body from the first body binder
    pub fn request_body(&mut self) -> Result<Option<RequestBody>> {
        let binder = self
            .route
            .handler
            .binders
            .iter()
            .find(|binder| binder.kind.is_body());
        let Some(binder) = binder else {
            return Ok(None);
        };
        let content_type = match &binder.kind {
            BinderKind::Body { content_type } => content_type.clone(),
            _ => self.config.default_content_type.clone(),
        };

        let body_info = self.docs.as_ref().and_then(|docs| docs.request_body.as_ref());
        let mut media_type = media_type_examples(
            body_info.map(|info| info.examples.as_slice()).unwrap_or(&[]),
        );
        media_type.schema = Some(self.resolver.resolve(&binder.expected_type, None)?);
        let description = body_info.and_then(|info| info.description.clone());

        let mut content = IndexMap::new();
        content.insert(content_type, media_type);

        Ok(Some(RequestBody {
            description,
            content,
            required: binder.required,
        }))
    }

    /// Common responses, overlaid with documented or inferred ones
    pub fn responses(&mut self) -> Result<IndexMap<String, Response>> {
        let mut responses = self.config.common_responses.clone();

        let documented = self
            .docs
            .as_ref()
            .map(|docs| docs.responses.clone())
            .filter(|responses| !responses.is_empty());

        let data = match documented {
            Some(documented) => documented,
            None => match &self.route.handler.return_type {
                Some(return_type) => self.inferred_responses(return_type)?,
                None => return Ok(responses),
            },
        };

        for (status, info) in data {
            let response = Response {
                description: info.description.clone(),
                headers: self.headers(&info.headers)?,
                content: self.content(&info.content)?,
            };
            responses.insert(status, response);
        }
        Ok(responses)
    }

    fn inferred_responses(
        &self,
        return_type: &TypeDescription,
    ) -> Result<IndexMap<String, ResponseInfo>> {
        let mut data = IndexMap::new();
        if return_type.is_absent() {
            data.insert("204".to_string(), ResponseInfo::from("Success response"));
            return Ok(data);
        }

        let inner = optional_inner(return_type)?;
        let child_type = inner.unwrap_or(return_type);
        data.insert(
            "200".to_string(),
            ResponseInfo {
                description: "Success response".to_string(),
                content: vec![ContentInfo::new(child_type.clone())],
                headers: IndexMap::new(),
            },
        );
        if inner.is_some() && self.config.handle_optional_response_with_404 {
            data.insert("404".to_string(), ResponseInfo::from("Object not found"));
        }
        Ok(data)
    }

    fn content(&mut self, content: &[ContentInfo]) -> Result<Option<IndexMap<String, MediaType>>> {
        if content.is_empty() {
            return Ok(None);
        }

        let mut media_types = IndexMap::new();
        for item in content {
            if media_types.contains_key(&item.content_type) {
                return Err(Error::DuplicateContentType(item.content_type.clone()));
            }
            let mut media_type = media_type_examples(&item.examples);
            media_type.schema = Some(self.resolver.resolve(&item.ty, None)?);
            media_types.insert(item.content_type.clone(), media_type);
        }
        Ok(Some(media_types))
    }

    fn headers(
        &mut self,
        headers: &IndexMap<String, HeaderInfo>,
    ) -> Result<Option<IndexMap<String, Header>>> {
        if headers.is_empty() {
            return Ok(None);
        }

        let mut documented = IndexMap::new();
        for (name, info) in headers {
            documented.insert(
                name.clone(),
                Header {
                    description: info.description.clone(),
                    schema: self.resolver.resolve(&info.ty, None)?,
                },
            );
        }
        Ok(Some(documented))
    }
}

/// A single example is written inline, several go into a named map
fn media_type_examples(examples: &[ExampleInfo]) -> MediaType {
    let mut media_type = MediaType::default();
    match examples {
        [] => {}
        [single] => media_type.example = Some(single.value.clone()),
        many => {
            let named = many
                .iter()
                .enumerate()
                .map(|(index, example)| {
                    let name = example
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("example {}", index));
                    let value = Example {
                        summary: example.summary.clone(),
                        description: example.description.clone(),
                        value: example.value.clone(),
                    };
                    (name, value)
                })
                .collect();
            media_type.examples = Some(named);
        }
    }
    media_type
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// Documentation overrides of a handler with its doc comments merged in
///
/// Explicit overrides win; doc comments only fill what is missing.
fn merged_docs(handler: &HandlerInfo, config: &DocsConfig) -> Option<EndpointDocs> {
    let docstring = match &handler.docstring {
        Some(docstring) if config.use_docstrings => docstring,
        _ => return handler.docs.clone(),
    };
    let mut docs = handler.docs.clone().unwrap_or_default();

    if is_blank(&docs.description) && docstring.description.is_some() {
        docs.description = docstring.description.clone();
    }
    if is_blank(&docs.summary) && docstring.summary.is_some() {
        docs.summary = docstring.summary.clone();
    }

    for (name, info) in &docstring.parameters {
        if let Some(explicit) = docs.parameters.get_mut(name) {
            explicit.description = info.description.clone();
            if explicit.value_type.is_none() {
                explicit.value_type = info.value_type.clone();
            }
            continue;
        }

        let binder = handler
            .binders
            .iter()
            .find(|binder| &binder.parameter_name == name);

        if let Some(binder) = binder.filter(|binder| binder.kind.is_body()) {
            debug!(
                "Documenting request body of {} from parameter {}",
                handler.name, binder.parameter_name
            );
            match docs.request_body.as_mut() {
                None => {
                    docs.request_body = Some(RequestBodyInfo {
                        description: Some(info.description.clone()),
                        examples: Vec::new(),
                    })
                }
                Some(body) if is_blank(&body.description) => {
                    body.description = Some(info.description.clone());
                }
                Some(_) => {}
            }
            continue;
        }

        let ignored = binder.is_some_and(|binder| binder.kind.location().is_none())
            || config.is_reserved(name);
        if ignored {
            continue;
        }

        docs.parameters.insert(
            name.clone(),
            ParameterInfo {
                description: info.description.clone(),
                value_type: info.value_type.clone(),
                required: info.required,
                source: Some(info.source.unwrap_or(ParameterLocation::Query)),
                example: None,
            },
        );
    }

    Some(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{
        Binder, DocstringInfo, DocstringParameter, HttpMethod, OperationHook,
    };
    use crate::schema::SchemaType;
    use crate::types::{FieldDecl, RecordType, ScalarKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scalar(kind: ScalarKind) -> TypeDescription {
        TypeDescription::Scalar(kind)
    }

    fn user() -> TypeDescription {
        TypeDescription::record(RecordType::plain(
            "User",
            vec![FieldDecl::new("id", scalar(ScalarKind::Int64))],
        ))
    }

    fn config() -> DocsConfig {
        let mut config = DocsConfig::default();
        config
            .common_responses
            .insert("500".to_string(), Response::new("Internal error"));
        config
    }

    fn build(route: &RouteInfo, config: &DocsConfig) -> Result<Operation> {
        let mut resolver = TypeResolver::new();
        OperationBuilder::new(route, config, &mut resolver).build()
    }

    fn statuses(operation: &Operation) -> Vec<&str> {
        operation.responses.keys().map(String::as_str).collect()
    }

    fn route(handler: HandlerInfo) -> RouteInfo {
        RouteInfo::new(HttpMethod::Get, "/users/:id", handler)
    }

    #[test]
    fn test_returns_nothing_documents_204() {
        let handler = HandlerInfo::new("delete_user").with_return_type(TypeDescription::Absent);
        let operation = build(&route(handler), &config()).unwrap();
        assert_eq!(statuses(&operation), vec!["500", "204"]);
        assert!(operation.responses["204"].content.is_none());
    }

    #[test]
    fn test_optional_return_documents_404() {
        let handler = HandlerInfo::new("find_name")
            .with_return_type(TypeDescription::optional(scalar(ScalarKind::String)));
        let operation = build(&route(handler), &config()).unwrap();

        assert_eq!(statuses(&operation), vec!["500", "200", "404"]);
        assert_eq!(operation.responses["404"].description, "Object not found");

        let content = operation.responses["200"].content.as_ref().unwrap();
        let schema = content["application/json"].schema.as_ref().unwrap();
        assert_eq!(
            schema.as_schema().unwrap().schema_type,
            Some(SchemaType::String)
        );
    }

    #[test]
    fn test_optional_return_without_404_heuristic() {
        let mut config = config();
        config.handle_optional_response_with_404 = false;
        let handler = HandlerInfo::new("find_name")
            .with_return_type(TypeDescription::optional(scalar(ScalarKind::String)));

        let operation = build(&route(handler), &config).unwrap();
        assert_eq!(statuses(&operation), vec!["500", "200"]);
    }

    #[test]
    fn test_concrete_return_documents_200() {
        let handler =
            HandlerInfo::new("get_name").with_return_type(scalar(ScalarKind::String));
        let operation = build(&route(handler), &config()).unwrap();
        assert_eq!(statuses(&operation), vec!["500", "200"]);
    }

    #[test]
    fn test_unannotated_handler_keeps_common_responses() {
        let operation = build(&route(HandlerInfo::new("legacy")), &config()).unwrap();
        assert_eq!(statuses(&operation), vec!["500"]);
        assert_eq!(operation.operation_id.as_deref(), Some("legacy"));
    }

    #[test]
    fn test_explicit_responses_override_common_ones() {
        let mut docs = EndpointDocs::default();
        docs.responses
            .insert("500".to_string(), ResponseInfo::from("Database unavailable"));
        docs.responses
            .insert("200".to_string(), ResponseInfo::from("The user"));
        let handler = HandlerInfo::new("get_user")
            .with_return_type(user())
            .with_docs(docs);

        let operation = build(&route(handler), &config()).unwrap();
        assert_eq!(statuses(&operation), vec!["500", "200"]);
        assert_eq!(operation.responses["500"].description, "Database unavailable");
        assert!(operation.responses["200"].content.is_none());
    }

    #[test]
    fn test_duplicate_content_type_is_rejected() {
        let mut docs = EndpointDocs::default();
        docs.responses.insert(
            "200".to_string(),
            ResponseInfo {
                description: "Ok".to_string(),
                content: vec![ContentInfo::new(user()), ContentInfo::new(user())],
                headers: IndexMap::new(),
            },
        );
        let handler = HandlerInfo::new("get_user").with_docs(docs);

        match build(&route(handler), &config()) {
            Err(Error::DuplicateContentType(content_type)) => {
                assert_eq!(content_type, "application/json")
            }
            other => panic!("Expected DuplicateContentType, got {:?}", other),
        }
    }

    #[test]
    fn test_parameters_from_binders() {
        let handler = HandlerInfo::new("list_users")
            .with_binder(Binder::new("id", BinderKind::Path, scalar(ScalarKind::Int64)))
            .with_binder(
                Binder::new("page", BinderKind::Query, scalar(ScalarKind::Int32))
                    .with_default(json!(1)),
            )
            .with_binder(Binder::new(
                "x_request_id",
                BinderKind::Header,
                scalar(ScalarKind::Uuid),
            ))
            .with_binder(Binder::new(
                "session",
                BinderKind::Cookie,
                scalar(ScalarKind::String),
            ).optional())
            .with_binder(Binder::new("db", BinderKind::Service, TypeDescription::Any));

        let operation = build(&route(handler), &config()).unwrap();
        let summary: Vec<(&str, ParameterLocation, Option<bool>)> = operation
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.location, p.required))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("id", ParameterLocation::Path, Some(true)),
                ("page", ParameterLocation::Query, None),
                ("x_request_id", ParameterLocation::Header, Some(true)),
                ("session", ParameterLocation::Cookie, None),
            ]
        );
    }

    #[test]
    fn test_parameter_overrides_without_binder_are_emitted() {
        let mut docs = EndpointDocs::default();
        docs.parameters.insert(
            "id".to_string(),
            ParameterInfo {
                example: Some(json!(42)),
                ..ParameterInfo::new("User identifier")
            },
        );
        docs.parameters.insert(
            "X-Trace".to_string(),
            ParameterInfo {
                value_type: Some(scalar(ScalarKind::String)),
                source: Some(ParameterLocation::Header),
                required: Some(false),
                ..ParameterInfo::new("Tracing header")
            },
        );
        let handler = HandlerInfo::new("get_user")
            .with_binder(Binder::new("id", BinderKind::Path, scalar(ScalarKind::Int64)))
            .with_docs(docs);

        let operation = build(&route(handler), &config()).unwrap();
        assert_eq!(operation.parameters.len(), 2);

        let id = &operation.parameters[0];
        assert_eq!(id.description.as_deref(), Some("User identifier"));
        assert_eq!(id.example, Some(json!(42)));

        let trace = &operation.parameters[1];
        assert_eq!(trace.location, ParameterLocation::Header);
        assert_eq!(trace.required, Some(false));
        assert_eq!(
            trace.schema.as_schema().unwrap().schema_type,
            Some(SchemaType::String)
        );
    }

    #[test]
    fn test_request_body_with_single_and_many_examples() {
        let body = Binder::new("payload", BinderKind::json_body(), user());

        let mut docs = EndpointDocs::default();
        docs.request_body = Some(RequestBodyInfo {
            description: Some("The new user".to_string()),
            examples: vec![ExampleInfo::new(json!({ "id": 1 }))],
        });
        let handler = HandlerInfo::new("create_user")
            .with_binder(body.clone())
            .with_docs(docs.clone());

        let operation = build(&route(handler), &config()).unwrap();
        let request_body = operation.request_body.unwrap();
        assert!(request_body.required);
        assert_eq!(request_body.description.as_deref(), Some("The new user"));
        let media_type = &request_body.content["application/json"];
        assert_eq!(media_type.example, Some(json!({ "id": 1 })));
        assert_eq!(
            media_type.schema.as_ref().unwrap().as_reference().unwrap().schema_name(),
            "User"
        );

        docs.request_body = Some(RequestBodyInfo {
            description: None,
            examples: vec![
                ExampleInfo {
                    name: Some("admin".to_string()),
                    ..ExampleInfo::new(json!({ "id": 1 }))
                },
                ExampleInfo::new(json!({ "id": 2 })),
            ],
        });
        let handler = HandlerInfo::new("create_user").with_binder(body).with_docs(docs);
        let operation = build(&route(handler), &config()).unwrap();
        let media_type = &operation.request_body.unwrap().content["application/json"];
        let names: Vec<&String> = media_type.examples.as_ref().unwrap().keys().collect();
        assert_eq!(names, vec!["admin", "example 1"]);
        assert!(media_type.example.is_none());
    }

    #[test]
    fn test_docstring_merge() {
        let mut docs = EndpointDocs::default();
        docs.summary = Some("Explicit summary".to_string());
        docs.parameters
            .insert("id".to_string(), ParameterInfo::new("old description"));

        let mut docstring = DocstringInfo {
            summary: Some("Docstring summary".to_string()),
            description: Some("Docstring description".to_string()),
            ..DocstringInfo::default()
        };
        for (name, description) in [
            ("id", "The user id"),
            ("payload", "User data"),
            ("db", "Database service"),
            ("request", "Raw request"),
            ("verbose", "Verbose output"),
        ] {
            docstring.parameters.insert(
                name.to_string(),
                DocstringParameter {
                    description: description.to_string(),
                    ..DocstringParameter::default()
                },
            );
        }

        let handler = HandlerInfo::new("update_user")
            .with_binder(Binder::new("id", BinderKind::Path, scalar(ScalarKind::Int64)))
            .with_binder(Binder::new("payload", BinderKind::json_body(), user()))
            .with_binder(Binder::new("db", BinderKind::Service, TypeDescription::Any))
            .with_docs(docs)
            .with_docstring(docstring);
        let route = route(handler);
        let config = config();

        let mut resolver = TypeResolver::new();
        let builder = OperationBuilder::new(&route, &config, &mut resolver);
        let merged = builder.docs().unwrap();
        assert_eq!(merged.summary.as_deref(), Some("Explicit summary"));
        assert_eq!(merged.description.as_deref(), Some("Docstring description"));
        assert_eq!(merged.parameters["id"].description, "The user id");
        assert_eq!(
            merged.request_body.as_ref().unwrap().description.as_deref(),
            Some("User data")
        );
        let names: Vec<&String> = merged.parameters.keys().collect();
        assert_eq!(names, vec!["id", "verbose"]);
        assert_eq!(
            merged.parameters["verbose"].source,
            Some(ParameterLocation::Query)
        );

        // the route keeps its original overrides
        let original = route.handler.docs.as_ref().unwrap();
        assert_eq!(original.parameters["id"].description, "old description");
        assert!(original.request_body.is_none());
    }

    #[test]
    fn test_docstrings_can_be_disabled() {
        let docstring = DocstringInfo {
            summary: Some("From comments".to_string()),
            ..DocstringInfo::default()
        };
        let handler = HandlerInfo::new("ping").with_docstring(docstring);
        let mut config = config();
        config.use_docstrings = false;

        let operation = build(&route(handler), &config).unwrap();
        assert!(operation.summary.is_none());
    }

    #[test]
    fn test_on_created_hook_and_metadata() {
        let docs = EndpointDocs {
            tags: vec!["users".to_string()],
            deprecated: true,
            on_created: Some(OperationHook::new(|builder, operation| {
                operation.summary = Some(format!("Handled by {}", builder.route().handler.name));
            })),
            ..EndpointDocs::default()
        };
        let handler = HandlerInfo::new("get_user").with_docs(docs);

        let operation = build(&route(handler), &config()).unwrap();
        assert_eq!(operation.summary.as_deref(), Some("Handled by get_user"));
        assert_eq!(operation.tags, vec!["users"]);
        assert_eq!(operation.deprecated, Some(true));
    }

    #[test]
    fn test_response_headers_are_resolved() {
        let mut headers = IndexMap::new();
        headers.insert(
            "X-Rate-Limit".to_string(),
            HeaderInfo {
                description: Some("Requests left".to_string()),
                ty: scalar(ScalarKind::Int32),
            },
        );
        let mut docs = EndpointDocs::default();
        docs.responses.insert(
            "200".to_string(),
            ResponseInfo {
                description: "Ok".to_string(),
                content: Vec::new(),
                headers,
            },
        );
        let handler = HandlerInfo::new("get_user").with_docs(docs);

        let operation = build(&route(handler), &config()).unwrap();
        let headers = operation.responses["200"].headers.as_ref().unwrap();
        assert_eq!(
            headers["X-Rate-Limit"].schema.as_schema().unwrap().format.as_deref(),
            Some("int32")
        );
    }
}
