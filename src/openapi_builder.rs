use crate::document::{Components, Info, OpenApiDocument, PathItem, Response, Server, OPENAPI_VERSION};
use crate::error::Result;
use crate::operation_builder::OperationBuilder;
use crate::routes::{RouteInfo, DEFAULT_CONTENT_TYPE};
use crate::type_resolver::TypeResolver;
use crate::types::TypeNamespace;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;
use std::sync::Arc;

/// Settings of document generation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// OpenAPI info section
    pub info: Info,
    pub servers: Vec<Server>,
    /// Responses documented on every operation, like error responses
    pub common_responses: IndexMap<String, Response>,
    /// Document a 404 response for handlers returning an optional value
    pub handle_optional_response_with_404: bool,
    /// Merge handler doc comments into the documentation
    pub use_docstrings: bool,
    /// Handler parameter names never documented as request parameters
    pub reserved_parameter_names: Vec<String>,
    /// Content type of bodies and responses that do not name one
    pub default_content_type: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            info: Info::default(),
            servers: Vec::new(),
            common_responses: IndexMap::new(),
            handle_optional_response_with_404: true,
            use_docstrings: true,
            reserved_parameter_names: vec!["request".to_string(), "services".to_string()],
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl DocsConfig {
    pub fn is_reserved(&self, parameter_name: &str) -> bool {
        self.reserved_parameter_names
            .iter()
            .any(|name| name == parameter_name)
    }
}

/// OpenAPI document builder
///
/// Holds only configuration: every [`generate`](OpenApiBuilder::generate) call creates its own
/// resolver and registry, so one builder can serve concurrent calls.
pub struct OpenApiBuilder {
    config: DocsConfig,
    /// Named types used to evaluate forward references
    namespace: Arc<TypeNamespace>,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with the given settings
    pub fn new(config: DocsConfig) -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            config,
            namespace: Arc::new(TypeNamespace::new()),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.config.info = Info {
            title,
            version,
            description,
        };
        self
    }

    pub fn with_namespace(mut self, namespace: TypeNamespace) -> Self {
        self.namespace = Arc::new(namespace);
        self
    }

    pub fn config(&self) -> &DocsConfig {
        &self.config
    }

    /// Generate the document for a snapshot of the routes
    pub fn generate(&self, routes: &[RouteInfo]) -> Result<OpenApiDocument> {
        Ok(self.generate_with_warnings(routes)?.0)
    }

    /// Generate the document, also returning the types left undocumented and why
    pub fn generate_with_warnings(
        &self,
        routes: &[RouteInfo],
    ) -> Result<(OpenApiDocument, Vec<String>)> {
        debug!("Generating OpenAPI document for {} routes", routes.len());

        let mut resolver = TypeResolver::with_namespace(Arc::clone(&self.namespace));
        let mut paths: IndexMap<String, PathItem> = IndexMap::new();

        for route in routes {
            debug!("Adding route: {} {}", route.method, route.path);

            let operation = OperationBuilder::new(route, &self.config, &mut resolver).build()?;

            let openapi_path = convert_path_format(&route.path);
            let slot = paths.entry(openapi_path).or_default().operation_mut(route.method);
            if slot.is_some() {
                warn!(
                    "Route {} {} is registered more than once, keeping the last handler",
                    route.method, route.path
                );
            }
            *slot = Some(operation);
        }

        let warnings = resolver.warnings().to_vec();
        let schemas = resolver.into_registry().into_schemas();
        let components = if schemas.is_empty() {
            None
        } else {
            Some(Components { schemas })
        };

        let document = OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.config.info.clone(),
            servers: self.config.servers.clone(),
            paths,
            components,
        };
        Ok((document, warnings))
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new(DocsConfig::default())
    }
}

/// Convert path format from :param or {param} to OpenAPI {param} format
pub fn convert_path_format(path: &str) -> String {
    path.split('/')
        .map(|part| match part.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name),
            None => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::routes::{Binder, BinderKind, HandlerInfo, HttpMethod};
    use crate::types::{FieldDecl, RecordType, ScalarKind, TypeDescription};
    use pretty_assertions::assert_eq;

    fn user() -> TypeDescription {
        TypeDescription::record(RecordType::plain(
            "User",
            vec![
                FieldDecl::new("id", TypeDescription::Scalar(ScalarKind::Int64)),
                FieldDecl::new("name", TypeDescription::Scalar(ScalarKind::String)),
            ],
        ))
    }

    fn get_user() -> RouteInfo {
        RouteInfo::new(
            HttpMethod::Get,
            "/users/:id",
            HandlerInfo::new("get_user")
                .with_binder(Binder::new(
                    "id",
                    BinderKind::Path,
                    TypeDescription::Scalar(ScalarKind::Int64),
                ))
                .with_return_type(TypeDescription::optional(user())),
        )
    }

    fn delete_user() -> RouteInfo {
        RouteInfo::new(
            HttpMethod::Delete,
            "/users/{id}",
            HandlerInfo::new("delete_user").with_return_type(TypeDescription::Absent),
        )
    }

    fn create_user() -> RouteInfo {
        RouteInfo::new(
            HttpMethod::Post,
            "/users",
            HandlerInfo::new("create_user")
                .with_binder(Binder::new("payload", BinderKind::json_body(), user()))
                .with_return_type(user()),
        )
    }

    #[test]
    fn test_new_builder() {
        let builder = OpenApiBuilder::default();
        assert_eq!(builder.config().info.title, "Generated API");
        assert!(builder.config().handle_optional_response_with_404);
        assert!(builder.config().is_reserved("services"));
    }

    #[test]
    fn test_with_info() {
        let builder = OpenApiBuilder::default().with_info(
            "Shop".to_string(),
            "2.0.0".to_string(),
            Some("Shop API".to_string()),
        );
        let document = builder.generate(&[]).unwrap();

        assert_eq!(document.info.title, "Shop");
        assert_eq!(document.info.version, "2.0.0");
        assert_eq!(document.info.description.as_deref(), Some("Shop API"));
        assert_eq!(document.openapi, "3.0.3");
    }

    #[test]
    fn test_routes_grouped_by_path() {
        let builder = OpenApiBuilder::default();
        let document = builder
            .generate(&[get_user(), create_user(), delete_user()])
            .unwrap();

        let paths: Vec<&String> = document.paths.keys().collect();
        assert_eq!(paths, vec!["/users/{id}", "/users"]);

        let item = &document.paths["/users/{id}"];
        assert!(item.get.is_some());
        assert!(item.delete.is_some());
        assert!(item.post.is_none());
        assert_eq!(
            item.get.as_ref().unwrap().operation_id.as_deref(),
            Some("get_user")
        );
    }

    #[test]
    fn test_schemas_shared_across_operations() {
        let document = OpenApiBuilder::default()
            .generate(&[get_user(), create_user()])
            .unwrap();

        let schemas = document.components.unwrap().schemas;
        let names: Vec<&String> = schemas.keys().collect();
        assert_eq!(names, vec!["User"]);
    }

    #[test]
    fn test_build_document_no_schemas() {
        let document = OpenApiBuilder::default().generate(&[delete_user()]).unwrap();
        assert!(document.components.is_none());
    }

    #[test]
    fn test_each_generation_starts_fresh() {
        let builder = OpenApiBuilder::default();
        let first = builder.generate(&[create_user()]).unwrap();
        let second = builder.generate(&[create_user()]).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.components.unwrap().schemas.len(), 1);
    }

    #[test]
    fn test_servers_and_common_responses_from_config() {
        let mut config = DocsConfig::default();
        config.servers.push(Server {
            url: "https://api.example.com".to_string(),
            description: None,
        });
        config
            .common_responses
            .insert("500".to_string(), Response::new("Internal error"));

        let document = OpenApiBuilder::new(config).generate(&[delete_user()]).unwrap();
        assert_eq!(document.servers[0].url, "https://api.example.com");

        let operation = document.paths["/users/{id}"].delete.as_ref().unwrap();
        let statuses: Vec<&String> = operation.responses.keys().collect();
        assert_eq!(statuses, vec!["500", "204"]);
    }

    #[test]
    fn test_errors_are_propagated() {
        let route = RouteInfo::new(
            HttpMethod::Get,
            "/broken",
            HandlerInfo::new("broken").with_return_type(TypeDescription::Union(vec![
                TypeDescription::Scalar(ScalarKind::Int32),
                TypeDescription::Scalar(ScalarKind::String),
            ])),
        );
        assert!(matches!(
            OpenApiBuilder::default().generate(&[route]),
            Err(Error::UnsupportedUnionShape(_))
        ));
    }

    #[test]
    fn test_convert_path_format_axum_style() {
        assert_eq!(convert_path_format("/users/:id"), "/users/{id}");
        assert_eq!(
            convert_path_format("/users/:user_id/posts/:post_id"),
            "/users/{user_id}/posts/{post_id}"
        );
    }

    #[test]
    fn test_convert_path_format_actix_style() {
        assert_eq!(convert_path_format("/users/{id}"), "/users/{id}");
    }

    #[test]
    fn test_convert_path_format_no_params() {
        assert_eq!(convert_path_format("/users"), "/users");
        assert_eq!(convert_path_format("/"), "/");
    }
}
