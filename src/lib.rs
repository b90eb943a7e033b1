//! routedoc - OpenAPI documents from route metadata and the Rust types handlers exchange.
//!
//! The core of the crate is a type-to-schema resolution engine: a [`TypeDescription`] of any
//! handler input or output is turned into an inline schema or a reference to a named component
//! schema, registering records, enums and generic instantiations exactly once per document.
//!
//! # Architecture
//!
//! 1. [`types`] - Language-neutral description of types: scalars, records, enums, generics
//! 2. [`field_extractor`] - Strategies reading the fields of record types
//! 3. [`registry`] - Component schema registry with collision-free naming
//! 4. [`type_resolver`] - Resolves type descriptions into schemas or references
//! 5. [`operation_builder`] - Builds one operation from a route, its binders and its docs
//! 6. [`openapi_builder`] - Assembles the document for a snapshot of routes
//! 7. [`catalog`] - Describes Rust types found in source files
//! 8. [`manifest`] - Route manifests listing routes, binders and endpoint docs
//! 9. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use routedoc::{
//!     catalog::SourceCatalog,
//!     manifest::Manifest,
//!     openapi_builder::OpenApiBuilder,
//!     serializer::serialize_yaml,
//! };
//! use std::path::Path;
//!
//! let manifest = Manifest::load(Path::new("routes.yaml")).unwrap();
//!
//! let mut catalog = SourceCatalog::new();
//! catalog
//!     .add_source("", "pub struct User { pub id: u64, pub name: String }")
//!     .unwrap();
//!
//! let routes = manifest.routes(&mut catalog).unwrap();
//! let builder = OpenApiBuilder::new(manifest.config()).with_namespace(catalog.namespace());
//! let document = builder.generate(&routes).unwrap();
//!
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.
//!
//! [`TypeDescription`]: types::TypeDescription

pub mod catalog;
pub mod cli;
pub mod docstring;
pub mod document;
pub mod error;
pub mod field_extractor;
pub mod manifest;
pub mod openapi_builder;
pub mod operation_builder;
pub mod parser;
pub mod registry;
pub mod routes;
pub mod scanner;
pub mod schema;
pub mod serializer;
pub mod type_resolver;
pub mod types;
pub mod validation;
