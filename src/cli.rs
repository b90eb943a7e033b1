use crate::catalog::SourceCatalog;
use crate::document::OpenApiDocument;
use crate::manifest::Manifest;
use crate::openapi_builder::OpenApiBuilder;
use crate::parser::{AstParser, ParsedFile};
use crate::scanner::FileScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// routedoc - Generate OpenAPI documentation from a route manifest and the Rust types it names
#[derive(Parser, Debug)]
#[command(name = "routedoc")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Route manifest (YAML, or JSON with a .json extension)
    #[arg(value_name = "MANIFEST")]
    pub manifest_path: PathBuf,

    /// Source directory holding the types named in the manifest
    #[arg(short = 's', long = "source", value_name = "DIR")]
    pub source_path: Option<PathBuf>,

    /// Directory names to skip while scanning sources
    #[arg(short = 'x', long = "exclude", value_name = "NAME")]
    pub excludes: Vec<String>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Do not document 404 responses for handlers returning optional values
    #[arg(long = "no-404")]
    pub no_404: bool,

    /// Ignore handler doc comments
    #[arg(long = "no-docstrings")]
    pub no_docstrings: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.manifest_path.is_file() {
        bail!(
            "Manifest does not exist or is not a file: {}",
            args.manifest_path.display()
        );
    }

    if let Some(source) = &args.source_path {
        if !source.is_dir() {
            bail!("Source path is not a directory: {}", source.display());
        }
        info!("Source path: {}", source.display());
    } else {
        info!("Source path: none, only built-in types are known");
    }

    info!("Manifest: {}", args.manifest_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Build the document described by the arguments
pub fn generate(args: &CliArgs) -> Result<OpenApiDocument> {
    info!("Loading manifest...");
    let manifest = Manifest::load(&args.manifest_path)?;
    info!("Manifest lists {} routes", manifest.routes.len());

    let mut catalog = match &args.source_path {
        Some(source) => build_catalog(source, &args.excludes)?,
        None => SourceCatalog::new(),
    };
    info!("Catalog holds {} types", catalog.len());

    info!("Describing routes...");
    let routes = manifest.routes(&mut catalog)?;
    if routes.is_empty() {
        warn!("The manifest lists no routes");
    }

    let mut config = manifest.config();
    if args.no_404 {
        config.handle_optional_response_with_404 = false;
    }
    if args.no_docstrings {
        config.use_docstrings = false;
    }

    info!("Building OpenAPI document...");
    let builder = OpenApiBuilder::new(config).with_namespace(catalog.namespace());
    let (document, warnings) = builder.generate_with_warnings(&routes)?;
    if !warnings.is_empty() {
        info!("{} types were left undocumented", warnings.len());
    }

    let schema_count = document
        .components
        .as_ref()
        .map_or(0, |components| components.schemas.len());
    info!(
        "Documented {} paths and {} component schemas",
        document.paths.len(),
        schema_count
    );
    Ok(document)
}

fn build_catalog(source: &Path, excludes: &[String]) -> Result<SourceCatalog> {
    info!("Scanning source directory...");
    let scanner = excludes
        .iter()
        .fold(FileScanner::new(source.to_path_buf()), |scanner, name| {
            scanner.exclude(name)
        });
    let scan_result = scanner.scan()?;
    info!("Found {} Rust files", scan_result.rust_files.len());

    info!("Parsing Rust files...");
    let parsed_files: Vec<ParsedFile> =
        AstParser::parse_files(scanner.root(), &scan_result.rust_files)
            .into_iter()
            .filter_map(|result| match result {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    debug!("Skipping file due to parse error: {:#}", e);
                    None
                }
            })
            .collect();
    info!("Successfully parsed {} files", parsed_files.len());

    Ok(SourceCatalog::from_files(&parsed_files))
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");
    let document = generate(&args)?;

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    Ok(())
}
