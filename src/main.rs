//! routedoc - Command-line tool generating OpenAPI documentation.
//!
//! Reads a route manifest, describes the types it names from the application's sources and writes
//! an OpenAPI 3 document.
//!
//! # Usage
//!
//! ```bash
//! routedoc [OPTIONS] <MANIFEST>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! routedoc routes.yaml -s ./my-service/src -o openapi.yaml
//! ```
//!
//! Generate JSON documentation without 404 responses for optional results:
//! ```bash
//! routedoc routes.yaml -s ./my-service/src -f json --no-404 -o openapi.json
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! routedoc routes.yaml -s ./my-service/src -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use routedoc::cli;

fn main() -> Result<()> {
    // Parse first so the verbose flag can pick the log level
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("routedoc starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
