use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Parser turning source files into syntax trees for the [`SourceCatalog`].
///
/// Every file is parsed with `syn` and tagged with the module path it declares, derived from its
/// location below the source root: `src/models/user.rs` holds `models::user`, while `lib.rs`,
/// `main.rs` and `mod.rs` files belong to their parent module.
///
/// # Example
///
/// ```no_run
/// use routedoc::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src"), Path::new("src/models/user.rs")).unwrap();
/// assert_eq!(parsed.module_path, "models::user");
/// ```
///
/// [`SourceCatalog`]: crate::catalog::SourceCatalog
pub struct AstParser;

/// A parsed source file
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    /// Module declared by the file, `""` for the crate root
    pub module_path: String,
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Parse one file below `root`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid Rust.
    pub fn parse_file(root: &Path, path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let syntax_tree = syn::parse_file(&content)
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))?;

        let module_path = module_path(root, path);
        debug!(
            "Parsed {} as module '{}' ({} items)",
            path.display(),
            module_path,
            syntax_tree.items.len()
        );

        Ok(ParsedFile {
            path: path.to_path_buf(),
            module_path,
            syntax_tree,
        })
    }

    /// Parse several files, continuing past failures
    ///
    /// Failures are logged as warnings and returned in place, so a project with a few broken files
    /// still yields a catalog of everything else.
    pub fn parse_files(root: &Path, paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| {
                Self::parse_file(root, path).inspect_err(|e| {
                    warn!("Failed to parse {}: {:#}", path.display(), e);
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

/// Module path of `path` relative to `root`
///
/// A leading `src` directory is not part of the module path.
pub fn module_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);

    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(file) = segments.pop() {
        let stem = file.strip_suffix(".rs").unwrap_or(&file);
        if !matches!(stem, "lib" | "main" | "mod") {
            segments.push(stem.to_string());
        }
    }
    if segments.first().map(String::as_str) == Some("src") {
        segments.remove(0);
    }

    segments.join("::")
}
