use anyhow::{bail, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never holding application types
const DEFAULT_EXCLUDES: &[&str] = &["target", "tests", "benches", "examples"];

/// File scanner collecting the Rust sources of a project.
///
/// The scanner walks the source directory recursively and keeps `.rs` files. Hidden directories
/// and the directories in [`DEFAULT_EXCLUDES`] are skipped; more can be added with
/// [`FileScanner::exclude`].
///
/// # Example
///
/// ```no_run
/// use routedoc::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-service/src")).exclude("generated");
/// let result = scanner.scan().unwrap();
/// println!("Found {} Rust files", result.rust_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    excludes: Vec<String>,
}

/// Result of a scan
pub struct ScanResult {
    /// Discovered `.rs` files, sorted by path
    pub rust_files: Vec<PathBuf>,
    /// Paths that could not be read
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            excludes: DEFAULT_EXCLUDES.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Skip directories with this name
    pub fn exclude(mut self, directory: &str) -> Self {
        self.excludes.push(directory.to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Collect the `.rs` files below the root
    ///
    /// Unreadable entries are logged and reported in [`ScanResult::warnings`].
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a directory.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.is_dir() {
            bail!("Source path is not a directory: {}", self.root_path.display());
        }

        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded(e))
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_file()
                        && path.extension().and_then(|s| s.to_str()) == Some("rs")
                    {
                        rust_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        debug!(
            "Scanned {}: {} Rust files",
            self.root_path.display(),
            rust_files.len()
        );
        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }

    fn is_excluded(&self, entry: &walkdir::DirEntry) -> bool {
        let file_name = entry.file_name().to_string_lossy();
        if file_name.starts_with('.') {
            return true;
        }
        entry.file_type().is_dir() && self.excludes.iter().any(|name| *name == file_name)
    }
}
