//! Declaration tree walker.
//!
//! Walks a root directory, finds every directory holding declaration files,
//! and parses their resource blocks. Directories are yielded lazily so the
//! reconciler can pull one directory's inventory at a time.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;
use crate::error::DeclarationError;

use super::types::DeclaredResource;
use super::{hcl_syntax, json_syntax};

/// Syntax of a declaration file, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationFormat {
    /// Native HCL syntax (`*.tf`).
    Hcl,
    /// JSON syntax (`*.tf.json`).
    Json,
}

impl DeclarationFormat {
    /// Detects the format from a file name.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".tf.json") {
            Some(Self::Json)
        } else if name.ends_with(".tf") {
            Some(Self::Hcl)
        } else {
            None
        }
    }
}

/// A directory containing at least one declaration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryScan {
    /// The directory.
    pub directory: PathBuf,
    /// Declaration files directly inside it, sorted by name.
    pub files: Vec<PathBuf>,
}

/// Extracts declared resources from a directory tree.
#[derive(Debug, Clone)]
pub struct DeclarationExtractor {
    /// Directory names never descended into.
    exclude_dirs: Vec<String>,
    /// Whether to follow symbolic links.
    follow_links: bool,
}

impl Default for DeclarationExtractor {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

impl DeclarationExtractor {
    /// Creates an extractor with the default exclude list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor from scan settings.
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            exclude_dirs: config.exclude_dirs.clone(),
            follow_links: config.follow_links,
        }
    }

    /// Lazily yields every directory under `root` (including `root`) that
    /// holds declaration files, in sorted walk order.
    ///
    /// Unreadable entries are logged and skipped.
    pub fn scan(&self, root: &Path) -> impl Iterator<Item = DirectoryScan> + '_ {
        WalkDir::new(root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry))
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => Some(entry.into_path()),
                Ok(_) => None,
                Err(e) => {
                    warn!("Skipping unreadable path during scan: {e}");
                    None
                }
            })
            .filter_map(|directory| {
                let files = declaration_files(&directory);
                if files.is_empty() {
                    None
                } else {
                    debug!(
                        "Found {} declaration files in {}",
                        files.len(),
                        directory.display()
                    );
                    Some(DirectoryScan { directory, files })
                }
            })
    }

    /// Parses every declaration file of a scanned directory.
    ///
    /// Files that cannot be read or parsed are skipped with a warning.
    #[must_use]
    pub fn parse_directory(&self, scan: &DirectoryScan) -> Vec<DeclaredResource> {
        let mut resources = Vec::new();
        for file in &scan.files {
            match Self::parse_file(file, &scan.directory) {
                Ok(found) => resources.extend(found),
                Err(e) => warn!("Skipping declaration file: {e}"),
            }
        }
        resources
    }

    /// Lazily yields every declared resource under `root`.
    pub fn resources(&self, root: &Path) -> impl Iterator<Item = DeclaredResource> + '_ {
        self.scan(root)
            .flat_map(|scan| self.parse_directory(&scan))
    }

    /// Parses a single declaration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a declaration
    /// file, or is syntactically invalid.
    pub fn parse_file(
        path: &Path,
        directory: &Path,
    ) -> std::result::Result<Vec<DeclaredResource>, DeclarationError> {
        let content = std::fs::read_to_string(path).map_err(|e| DeclarationError::ReadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        match DeclarationFormat::from_path(path) {
            Some(DeclarationFormat::Hcl) => hcl_syntax::parse_resources(&content, path, directory),
            Some(DeclarationFormat::Json) => json_syntax::parse_resources(&content, path, directory),
            None => Err(DeclarationError::Syntax {
                path: path.to_path_buf(),
                message: String::from("not a declaration file"),
            }),
        }
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.exclude_dirs.iter().any(|ex| ex == name))
    }
}

/// Lists the declaration files directly inside `directory`, sorted.
fn declaration_files(directory: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list {}: {e}", directory.display());
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && DeclarationFormat::from_path(path).is_some())
        .collect();
    files.sort();
    files
}
