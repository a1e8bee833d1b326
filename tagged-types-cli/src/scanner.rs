//! Definition file scanner.
//!
//! This module recursively scans a directory for definition documents
//! (`*.json` and `*.toml`), respecting `.gitignore` patterns and custom
//! filters. The CLI's own `tagged.toml` is never treated as a definition.

use crate::config::CONFIG_FILENAME;
use crate::error::{CliResult, ScanError};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Syntax of a definition file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// A discovered definition file with its content.
#[derive(Debug, Clone)]
pub struct DefinitionFile {
    /// Absolute path to the file.
    pub path: PathBuf,

    /// Path relative to the scan root.
    pub relative_path: PathBuf,

    /// File syntax.
    pub format: FileFormat,

    /// File content.
    pub content: String,
}

/// Scanner for discovering definition files.
#[derive(Debug)]
pub struct DefinitionScanner {
    /// Root directory to scan.
    root: PathBuf,

    /// Whether to respect .gitignore files.
    respect_gitignore: bool,

    /// Optional glob filter pattern.
    filter: Option<glob::Pattern>,
}

impl DefinitionScanner {
    /// Create a new scanner for the given root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            respect_gitignore: true,
            filter: None,
        }
    }

    /// Set whether to respect .gitignore files.
    pub fn with_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    /// Set a glob filter pattern for files.
    ///
    /// Only files whose path relative to the root matches are included.
    pub fn with_filter(mut self, pattern: &str) -> Result<Self, ScanError> {
        let glob_pattern = glob::Pattern::new(pattern)
            .map_err(|e| ScanError::invalid_pattern(pattern, e.to_string()))?;
        self.filter = Some(glob_pattern);
        Ok(self)
    }

    /// Scan the directory and return all discovered definition files,
    /// sorted by relative path.
    pub fn scan(&self) -> CliResult<Vec<DefinitionFile>> {
        if !self.root.is_dir() {
            return Err(ScanError::not_found(self.root.clone()).into());
        }

        let mut files = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .hidden(false)
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        for entry in walker {
            let entry = entry.map_err(ScanError::Walk)?;
            let path = entry.path();

            if !path.is_file() || path.file_name().is_some_and(|name| name == CONFIG_FILENAME) {
                continue;
            }

            let Some(format) = FileFormat::from_path(path) else {
                continue;
            };

            let relative_path = self.relative_path(path);
            if let Some(ref pattern) = self.filter {
                if !pattern.matches_path(&relative_path) {
                    continue;
                }
            }

            let content = std::fs::read_to_string(path).map_err(|e| ScanError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

            files.push(DefinitionFile {
                path: path.to_path_buf(),
                relative_path,
                format,
                content,
            });
        }

        if files.is_empty() {
            return Err(ScanError::no_definition_files(self.root.clone()).into());
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }

    /// Get the relative path from root.
    fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
