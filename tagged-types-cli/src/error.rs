//! Error types for the CLI.
//!
//! This module defines all error types used throughout the CLI, keeping
//! the file each failure came from so it can be reported next to it.

use std::path::PathBuf;
use tagged_types::TypeError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Main error type for CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error during definition file scanning.
    #[error("Failed to scan directory: {0}")]
    Scan(#[from] ScanError),

    /// Error loading definitions into a registry.
    #[error("Failed to load definitions: {0}")]
    Load(#[from] LoadError),

    /// Error loading configuration.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// A type operation failed for a reason other than the document.
    #[error("{0}")]
    Type(TypeError),

    /// A document was rejected by its type.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A file the command would create already exists.
    #[error("File already exists: {path} (use --force to overwrite)")]
    AlreadyExists { path: PathBuf },

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during definition file scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Directory does not exist.
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// No definition files found in directory.
    #[error("No definition files (*.json, *.toml) found in: {path}")]
    NoDefinitionFiles { path: PathBuf },

    /// Invalid filter pattern.
    #[error("Invalid filter pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// IO error during scanning.
    #[error("IO error scanning {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from ignore crate walker.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),
}

/// Error turning definition files into a registry.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file is not valid JSON or TOML.
    #[error("Syntax error in {file}: {message}")]
    Syntax { file: PathBuf, message: String },

    /// The file parsed but declares something invalid.
    #[error("{file}: {source}")]
    Definition {
        file: PathBuf,
        #[source]
        source: TypeError,
    },

    /// Cross-file resolution failed when building the registry.
    #[error("{0}")]
    Build(#[from] TypeError),

    /// Multiple load errors collected.
    #[error("Multiple load errors:\n{}", format_errors(.0))]
    Multiple(Vec<LoadError>),
}

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid TOML syntax.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// IO error reading config.
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Format multiple errors for display.
fn format_errors(errors: &[LoadError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("  {}. {}", i + 1, e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl LoadError {
    /// Create a syntax error for `file`.
    pub fn syntax(file: PathBuf, message: impl Into<String>) -> Self {
        Self::Syntax {
            file,
            message: message.into(),
        }
    }

    /// Attach the file a definition error came from.
    pub fn definition(file: PathBuf, source: TypeError) -> Self {
        Self::Definition { file, source }
    }

    /// Collapse collected errors: one stays as is, several become `Multiple`.
    pub fn collect(mut errors: Vec<LoadError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Flatten into individual errors, in the order they were found.
    pub fn into_errors(self) -> Vec<LoadError> {
        match self {
            Self::Multiple(errors) => errors.into_iter().flat_map(Self::into_errors).collect(),
            other => vec![other],
        }
    }
}

impl ScanError {
    /// Create a directory not found error.
    pub fn not_found(path: PathBuf) -> Self {
        Self::DirectoryNotFound { path }
    }

    /// Create a no definition files error.
    pub fn no_definition_files(path: PathBuf) -> Self {
        Self::NoDefinitionFiles { path }
    }

    /// Create an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

impl ConfigError {
    /// Create an invalid TOML error.
    pub fn invalid_toml(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path,
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}
