//! # tagged-types-cli
//!
//! CLI library for checking tagged type definition files and validating
//! JSON documents against the types they declare.
//!
//! ## Architecture
//!
//! - [`config`] - Configuration management and TOML parsing
//! - [`scanner`] - Definition file discovery and filtering
//! - [`loader`] - Parsing definition files into a registry
//! - [`error`] - Error types and handling

pub mod config;
pub mod error;
pub mod loader;
pub mod scanner;

// Re-export main types for convenience
pub use config::{Config, ConfigManager};
pub use error::{CliError, CliResult};
pub use loader::{DefinitionLoader, LoadedDefinitions};
pub use scanner::{DefinitionFile, DefinitionScanner};
