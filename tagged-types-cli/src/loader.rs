//! Loading definition files into a registry.
//!
//! Every file is parsed on its own so that one broken file does not hide
//! the diagnostics of the others. TOML files are converted to the same
//! JSON document shape the library reads. Types may reference types and
//! patterns from any other loaded file; those references are resolved
//! once, when the registry is built.

use indexmap::IndexMap;
use serde_json::Value as Json;
use std::path::PathBuf;
use std::sync::Arc;
use tagged_types::{DefinitionDocument, EngineConfig, PatternLibrary, TypeRegistry};
use tracing::debug;

use crate::error::LoadError;
use crate::scanner::{DefinitionFile, FileFormat};

/// A built registry plus the file each type was declared in.
#[derive(Debug)]
pub struct LoadedDefinitions {
    /// The frozen registry.
    pub registry: Arc<TypeRegistry>,

    /// Declaring file per type name, in load order.
    pub origins: IndexMap<String, PathBuf>,
}

impl LoadedDefinitions {
    /// File a type was declared in.
    pub fn origin(&self, type_name: &str) -> Option<&PathBuf> {
        self.origins.get(type_name)
    }
}

/// Loads definition files into a [`TypeRegistry`].
#[derive(Debug, Default)]
pub struct DefinitionLoader {
    config: EngineConfig,
}

impl DefinitionLoader {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Parse every file and build one registry from all of them.
    ///
    /// All per-file errors are collected before failing; cross-file errors
    /// (unresolved references, missing id fields, duplicates) come from the
    /// build step.
    pub fn load(&self, files: &[DefinitionFile]) -> Result<LoadedDefinitions, LoadError> {
        let mut patterns = PatternLibrary::new();
        let mut documents = Vec::with_capacity(files.len());
        let mut errors = Vec::new();

        for file in files {
            let json = match to_json(file) {
                Ok(json) => json,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            match DefinitionDocument::from_json(&json, &patterns) {
                Ok(document) => {
                    for pattern in &document.patterns {
                        patterns.insert(pattern.clone());
                    }
                    documents.push((file.relative_path.clone(), document));
                }
                Err(e) => errors.push(LoadError::definition(file.relative_path.clone(), e)),
            }
        }

        if let Some(error) = LoadError::collect(errors) {
            return Err(error);
        }

        let mut builder = TypeRegistry::builder().config(self.config.clone());
        let mut origins = IndexMap::new();
        for pattern in patterns.iter() {
            builder = builder.pattern(pattern.clone());
        }
        for (path, document) in documents {
            for definition in document.definitions {
                origins.entry(definition.name().to_string()).or_insert_with(|| path.clone());
                builder = builder.define(definition);
            }
        }

        let registry = builder.build()?;
        debug!(
            files = files.len(),
            types = registry.len(),
            "definitions loaded"
        );

        Ok(LoadedDefinitions { registry, origins })
    }
}

/// Parse a file into the JSON document shape.
fn to_json(file: &DefinitionFile) -> Result<Json, LoadError> {
    let syntax = |message: String| LoadError::syntax(file.relative_path.clone(), message);
    match file.format {
        FileFormat::Json => serde_json::from_str(&file.content).map_err(|e| syntax(e.to_string())),
        FileFormat::Toml => toml::from_str::<Json>(&file.content).map_err(|e| syntax(e.to_string())),
    }
}
