//! Configuration management for the CLI.
//!
//! This module handles loading configuration from `tagged.toml` files
//! and merging with command-line arguments.

use crate::error::{CliResult, ConfigError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tagged_types::{CodecConfig, EngineConfig, FormatConfig};

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "tagged.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where definition files live.
    pub definitions: DefinitionsConfig,

    /// Rendering layout.
    pub format: FormatConfig,

    /// Persistence shapes.
    pub codec: CodecConfig,
}

/// Definition discovery configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefinitionsConfig {
    /// Directory scanned for definition files.
    pub dir: PathBuf,

    /// Optional glob restricting which files are loaded.
    pub filter: Option<String>,

    /// Whether to respect .gitignore files.
    pub respect_gitignore: bool,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./types"),
            filter: None,
            respect_gitignore: true,
        }
    }
}

impl Config {
    /// Engine configuration handed to the registry.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            format: self.format.clone(),
            codec: self.codec.clone(),
        }
    }
}

/// Configuration manager for loading and merging configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// If the path is None, attempts to load from the default location.
    /// If no config file exists, returns default configuration.
    pub fn load(path: Option<&Path>) -> CliResult<Config> {
        let config_path = path
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::invalid_toml(config_path, e.to_string()))?;

        Self::check(&config)?;
        Ok(config)
    }

    /// Reject values the engine cannot work with. Run again after
    /// [`merge_cli_args`](Self::merge_cli_args), since flags bypass the file.
    pub fn check(config: &Config) -> Result<(), ConfigError> {
        if config.format.max_width == 0 {
            return Err(ConfigError::invalid_value(
                "format.max_width",
                "must be greater than zero",
            ));
        }
        if config.codec.variant_key.is_empty() {
            return Err(ConfigError::invalid_value(
                "codec.variant_key",
                "must not be empty",
            ));
        }
        Ok(())
    }

    /// Merge CLI arguments into configuration.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn merge_cli_args(mut config: Config, args: &CliArgs) -> Config {
        if let Some(ref input) = args.input {
            config.definitions.dir = input.clone();
        }

        if let Some(ref filter) = args.filter {
            config.definitions.filter = Some(filter.clone());
        }

        if let Some(max_width) = args.max_width {
            config.format.max_width = max_width;
        }

        config
    }

    /// Generate default configuration file content with comments.
    pub fn default_config_content() -> &'static str {
        r#"# tagged configuration file

[definitions]
# Directory scanned (recursively) for *.json and *.toml definition files
dir = "./types"

# Only load files whose path relative to `dir` matches this glob
# filter = "billing/**"

# Skip files ignored by .gitignore
respect_gitignore = true

[format]
# Rendered instances longer than this break into one field per line
max_width = 80

# Spaces per nesting level when a rendering breaks
indent = 4

[codec]
# Key carrying the variant name of encoded union instances
variant_key = "@tag"

# Decode JSON null in a field as an absent value
null_as_absent = true
"#
    }
}

/// CLI arguments that can override configuration.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Definitions directory override.
    pub input: Option<PathBuf>,

    /// File filter override.
    pub filter: Option<String>,

    /// Render width override.
    pub max_width: Option<usize>,
}
