//! # tagged
//!
//! CLI tool for checking tagged type definitions and validating documents
//! against them.
//!
//! ## Usage
//!
//! ```bash
//! # Check every definition file under ./types
//! tagged check
//!
//! # Check a subset of another directory
//! tagged check --input ./model --filter "billing/**"
//!
//! # Validate a JSON document against a declared type
//! tagged validate --type Order ./fixtures/order.json
//!
//! # Initialize configuration
//! tagged init
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value as Json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tagged_types::ErrorCode;
use tagged_types_cli::{
    config::{CliArgs, Config, ConfigManager},
    error::{CliError, LoadError},
    loader::{DefinitionLoader, LoadedDefinitions},
    scanner::DefinitionScanner,
};

#[derive(Parser)]
#[command(name = "tagged")]
#[command(author, version, about = "Check tagged type definitions and validate documents against them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every definition file and report declaration errors
    Check {
        /// Directory containing definition files
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Filter definition files by path pattern (glob)
        #[arg(long)]
        filter: Option<String>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate a JSON document against a declared type
    Validate {
        /// Name of the declared type
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// Path to the JSON document
        document: PathBuf,

        /// Directory containing definition files
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Render width for the accepted instance
        #[arg(long)]
        width: Option<usize>,
    },

    /// Initialize a new tagged configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "tagged.toml")]
        output: PathBuf,

        /// Overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            match e {
                CliError::Validation(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Check {
            input,
            filter,
            config,
        } => cmd_check(input, filter, config),

        Commands::Validate {
            type_name,
            document,
            input,
            config,
            width,
        } => cmd_validate(&type_name, &document, input, config, width),

        Commands::Init { output, force } => cmd_init(output, force),
    }
}

/// Check command implementation.
fn cmd_check(
    input: Option<PathBuf>,
    filter: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = ConfigManager::load(config_path.as_deref())?;
    let config = ConfigManager::merge_cli_args(
        config,
        &CliArgs {
            input,
            filter,
            ..Default::default()
        },
    );
    ConfigManager::check(&config)?;

    let loaded = load_definitions(&config)?;
    let registry = &loaded.registry;

    println!(
        "  Declared {} type(s), {} pattern(s)",
        registry.len().to_string().green(),
        registry.patterns().len().to_string().green()
    );

    for name in registry.dependency_order() {
        let Some(definition) = registry.definition(name) else {
            continue;
        };
        let origin = loaded
            .origin(name)
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        println!(
            "  {} {} {}",
            "✓".green(),
            definition.signature(),
            format!("({}, {origin})", definition.kind()).dimmed()
        );
    }

    if let Some(cycle) = registry.required_cycle() {
        println!(
            "{} these types require each other and can never be constructed: {}",
            "Warning:".yellow(),
            cycle.join(" -> ")
        );
    }

    println!("{} Definitions are valid", "✓".green());
    Ok(())
}

/// Validate command implementation.
fn cmd_validate(
    type_name: &str,
    document: &Path,
    input: Option<PathBuf>,
    config_path: Option<PathBuf>,
    width: Option<usize>,
) -> Result<(), CliError> {
    let config = ConfigManager::load(config_path.as_deref())?;
    let config = ConfigManager::merge_cli_args(
        config,
        &CliArgs {
            input,
            max_width: width,
            ..Default::default()
        },
    );
    ConfigManager::check(&config)?;

    let loaded = load_definitions(&config)?;

    println!(
        "{} {} against {}",
        "Validating".cyan(),
        document.display(),
        type_name.bold()
    );

    let content = std::fs::read_to_string(document)?;
    let json: Json = serde_json::from_str(&content)
        .map_err(|e| LoadError::syntax(document.to_path_buf(), e.to_string()))?;

    match loaded.registry.decode(type_name, &json) {
        Ok(instance) => {
            println!("{} {} is a valid {}", "✓".green(), document.display(), type_name);
            println!("{}", loaded.registry.render(&instance));
            Ok(())
        }
        Err(e) if e.code() == ErrorCode::UnknownType => Err(CliError::Type(e)),
        Err(e) => {
            println!("{} {} is not a valid {}", "✗".red(), document.display(), type_name);
            Err(CliError::Validation(e.to_string()))
        }
    }
}

/// Scan and load every definition file the configuration points at.
fn load_definitions(config: &Config) -> Result<LoadedDefinitions, CliError> {
    println!("{}", "Scanning for definition files...".cyan());

    let mut scanner = DefinitionScanner::new(&config.definitions.dir)
        .with_gitignore(config.definitions.respect_gitignore);
    if let Some(ref pattern) = config.definitions.filter {
        scanner = scanner.with_filter(pattern)?;
    }

    let files = scanner.scan()?;
    println!("  Found {} definition file(s)", files.len().to_string().green());

    let loaded = DefinitionLoader::new(config.engine()).load(&files)?;
    Ok(loaded)
}

/// Init command implementation.
fn cmd_init(output: PathBuf, force: bool) -> Result<(), CliError> {
    if output.exists() && !force {
        return Err(CliError::AlreadyExists { path: output });
    }

    std::fs::write(&output, ConfigManager::default_config_content())?;

    println!(
        "{} Created configuration file: {}",
        "✓".green(),
        output.display()
    );

    Ok(())
}

/// Print an error with formatting.
fn print_error(error: &CliError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}
