//! CLI tool for entity declarations.
//!
//! Provides commands for:
//! - Validating a file of declarations
//! - Printing the statements generated for each declaration

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rowmap_core::{sql, ConditionSet, EntityDeclaration, MapperConfig, TypeDescriptor};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the declaration tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Mapper configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Schema for declarations that do not name one; overrides the config file
    #[arg(long)]
    schema: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate every declaration in a JSON file
    Check {
        /// JSON array of entity declarations
        file: PathBuf,
    },
    /// Print the statements generated for every declaration in a JSON file
    Statements {
        /// JSON array of entity declarations
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => MapperConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MapperConfig::default(),
    };
    if let Some(schema) = args.schema {
        config = config.with_default_schema(schema);
    }

    match args.command {
        Command::Check { file } => {
            let declarations = load_declarations(&file)?;
            let mut failures = 0;
            for decl in &declarations {
                match TypeDescriptor::build(decl, &config) {
                    Ok(desc) => println!("ok      {} -> {}", desc.name, desc.table_identifier()),
                    Err(e) => {
                        failures += 1;
                        println!("invalid {}: {}", decl.name, e);
                    }
                }
            }
            tracing::info!(
                "Checked {} declarations, {} invalid",
                declarations.len(),
                failures
            );
            Ok(if failures == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Statements { file } => {
            for decl in load_declarations(&file)? {
                let desc = TypeDescriptor::build(&decl, &config)
                    .with_context(|| format!("Invalid declaration {}", decl.name))?;
                println!("{}", render_statements(&desc)?);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_declarations(path: &Path) -> anyhow::Result<Vec<EntityDeclaration>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let declarations: Vec<EntityDeclaration> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse declarations in {}", path.display()))?;
    tracing::debug!("Loaded {} declarations from {}", declarations.len(), path.display());
    Ok(declarations)
}

/// Renders the shape-invariant statements of a descriptor, one per line.
fn render_statements(desc: &TypeDescriptor) -> anyhow::Result<String> {
    let mut lines = vec![
        format!("-- {} ({})", desc.name, desc.table_identifier()),
        sql::select_all(desc).to_string(),
    ];
    if desc.key_count() > 0 {
        lines.push(sql::select_by_key(desc).to_string());
    }
    if let Some(next) = sql::next_sequential_id(desc) {
        lines.push(next.to_string());
    }
    lines.push(sql::insert(desc).to_string());

    let updateable: ConditionSet = desc
        .updateable_fields()
        .map(|f| (f.name.clone(), rowmap_core::Value::Null))
        .collect();
    if desc.key_count() > 0 && !updateable.is_empty() {
        lines.push(sql::update(desc, &updateable)?);
    }
    if desc.key_count() > 0 {
        lines.push(sql::delete_by_key(desc).to_string());
    }
    lines.push(sql::count_where(desc, &ConditionSet::new())?);
    Ok(lines.join("\n"))
}
