//! veil CLI — driving adapter for the veil projection engine.
//!
//! Subcommands:
//! - `project <schema> <document> [--level L] [--projection P] [--minimize]` — project a document
//! - `check <schema>` — validate that the schema builds
//! - `levels <schema>` — print the compiled levels
//! - `tree <schema> <level>` — print the schema's field tree as seen at a level

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use veil::{CallOptions, LevelSpec, Schema, SchemaConfig};

#[derive(Parser)]
#[command(name = "veil", version)]
#[command(about = "Project documents through schema visibility levels")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Project a document at a level
    Project {
        /// Schema config (YAML or JSON)
        schema: PathBuf,
        /// Document to project (YAML or JSON)
        document: PathBuf,
        /// Level name; the schema default applies when omitted
        #[arg(long)]
        level: Option<String>,
        /// Per-call selector, e.g. "name -email"
        #[arg(long, allow_hyphen_values = true)]
        projection: Option<String>,
        /// Prune emptied objects from the output
        #[arg(long)]
        minimize: bool,
    },
    /// Validate that a schema builds
    Check {
        /// Schema config (YAML or JSON)
        schema: PathBuf,
    },
    /// Print the compiled levels of a schema
    Levels {
        /// Schema config (YAML or JSON)
        schema: PathBuf,
    },
    /// Print the schema's field tree as seen at a level
    Tree {
        /// Schema config (YAML or JSON)
        schema: PathBuf,
        /// Level name
        level: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Project {
            schema,
            document,
            level,
            projection,
            minimize,
        } => {
            let options = call_options(level, projection, minimize);
            let out = cmd_project(&schema, &document, &options)?;
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Check { schema } => println!("{}", cmd_check(&schema)?),
        Command::Levels { schema } => {
            for line in cmd_levels(&schema)? {
                println!("{line}");
            }
        }
        Command::Tree { schema, level } => {
            let tree = cmd_tree(&schema, &level)?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_project(schema: &Path, document: &Path, options: &CallOptions<Value>) -> Result<Value> {
    let schema = build_schema(schema)?;
    let doc = load_document(document)?;
    schema
        .to_object(&doc, doc.clone(), options)
        .context("projection failed")
}

fn cmd_check(schema: &Path) -> Result<String> {
    let schema = build_schema(schema)?;
    Ok(format!(
        "Schema valid ({} levels, {} fields)",
        schema.registry().len(),
        schema.fields().each_path().len()
    ))
}

fn cmd_levels(schema: &Path) -> Result<Vec<String>> {
    let schema = build_schema(schema)?;
    let default = schema
        .transform()
        .default_level()
        .and_then(LevelSpec::as_name);

    Ok(schema
        .registry()
        .iter()
        .map(|(name, selector)| {
            let marker = if Some(name) == default { " (default)" } else { "" };
            format!("{name}{marker}: {selector}")
        })
        .collect())
}

fn cmd_tree(schema: &Path, level: &str) -> Result<Value> {
    let schema = build_schema(schema)?;
    let tree = schema
        .level_schema_tree(level)
        .context("level schema tree failed")?;
    Ok(tree.unwrap_or_else(|| Value::Object(serde_json::Map::new())))
}

fn call_options(
    level: Option<String>,
    projection: Option<String>,
    minimize: bool,
) -> CallOptions<Value> {
    let mut options = CallOptions::new().with_minimize(minimize);
    if let Some(level) = level {
        options = options.with_level(level);
    }
    if let Some(projection) = projection {
        options = options.with_projection(projection);
    }
    options
}

// ═══════════════════════════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════════════════════════

fn build_schema(path: &Path) -> Result<Schema<Value>> {
    let config: SchemaConfig = load(path)?;
    let schema = config
        .build()
        .with_context(|| format!("schema \"{}\" invalid", path.display()))?;
    tracing::debug!(path = %path.display(), levels = schema.registry().len(), "schema loaded");
    Ok(schema)
}

fn load_document(path: &Path) -> Result<Value> {
    load(path)
}

fn load<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read \"{}\"", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).context("JSON parse error")
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(&content).context("YAML parse error")
    }
}
