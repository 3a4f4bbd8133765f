//! Stencil command line.
//!
//! Compiles JSON query templates to parameterized SQL from the shell.
//! `stencil compile` prints the SQL and ordered parameter map as JSON on
//! stdout; `stencil check` parses a template and reports structural
//! problems without needing any request parameters.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use stencil_compiler::{compile_value, Params, QueryTemplate};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "stencil", about = "Compile JSON query templates to parameterized SQL", version)]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a template against request parameters
    Compile {
        /// Template JSON file
        #[arg(short, long)]
        template: PathBuf,

        /// File holding the request parameters as a JSON object
        #[arg(long)]
        params: Option<PathBuf>,

        /// One request parameter as NAME=VALUE; repeatable, wins over --params
        #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
        param: Vec<String>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Parse a template and report what it would compile
    Check {
        /// Template JSON file
        #[arg(short, long)]
        template: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "stencil=debug,stencil_compiler=debug"
    } else {
        "warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Compile {
            template,
            params,
            param,
            pretty,
        } => run_compile(&template, params.as_deref(), &param, pretty),
        Commands::Check { template } => run_check(&template),
    }
}

fn run_compile(
    template_path: &Path,
    params_path: Option<&Path>,
    overrides: &[String],
    pretty: bool,
) -> Result<()> {
    let template = read_json(template_path)?;

    let mut request = match params_path {
        Some(path) => match read_json(path)? {
            serde_json::Value::Object(map) => map,
            _ => anyhow::bail!(
                "Parameter file {} must hold a JSON object",
                path.display()
            ),
        },
        None => Params::new(),
    };
    for entry in overrides {
        let (name, value) = parse_override(entry)?;
        request.insert(name, value);
    }
    debug!(
        "Compiling {} with {} request parameters",
        template_path.display(),
        request.len()
    );

    let query = compile_value(template, &request)
        .with_context(|| format!("Failed to compile {}", template_path.display()))?;

    let output = if pretty {
        serde_json::to_string_pretty(&query)?
    } else {
        serde_json::to_string(&query)?
    };
    println!("{}", output);
    Ok(())
}

fn run_check(template_path: &Path) -> Result<()> {
    let value = read_json(template_path)?;
    let template = QueryTemplate::from_value(value)
        .with_context(|| format!("{} is not a valid template", template_path.display()))?;

    println!(
        "OK: {} template for '{}'",
        template.operation.as_str(),
        template.source.table
    );
    Ok(())
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Split a `NAME=VALUE` override. Values that parse as JSON keep their
/// type; anything else binds as a string.
fn parse_override(entry: &str) -> Result<(String, serde_json::Value)> {
    let (name, raw) = entry
        .split_once('=')
        .with_context(|| format!("Invalid --param '{}': expected NAME=VALUE", entry))?;
    let value = serde_json::from_str(raw)
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}
