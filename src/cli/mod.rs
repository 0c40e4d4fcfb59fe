//! CLI module for Central Prompt
//!
//! Provides subcommands for working with a prompt registry:
//! - `set`: register a new prompt version
//! - `get`: fetch a prompt version and print it
//! - `compile`: fetch a prompt version and fill its placeholders

pub mod compile;
pub mod get;
pub mod set;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::config::PromptSettings;
use crate::domain::PromptQuery;
use crate::infrastructure::logging;
use crate::infrastructure::CentralPrompt;

/// Central Prompt - One interface for MLflow and Langfuse prompt registries
#[derive(Parser)]
#[command(name = "central-prompt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Prompt registry to use (mlflow or langfuse)
    #[arg(long, short)]
    pub provider: String,

    /// MLflow experiment to associate new prompt versions with
    #[arg(long, short)]
    pub experiment: Option<String>,

    /// Do not load a .env file before reading the environment
    #[arg(long)]
    pub no_env: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a new prompt version
    Set(set::SetArgs),

    /// Fetch a prompt version
    Get(PromptArgs),

    /// Fetch a prompt version and substitute its variables
    Compile(compile::CompileArgs),
}

/// Identity of the prompt version to fetch
#[derive(Args, Clone, Debug)]
pub struct PromptArgs {
    /// Prompt name
    #[arg(long, short)]
    pub name: Option<String>,

    /// Version number
    #[arg(long, short)]
    pub version: Option<u32>,

    /// MLflow prompt URI, e.g. prompts:/greet/1
    #[arg(long)]
    pub path: Option<String>,

    /// Langfuse label, e.g. production
    #[arg(long, short)]
    pub label: Option<String>,
}

impl PromptArgs {
    pub fn to_query(&self) -> PromptQuery {
        PromptQuery {
            name: self.name.clone(),
            version: self.version,
            path: self.path.clone(),
            label: self.label.clone(),
        }
    }
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = PromptSettings::load(!cli.no_env)?;
    logging::init_logging(&settings.logging);

    let service = CentralPrompt::with_settings(&cli.provider, cli.experiment.as_deref(), &settings)?;

    match cli.command {
        Command::Set(args) => set::run(&service, args).await,
        Command::Get(args) => get::run(&service, args).await,
        Command::Compile(args) => compile::run(&service, args).await,
    }
}

/// Parse a `key=value` argument
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;

    if key.trim().is_empty() {
        return Err(format!("empty key in '{}'", s));
    }

    Ok((key.trim().to_string(), value.to_string()))
}

/// Parse an argument holding a JSON document
pub fn parse_json(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {}", e))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
