use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use super::commands;

/// Entry point for the `program-builder` command-line interface.
#[derive(Debug, Parser)]
#[command(
    name = "program-builder",
    about = "Generate validated training programs with a language model",
    version,
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging, including each model attempt
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Generate one program from a request file and print it.
    Generate(GenerateArgs),
    /// Print the JSON Schema sent to the model.
    Schema,
    /// Validate a candidate program file against the output contract.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind (defaults to config setting).
    #[arg(long)]
    pub bind: Option<String>,

    /// Port to listen on (defaults to config setting).
    #[arg(short = 'p', long)]
    pub port: Option<u16>,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Program request JSON file, or `-` for stdin.
    pub input: PathBuf,

    /// Print the program as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,

    /// Override the attempt budget (defaults to config setting).
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Candidate program file (raw model output is fine), or `-` for stdin.
    pub input: PathBuf,

    /// Accept keys the contract does not declare.
    #[arg(long)]
    pub loose: bool,

    /// Also require this many training days.
    #[arg(long)]
    pub days: Option<u8>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        commands::run(self).await
    }
}
