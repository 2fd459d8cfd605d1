use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use super::commands;

/// Entry point for the `mentat` command-line interface.
#[derive(Debug, Parser)]
#[command(
    name = "mentat",
    about = "AI coding assistant that edits the files you give it",
    version,
    long_about = None
)]
pub struct Cli {
    /// Files or directories to include in the model's context
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Use the extended-context model for prompts too large for the standard one
    #[arg(long = "allow-extended-context")]
    pub allow_extended_context: bool,

    /// Enable debug logging of requests and model selection
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        commands::run(self).await
    }
}
