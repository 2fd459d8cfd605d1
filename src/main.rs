mod cli;
mod client;
mod code_change;
mod code_file_manager;
mod config;
mod conversation;
mod cost;
mod parsing;
mod prompts;
mod tokens;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    cli.run().await
}
