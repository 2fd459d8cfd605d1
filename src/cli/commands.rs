use std::sync::Arc;

use anyhow::{Context, Result};
use colored::*;
use tracing::debug;

use crate::client::{AIClient, DynLlmClient};
use crate::code_change::CodeChange;
use crate::code_file_manager::CodeFileManager;
use crate::config::Config;
use crate::conversation::Conversation;

use super::args::Cli;
use super::util;

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if cli.allow_extended_context {
        config.models.allow_extended_context = true;
    }

    let root = std::env::current_dir().context("Could not determine current directory")?;
    let mut code_files = CodeFileManager::new(root, &cli.paths)?;
    show_files(&code_files);

    let client: Arc<DynLlmClient> = Arc::new(AIClient::new(&config.llm)?);
    let mut conversation = Conversation::new(client, &config).await?;

    loop {
        let Some(request) = util::prompt_line(&format!("\n{} ", "Request:".bold().blue()))? else {
            break;
        };
        if request.is_empty() {
            continue;
        }
        if util::is_quit(&request) {
            break;
        }

        conversation.add_user_message(request);
        let changes = match conversation.get_model_response(&code_files, &config).await {
            Ok((explanation, changes)) => {
                debug!(explanation_len = explanation.len(), "turn complete");
                changes
            }
            Err(error) => {
                eprintln!("{} {error:#}", "❌ Request failed:".red().bold());
                continue;
            }
        };

        if changes.is_empty() {
            continue;
        }

        show_changes(&changes);
        if util::confirm("Apply these changes?")? {
            match code_files.apply_changes(&changes) {
                Ok(()) => println!("{}", "✅ Changes applied.".green()),
                Err(error) => {
                    eprintln!("{} {error:#}", "❌ Could not apply changes:".red().bold())
                }
            }
        } else {
            println!("Changes discarded.");
        }
    }

    conversation.cost_tracker().display_total_cost();
    Ok(())
}

fn show_files(code_files: &CodeFileManager) {
    println!("{}", "Files included in context:".bold());
    for file in code_files.files() {
        println!("  {}", file.display());
    }
}

fn show_changes(changes: &[CodeChange]) {
    println!("\n{}", "Proposed changes:".bold());
    for change in changes {
        println!("  {}", change.to_string().green());
        for line in &change.code_lines {
            println!("    {}", format!("+ {line}").dimmed());
        }
    }
}
