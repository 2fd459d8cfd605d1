//! Conversation state for one CLI session and the per-turn orchestration
//! around a model call.

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::*;
use tracing::{debug, warn};

use crate::client::{ChatMessage, ChatMessageRole, DynLlmClient};
use crate::code_change::CodeChange;
use crate::code_file_manager::CodeContext;
use crate::config::Config;
use crate::cost::CostTracker;
use crate::parsing::stream_and_parse_response;
use crate::prompts::SYSTEM_PROMPT;
use crate::tokens::count_tokens;

mod model;

pub use model::{ModelChoice, choose_model};

pub struct Conversation {
    client: Arc<DynLlmClient>,
    messages: Vec<ChatMessage>,
    allow_extended_context: bool,
    cost_tracker: CostTracker,
}

impl Conversation {
    /// Start a session seeded with the system prompt.
    ///
    /// When the config requests extended context, the account's model list is
    /// checked once; if the extended model is missing the session falls back
    /// to the standard tier and warns. A failing model listing is returned as
    /// an error.
    pub async fn new(client: Arc<DynLlmClient>, config: &Config) -> Result<Self> {
        let mut allow_extended_context = config.allow_extended_context();

        if allow_extended_context {
            let extended_model = &config.models.extended;
            allow_extended_context = probe_extended_context(client.as_ref(), extended_model)
                .await
                .context("Failed to check access to the extended-context model")?;

            if !allow_extended_context {
                warn!(model = %extended_model, "extended-context model unavailable, disabling");
                eprintln!(
                    "{}",
                    format!(
                        "Extended context is enabled, but your API key doesn't have access to {extended_model}. \
                         To remove this warning, disable extended context until you have access."
                    )
                    .yellow()
                );
            }
        }

        Ok(Self::with_flag(client, allow_extended_context))
    }

    /// Start a session without probing the model list.
    pub fn with_flag(client: Arc<DynLlmClient>, allow_extended_context: bool) -> Self {
        let mut conversation = Self {
            client,
            messages: Vec::new(),
            allow_extended_context,
            cost_tracker: CostTracker::new(),
        };
        conversation.add_system_message(SYSTEM_PROMPT);
        conversation
    }

    pub fn add_system_message(&mut self, message: impl Into<String>) {
        self.push(ChatMessageRole::System, message.into());
    }

    pub fn add_user_message(&mut self, message: impl Into<String>) {
        self.push(ChatMessageRole::User, message.into());
    }

    pub fn add_assistant_message(&mut self, message: impl Into<String>) {
        self.push(ChatMessageRole::Assistant, message.into());
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Effective flag after the startup capability check.
    pub fn allow_extended_context(&self) -> bool {
        self.allow_extended_context
    }

    pub fn cost_tracker(&self) -> &CostTracker {
        &self.cost_tracker
    }

    /// Run one model turn against the current history.
    ///
    /// The code message is only added to the request, never to the stored
    /// history. On success exactly one assistant message is appended; on any
    /// error the history is left as it was.
    pub async fn get_model_response(
        &mut self,
        code_context: &dyn CodeContext,
        config: &Config,
    ) -> Result<(String, Vec<CodeChange>)> {
        let mut messages = self.messages.clone();
        let code_message = code_context
            .code_message()
            .context("Failed to build code message")?;
        messages.push(ChatMessage::new(ChatMessageRole::System, code_message));

        let choice = choose_model(&messages, self.allow_extended_context, &config.models);
        debug!(
            model = %choice.model,
            prompt_tokens = choice.prompt_tokens,
            "model selected"
        );
        if choice.exceeds_context() {
            warn!(
                model = %choice.model,
                prompt_tokens = choice.prompt_tokens,
                context_limit = choice.context_limit,
                "prompt exceeds context window"
            );
            eprintln!(
                "{}",
                format!(
                    "Warning: {} tokens is too close to the {}-token limit of {}; the response may be cut off or rejected.",
                    choice.prompt_tokens, choice.context_limit, choice.model
                )
                .yellow()
            );
        }

        let state = stream_and_parse_response(self.client.as_ref(), messages, &choice.model).await?;

        self.cost_tracker.display_api_call_stats(
            choice.prompt_tokens,
            count_tokens(&state.message),
            &choice.model,
            state.elapsed,
        );

        self.add_assistant_message(state.message);
        Ok((state.explanation, state.code_changes))
    }

    fn push(&mut self, role: ChatMessageRole, content: String) {
        self.messages.push(ChatMessage { role, content });
    }
}

/// Check whether `model` appears in the account's model list.
pub async fn probe_extended_context(client: &DynLlmClient, model: &str) -> Result<bool> {
    let available = client.list_models().await?;
    Ok(available.iter().any(|id| id == model))
}
