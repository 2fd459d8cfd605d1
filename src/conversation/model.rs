use crate::client::ChatMessage;
use crate::config::ModelSettings;
use crate::tokens::estimate_prompt_tokens;

/// Tokens kept free in the context window for the model's reply.
pub const RESPONSE_TOKEN_BUFFER: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChoice {
    pub model: String,
    pub prompt_tokens: u32,
    pub context_limit: u32,
}

impl ModelChoice {
    /// True when the prompt leaves less than the reply buffer in the window.
    pub fn exceeds_context(&self) -> bool {
        self.prompt_tokens > self.context_limit.saturating_sub(RESPONSE_TOKEN_BUFFER)
    }
}

/// Pick the model tier for a prompt. The extended tier is only used when it
/// is allowed and the prompt does not fit the standard window.
pub fn choose_model(
    messages: &[ChatMessage],
    allow_extended_context: bool,
    settings: &ModelSettings,
) -> ModelChoice {
    let prompt_tokens = estimate_prompt_tokens(messages);
    let standard_budget = settings
        .standard_context_tokens
        .saturating_sub(RESPONSE_TOKEN_BUFFER);

    let (model, context_limit) = if prompt_tokens > standard_budget && allow_extended_context {
        (&settings.extended, settings.extended_context_tokens)
    } else {
        (&settings.standard, settings.standard_context_tokens)
    };

    ModelChoice {
        model: model.clone(),
        prompt_tokens,
        context_limit,
    }
}
