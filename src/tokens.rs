use std::sync::LazyLock;

use tiktoken_rs::{CoreBPE, cl100k_base};
use tracing::warn;

use crate::client::ChatMessage;

/// Per-message overhead for the role tag and message framing.
const MESSAGE_OVERHEAD_TOKENS: u32 = 4;

/// The encoding used by the gpt-4 and gpt-3.5 model families.
static TOKENIZER: LazyLock<Option<CoreBPE>> = LazyLock::new(|| match cl100k_base() {
    Ok(bpe) => Some(bpe),
    Err(error) => {
        warn!(%error, "cl100k tokenizer unavailable, estimating token counts");
        None
    }
});

/// Number of tokens the model will see for `text`.
pub fn count_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }

    let count = match TOKENIZER.as_ref() {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => estimate_tokens(text),
    };
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Conservative fallback: ~3 chars per token, never fewer than one per word.
fn estimate_tokens(text: &str) -> usize {
    let approx_from_chars = text.chars().count().div_ceil(3);
    approx_from_chars.max(text.split_whitespace().count())
}

/// Total tokens contributed by a sequence of chat messages.
pub fn estimate_prompt_tokens(messages: &[ChatMessage]) -> u32 {
    messages
        .iter()
        .map(|message| count_tokens(&message.content).saturating_add(MESSAGE_OVERHEAD_TOKENS))
        .fold(0u32, u32::saturating_add)
}
