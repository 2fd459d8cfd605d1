use super::constants::*;
use super::types::{LlmSettings, ModelSettings};

pub fn default_user_agent() -> String {
    format!("mentat/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            standard: DEFAULT_STANDARD_MODEL.to_string(),
            extended: DEFAULT_EXTENDED_MODEL.to_string(),
            standard_context_tokens: DEFAULT_STANDARD_CONTEXT_TOKENS,
            extended_context_tokens: DEFAULT_EXTENDED_CONTEXT_TOKENS,
            allow_extended_context: false,
        }
    }
}
