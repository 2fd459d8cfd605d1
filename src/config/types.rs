use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmSettings,
    pub models: ModelSettings,
}

impl Config {
    /// Whether the user asked for the extended-context model tier.
    ///
    /// This is the requested value; the conversation may still downgrade it
    /// after probing which models the API key can actually use.
    pub fn allow_extended_context(&self) -> bool {
        self.models.allow_extended_context
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub timeout_secs: u64,
    pub base_url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub standard: String,
    pub extended: String,
    pub standard_context_tokens: u32,
    pub extended_context_tokens: u32,
    pub allow_extended_context: bool,
}

// File configuration types
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileConfig {
    pub llm: FileLlmSettings,
    pub models: FileModelSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileLlmSettings {
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileModelSettings {
    pub standard: Option<String>,
    pub extended: Option<String>,
    pub standard_context_tokens: Option<u32>,
    pub extended_context_tokens: Option<u32>,
    pub allow_extended_context: Option<bool>,
}
