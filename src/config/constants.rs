pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_STANDARD_MODEL: &str = "gpt-4-0314";
pub const DEFAULT_EXTENDED_MODEL: &str = "gpt-4-32k-0314";
pub const DEFAULT_STANDARD_CONTEXT_TOKENS: u32 = 8192;
pub const DEFAULT_EXTENDED_CONTEXT_TOKENS: u32 = 32768;
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
