use anyhow::{Result, anyhow, bail};

use super::constants::API_KEY_ENV_VAR;
use super::types::Config;

pub fn validate(config: &Config) -> Result<()> {
    if config.llm.api_key.trim().is_empty() {
        return Err(anyhow!(
            "OpenAI API key not found. Set {} or add it to {}",
            API_KEY_ENV_VAR,
            Config::config_path()?.display()
        ));
    }

    if config.models.standard_context_tokens == 0 || config.models.extended_context_tokens == 0 {
        bail!("Model context sizes must be greater than zero");
    }

    Ok(())
}
