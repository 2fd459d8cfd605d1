use anyhow::{Context, Result, anyhow};
use std::env;

use super::builder::ConfigBuilder;
use super::constants::API_KEY_ENV_VAR;

pub fn apply_env_overrides(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    if let Some(api_key) = env_string(API_KEY_ENV_VAR)? {
        builder = builder.with_llm(|llm| llm.api_key = api_key);
    }

    if let Some(base_url) = env_string("MENTAT_BASE_URL")? {
        builder = builder.with_llm(|llm| llm.base_url = base_url);
    }

    if let Some(timeout) = env_u64("MENTAT_TIMEOUT_SECS")? {
        builder = builder.with_llm(|llm| llm.timeout_secs = timeout);
    }

    if let Some(model) = env_string("MENTAT_MODEL")? {
        builder = builder.with_models(|models| models.standard = model);
    }

    if let Some(model) = env_string("MENTAT_EXTENDED_MODEL")? {
        builder = builder.with_models(|models| models.extended = model);
    }

    if let Some(allow) = env_bool("MENTAT_ALLOW_EXTENDED_CONTEXT")? {
        builder = builder.with_models(|models| models.allow_extended_context = allow);
    }

    Ok(builder)
}

pub fn env_string(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(anyhow!("{key} contains invalid UTF-8")),
    }
}

pub fn env_u64(key: &str) -> Result<Option<u64>> {
    if let Some(value) = env_string(key)? {
        let parsed = value
            .parse::<u64>()
            .with_context(|| format!("Failed to parse {key} as u64"))?;
        Ok(Some(parsed))
    } else {
        Ok(None)
    }
}

pub fn env_bool(key: &str) -> Result<Option<bool>> {
    let Some(value) = env_string(key)? else {
        return Ok(None);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" | "" => Ok(Some(false)),
        other => Err(anyhow!("Failed to parse {key} as a boolean: '{other}'")),
    }
}
