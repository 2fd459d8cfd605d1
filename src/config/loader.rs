use anyhow::{Context, Result};
use dirs::home_dir;
use std::{fs, path::Path};

use super::Config;
use super::builder::ConfigBuilder;
use super::environment::apply_env_overrides;
use super::types::FileConfig;
use super::validation::validate;

impl Config {
    pub fn config_path() -> Result<std::path::PathBuf> {
        let mut path = home_dir().context("Could not determine home directory")?;
        path.push(".mentat/config.json");
        Ok(path)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut builder = ConfigBuilder::new();

        if path.exists() {
            builder = Self::apply_file(builder, &path)?;
        }

        builder = apply_env_overrides(builder)?;

        let config = builder.build()?;
        validate(&config)?;
        Ok(config)
    }

    fn apply_file(builder: ConfigBuilder, path: &Path) -> Result<ConfigBuilder> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed reading config at {}", path.display()))?;

        if contents.trim().is_empty() {
            return Ok(builder);
        }

        let file: FileConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed parsing JSON config at {}", path.display()))?;

        Ok(file.apply(builder))
    }
}

impl FileConfig {
    pub fn apply(self, builder: ConfigBuilder) -> ConfigBuilder {
        let FileConfig { llm: file_llm, models: file_models } = self;

        builder
            .with_llm(|llm| {
                if let Some(api_key) = file_llm.api_key {
                    llm.api_key = api_key;
                }
                if let Some(timeout) = file_llm.timeout_secs {
                    llm.timeout_secs = timeout;
                }
                if let Some(base_url) = file_llm.base_url {
                    llm.base_url = base_url;
                }
                if let Some(user_agent) = file_llm.user_agent {
                    llm.user_agent = user_agent;
                }
            })
            .with_models(|models| {
                if let Some(standard) = file_models.standard {
                    models.standard = standard;
                }
                if let Some(extended) = file_models.extended {
                    models.extended = extended;
                }
                if let Some(tokens) = file_models.standard_context_tokens {
                    models.standard_context_tokens = tokens;
                }
                if let Some(tokens) = file_models.extended_context_tokens {
                    models.extended_context_tokens = tokens;
                }
                if let Some(allow) = file_models.allow_extended_context {
                    models.allow_extended_context = allow;
                }
            })
    }
}
