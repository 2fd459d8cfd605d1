//! Configuration management for the mentat coding assistant.
//!
//! This module provides a layered configuration system that supports:
//! - File-based configuration at `~/.mentat/config.json`
//! - Environment variable overrides
//! - Builder pattern for programmatic configuration
//! - Validation of required settings

mod builder;
mod constants;
mod defaults;
mod environment;
mod loader;
mod types;
mod validation;

pub use types::{Config, LlmSettings, ModelSettings};
