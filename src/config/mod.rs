//! Configuration parsing, overrides and validation.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

use std::path::Path;

use tracing::debug;

use crate::common::error::ConfigError;

pub use parser::{load_config, load_config_str};
pub use types::*;

/// Load a config file, apply environment overrides and validate the result.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let config = env::apply_env_overrides(load_config(path)?);
    validate::validate_config(&config)?;
    debug!("Configuration has {} channel mappings", config.mappings.len());
    Ok(config)
}
