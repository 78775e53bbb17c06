//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.
//! Duplicate channel mappings are rejected later, when the mapping table is built.

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.guild_id == 0 {
        errors.push("discord.guild_id must be non-zero".to_string());
    }

    if config.irc.server.is_empty() {
        errors.push("irc.server is required (missing server name)".to_string());
    }
    if config.irc.listener_name.is_empty() {
        errors.push("irc.listener_name is required".to_string());
    }

    if config.inbox_capacity == 0 {
        errors.push("inbox_capacity must be at least 1".to_string());
    }

    for (irc_channel, discord_channel) in config.mapping_pairs() {
        if irc_channel.is_empty() {
            errors.push("mappings contains an empty IRC channel name".to_string());
        }
        if discord_channel == 0 {
            errors.push(format!(
                "mappings.\"{}\" must be a non-zero Discord channel ID",
                irc_channel
            ));
        }
    }

    if config.mappings.is_empty() {
        errors.push("mappings is empty - no message routing configured".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
