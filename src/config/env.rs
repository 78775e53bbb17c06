//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `DIB_DISCORD_TOKEN` - Discord bot token
//! - `DIB_GUILD_ID` - Discord guild ID
//! - `DIB_IRC_SERVER` - IRC server address
//! - `DIB_WEBIRC_PASS` - WebIRC shared secret

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "DIB";

/// Apply environment variable overrides to a config.
///
/// This allows secrets like the bot token to be provided via the
/// environment instead of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.token = token;
    }

    if let Ok(guild_id) = env::var(format!("{}_GUILD_ID", ENV_PREFIX)) {
        if let Ok(id) = guild_id.parse() {
            config.discord.guild_id = id;
        }
    }

    if let Ok(server) = env::var(format!("{}_IRC_SERVER", ENV_PREFIX)) {
        config.irc.server = server;
    }

    if let Ok(pass) = env::var(format!("{}_WEBIRC_PASS", ENV_PREFIX)) {
        config.irc.webirc_pass = Some(pass);
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `DIB_CONFIG` environment variable, otherwise returns "bridge.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "bridge.conf".to_string())
}
