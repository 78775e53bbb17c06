//! Error types for the bridge.

use thiserror::Error;

/// Top-level bridge error.
///
/// Only configuration and capability problems end up here at startup; per-message
/// failures are logged and dropped by the router instead of surfacing as a
/// `BridgeError`.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("The bot does not have the 'Manage Webhooks' permission")]
    MissingWebhookPermission,

    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    #[error("{component} failed: {source}")]
    Session {
        component: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Channel mapping table construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("IRC channel '{channel}' appears in more than one mapping")]
    DuplicateIrcChannel { channel: String },

    #[error("Discord channel {channel} appears in more than one mapping")]
    DuplicateDiscordChannel { channel: u64 },
}

/// Failure to look something up in the cached guild state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The guild is known but the entity is not in it (deleted, or never existed).
    #[error("not found in guild state")]
    NotFound,

    /// The guild state itself is not loaded, so nothing can be confirmed.
    #[error("guild state unavailable: {message}")]
    Unavailable { message: String },
}

/// A message could not be normalized. Aborts that single message only.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("channel mention <#{id}> could not be resolved: {source}")]
    Channel {
        id: u64,
        #[source]
        source: LookupError,
    },

    #[error("role mention <@&{id}> could not be resolved: {source}")]
    Role {
        id: u64,
        #[source]
        source: LookupError,
    },

    #[error("mention pattern failed: {0}")]
    Pattern(#[from] fancy_regex::Error),
}

/// Outbound webhook delivery errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no webhook available for Discord channel {channel}")]
    NoWebhook { channel: u64 },

    #[error("Serenity error: {0}")]
    Discord(#[from] serenity::Error),
}

/// Result type alias using BridgeError.
pub type Result<T> = std::result::Result<T, BridgeError>;
