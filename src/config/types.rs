//! Configuration type definitions.

use std::collections::HashMap;

use serde::Deserialize;

/// Default number of buffered events per router inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 64;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    pub irc: IrcConfig,
    /// IRC channel -> Discord channel ID.
    #[serde(default)]
    pub mappings: HashMap<String, u64>,
    /// Disables per-user IRC sessions; only the listener relays messages.
    #[serde(default)]
    pub simple_mode: bool,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    pub guild_id: u64,
}

/// IRC network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    /// `host:port` of the IRC server.
    #[serde(default)]
    pub server: String,
    #[serde(default = "default_true")]
    pub use_tls: bool,
    /// Accept any certificate. Only for testing.
    #[serde(default)]
    pub insecure_skip_verify: bool,
    /// Nick of the listener connection, e.g. "DiscordBot".
    pub listener_name: String,
    /// WebIRC shared secret, if the network grants one.
    #[serde(default)]
    pub webirc_pass: Option<String>,
    /// Appended to Discord users' nicks on the IRC side.
    #[serde(default)]
    pub suffix: String,
}

/// Connection settings handed to each IRC connection the bridge opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcConnectionSettings {
    pub use_tls: bool,
    pub insecure_skip_verify: bool,
    /// WEBIRC line parameters: `<pass> discord <hostname> <ip>`.
    pub webirc: Option<String>,
}

impl Config {
    /// Channel mappings as `(irc_channel, discord_channel)` pairs, ordered by IRC channel.
    pub fn mapping_pairs(&self) -> Vec<(String, u64)> {
        let mut pairs: Vec<(String, u64)> = self
            .mappings
            .iter()
            .map(|(irc, discord)| (irc.clone(), *discord))
            .collect();
        pairs.sort();
        pairs
    }

    /// Settings for an IRC connection made on behalf of a user at `hostname`/`ip`.
    pub fn irc_connection_settings(&self, hostname: &str, ip: &str) -> IrcConnectionSettings {
        let webirc = self
            .irc
            .webirc_pass
            .as_deref()
            .filter(|pass| !pass.is_empty())
            .map(|pass| format!("{} discord {} {}", pass, hostname, ip));

        IrcConnectionSettings {
            use_tls: self.irc.use_tls,
            insecure_skip_verify: self.irc.insecure_skip_verify,
            webirc,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_inbox_capacity() -> usize {
    DEFAULT_INBOX_CAPACITY
}

#[cfg(test)]
pub(crate) fn make_test_config() -> Config {
    Config {
        discord: DiscordConfig {
            token: "test_token".to_string(),
            guild_id: 1000,
        },
        irc: IrcConfig {
            server: "irc.example.net:6697".to_string(),
            use_tls: true,
            insecure_skip_verify: false,
            listener_name: "DiscordBot".to_string(),
            webirc_pass: None,
            suffix: "_d2".to_string(),
        },
        mappings: HashMap::from([
            ("#general".to_string(), 111),
            ("#random".to_string(), 222),
        ]),
        simple_mode: false,
        debug: false,
        inbox_capacity: DEFAULT_INBOX_CAPACITY,
    }
}
