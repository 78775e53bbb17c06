//! Bridge orchestrator.
//!
//! Builds the mapping table and inboxes, spawns the router, and exposes the
//! handle used to open and close the bridge.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::bridge::channels::{ChannelBundle, InboxSenders};
use crate::bridge::lifecycle::{Lifecycle, Phase};
use crate::bridge::mapping::{MappingTable, SharedMappings};
use crate::bridge::router::Router;
use crate::bridge::sessions::{IrcListener, ProtocolSession, SessionManager, WebhookDispatcher};
use crate::common::error::{BridgeError, Result};
use crate::common::IrcMessage;
use crate::config::types::Config;
use crate::discord::avatar::AvatarResolver;
use crate::discord::client::DiscordSession;
use crate::discord::state::GuildState;

/// Build the shared mapping table from configuration.
pub fn build_mappings(config: &Config) -> Result<SharedMappings> {
    let table = MappingTable::build(config.mapping_pairs())?;
    info!("Configured {} channel mappings", table.len());
    Ok(Arc::new(table))
}

/// Collaborators the router drives.
pub struct BridgeParts {
    pub discord: Arc<dyn ProtocolSession>,
    pub irc_listener: Arc<dyn IrcListener>,
    pub sessions: Arc<dyn SessionManager>,
    pub dispatcher: Arc<dyn WebhookDispatcher>,
    pub guild_state: Arc<dyn GuildState>,
}

/// Handle on a running bridge.
pub struct Bridge {
    mappings: SharedMappings,
    senders: InboxSenders,
    lifecycle: Lifecycle,
    discord: Arc<dyn ProtocolSession>,
    irc_listener: Arc<dyn IrcListener>,
    _router: JoinHandle<()>,
}

impl Bridge {
    /// Spawn the router over `channels` and return the handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: &Config,
        mappings: SharedMappings,
        channels: ChannelBundle,
        parts: BridgeParts,
    ) -> Self {
        let lifecycle = Lifecycle::new();

        let router = Router {
            guild_id: config.discord.guild_id,
            mappings: Arc::clone(&mappings),
            receivers: channels.receivers,
            lifecycle: lifecycle.clone(),
            avatars: AvatarResolver::new(parts.guild_state),
            dispatcher: parts.dispatcher,
            sessions: parts.sessions,
            discord: Arc::clone(&parts.discord),
            irc_listener: Arc::clone(&parts.irc_listener),
        };
        let router = tokio::spawn(router.run());

        Self {
            mappings,
            senders: channels.senders,
            lifecycle,
            discord: parts.discord,
            irc_listener: parts.irc_listener,
            _router: router,
        }
    }

    /// Build the Discord session and assemble the bridge around it.
    ///
    /// `irc_listener` is given the inbox senders and mapping table so it can
    /// join the mapped channels and forward what it hears.
    pub async fn with_discord<F>(
        config: &Config,
        irc_listener: F,
        sessions: Arc<dyn SessionManager>,
    ) -> Result<Self>
    where
        F: FnOnce(&InboxSenders, &SharedMappings) -> Arc<dyn IrcListener>,
    {
        let mappings = build_mappings(config)?;
        let channels = ChannelBundle::new(config.inbox_capacity);

        let discord =
            DiscordSession::new(config, channels.senders.clone(), Arc::clone(&mappings)).await?;
        let irc_listener = irc_listener(&channels.senders, &mappings);

        let parts = BridgeParts {
            dispatcher: discord.dispatcher(),
            guild_state: discord.guild_state(),
            discord: Arc::new(discord),
            irc_listener,
            sessions,
        };
        Ok(Self::new(config, mappings, channels, parts))
    }

    /// Connect Discord, then the IRC listener.
    pub async fn open(&self) -> Result<()> {
        self.discord
            .open()
            .await
            .map_err(|e| session_error("discord", e))?;
        debug!("Discord session open");

        self.irc_listener
            .open()
            .await
            .map_err(|e| session_error("irc", e))?;

        info!("Bridge open with {} mappings", self.mappings.len());
        Ok(())
    }

    /// Shut the bridge down and wait until every session has closed.
    ///
    /// Safe to call more than once and from several tasks at a time; only the
    /// first call starts the shutdown, every call returns once it finished.
    pub async fn close(&self) {
        if self.lifecycle.request_shutdown() {
            info!("Shutdown requested");
        }
        self.lifecycle.wait_closed().await;
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    /// Sender for the IRC inbox.
    pub fn irc_sender(&self) -> mpsc::Sender<IrcMessage> {
        self.senders.from_irc.clone()
    }

    pub fn senders(&self) -> InboxSenders {
        self.senders.clone()
    }

    pub fn mappings(&self) -> SharedMappings {
        Arc::clone(&self.mappings)
    }

    /// IRC channels the listener has to be in.
    pub fn irc_channels(&self) -> Vec<String> {
        self.mappings
            .irc_channels()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Change the IRC listener's nick.
    pub fn set_irc_listener_name(&self, name: &str) {
        self.irc_listener.set_nick(name);
    }
}

/// Keep bridge errors raised inside a session (e.g. missing webhook
/// permission) as they are, and wrap anything else.
fn session_error(component: &'static str, source: anyhow::Error) -> BridgeError {
    match source.downcast::<BridgeError>() {
        Ok(e) => e,
        Err(source) => BridgeError::Session { component, source },
    }
}
