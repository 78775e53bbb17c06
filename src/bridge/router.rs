//! Bridge router.
//!
//! The single consumer of all three inboxes and the only caller of the
//! webhook dispatcher and session manager. Events within one inbox are
//! handled in arrival order; no order is kept between inboxes.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::bridge::channels::InboxReceivers;
use crate::bridge::lifecycle::{ClosedGuard, Lifecycle, Phase};
use crate::bridge::mapping::SharedMappings;
use crate::bridge::sessions::{IrcListener, ProtocolSession, SessionManager, WebhookDispatcher};
use crate::common::{DiscordMessage, IrcMessage, UserPresence, WebhookPost};
use crate::discord::avatar::AvatarResolver;

/// Base URL of the generated avatar used when an IRC user has no Discord twin.
pub const PLACEHOLDER_AVATAR_BASE: &str = "https://api.adorable.io/avatars/128/";

/// Deterministic placeholder avatar for `username`.
pub fn placeholder_avatar(username: &str) -> String {
    format!("{}{}", PLACEHOLDER_AVATAR_BASE, username)
}

/// Everything the router drives.
pub struct Router {
    pub(crate) guild_id: u64,
    pub(crate) mappings: SharedMappings,
    pub(crate) receivers: InboxReceivers,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) avatars: AvatarResolver,
    pub(crate) dispatcher: Arc<dyn WebhookDispatcher>,
    pub(crate) sessions: Arc<dyn SessionManager>,
    pub(crate) discord: Arc<dyn ProtocolSession>,
    pub(crate) irc_listener: Arc<dyn IrcListener>,
}

impl Router {
    /// Run until shutdown is requested, then close every session.
    pub async fn run(mut self) {
        let _closed = ClosedGuard(self.lifecycle.clone());
        let mut shutdown_rx = self.lifecycle.subscribe();

        let mut irc_open = true;
        let mut discord_open = true;
        let mut presence_open = true;

        while self.lifecycle.phase() == Phase::Running {
            tokio::select! {
                biased;

                result = shutdown_rx.changed() => {
                    if result.is_err() {
                        break;
                    }
                }

                message = self.receivers.from_irc.recv(), if irc_open => {
                    match message {
                        Some(message) => self.handle_irc_message(message).await,
                        None => {
                            debug!("IRC inbox closed");
                            irc_open = false;
                        }
                    }
                }

                message = self.receivers.from_discord.recv(), if discord_open => {
                    match message {
                        Some(message) => self.handle_discord_message(message),
                        None => {
                            debug!("Discord inbox closed");
                            discord_open = false;
                        }
                    }
                }

                update = self.receivers.presence.recv(), if presence_open => {
                    match update {
                        Some(update) => self.handle_presence(update),
                        None => {
                            debug!("Presence inbox closed");
                            presence_open = false;
                        }
                    }
                }
            }
        }

        self.shutdown().await;
    }

    async fn handle_irc_message(&self, message: IrcMessage) {
        let Some(mapping) = self.mappings.lookup_by_irc(&message.irc_channel) else {
            debug!(
                irc_channel = %message.irc_channel,
                "Ignoring message sent from an unmapped IRC channel"
            );
            return;
        };

        let avatar_url = self
            .avatars
            .resolve(self.guild_id, &message.username)
            .unwrap_or_else(|| placeholder_avatar(&message.username));

        let post = WebhookPost {
            content: message.message,
            display_name: message.username,
            avatar_url,
        };

        if let Err(e) = self.dispatcher.execute(mapping.discord_channel, post).await {
            warn!(
                irc_channel = %mapping.irc_channel,
                discord_channel = mapping.discord_channel,
                "Message from IRC to Discord was not delivered: {}", e
            );
        }
    }

    fn handle_discord_message(&self, message: DiscordMessage) {
        let Some(mapping) = self.mappings.lookup_by_discord(message.channel_id()) else {
            return;
        };
        self.sessions.send_message(&mapping.irc_channel, message);
    }

    fn handle_presence(&self, update: UserPresence) {
        self.sessions.handle_user(update);
    }

    /// Close Discord, then the IRC listener, then the per-user sessions.
    async fn shutdown(&mut self) {
        info!("Closing bridge");
        self.receivers.from_irc.close();
        self.receivers.from_discord.close();
        self.receivers.presence.close();

        if let Err(e) = self.discord.close().await {
            error!("Failed to close Discord session: {:#}", e);
        }
        if let Err(e) = self.irc_listener.close().await {
            error!("Failed to close IRC listener: {:#}", e);
        }
        if let Err(e) = self.sessions.close().await {
            error!("Failed to close IRC sessions: {:#}", e);
        }

        self.lifecycle.mark_closed();
        info!("Bridge closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_avatar() {
        assert_eq!(
            placeholder_avatar("someone"),
            "https://api.adorable.io/avatars/128/someone"
        );
    }
}
