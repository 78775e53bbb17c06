//! What the bridge does with each gateway event.
//!
//! The serenity event handler converts its arguments and delegates here, so
//! every decision (guild filter, echo filter, ping reply, simple mode) works
//! on plain data and a `GuildState`.

use std::sync::Arc;

use tracing::debug;

use crate::bridge::sessions::WebhookDispatcher;
use crate::common::{DiscordMessage, MemberIdentity, PresenceStatus, SourceMessage, UserPresence};
use crate::discord::adapter::MessageAdapter;
use crate::discord::presence::PresenceTracker;
use crate::discord::state::GuildState;

/// Content that gets a `Pong!` reply.
pub const PING: &str = "ping";

/// Result of a message event.
#[derive(Debug, Default)]
pub struct MessageOutcome {
    /// Answer with `Pong!` in the message's channel.
    pub reply_pong: bool,
    /// Events for the Discord inbox.
    pub events: Vec<DiscordMessage>,
}

pub struct GatewayEvents {
    guild_id: u64,
    adapter: MessageAdapter,
    /// `None` in simple mode.
    presence: Option<PresenceTracker>,
    dispatcher: Arc<dyn WebhookDispatcher>,
}

impl GatewayEvents {
    pub fn new(guild_id: u64, simple_mode: bool, dispatcher: Arc<dyn WebhookDispatcher>) -> Self {
        Self {
            guild_id,
            adapter: MessageAdapter::new(guild_id),
            presence: (!simple_mode).then(|| PresenceTracker::new(guild_id)),
            dispatcher,
        }
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    /// Whether presence and member events are turned into signals.
    pub fn tracks_presence(&self) -> bool {
        self.presence.is_some()
    }

    fn is_our_guild(&self, guild_id: Option<u64>) -> bool {
        guild_id == Some(self.guild_id)
    }

    /// A message was posted. Messages from other guilds, from the bot and
    /// from its webhooks produce nothing, not even a ping reply.
    pub async fn on_message(
        &self,
        guild_id: Option<u64>,
        source: SourceMessage,
        state: &dyn GuildState,
    ) -> MessageOutcome {
        if !self.is_our_guild(guild_id) {
            return MessageOutcome::default();
        }
        if self.adapter.is_echo(&source, state, &*self.dispatcher).await {
            debug!(author = source.author_id, "Ignoring message from our own identity");
            return MessageOutcome::default();
        }

        MessageOutcome {
            reply_pong: source.content == PING,
            events: self.adapter.convert(source, state),
        }
    }

    pub fn on_presence(
        &self,
        guild_id: Option<u64>,
        user_id: u64,
        status: PresenceStatus,
        state: &dyn GuildState,
    ) -> Vec<UserPresence> {
        match &self.presence {
            Some(tracker) if self.is_our_guild(guild_id) => {
                tracker.on_presence(user_id, status, state).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    /// A full presence snapshot. Entries without a guild belong to ours.
    pub fn on_presence_replace(
        &self,
        presences: &[(Option<u64>, u64, PresenceStatus)],
        state: &dyn GuildState,
    ) -> Vec<UserPresence> {
        let Some(tracker) = &self.presence else {
            return Vec::new();
        };

        let reports: Vec<_> = presences
            .iter()
            .filter(|(guild_id, _, _)| guild_id.map_or(true, |id| id == self.guild_id))
            .map(|&(_, user_id, status)| (user_id, status))
            .collect();
        tracker.on_presence_replace(&reports, state)
    }

    /// A member joined or changed.
    pub fn on_member(
        &self,
        guild_id: u64,
        member: &MemberIdentity,
        state: &dyn GuildState,
    ) -> Vec<UserPresence> {
        match &self.presence {
            Some(tracker) if self.is_our_guild(Some(guild_id)) => {
                tracker.on_member(member, state).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn on_member_chunk(
        &self,
        guild_id: u64,
        members: &[MemberIdentity],
        state: &dyn GuildState,
    ) -> Vec<UserPresence> {
        match &self.presence {
            Some(tracker) if self.is_our_guild(Some(guild_id)) => {
                debug!("Received {} guild members", members.len());
                tracker.on_member_chunk(members, state)
            }
            _ => Vec::new(),
        }
    }
}
