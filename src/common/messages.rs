//! Canonical message types for bridge communication.
//!
//! These are what the protocol adapters push into the router's inboxes. They
//! carry plain ids and strings so the router never touches a protocol library
//! type directly.

use std::sync::Arc;

/// Message received on IRC, headed for Discord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    /// IRC channel the message was said in (e.g. `#general`).
    pub irc_channel: String,
    /// Nick of the IRC user who said it.
    pub username: String,
    /// Message text.
    pub message: String,
}

/// A user referenced by an `<@id>` mention in a Discord message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionedUser {
    pub id: u64,
    /// Account name, used for the low-fidelity `@name` fallback.
    pub name: String,
}

/// A file attached to a Discord message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
}

/// The raw Discord message as received from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMessage {
    pub author_id: u64,
    pub channel_id: u64,
    /// Raw, un-normalized content with Discord markup.
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub mentions: Vec<MentionedUser>,
}

/// Normalized message from Discord, headed for IRC.
///
/// One is produced for the text body and one per attachment; all of them share
/// the same `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordMessage {
    pub source: Arc<SourceMessage>,
    /// IRC-safe single-line text, or the attachment URL.
    pub content: String,
    /// Third-person action (`/me`) on the IRC side.
    pub is_action: bool,
}

impl DiscordMessage {
    /// Discord channel the message was posted in.
    pub fn channel_id(&self) -> u64 {
        self.source.channel_id
    }
}

/// Presence status as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceStatus {
    Online,
    Idle,
    DoNotDisturb,
    Offline,
}

impl PresenceStatus {
    pub fn is_offline(self) -> bool {
        matches!(self, PresenceStatus::Offline)
    }
}

/// Snapshot of a guild member's identity from cached state or a member event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberIdentity {
    pub user_id: u64,
    /// Account name.
    pub username: String,
    /// Guild nickname, if set.
    pub nick: Option<String>,
    /// Legacy four digit discriminator; empty for migrated usernames.
    pub discriminator: String,
    pub bot: bool,
    pub avatar_url: Option<String>,
}

impl MemberIdentity {
    /// Nickname when set, otherwise the account name.
    pub fn display_name(&self) -> &str {
        match self.nick.as_deref() {
            Some(nick) if !nick.is_empty() => nick,
            _ => &self.username,
        }
    }
}

/// Signal to the per-user IRC session manager that a Discord user went
/// online, changed identity, or went offline.
///
/// Offline signals only carry `user_id`; the identity fields are empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPresence {
    pub user_id: u64,
    pub discriminator: String,
    pub display_name: String,
    pub bot: bool,
    pub online: bool,
}

impl UserPresence {
    /// Offline signal carrying only the identity key.
    pub fn offline(user_id: u64) -> Self {
        Self {
            user_id,
            discriminator: String::new(),
            display_name: String::new(),
            bot: false,
            online: false,
        }
    }

    /// Online signal with full identity.
    pub fn online(member: &MemberIdentity) -> Self {
        Self {
            user_id: member.user_id,
            discriminator: member.discriminator.clone(),
            display_name: member.display_name().to_string(),
            bot: member.bot,
            online: true,
        }
    }
}

/// Outbound webhook post, as an IRC user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookPost {
    pub content: String,
    pub display_name: String,
    pub avatar_url: String,
}
