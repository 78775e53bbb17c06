//! Interfaces of the collaborators the router drives.
//!
//! The IRC listener and per-user session manager live outside this crate;
//! the Discord session and webhook dispatcher are implemented in
//! [`crate::discord`].

use serenity::async_trait;

use crate::common::error::DispatchError;
use crate::common::{DiscordMessage, UserPresence, WebhookPost};

/// A connection to one of the two chat networks.
#[async_trait]
pub trait ProtocolSession: Send + Sync {
    async fn open(&self) -> anyhow::Result<()>;

    async fn close(&self) -> anyhow::Result<()>;
}

/// The bridge's own IRC connection, joined to every mapped channel.
///
/// It pushes what it hears into the router's IRC inbox.
pub trait IrcListener: ProtocolSession {
    fn set_nick(&self, nick: &str);
}

/// Opens, updates and tears down one IRC connection per Discord user.
///
/// `handle_user` and `send_message` are fire-and-forget: the manager queues the
/// work and returns immediately.
#[async_trait]
pub trait SessionManager: Send + Sync {
    fn handle_user(&self, user: UserPresence);

    fn send_message(&self, irc_channel: &str, message: DiscordMessage);

    async fn close(&self) -> anyhow::Result<()>;
}

/// Posts messages into Discord channels under an arbitrary name and avatar.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    async fn execute(&self, discord_channel: u64, post: WebhookPost) -> Result<(), DispatchError>;

    /// Whether `user_id` is one of the identities the dispatcher posts as.
    async fn is_puppet(&self, user_id: u64) -> bool;
}
