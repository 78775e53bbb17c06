//! Common types shared across the bridge.

pub mod error;
pub mod messages;

// Re-export message types from messages module
pub use messages::{
    Attachment, DiscordMessage, IrcMessage, MemberIdentity, MentionedUser, PresenceStatus,
    SourceMessage, UserPresence, WebhookPost,
};
