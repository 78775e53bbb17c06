//! Discord side of the bridge.
//!
//! ## Module Structure
//!
//! - `state`: read-only lookups against the gateway cache
//! - `normalizer`: Discord markup to single-line IRC text
//! - `adapter`: message events to router inbox messages
//! - `events`: per-event decisions behind the serenity handler
//! - `presence`: presence/member events to per-user session signals
//! - `avatar`: IRC nick to guild member avatar
//! - `webhook`: outbound posts through per-channel webhooks
//! - `client`: the serenity client and its event handler

pub mod adapter;
pub mod avatar;
pub mod client;
pub mod events;
pub mod normalizer;
pub mod presence;
pub mod state;
pub mod webhook;

pub use adapter::MessageAdapter;
pub use avatar::AvatarResolver;
pub use client::DiscordSession;
pub use events::GatewayEvents;
pub use normalizer::TextNormalizer;
pub use presence::PresenceTracker;
pub use state::{CacheState, GuildState};
pub use webhook::WebhookDemux;
