//! Discord <-> IRC bridge core.
//!
//! Relays messages between mapped Discord and IRC channels, posting IRC
//! messages into Discord through webhooks and handing Discord messages and
//! presence changes to a per-user IRC session manager.

pub mod bridge;
pub mod common;
pub mod config;
pub mod discord;
pub mod logging;

#[cfg(test)]
mod testing;

pub use bridge::{Bridge, BridgeParts, Phase};
pub use common::error::{BridgeError, Result};
pub use config::Config;
