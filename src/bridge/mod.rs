//! The bridge core: mapping table, inboxes, router and lifecycle.
//!
//! ## Module Structure
//!
//! - `mapping`: IRC channel <-> Discord channel table
//! - `channels`: the router's three inboxes
//! - `sessions`: interfaces of the collaborators the router drives
//! - `lifecycle`: running/shutting down/closed phase
//! - `router`: the event loop
//! - `orchestrator`: the `Bridge` handle

pub mod channels;
pub mod lifecycle;
pub mod mapping;
pub mod orchestrator;
pub mod router;
pub mod sessions;

pub use channels::{ChannelBundle, InboxReceivers, InboxSenders};
pub use lifecycle::Phase;
pub use mapping::{Mapping, MappingTable, SharedMappings};
pub use orchestrator::{build_mappings, Bridge, BridgeParts};
pub use sessions::{IrcListener, ProtocolSession, SessionManager, WebhookDispatcher};
