//! Router inboxes.
//!
//! Three bounded queues carry everything into the router: messages heard on
//! IRC, normalized messages from Discord, and presence signals. Producers wait
//! when a queue is full.

use tokio::sync::mpsc;

use crate::common::{DiscordMessage, IrcMessage, UserPresence};
use crate::config::types::DEFAULT_INBOX_CAPACITY;

/// Producer side, handed to the protocol adapters.
#[derive(Debug, Clone)]
pub struct InboxSenders {
    /// IRC listener -> router.
    pub from_irc: mpsc::Sender<IrcMessage>,
    /// Discord adapter -> router.
    pub from_discord: mpsc::Sender<DiscordMessage>,
    /// Presence tracker -> router. Unused in simple mode.
    pub presence: mpsc::Sender<UserPresence>,
}

/// Consumer side, owned by the router task.
#[derive(Debug)]
pub struct InboxReceivers {
    pub from_irc: mpsc::Receiver<IrcMessage>,
    pub from_discord: mpsc::Receiver<DiscordMessage>,
    pub presence: mpsc::Receiver<UserPresence>,
}

/// Bundle of all inboxes created for one bridge.
#[derive(Debug)]
pub struct ChannelBundle {
    pub senders: InboxSenders,
    pub receivers: InboxReceivers,
}

impl ChannelBundle {
    /// Create the inboxes, each buffering up to `capacity` events.
    ///
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (irc_tx, irc_rx) = mpsc::channel(capacity);
        let (discord_tx, discord_rx) = mpsc::channel(capacity);
        let (presence_tx, presence_rx) = mpsc::channel(capacity);

        Self {
            senders: InboxSenders {
                from_irc: irc_tx,
                from_discord: discord_tx,
                presence: presence_tx,
            },
            receivers: InboxReceivers {
                from_irc: irc_rx,
                from_discord: discord_rx,
                presence: presence_rx,
            },
        }
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new(DEFAULT_INBOX_CAPACITY)
    }
}
