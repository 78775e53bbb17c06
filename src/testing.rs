//! Test doubles for the bridge's collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serenity::async_trait;

use crate::bridge::sessions::{IrcListener, ProtocolSession, SessionManager, WebhookDispatcher};
use crate::common::error::{DispatchError, LookupError};
use crate::common::{DiscordMessage, MemberIdentity, PresenceStatus, UserPresence, WebhookPost};
use crate::discord::state::GuildState;

pub const GUILD_ID: u64 = 1000;
pub const BOT_USER_ID: u64 = 1;

/// Fixed guild data. Setting `available = false` makes every lookup fail
/// with `LookupError::Unavailable`.
#[derive(Debug, Clone)]
pub struct FakeGuildState {
    pub available: bool,
    pub channels: HashMap<u64, String>,
    pub roles: HashMap<u64, String>,
    pub members: Vec<MemberIdentity>,
    pub presences: HashMap<u64, PresenceStatus>,
}

impl Default for FakeGuildState {
    fn default() -> Self {
        Self {
            available: true,
            channels: HashMap::new(),
            roles: HashMap::new(),
            members: Vec::new(),
            presences: HashMap::new(),
        }
    }
}

impl FakeGuildState {
    fn check(&self, guild_id: u64) -> Result<(), LookupError> {
        if self.available && guild_id == GUILD_ID {
            Ok(())
        } else {
            Err(LookupError::Unavailable {
                message: "not cached".to_string(),
            })
        }
    }
}

impl GuildState for FakeGuildState {
    fn current_user_id(&self) -> u64 {
        BOT_USER_ID
    }

    fn channel_name(&self, guild_id: u64, channel_id: u64) -> Result<String, LookupError> {
        self.check(guild_id)?;
        self.channels
            .get(&channel_id)
            .cloned()
            .ok_or(LookupError::NotFound)
    }

    fn role_name(&self, guild_id: u64, role_id: u64) -> Result<String, LookupError> {
        self.check(guild_id)?;
        self.roles.get(&role_id).cloned().ok_or(LookupError::NotFound)
    }

    fn member(&self, guild_id: u64, user_id: u64) -> Result<MemberIdentity, LookupError> {
        self.check(guild_id)?;
        self.members
            .iter()
            .find(|m| m.user_id == user_id)
            .cloned()
            .ok_or(LookupError::NotFound)
    }

    fn members(&self, guild_id: u64) -> Result<Vec<MemberIdentity>, LookupError> {
        self.check(guild_id)?;
        Ok(self.members.clone())
    }

    fn presence(&self, guild_id: u64, user_id: u64) -> Result<PresenceStatus, LookupError> {
        self.check(guild_id)?;
        self.presences
            .get(&user_id)
            .copied()
            .ok_or(LookupError::NotFound)
    }
}

pub fn member(user_id: u64, username: &str, nick: Option<&str>) -> MemberIdentity {
    MemberIdentity {
        user_id,
        username: username.to_string(),
        nick: nick.map(str::to_string),
        discriminator: "0420".to_string(),
        bot: false,
        avatar_url: Some(format!("https://cdn.discordapp.com/avatars/{}/a.png", user_id)),
    }
}

/// Shared, ordered record of collaborator calls.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Protocol session that records open/close calls.
pub struct RecordingSession {
    pub name: &'static str,
    pub log: CallLog,
    pub fail_open: bool,
}

impl RecordingSession {
    pub fn new(name: &'static str, log: CallLog) -> Self {
        Self {
            name,
            log,
            fail_open: false,
        }
    }
}

#[async_trait]
impl ProtocolSession for RecordingSession {
    async fn open(&self) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(format!("{}.open", self.name));
        if self.fail_open {
            anyhow::bail!("{} refused to open", self.name);
        }
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(format!("{}.close", self.name));
        Ok(())
    }
}

impl IrcListener for RecordingSession {
    fn set_nick(&self, nick: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}.nick {}", self.name, nick));
    }
}

/// Session manager that records every signal and message it is handed.
#[derive(Default)]
pub struct RecordingSessions {
    pub log: CallLog,
    pub users: Mutex<Vec<UserPresence>>,
    pub messages: Mutex<Vec<(String, DiscordMessage)>>,
}

impl RecordingSessions {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }
}

#[async_trait]
impl SessionManager for RecordingSessions {
    fn handle_user(&self, user: UserPresence) {
        self.users.lock().unwrap().push(user);
    }

    fn send_message(&self, irc_channel: &str, message: DiscordMessage) {
        self.messages
            .lock()
            .unwrap()
            .push((irc_channel.to_string(), message));
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.log.lock().unwrap().push("sessions.close".to_string());
        Ok(())
    }
}

/// Webhook dispatcher that records posts and knows a fixed set of puppets.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub posts: Mutex<Vec<(u64, WebhookPost)>>,
    pub puppets: HashSet<u64>,
    /// Channels whose posts fail.
    pub failing: HashSet<u64>,
}

#[async_trait]
impl WebhookDispatcher for RecordingDispatcher {
    async fn execute(&self, discord_channel: u64, post: WebhookPost) -> Result<(), DispatchError> {
        if self.failing.contains(&discord_channel) {
            return Err(DispatchError::NoWebhook {
                channel: discord_channel,
            });
        }
        self.posts.lock().unwrap().push((discord_channel, post));
        Ok(())
    }

    async fn is_puppet(&self, user_id: u64) -> bool {
        self.puppets.contains(&user_id)
    }
}
