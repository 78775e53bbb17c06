//! Presence tracking for per-user IRC sessions.
//!
//! Presence and member events arrive on independent streams. A user is only
//! reported online once the cache holds both a member record and a non-offline
//! presence for them; going offline is reported straight away.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::common::{MemberIdentity, PresenceStatus, UserPresence};
use crate::discord::state::GuildState;

/// Last state reported for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserState {
    #[default]
    Unknown,
    Online,
    Offline,
}

#[derive(Debug)]
pub struct PresenceTracker {
    guild_id: u64,
    states: Mutex<HashMap<u64, UserState>>,
}

impl PresenceTracker {
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// A single presence report.
    pub fn on_presence(
        &self,
        user_id: u64,
        status: PresenceStatus,
        state: &dyn GuildState,
    ) -> Option<UserPresence> {
        if status.is_offline() {
            self.record(user_id, UserState::Offline);
            return Some(UserPresence::offline(user_id));
        }

        match state.member(self.guild_id, user_id) {
            Ok(member) => self.on_member(&member, state),
            Err(e) => {
                debug!(user_id, "Presence for unknown member: {}", e);
                None
            }
        }
    }

    /// A single membership report (join, update, or one entry of a chunk).
    pub fn on_member(
        &self,
        member: &MemberIdentity,
        state: &dyn GuildState,
    ) -> Option<UserPresence> {
        match state.presence(self.guild_id, member.user_id) {
            Ok(status) if !status.is_offline() => {
                self.record(member.user_id, UserState::Online);
                Some(UserPresence::online(member))
            }
            Ok(_) => None,
            Err(e) => {
                debug!(user_id = member.user_id, "No cached presence yet: {}", e);
                None
            }
        }
    }

    /// A bulk member list, e.g. a guild members chunk.
    pub fn on_member_chunk(
        &self,
        members: &[MemberIdentity],
        state: &dyn GuildState,
    ) -> Vec<UserPresence> {
        members
            .iter()
            .filter_map(|member| self.on_member(member, state))
            .collect()
    }

    /// A bulk presence snapshot replacing everything known so far.
    pub fn on_presence_replace(
        &self,
        presences: &[(u64, PresenceStatus)],
        state: &dyn GuildState,
    ) -> Vec<UserPresence> {
        presences
            .iter()
            .filter_map(|&(user_id, status)| self.on_presence(user_id, status, state))
            .collect()
    }

    /// Last state reported for `user_id`.
    pub fn user_state(&self, user_id: u64) -> UserState {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }

    /// Store the state reported for `user_id` and return the previous one.
    fn record(&self, user_id: u64, user_state: UserState) -> UserState {
        let previous = self
            .states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id, user_state)
            .unwrap_or_default();

        if previous != user_state {
            debug!(user_id, ?previous, current = ?user_state, "User presence changed");
        }
        previous
    }
}
