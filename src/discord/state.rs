//! Read-only view of the cached guild state.
//!
//! The normalizer, presence tracker and avatar resolver only ever read the
//! gateway cache through `GuildState`, which keeps them independent from
//! serenity and lets tests feed them fixed guild data.

use std::sync::Arc;

use serenity::cache::{Cache, GuildRef};
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use serenity::model::user::{OnlineStatus, User};

use crate::common::error::LookupError;
use crate::common::{MemberIdentity, PresenceStatus};

/// Lookups against locally cached guild data.
pub trait GuildState: Send + Sync {
    /// ID of the bot's own user.
    fn current_user_id(&self) -> u64;

    fn channel_name(&self, guild_id: u64, channel_id: u64) -> Result<String, LookupError>;

    fn role_name(&self, guild_id: u64, role_id: u64) -> Result<String, LookupError>;

    fn member(&self, guild_id: u64, user_id: u64) -> Result<MemberIdentity, LookupError>;

    /// Every member currently known for the guild.
    fn members(&self, guild_id: u64) -> Result<Vec<MemberIdentity>, LookupError>;

    /// `NotFound` means no presence has been received for the user yet.
    fn presence(&self, guild_id: u64, user_id: u64) -> Result<PresenceStatus, LookupError>;
}

/// Build a member identity from a Discord user and their guild nickname.
pub fn member_identity(user: &User, nick: Option<&str>) -> MemberIdentity {
    MemberIdentity {
        user_id: user.id.get(),
        username: user.name.clone(),
        nick: nick.map(str::to_string),
        discriminator: user
            .discriminator
            .map(|d| format!("{:04}", d.get()))
            .unwrap_or_default(),
        bot: user.bot,
        avatar_url: Some(user.face()),
    }
}

/// Map a gateway status to the bridge's presence status.
///
/// Invisible users are reported as offline to everybody else.
pub fn presence_status(status: OnlineStatus) -> PresenceStatus {
    match status {
        OnlineStatus::Offline | OnlineStatus::Invisible => PresenceStatus::Offline,
        OnlineStatus::Idle => PresenceStatus::Idle,
        OnlineStatus::DoNotDisturb => PresenceStatus::DoNotDisturb,
        _ => PresenceStatus::Online,
    }
}

/// `GuildState` backed by serenity's gateway cache.
#[derive(Clone)]
pub struct CacheState {
    cache: Arc<Cache>,
}

impl CacheState {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self { cache }
    }

    fn guild(&self, guild_id: u64) -> Result<GuildRef<'_>, LookupError> {
        if guild_id == 0 {
            return Err(LookupError::NotFound);
        }
        self.cache
            .guild(GuildId::new(guild_id))
            .ok_or_else(|| LookupError::Unavailable {
                message: format!("guild {} is not cached", guild_id),
            })
    }
}

impl GuildState for CacheState {
    fn current_user_id(&self) -> u64 {
        self.cache.current_user().id.get()
    }

    fn channel_name(&self, guild_id: u64, channel_id: u64) -> Result<String, LookupError> {
        let guild = self.guild(guild_id)?;
        if channel_id == 0 {
            return Err(LookupError::NotFound);
        }
        let channel_id = ChannelId::new(channel_id);

        if let Some(channel) = guild.channels.get(&channel_id) {
            return Ok(channel.name.clone());
        }
        guild
            .threads
            .iter()
            .find(|thread| thread.id == channel_id)
            .map(|thread| thread.name.clone())
            .ok_or(LookupError::NotFound)
    }

    fn role_name(&self, guild_id: u64, role_id: u64) -> Result<String, LookupError> {
        let guild = self.guild(guild_id)?;
        if role_id == 0 {
            return Err(LookupError::NotFound);
        }
        guild
            .roles
            .get(&RoleId::new(role_id))
            .map(|role| role.name.clone())
            .ok_or(LookupError::NotFound)
    }

    fn member(&self, guild_id: u64, user_id: u64) -> Result<MemberIdentity, LookupError> {
        let guild = self.guild(guild_id)?;
        if user_id == 0 {
            return Err(LookupError::NotFound);
        }
        guild
            .members
            .get(&UserId::new(user_id))
            .map(|member| member_identity(&member.user, member.nick.as_deref()))
            .ok_or(LookupError::NotFound)
    }

    fn members(&self, guild_id: u64) -> Result<Vec<MemberIdentity>, LookupError> {
        let guild = self.guild(guild_id)?;
        Ok(guild
            .members
            .values()
            .map(|member| member_identity(&member.user, member.nick.as_deref()))
            .collect())
    }

    fn presence(&self, guild_id: u64, user_id: u64) -> Result<PresenceStatus, LookupError> {
        let guild = self.guild(guild_id)?;
        if user_id == 0 {
            return Err(LookupError::NotFound);
        }
        guild
            .presences
            .get(&UserId::new(user_id))
            .map(|presence| presence_status(presence.status))
            .ok_or(LookupError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_status_mapping() {
        assert_eq!(presence_status(OnlineStatus::Online), PresenceStatus::Online);
        assert_eq!(presence_status(OnlineStatus::Idle), PresenceStatus::Idle);
        assert_eq!(
            presence_status(OnlineStatus::DoNotDisturb),
            PresenceStatus::DoNotDisturb
        );
        assert_eq!(presence_status(OnlineStatus::Offline), PresenceStatus::Offline);
        assert_eq!(presence_status(OnlineStatus::Invisible), PresenceStatus::Offline);
    }

    #[test]
    fn test_uncached_guild_is_unavailable() {
        let state = CacheState::new(Arc::new(Cache::new()));
        assert!(matches!(
            state.channel_name(42, 7),
            Err(LookupError::Unavailable { .. })
        ));
        assert!(matches!(
            state.members(42),
            Err(LookupError::Unavailable { .. })
        ));
    }
}
