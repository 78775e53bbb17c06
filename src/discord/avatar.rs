//! Avatar lookup for IRC users posting through webhooks.

use std::sync::Arc;

use tracing::debug;

use crate::common::MemberIdentity;
use crate::discord::state::GuildState;

/// Finds the avatar of the guild member an IRC nick refers to.
#[derive(Clone)]
pub struct AvatarResolver {
    state: Arc<dyn GuildState>,
}

impl AvatarResolver {
    pub fn new(state: Arc<dyn GuildState>) -> Self {
        Self { state }
    }

    /// Avatar URL of the single member whose nickname or account name is
    /// `name`. `None` when nobody or more than one member matches.
    pub fn resolve(&self, guild_id: u64, name: &str) -> Option<String> {
        let members = match self.state.members(guild_id) {
            Ok(members) => members,
            Err(e) => {
                debug!("Member list unavailable for avatar lookup: {}", e);
                return None;
            }
        };

        find_unique_member(&members, name).and_then(|member| member.avatar_url.clone())
    }
}

/// Exact match first, then case-insensitive. Ambiguity in whichever pass
/// produced matches means no result.
pub fn find_unique_member<'a>(
    members: &'a [MemberIdentity],
    name: &str,
) -> Option<&'a MemberIdentity> {
    let exact = matching(members, |candidate| candidate == name);
    if !exact.is_empty() {
        return single(exact);
    }

    let folded = name.to_lowercase();
    single(matching(members, |candidate| candidate.to_lowercase() == folded))
}

fn matching<'a, F>(members: &'a [MemberIdentity], is_match: F) -> Vec<&'a MemberIdentity>
where
    F: Fn(&str) -> bool,
{
    members
        .iter()
        .filter(|m| m.nick.as_deref().is_some_and(&is_match) || is_match(&m.username))
        .collect()
}

fn single(mut found: Vec<&MemberIdentity>) -> Option<&MemberIdentity> {
    if found.len() == 1 {
        found.pop()
    } else {
        None
    }
}
