//! Discord markup to IRC text.
//!
//! Applied in order:
//! 1. `<@id>` / `<@!id>` user mentions to `@display name`
//! 2. line breaks to single spaces
//! 3. `<#id>` channel mentions to `#channel-name`
//! 4. `<@&id>` role mentions to `@role-name`

use fancy_regex::Regex;
use tracing::debug;

use crate::common::error::{LookupError, NormalizeError};
use crate::common::{MentionedUser, SourceMessage};
use crate::discord::state::GuildState;

/// Substituted for a channel mention whose channel no longer exists.
pub const DELETED_CHANNEL: &str = "#deleted-channel";
/// Substituted for a role mention whose role no longer exists.
pub const DELETED_ROLE: &str = "@deleted-role";

/// Converts raw Discord message content into single-line IRC text.
///
/// Stateless apart from its compiled patterns, so one instance is shared by
/// every event handler task.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    /// Pattern for Discord channel mentions (<#123>).
    channel_pattern: Regex,
    /// Pattern for Discord role mentions (<@&123>).
    role_pattern: Regex,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            channel_pattern: Regex::new(r"<#(\d+)>").unwrap(),
            role_pattern: Regex::new(r"<@&(\d+)>").unwrap(),
        }
    }

    /// Normalize a message's content.
    ///
    /// Fails only when a channel or role mention can't be resolved for a reason
    /// other than the channel/role having been deleted.
    pub fn normalize(
        &self,
        message: &SourceMessage,
        guild_id: u64,
        state: &dyn GuildState,
    ) -> Result<String, NormalizeError> {
        let content = self.expand_user_mentions(message, guild_id, state);
        let content = collapse_line_breaks(&content);
        let content = self.expand_channel_mentions(&content, guild_id, state)?;
        self.expand_role_mentions(&content, guild_id, state)
    }

    /// Replace user mentions with guild display names, falling back to plain
    /// account names when the guild's members can't be looked up at all.
    fn expand_user_mentions(
        &self,
        message: &SourceMessage,
        guild_id: u64,
        state: &dyn GuildState,
    ) -> String {
        let resolved = replace_user_mentions(&message.content, &message.mentions, |user| {
            match state.member(guild_id, user.id) {
                Ok(member) => Ok(member.display_name().to_string()),
                Err(LookupError::NotFound) => Ok(user.name.clone()),
                Err(e) => Err(e),
            }
        });

        match resolved {
            Ok(content) => content,
            Err(e) => {
                debug!("Falling back to plain user mentions: {}", e);
                replace_user_mentions(&message.content, &message.mentions, |user| {
                    Ok(user.name.clone())
                })
                .unwrap_or_else(|_| message.content.clone())
            }
        }
    }

    fn expand_channel_mentions(
        &self,
        content: &str,
        guild_id: u64,
        state: &dyn GuildState,
    ) -> Result<String, NormalizeError> {
        replace_references(&self.channel_pattern, content, |id| {
            match state.channel_name(guild_id, id) {
                Ok(name) => Ok(format!("#{}", name)),
                Err(LookupError::NotFound) => Ok(DELETED_CHANNEL.to_string()),
                Err(source) => Err(NormalizeError::Channel { id, source }),
            }
        })
    }

    fn expand_role_mentions(
        &self,
        content: &str,
        guild_id: u64,
        state: &dyn GuildState,
    ) -> Result<String, NormalizeError> {
        replace_references(&self.role_pattern, content, |id| {
            match state.role_name(guild_id, id) {
                Ok(name) => Ok(format!("@{}", name)),
                Err(LookupError::NotFound) => Ok(DELETED_ROLE.to_string()),
                Err(source) => Err(NormalizeError::Role { id, source }),
            }
        })
    }
}

/// Replace CRLF, CR and LF with a single space each.
pub fn collapse_line_breaks(content: &str) -> String {
    content
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', " ")
}

/// Replace `<@id>` and `<@!id>` for every mentioned user.
fn replace_user_mentions<F>(
    content: &str,
    mentions: &[MentionedUser],
    mut name_of: F,
) -> Result<String, LookupError>
where
    F: FnMut(&MentionedUser) -> Result<String, LookupError>,
{
    let mut result = content.to_string();
    for user in mentions {
        let name = format!("@{}", name_of(user)?);
        result = result
            .replace(&format!("<@{}>", user.id), &name)
            .replace(&format!("<@!{}>", user.id), &name);
    }
    Ok(result)
}

/// Replace every match of `pattern` using the numeric ID in its first group.
///
/// IDs too large for a u64 can't be real snowflakes; those tokens are left as-is.
fn replace_references<F>(
    pattern: &Regex,
    content: &str,
    mut replacement: F,
) -> Result<String, NormalizeError>
where
    F: FnMut(u64) -> Result<String, NormalizeError>,
{
    let mut result = String::with_capacity(content.len());
    let mut last = 0;

    for caps in pattern.captures_iter(content) {
        let caps = caps?;
        let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        result.push_str(&content[last..whole.start()]);
        match id.as_str().parse::<u64>() {
            Ok(id) => result.push_str(&replacement(id)?),
            Err(_) => result.push_str(whole.as_str()),
        }
        last = whole.end();
    }

    result.push_str(&content[last..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{member, FakeGuildState, GUILD_ID};

    fn message(content: &str) -> SourceMessage {
        SourceMessage {
            author_id: 10,
            channel_id: 111,
            content: content.to_string(),
            attachments: Vec::new(),
            mentions: Vec::new(),
        }
    }

    fn guild() -> FakeGuildState {
        let mut state = FakeGuildState::default();
        state.channels.insert(500, "general".to_string());
        state.roles.insert(600, "moderators".to_string());
        state.members.push(member(20, "alice", Some("Ali")));
        state
    }

    #[test]
    fn test_line_breaks_collapsed() {
        let normalizer = TextNormalizer::new();
        let out = normalizer
            .normalize(&message("line1\r\nline2\rline3"), GUILD_ID, &guild())
            .unwrap();
        assert_eq!(out, "line1 line2 line3");
    }

    #[test]
    fn test_plain_text_unchanged() {
        let normalizer = TextNormalizer::new();
        let out = normalizer
            .normalize(&message("just some text"), GUILD_ID, &guild())
            .unwrap();
        assert_eq!(out, "just some text");
    }

    #[test]
    fn test_channel_mention() {
        let normalizer = TextNormalizer::new();
        let out = normalizer
            .normalize(&message("see <#500> please"), GUILD_ID, &guild())
            .unwrap();
        assert_eq!(out, "see #general please");
    }

    #[test]
    fn test_deleted_channel_mention() {
        let normalizer = TextNormalizer::new();
        let out = normalizer
            .normalize(&message("was in <#501>"), GUILD_ID, &guild())
            .unwrap();
        assert_eq!(out, "was in #deleted-channel");
    }

    #[test]
    fn test_role_mention() {
        let normalizer = TextNormalizer::new();
        let out = normalizer
            .normalize(&message("ping <@&600> and <@&601>"), GUILD_ID, &guild())
            .unwrap();
        assert_eq!(out, "ping @moderators and @deleted-role");
    }

    #[test]
    fn test_user_mention_uses_nickname() {
        let normalizer = TextNormalizer::new();
        let mut msg = message("hi <@20> and <@!20>");
        msg.mentions.push(MentionedUser {
            id: 20,
            name: "alice".to_string(),
        });
        let out = normalizer.normalize(&msg, GUILD_ID, &guild()).unwrap();
        assert_eq!(out, "hi @Ali and @Ali");
    }

    #[test]
    fn test_user_mention_not_a_member_uses_account_name() {
        let normalizer = TextNormalizer::new();
        let mut msg = message("hi <@30>");
        msg.mentions.push(MentionedUser {
            id: 30,
            name: "bob".to_string(),
        });
        let out = normalizer.normalize(&msg, GUILD_ID, &guild()).unwrap();
        assert_eq!(out, "hi @bob");
    }

    #[test]
    fn test_user_mention_falls_back_when_state_unavailable() {
        let normalizer = TextNormalizer::new();
        let mut state = guild();
        state.available = false;
        let mut msg = message("hi <@20>");
        msg.mentions.push(MentionedUser {
            id: 20,
            name: "alice".to_string(),
        });
        let out = normalizer.normalize(&msg, GUILD_ID, &state).unwrap();
        assert_eq!(out, "hi @alice");
    }

    #[test]
    fn test_unavailable_state_fails_channel_mention() {
        let normalizer = TextNormalizer::new();
        let mut state = guild();
        state.available = false;
        let result = normalizer.normalize(&message("see <#500>"), GUILD_ID, &state);
        assert!(matches!(result, Err(NormalizeError::Channel { id: 500, .. })));
    }

    #[test]
    fn test_unavailable_state_fails_role_mention() {
        let normalizer = TextNormalizer::new();
        let mut state = guild();
        state.available = false;
        let result = normalizer.normalize(&message("hey <@&600>"), GUILD_ID, &state);
        assert!(matches!(result, Err(NormalizeError::Role { id: 600, .. })));
    }

    #[test]
    fn test_oversized_id_left_alone() {
        let normalizer = TextNormalizer::new();
        let out = normalizer
            .normalize(&message("<#99999999999999999999999>"), GUILD_ID, &guild())
            .unwrap();
        assert_eq!(out, "<#99999999999999999999999>");
    }

    #[test]
    fn test_input_not_mutated() {
        let normalizer = TextNormalizer::new();
        let msg = message("a\nb <#500>");
        let _ = normalizer.normalize(&msg, GUILD_ID, &guild()).unwrap();
        assert_eq!(msg.content, "a\nb <#500>");
    }
}
