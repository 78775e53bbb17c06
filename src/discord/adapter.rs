//! Turns Discord message events into bridge messages.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::bridge::sessions::WebhookDispatcher;
use crate::common::{DiscordMessage, SourceMessage};
use crate::discord::normalizer::TextNormalizer;
use crate::discord::state::GuildState;

/// User ID of the Mee6 bot.
pub const MEE6_USER_ID: u64 = 159985870458322944;

/// Boilerplate Mee6 appends to its welcome messages.
pub const MEE6_WELCOME_BOILERPLATE: &str = "CompSoc is The University of Edinburgh's society for anyone interested in Informatics.  This server is linked up with IRC, another way of chatting, so you'll find there are a lot more people listening than what it shows on Discord.";

/// Builds the events for one Discord message.
#[derive(Debug, Clone)]
pub struct MessageAdapter {
    guild_id: u64,
    normalizer: TextNormalizer,
}

impl MessageAdapter {
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            normalizer: TextNormalizer::new(),
        }
    }

    /// Whether the message was written by the bridge itself.
    pub async fn is_echo(
        &self,
        source: &SourceMessage,
        state: &dyn GuildState,
        dispatcher: &dyn WebhookDispatcher,
    ) -> bool {
        source.author_id == state.current_user_id() || dispatcher.is_puppet(source.author_id).await
    }

    /// Events to push into the Discord inbox, in delivery order: the text body
    /// (if any) followed by one per attachment.
    ///
    /// Returns nothing for echoes and for messages that fail to normalize.
    pub async fn handle(
        &self,
        source: SourceMessage,
        state: &dyn GuildState,
        dispatcher: &dyn WebhookDispatcher,
    ) -> Vec<DiscordMessage> {
        if self.is_echo(&source, state, dispatcher).await {
            debug!(author = source.author_id, "Ignoring message from our own identity");
            return Vec::new();
        }
        self.convert(source, state)
    }

    /// Normalize a message already known not to be an echo.
    pub fn convert(&self, source: SourceMessage, state: &dyn GuildState) -> Vec<DiscordMessage> {
        let mut content = match self.normalizer.normalize(&source, self.guild_id, state) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    discord_channel = source.channel_id,
                    "Dropping message that could not be normalized: {}", e
                );
                return Vec::new();
            }
        };

        if source.author_id == MEE6_USER_ID {
            content = content.replace(MEE6_WELCOME_BOILERPLATE, "");
        }

        let is_action = is_action(&source.content);
        if is_action {
            content = strip_action_markers(&content).to_string();
        }

        let source = Arc::new(source);
        let mut events = Vec::with_capacity(source.attachments.len() + 1);

        if !content.is_empty() {
            events.push(DiscordMessage {
                source: Arc::clone(&source),
                content,
                is_action,
            });
        }

        for attachment in &source.attachments {
            events.push(DiscordMessage {
                source: Arc::clone(&source),
                content: attachment.url.clone(),
                is_action,
            });
        }

        events
    }
}

/// `_text_` marks a third-person action.
pub fn is_action(raw: &str) -> bool {
    raw.chars().count() > 2 && raw.starts_with('_') && raw.ends_with('_')
}

/// Remove one leading and one trailing underscore, if present.
fn strip_action_markers(text: &str) -> &str {
    let text = text.strip_prefix('_').unwrap_or(text);
    text.strip_suffix('_').unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Attachment;
    use crate::testing::{FakeGuildState, RecordingDispatcher, BOT_USER_ID, GUILD_ID};

    fn source(author_id: u64, content: &str) -> SourceMessage {
        SourceMessage {
            author_id,
            channel_id: 111,
            content: content.to_string(),
            attachments: Vec::new(),
            mentions: Vec::new(),
        }
    }

    #[test]
    fn test_is_action() {
        assert!(is_action("_hello_"));
        assert!(is_action("_a_"));
        assert!(!is_action("__"));
        assert!(!is_action("_"));
        assert!(!is_action("_hello"));
        assert!(!is_action("hello_"));
        assert!(!is_action("plain"));
    }

    #[tokio::test]
    async fn test_action_message() {
        let adapter = MessageAdapter::new(GUILD_ID);
        let events = adapter
            .handle(
                source(10, "_hello_"),
                &FakeGuildState::default(),
                &RecordingDispatcher::default(),
            )
            .await;

        assert_eq!(events.len(), 1);
        assert!(events[0].is_action);
        assert_eq!(events[0].content, "hello");
    }

    #[tokio::test]
    async fn test_plain_message() {
        let adapter = MessageAdapter::new(GUILD_ID);
        let events = adapter
            .handle(
                source(10, "hello\nworld"),
                &FakeGuildState::default(),
                &RecordingDispatcher::default(),
            )
            .await;

        assert_eq!(events.len(), 1);
        assert!(!events[0].is_action);
        assert_eq!(events[0].content, "hello world");
        assert_eq!(events[0].channel_id(), 111);
    }

    #[tokio::test]
    async fn test_own_messages_dropped() {
        let adapter = MessageAdapter::new(GUILD_ID);
        let events = adapter
            .handle(
                source(BOT_USER_ID, "hi"),
                &FakeGuildState::default(),
                &RecordingDispatcher::default(),
            )
            .await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_puppet_messages_dropped() {
        let adapter = MessageAdapter::new(GUILD_ID);
        let dispatcher = RecordingDispatcher {
            puppets: [77].into_iter().collect(),
            ..Default::default()
        };
        let events = adapter
            .handle(source(77, "hi"), &FakeGuildState::default(), &dispatcher)
            .await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_attachments_follow_text() {
        let adapter = MessageAdapter::new(GUILD_ID);
        let mut msg = source(10, "_look_");
        msg.attachments = vec![
            Attachment {
                url: "https://cdn.example/a.png".to_string(),
            },
            Attachment {
                url: "https://cdn.example/b.png".to_string(),
            },
        ];

        let events = adapter
            .handle(msg, &FakeGuildState::default(), &RecordingDispatcher::default())
            .await;

        let contents: Vec<_> = events.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["look", "https://cdn.example/a.png", "https://cdn.example/b.png"]
        );
        assert!(events.iter().all(|e| e.is_action));
        assert!(Arc::ptr_eq(&events[0].source, &events[2].source));
    }

    #[tokio::test]
    async fn test_attachment_only_message() {
        let adapter = MessageAdapter::new(GUILD_ID);
        let mut msg = source(10, "");
        msg.attachments = vec![Attachment {
            url: "https://cdn.example/a.png".to_string(),
        }];

        let events = adapter
            .handle(msg, &FakeGuildState::default(), &RecordingDispatcher::default())
            .await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].content, "https://cdn.example/a.png");
    }

    #[tokio::test]
    async fn test_mee6_boilerplate_scrubbed() {
        let adapter = MessageAdapter::new(GUILD_ID);
        let content = format!("Welcome newbie! {}", MEE6_WELCOME_BOILERPLATE);
        let events = adapter
            .handle(
                source(MEE6_USER_ID, &content),
                &FakeGuildState::default(),
                &RecordingDispatcher::default(),
            )
            .await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].content, "Welcome newbie! ");
    }

    #[tokio::test]
    async fn test_mee6_boilerplate_only_produces_nothing() {
        let adapter = MessageAdapter::new(GUILD_ID);
        let events = adapter
            .handle(
                source(MEE6_USER_ID, MEE6_WELCOME_BOILERPLATE),
                &FakeGuildState::default(),
                &RecordingDispatcher::default(),
            )
            .await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_boilerplate_from_other_users_kept() {
        let adapter = MessageAdapter::new(GUILD_ID);
        let events = adapter
            .handle(
                source(10, MEE6_WELCOME_BOILERPLATE),
                &FakeGuildState::default(),
                &RecordingDispatcher::default(),
            )
            .await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_normalize_failure_drops_message() {
        let adapter = MessageAdapter::new(GUILD_ID);
        let state = FakeGuildState {
            available: false,
            ..Default::default()
        };
        let events = adapter
            .handle(source(10, "see <#500>"), &state, &RecordingDispatcher::default())
            .await;
        assert!(events.is_empty());
    }
}
