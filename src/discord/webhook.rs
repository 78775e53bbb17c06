//! Webhook dispatcher.
//!
//! Keeps one bridge-owned webhook per mapped Discord channel and posts IRC
//! messages through it under the IRC user's name and avatar. Every webhook
//! the bridge posts through is remembered so the message adapter can drop
//! the echoes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serenity::async_trait;
use serenity::builder::{CreateWebhook, ExecuteWebhook};
use serenity::http::Http;
use serenity::model::id::ChannelId;
use serenity::model::webhook::Webhook;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::bridge::sessions::WebhookDispatcher;
use crate::common::error::DispatchError;
use crate::common::WebhookPost;

/// Name of the webhooks the bridge creates and reuses.
pub const WEBHOOK_NAME: &str = "IRC Bridge";

pub struct WebhookDemux {
    http: Arc<Http>,
    /// Discord channel ID -> webhook used for that channel.
    webhooks: RwLock<HashMap<u64, Webhook>>,
    /// IDs of every webhook ever used, for echo suppression.
    known: RwLock<HashSet<u64>>,
}

impl WebhookDemux {
    pub fn new(http: Arc<Http>) -> Self {
        Self {
            http,
            webhooks: RwLock::new(HashMap::new()),
            known: RwLock::new(HashSet::new()),
        }
    }

    /// Fetch or create the webhooks for `channels` up front.
    ///
    /// Failures are logged; the channel's webhook is retried on first use.
    pub async fn prepare(&self, channels: &[u64]) {
        for &channel in channels {
            if let Err(e) = self.webhook_for(channel).await {
                warn!(discord_channel = channel, "Could not prepare webhook: {}", e);
            }
        }
    }

    /// Delete every webhook the bridge is posting through.
    pub async fn destroy(&self) {
        let webhooks: Vec<(u64, Webhook)> = self.webhooks.write().await.drain().collect();

        for (channel, webhook) in webhooks {
            match webhook.delete(&*self.http).await {
                Ok(()) => debug!(discord_channel = channel, "Deleted webhook"),
                Err(e) => warn!(discord_channel = channel, "Failed to delete webhook: {}", e),
            }
        }
    }

    async fn webhook_for(&self, channel: u64) -> Result<Webhook, DispatchError> {
        if let Some(webhook) = self.webhooks.read().await.get(&channel) {
            return Ok(webhook.clone());
        }
        if channel == 0 {
            return Err(DispatchError::NoWebhook { channel });
        }

        let channel_id = ChannelId::new(channel);
        let existing = channel_id
            .webhooks(&*self.http)
            .await?
            .into_iter()
            .find(|w| w.name.as_deref() == Some(WEBHOOK_NAME) && w.token.is_some());

        let webhook = match existing {
            Some(webhook) => webhook,
            None => {
                info!(discord_channel = channel, "Creating webhook");
                channel_id
                    .create_webhook(&*self.http, CreateWebhook::new(WEBHOOK_NAME))
                    .await?
            }
        };

        self.known.write().await.insert(webhook.id.get());
        self.webhooks.write().await.insert(channel, webhook.clone());
        Ok(webhook)
    }
}

#[async_trait]
impl WebhookDispatcher for WebhookDemux {
    async fn execute(&self, discord_channel: u64, post: WebhookPost) -> Result<(), DispatchError> {
        let webhook = self.webhook_for(discord_channel).await?;

        let builder = ExecuteWebhook::new()
            .content(post.content)
            .username(post.display_name)
            .avatar_url(post.avatar_url);

        if let Err(e) = webhook.execute(&*self.http, false, builder).await {
            // The webhook may have been deleted by someone else; fetch a fresh one next time.
            self.webhooks.write().await.remove(&discord_channel);
            return Err(e.into());
        }
        Ok(())
    }

    async fn is_puppet(&self, user_id: u64) -> bool {
        self.known.read().await.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_ids_are_not_puppets() {
        let demux = WebhookDemux::new(Arc::new(Http::new("token")));
        assert!(!demux.is_puppet(42).await);
    }

    #[tokio::test]
    async fn test_zero_channel_has_no_webhook() {
        let demux = WebhookDemux::new(Arc::new(Http::new("token")));
        let result = demux.webhook_for(0).await;
        assert!(matches!(result, Err(DispatchError::NoWebhook { channel: 0 })));
    }

    #[tokio::test]
    async fn test_destroy_without_webhooks() {
        let demux = WebhookDemux::new(Arc::new(Http::new("token")));
        demux.destroy().await;
        assert!(demux.webhooks.read().await.is_empty());
    }
}
