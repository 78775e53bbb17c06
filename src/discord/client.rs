//! Discord session.
//!
//! Owns the serenity client and the webhook dispatcher, and turns gateway
//! events into inbox messages for the router.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use anyhow::Context as _;
use serenity::all::{ChunkGuildFilter, GuildMemberUpdateEvent, GuildMembersChunkEvent};
use serenity::async_trait;
use serenity::cache::Cache;
use serenity::gateway::ShardManager;
use serenity::http::{Http, HttpBuilder, HttpError};
use serenity::model::channel::Message;
use serenity::model::gateway::{Presence, Ready};
use serenity::model::guild::Member;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use serenity::Client;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::bridge::channels::InboxSenders;
use crate::bridge::mapping::SharedMappings;
use crate::bridge::sessions::ProtocolSession;
use crate::common::error::{BridgeError, ConfigError};
use crate::common::{Attachment, MentionedUser, SourceMessage, UserPresence};
use crate::config::types::Config;
use crate::discord::events::GatewayEvents;
use crate::discord::state::{member_identity, presence_status, CacheState};
use crate::discord::webhook::WebhookDemux;

/// JSON error code Discord returns for a missing permission.
const MISSING_PERMISSIONS: isize = 50013;
/// How long `open` waits for the gateway to report ready.
const READY_TIMEOUT: Duration = Duration::from_secs(15);

/// Gateway intents for the configured mode.
///
/// Presence updates are only needed when per-user sessions are tracked.
pub fn gateway_intents(simple_mode: bool) -> GatewayIntents {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;

    if simple_mode {
        intents
    } else {
        intents | GatewayIntents::GUILD_PRESENCES
    }
}

/// Convert a gateway message into the bridge's source message.
pub fn source_message(msg: &Message) -> SourceMessage {
    SourceMessage {
        author_id: msg.author.id.get(),
        channel_id: msg.channel_id.get(),
        content: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| Attachment { url: a.url.clone() })
            .collect(),
        mentions: msg
            .mentions
            .iter()
            .map(|u| MentionedUser {
                id: u.id.get(),
                name: u.name.clone(),
            })
            .collect(),
    }
}

/// Gateway event handler. Converts serenity types, delegates to
/// `GatewayEvents` and pushes the results into the router's inboxes.
struct BridgeHandler {
    events: GatewayEvents,
    senders: InboxSenders,
    ready_tx: StdMutex<Option<oneshot::Sender<()>>>,
}

impl BridgeHandler {
    async fn send_presences(&self, signals: Vec<UserPresence>) {
        for signal in signals {
            if let Err(e) = self.senders.presence.send(signal).await {
                warn!("Failed to queue presence update: {}", e);
            }
        }
    }
}

#[async_trait]
impl EventHandler for BridgeHandler {
    async fn message(&self, ctx: Context, msg: Message) {
        let state = CacheState::new(ctx.cache.clone());
        let outcome = self
            .events
            .on_message(msg.guild_id.map(|id| id.get()), source_message(&msg), &state)
            .await;

        if outcome.reply_pong {
            if let Err(e) = msg.channel_id.say(&ctx.http, "Pong!").await {
                warn!("Failed to answer ping: {}", e);
            }
        }

        for event in outcome.events {
            if let Err(e) = self.senders.from_discord.send(event).await {
                warn!("Failed to queue Discord message: {}", e);
            }
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Discord bot connected as {}", ready.user.name);

        ctx.shard.chunk_guild(
            GuildId::new(self.events.guild_id()),
            None,
            self.events.tracks_presence(),
            ChunkGuildFilter::None,
            None,
        );

        let ready_tx = self
            .ready_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = ready_tx {
            let _ = tx.send(());
        }
    }

    async fn presence_update(&self, ctx: Context, new_data: Presence) {
        let state = CacheState::new(ctx.cache.clone());
        let signals = self.events.on_presence(
            new_data.guild_id.map(|id| id.get()),
            new_data.user.id.get(),
            presence_status(new_data.status),
            &state,
        );
        self.send_presences(signals).await;
    }

    async fn presence_replace(&self, ctx: Context, presences: Vec<Presence>) {
        let reports: Vec<_> = presences
            .iter()
            .map(|p| {
                (
                    p.guild_id.map(|id| id.get()),
                    p.user.id.get(),
                    presence_status(p.status),
                )
            })
            .collect();

        let state = CacheState::new(ctx.cache.clone());
        let signals = self.events.on_presence_replace(&reports, &state);
        self.send_presences(signals).await;
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let state = CacheState::new(ctx.cache.clone());
        let member = member_identity(&new_member.user, new_member.nick.as_deref());
        let signals = self
            .events
            .on_member(new_member.guild_id.get(), &member, &state);
        self.send_presences(signals).await;
    }

    async fn guild_member_update(
        &self,
        ctx: Context,
        _old_if_available: Option<Member>,
        _new: Option<Member>,
        event: GuildMemberUpdateEvent,
    ) {
        let state = CacheState::new(ctx.cache.clone());
        let member = member_identity(&event.user, event.nick.as_deref());
        let signals = self.events.on_member(event.guild_id.get(), &member, &state);
        self.send_presences(signals).await;
    }

    async fn guild_members_chunk(&self, ctx: Context, chunk: GuildMembersChunkEvent) {
        let members: Vec<_> = chunk
            .members
            .values()
            .map(|m| member_identity(&m.user, m.nick.as_deref()))
            .collect();

        let state = CacheState::new(ctx.cache.clone());
        let signals = self
            .events
            .on_member_chunk(chunk.guild_id.get(), &members, &state);
        self.send_presences(signals).await;
    }
}

/// The bridge's Discord bot connection.
pub struct DiscordSession {
    guild_id: u64,
    mappings: SharedMappings,
    /// REST client for the capability check.
    http: Arc<Http>,
    cache: Arc<Cache>,
    shard_manager: Arc<ShardManager>,
    webhooks: Arc<WebhookDemux>,
    /// Taken by `open`.
    client: Mutex<Option<Client>>,
    ready_rx: Mutex<Option<oneshot::Receiver<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DiscordSession {
    /// Build the client. Nothing is connected until `open`.
    pub async fn new(
        config: &Config,
        senders: InboxSenders,
        mappings: SharedMappings,
    ) -> Result<Self, BridgeError> {
        let guild_id = config.discord.guild_id;
        if guild_id == 0 {
            return Err(ConfigError::ValidationError {
                message: "discord.guild_id must be set".to_string(),
            }
            .into());
        }

        // Build a custom reqwest client with timeout settings
        let reqwest_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BridgeError::Session {
                component: "discord",
                source: e.into(),
            })?;

        let http = Arc::new(
            HttpBuilder::new(&config.discord.token)
                .client(reqwest_client.clone())
                .build(),
        );
        let webhooks = Arc::new(WebhookDemux::new(Arc::clone(&http)));

        let (ready_tx, ready_rx) = oneshot::channel();
        let handler = BridgeHandler {
            events: GatewayEvents::new(guild_id, config.simple_mode, webhooks.clone()),
            senders,
            ready_tx: StdMutex::new(Some(ready_tx)),
        };

        let gateway_http = HttpBuilder::new(&config.discord.token)
            .client(reqwest_client)
            .build();
        let client = serenity::client::ClientBuilder::new_with_http(
            gateway_http,
            gateway_intents(config.simple_mode),
        )
        .event_handler(handler)
        .await?;

        Ok(Self {
            guild_id,
            mappings,
            http,
            cache: Arc::clone(&client.cache),
            shard_manager: Arc::clone(&client.shard_manager),
            webhooks,
            client: Mutex::new(Some(client)),
            ready_rx: Mutex::new(Some(ready_rx)),
            task: Mutex::new(None),
        })
    }

    /// Cached guild state for the router's avatar lookups.
    pub fn guild_state(&self) -> Arc<CacheState> {
        Arc::new(CacheState::new(Arc::clone(&self.cache)))
    }

    pub fn dispatcher(&self) -> Arc<WebhookDemux> {
        Arc::clone(&self.webhooks)
    }

    /// Fails with `MissingWebhookPermission` when the bot can't manage the
    /// guild's webhooks.
    pub async fn check_webhook_permission(&self) -> Result<(), BridgeError> {
        match GuildId::new(self.guild_id).webhooks(&*self.http).await {
            Ok(_) => Ok(()),
            Err(serenity::Error::Http(HttpError::UnsuccessfulRequest(ref response)))
                if response.error.code == MISSING_PERMISSIONS =>
            {
                Err(BridgeError::MissingWebhookPermission)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ProtocolSession for DiscordSession {
    async fn open(&self) -> anyhow::Result<()> {
        self.check_webhook_permission().await?;

        let mut client = self
            .client
            .lock()
            .await
            .take()
            .context("Discord session was already opened")?;

        info!("Connecting to Discord...");
        let task = tokio::spawn(async move {
            match client.start().await {
                Ok(()) => info!("Discord client disconnected normally"),
                Err(e) => error!("Discord client error: {}", e),
            }
        });
        *self.task.lock().await = Some(task);

        let ready_rx = self
            .ready_rx
            .lock()
            .await
            .take()
            .context("Discord session was already opened")?;
        tokio::time::timeout(READY_TIMEOUT, ready_rx)
            .await
            .context("Timed out waiting for the Discord gateway")?
            .context("Discord client stopped before becoming ready")?;

        let channels: Vec<u64> = self.mappings.iter().map(|m| m.discord_channel).collect();
        self.webhooks.prepare(&channels).await;

        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.webhooks.destroy().await;

        info!("Initiating graceful Discord shutdown...");
        self.shard_manager.shutdown_all().await;

        if let Some(task) = self.task.lock().await.take() {
            task.await.context("Discord client task failed")?;
        }
        info!("Discord shutdown complete");
        Ok(())
    }
}
