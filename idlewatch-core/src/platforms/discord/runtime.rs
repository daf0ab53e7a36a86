use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    MessageSender,
    Shard,
    StreamExt,
};
use twilight_http::Client as HttpClient;
use twilight_http::client::ClientBuilder;
use twilight_model::id::marker::GuildMarker;
use twilight_model::id::Id;

use crate::platforms::{ConnectionStatus, PlatformIntegration};
use crate::services::discord::slashcommands::{handle_interaction_create, register_guild_slash_commands};
use crate::services::CommandService;
use crate::Error;

/// Builds the REST client shared by the gateway runtime and the notification sink.
pub fn build_http_client(token: &str) -> Arc<HttpClient> {
    Arc::new(
        ClientBuilder::new()
            .token(token.to_string())
            .timeout(Duration::from_secs(30))
            .build(),
    )
}

/// Per-shard event loop:
///   - on READY, registers the slash commands for the configured guild
///   - on INTERACTION_CREATE, hands the interaction to the command service
///     on its own task so a slow lookup never stalls the shard.
async fn shard_runner(
    mut shard: Shard,
    http: Arc<HttpClient>,
    commands: Arc<CommandService>,
    guild_id: Option<Id<GuildMarker>>,
) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    let wanted = EventTypeFlags::READY | EventTypeFlags::INTERACTION_CREATE;
    while let Some(item) = shard.next_event(wanted).await {
        let event = match item {
            Ok(event) => event,
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
                continue;
            }
        };

        match event {
            Event::Ready(ready) => {
                info!(
                    "Shard {shard_id} => READY as {} (ID={})",
                    ready.user.name, ready.user.id
                );
                match guild_id {
                    Some(guild_id) => {
                        let application_id = ready.application.id;
                        if let Err(e) = register_guild_slash_commands(&http, application_id, guild_id).await {
                            error!("{e}");
                        } else {
                            info!("Slash commands registered for guild {guild_id}");
                        }
                    }
                    None => warn!("No guild configured; slash commands were not registered"),
                }
            }
            Event::InteractionCreate(interaction) => {
                let http = http.clone();
                let commands = commands.clone();
                let application_id = interaction.application_id;
                tokio::spawn(async move {
                    if let Err(e) = handle_interaction_create(http, application_id, commands, &interaction).await {
                        error!("Interaction error: {e}");
                    }
                });
            }
            other => {
                trace!("Shard {shard_id} => unhandled event: {:?}", other.kind());
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

pub struct DiscordPlatform {
    token: String,
    guild_id: Option<Id<GuildMarker>>,
    connection_status: ConnectionStatus,

    http: Arc<HttpClient>,
    commands: Arc<CommandService>,

    shard_tasks: Vec<JoinHandle<()>>,
    shard_senders: Vec<MessageSender>,
}

impl DiscordPlatform {
    pub fn new(
        token: String,
        guild_id: Option<u64>,
        http: Arc<HttpClient>,
        commands: Arc<CommandService>,
    ) -> Self {
        Self {
            token,
            guild_id: guild_id.and_then(Id::new_checked),
            connection_status: ConnectionStatus::Disconnected,
            http,
            commands,
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
        }
    }
}

#[async_trait]
impl PlatformIntegration for DiscordPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }
        if self.token.is_empty() {
            return Err(Error::Platform("Discord token is empty".into()));
        }

        let config = Config::new(self.token.clone(), Intents::GUILDS);

        let shards = gateway::create_recommended(&self.http, config, |_, b| b.build())
            .await
            .map_err(|e| {
                self.connection_status = ConnectionStatus::Error(e.to_string());
                Error::Platform(format!("create_recommended error: {e}"))
            })?;

        for shard in shards {
            self.shard_senders.push(shard.sender());

            let http = self.http.clone();
            let commands = self.commands.clone();
            let guild_id = self.guild_id;
            let handle = tokio::spawn(async move {
                shard_runner(shard, http, commands, guild_id).await;
            });
            self.shard_tasks.push(handle);
        }
        debug!("(DiscordPlatform) spawned {} shard(s)", self.shard_tasks.len());

        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;

        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in &mut self.shard_tasks {
            let _ = task.await;
        }

        self.shard_senders.clear();
        self.shard_tasks.clear();
        info!("(DiscordPlatform) disconnected");
        Ok(())
    }

    async fn get_connection_status(&self) -> Result<ConnectionStatus, Error> {
        Ok(self.connection_status.clone())
    }
}
