// File: idlewatch-core/src/notify/discord.rs

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use twilight_http::Client as HttpClient;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};
use twilight_model::id::Id;

use idlewatch_common::models::UserId;
use idlewatch_common::traits::NotificationSink;

use crate::Error;

/// Posts the notification into a Discord channel.
///
/// When a guild is configured the user must still be a member of it; users
/// who left are reported as a failed delivery instead of being pinged.
pub struct DiscordNotificationSink {
    http: Arc<HttpClient>,
    guild_id: Option<Id<GuildMarker>>,
}

impl DiscordNotificationSink {
    pub fn new(http: Arc<HttpClient>, guild_id: Option<u64>) -> Self {
        Self {
            http,
            guild_id: guild_id.and_then(Id::new_checked),
        }
    }
}

pub(crate) fn parse_snowflake<T>(raw: &str, what: &str) -> Result<Id<T>, Error> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .and_then(Id::new_checked)
        .ok_or_else(|| Error::Parse(format!("invalid {what} ID: '{raw}'")))
}

#[async_trait]
impl NotificationSink for DiscordNotificationSink {
    async fn notify(&self, user_id: &UserId, destination: &str, message: &str) -> Result<(), Error> {
        let channel_id: Id<ChannelMarker> = parse_snowflake(destination, "channel")?;
        let member_id: Id<UserMarker> = parse_snowflake(user_id.as_str(), "user")?;

        if let Some(guild_id) = self.guild_id {
            self.http
                .guild_member(guild_id, member_id)
                .await
                .map_err(|e| Error::Notification(format!("member {user_id} not found in guild {guild_id}: {e}")))?;
        }

        self.http
            .create_message(channel_id)
            .content(message)
            .await
            .map_err(|e| Error::Notification(format!("Error sending Discord message: {e:?}")))?;

        debug!("Posted inactivity notification for {} in {}", user_id, channel_id);
        Ok(())
    }
}
