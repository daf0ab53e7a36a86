use async_trait::async_trait;

use crate::error::Error;
use crate::models::user::UserId;

/// Delivers an inactivity notification about `user_id` to `destination`
/// (a channel id for chat platforms).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: &UserId, destination: &str, message: &str) -> Result<(), Error>;
}
