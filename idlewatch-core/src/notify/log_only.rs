use async_trait::async_trait;
use tracing::info;

use idlewatch_common::models::UserId;
use idlewatch_common::traits::NotificationSink;

use crate::Error;

/// Degraded-mode sink used when there is no way to reach a channel. The
/// would-be notification goes to the log and counts as delivered.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyNotificationSink;

#[async_trait]
impl NotificationSink for LogOnlyNotificationSink {
    async fn notify(&self, user_id: &UserId, destination: &str, message: &str) -> Result<(), Error> {
        let destination = if destination.is_empty() { "<unset>" } else { destination };
        info!("(log-only) notification for {} to {}: {}", user_id, destination, message);
        Ok(())
    }
}
