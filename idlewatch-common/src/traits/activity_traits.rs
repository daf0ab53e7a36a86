use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Error;

/// Looks up when a game identity was last active.
///
/// `Ok(None)` means the identity has no activity history. `Err` means the
/// lookup itself failed (network, rate limit, unexpected payload). The monitor
/// skips the user for the current cycle in both cases, but they are logged
/// differently.
///
/// Implementations may be slow and must be callable concurrently for
/// different identities.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn last_activity_of(&self, game_identity: &str) -> Result<Option<DateTime<Utc>>, Error>;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        "activity-source"
    }
}
