use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use idlewatch_common::traits::ActivitySource;

use crate::Error;

/// Reports every identity as last active `offset` ago.
#[derive(Debug, Clone, Copy)]
pub struct FixedOffsetActivitySource {
    offset: Duration,
}

impl FixedOffsetActivitySource {
    pub fn new(offset: Duration) -> Self {
        Self { offset }
    }
}

impl Default for FixedOffsetActivitySource {
    fn default() -> Self {
        Self::new(Duration::hours(4))
    }
}

#[async_trait]
impl ActivitySource for FixedOffsetActivitySource {
    async fn last_activity_of(&self, _game_identity: &str) -> Result<Option<DateTime<Utc>>, Error> {
        Ok(Some(Utc::now() - self.offset))
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}
