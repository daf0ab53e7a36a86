//! Strategies for answering "when did this game identity last play?".

pub mod riot;
pub mod opgg;
pub mod fixed;

use std::sync::Arc;

use tracing::info;

use idlewatch_common::traits::ActivitySource;

use crate::config::{ActivitySourceKind, BotConfig};
use crate::http::HttpClient;

pub use fixed::FixedOffsetActivitySource;
pub use opgg::OpggActivitySource;
pub use riot::RiotActivitySource;

/// Builds the source selected in `config`.
pub fn build_activity_source(config: &BotConfig, http: Arc<dyn HttpClient>) -> Arc<dyn ActivitySource> {
    let source: Arc<dyn ActivitySource> = match config.activity_source {
        ActivitySourceKind::Riot => Arc::new(RiotActivitySource::new(
            http,
            config.riot_api_key.clone().unwrap_or_default(),
            &config.riot_platform,
            &config.riot_region,
        )),
        ActivitySourceKind::Opgg => Arc::new(OpggActivitySource::new(http)),
        ActivitySourceKind::Fixed => Arc::new(FixedOffsetActivitySource::default()),
    };
    info!("Using activity source '{}'", source.name());
    source
}
