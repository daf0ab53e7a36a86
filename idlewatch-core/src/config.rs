//! Runtime configuration, read from the process environment (after `.env` has
//! been loaded by the binary).
//!
//! Every value has a default so the bot can start with nothing but a token;
//! values that are present but malformed are reported as `Error::Config`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::Error;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_INACTIVITY_THRESHOLD: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_USERS_FILE: &str = "users.json";

/// Settings that drive the inactivity monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub inactivity_threshold: Duration,
    /// Channel that receives notifications. `None` puts delivery in log-only mode.
    pub notification_destination: Option<String>,
    pub enabled_at_startup: bool,
    /// Delivery attempts per due user within one scan (at least 1).
    pub notify_attempts: u32,
    /// Delay before retry `n` is `n * notify_retry_backoff`.
    pub notify_retry_backoff: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            inactivity_threshold: DEFAULT_INACTIVITY_THRESHOLD,
            notification_destination: None,
            enabled_at_startup: true,
            notify_attempts: 1,
            notify_retry_backoff: Duration::from_secs(2),
        }
    }
}

impl MonitorConfig {
    pub fn threshold_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.inactivity_threshold)
            .unwrap_or_else(|_| chrono::Duration::MAX)
    }
}

/// Which `ActivitySource` strategy to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySourceKind {
    /// Riot match-history API.
    Riot,
    /// OP.GG profile page scraping.
    Opgg,
    /// Always reports a fixed offset into the past. For dry runs.
    Fixed,
}

impl FromStr for ActivitySourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "riot" | "riotapi" => Ok(Self::Riot),
            "opgg" | "op.gg" => Ok(Self::Opgg),
            "fixed" | "dummy" => Ok(Self::Fixed),
            other => Err(Error::Config(format!(
                "unknown activity source '{other}' (expected riot, opgg or fixed)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: Option<String>,
    pub guild_id: Option<u64>,
    pub riot_api_key: Option<String>,
    /// Platform routing value for summoner-v4, e.g. `jp1`.
    pub riot_platform: String,
    /// Regional routing value for account-v1 and match-v5, e.g. `asia`.
    pub riot_region: String,
    pub port: u16,
    pub users_file: PathBuf,
    pub activity_source: ActivitySourceKind,
    pub monitor: MonitorConfig,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let riot_api_key = get("RIOT_API_KEY");
        let activity_source = match get("ACTIVITY_SOURCE") {
            Some(raw) => raw.parse()?,
            None if riot_api_key.is_some() => ActivitySourceKind::Riot,
            None => ActivitySourceKind::Fixed,
        };

        let mut monitor = MonitorConfig {
            notification_destination: get("TARGET_CHANNEL_ID"),
            ..MonitorConfig::default()
        };
        if let Some(ms) = parse_opt::<u64>(&get, "POLL_INTERVAL_MS")? {
            if ms == 0 {
                return Err(Error::Config("POLL_INTERVAL_MS must be greater than zero".into()));
            }
            monitor.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_opt::<u64>(&get, "INACTIVITY_THRESHOLD_MS")? {
            monitor.inactivity_threshold = Duration::from_millis(ms);
        }
        if let Some(enabled) = parse_bool_opt(&get, "MONITORING_ENABLED_AT_STARTUP")? {
            monitor.enabled_at_startup = enabled;
        }
        if let Some(attempts) = parse_opt::<u32>(&get, "NOTIFY_ATTEMPTS")? {
            monitor.notify_attempts = attempts.max(1);
        }

        let cfg = Self {
            discord_token: get("DISCORD_BOT_TOKEN"),
            guild_id: parse_opt(&get, "GUILD_ID")?,
            riot_api_key,
            riot_platform: get("RIOT_PLATFORM").unwrap_or_else(|| "jp1".to_string()),
            riot_region: get("RIOT_REGION").unwrap_or_else(|| "asia".to_string()),
            port: parse_opt(&get, "PORT")?.unwrap_or(DEFAULT_PORT),
            users_file: get("USERS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_USERS_FILE)),
            activity_source,
            monitor,
        };
        cfg.warn_on_degraded();
        Ok(cfg)
    }

    /// Logs every missing setting that leaves part of the bot in degraded mode.
    fn warn_on_degraded(&self) {
        if self.discord_token.is_none() {
            warn!("DISCORD_BOT_TOKEN is not set; commands are unavailable and notifications will only be logged");
        }
        if self.monitor.notification_destination.is_none() {
            warn!("TARGET_CHANNEL_ID is not set; notifications will only be logged");
        }
        if self.guild_id.is_none() {
            warn!("GUILD_ID is not set; slash commands will not be registered and members cannot be looked up");
        }
        if self.activity_source == ActivitySourceKind::Riot && self.riot_api_key.is_none() {
            warn!("ACTIVITY_SOURCE=riot without RIOT_API_KEY; every lookup will fail");
        }
    }

    /// Notifications can reach a real channel.
    pub fn can_deliver(&self) -> bool {
        self.discord_token.is_some() && self.monitor.notification_destination.is_some()
    }
}

fn parse_opt<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{key}='{raw}': {e}"))),
        None => Ok(None),
    }
}

fn parse_bool_opt(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>, Error> {
    match get(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::Config(format!("{key}='{v}' is not a boolean"))),
        },
    }
}
