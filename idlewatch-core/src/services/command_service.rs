use std::sync::Arc;

use tracing::{debug, error, info, warn};

use idlewatch_common::models::UserId;

use crate::monitor::{CheckOutcome, InactivityMonitor};
use crate::utils::time::format_elapsed;
use crate::Error;

/// Transport-independent commands. Slash commands (or any other front end)
/// parse into this and hand it to `CommandService::handle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// `/login`
    EnableMonitoring,
    /// `/logout`
    DisableMonitoring,
    /// `/rule`
    Rule,
    Register {
        target: UserId,
        riot_id: String,
        /// May be omitted when `riot_id` already has the form `Name#Tag`.
        tag: Option<String>,
    },
    Unregister { target: UserId },
    Check { target: UserId },
}

/// Reply text for the invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub text: String,
    /// Only the invoker should see it (input errors).
    pub ephemeral: bool,
}

impl CommandResponse {
    fn public(text: impl Into<String>) -> Self {
        Self { text: text.into(), ephemeral: false }
    }

    fn private(text: impl Into<String>) -> Self {
        Self { text: text.into(), ephemeral: true }
    }
}

pub const RULE_TEXT: &str = "\
**How this bot works:**

- /login ... turn inactivity monitoring on
- /logout ... turn inactivity monitoring off
- /rule ... show this help
- /register (user, riotid, tag) ... link a Riot ID (Name#Tag) to a member
- /unregister (user) ... stop watching a member
- /check (user) ... how long since that member last played

Members who go too long without a game get called out once, then need to /register again.";

pub struct CommandService {
    monitor: Arc<InactivityMonitor>,
}

impl CommandService {
    pub fn new(monitor: Arc<InactivityMonitor>) -> Self {
        debug!("Initializing CommandService");
        Self { monitor }
    }

    /// Runs `cmd` on behalf of `invoker`. Failures become reply text; this
    /// never returns an error to the transport.
    pub async fn handle(&self, invoker: &UserId, cmd: BotCommand) -> CommandResponse {
        debug!("{} invoked {:?}", invoker, cmd);
        match cmd {
            BotCommand::EnableMonitoring => {
                if self.monitor.enable() {
                    CommandResponse::public("Monitoring is now on!")
                } else {
                    CommandResponse::public("Monitoring is already on.")
                }
            }
            BotCommand::DisableMonitoring => {
                if self.monitor.disable() {
                    CommandResponse::public("Monitoring is now off.")
                } else {
                    CommandResponse::public("Monitoring is already off.")
                }
            }
            BotCommand::Rule => CommandResponse::public(RULE_TEXT),
            BotCommand::Register { target, riot_id, tag } => {
                self.register(invoker, target, &riot_id, tag.as_deref()).await
            }
            BotCommand::Unregister { target } => self.unregister(target).await,
            BotCommand::Check { target } => self.check(target).await,
        }
    }

    async fn register(
        &self,
        invoker: &UserId,
        target: UserId,
        riot_id: &str,
        tag: Option<&str>,
    ) -> CommandResponse {
        let full_id = match compose_riot_id(riot_id, tag) {
            Ok(id) => id,
            Err(msg) => return CommandResponse::private(msg),
        };

        info!("Registering {} => {}", target, full_id);
        match self.monitor.registry().register(target.clone(), &full_id).await {
            Ok(_) if &target == invoker => {
                CommandResponse::public(format!("Registered your Riot ID as \"{full_id}\"."))
            }
            Ok(_) => CommandResponse::public(format!(
                "Registered {}'s Riot ID as \"{full_id}\".",
                target.mention()
            )),
            Err(e) => {
                error!("Registration of {} failed: {}", target, e);
                CommandResponse::private("Could not save the registration. Please try again later.")
            }
        }
    }

    async fn unregister(&self, target: UserId) -> CommandResponse {
        match self.monitor.registry().remove(&target).await {
            Ok(Some(entry)) => CommandResponse::public(format!(
                "Stopped watching {} (Riot ID: {}).",
                target.mention(),
                entry.game_identity
            )),
            Ok(None) => CommandResponse::private(format!("{} is not registered.", target.mention())),
            Err(e) => {
                error!("Unregistration of {} failed: {}", target, e);
                CommandResponse::private("Could not save the change. Please try again later.")
            }
        }
    }

    async fn check(&self, target: UserId) -> CommandResponse {
        match self.monitor.check(&target).await {
            Ok(CheckOutcome::NotRegistered) => CommandResponse::private(format!(
                "{} is not registered yet. (use /register)",
                target.mention()
            )),
            Ok(CheckOutcome::NoHistory { game_identity }) => CommandResponse::public(format!(
                "{} (Riot ID: {game_identity}) has no play history yet.",
                target.mention()
            )),
            Ok(CheckOutcome::Elapsed { game_identity, elapsed }) => CommandResponse::public(format!(
                "{} (Riot ID: {game_identity}) last played **{}** ago.",
                target.mention(),
                format_elapsed(elapsed)
            )),
            Err(Error::NotFound(what)) => {
                CommandResponse::private(format!("{what} could not be found. Check the Riot ID and tag."))
            }
            Err(e) => {
                warn!("Check for {} failed: {}", target, e);
                CommandResponse::private("Could not look up the last game right now. Please try again later.")
            }
        }
    }
}

/// Builds `Name#Tag` from the command arguments.
pub fn compose_riot_id(riot_id: &str, tag: Option<&str>) -> Result<String, String> {
    let name = riot_id.trim();
    if name.is_empty() {
        return Err("A Riot ID is required.".to_string());
    }

    let tag = tag.map(|t| t.trim().trim_start_matches('#').trim()).filter(|t| !t.is_empty());
    match (name.split_once('#'), tag) {
        (Some(_), Some(_)) => Err("Give the tag either in the Riot ID or as the tag option, not both.".to_string()),
        (Some((n, t)), None) if n.trim().is_empty() || t.trim().is_empty() => {
            Err(format!("\"{name}\" is not a valid Riot ID (expected Name#Tag)."))
        }
        (Some(_), None) => Ok(name.to_string()),
        (None, Some(tag)) => Ok(format!("{name}#{tag}")),
        (None, None) => Ok(name.to_string()),
    }
}
