// File: idlewatch-core/src/services/discord/slashcommands/mod.rs

pub mod check;
pub mod monitoring;
pub mod register;
pub mod rule;

use std::sync::Arc;

use tracing::{debug, warn};
use twilight_http::Client as HttpClient;
use twilight_model::{
    application::{
        command::Command,
        interaction::{
            application_command::{CommandDataOption, CommandOptionValue},
            InteractionData,
        },
    },
    channel::message::MessageFlags,
    gateway::payload::incoming::InteractionCreate,
    http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
    id::marker::{ApplicationMarker, GuildMarker, InteractionMarker},
    id::Id,
};

use idlewatch_common::models::UserId;

use crate::services::{BotCommand, CommandResponse, CommandService};
use crate::Error;

use check::{create_check_command, parse_check};
use monitoring::{create_login_command, create_logout_command};
use register::{create_register_command, create_unregister_command, parse_register, parse_unregister};
use rule::create_rule_command;

/// Every slash command the bot exposes.
pub fn all_commands() -> Vec<Command> {
    vec![
        create_login_command(),
        create_logout_command(),
        create_rule_command(),
        create_register_command(),
        create_unregister_command(),
        create_check_command(),
    ]
}

/// Registers the commands for one guild (instant, unlike global commands).
pub async fn register_guild_slash_commands(
    http: &Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
    guild_id: Id<GuildMarker>,
) -> Result<(), Error> {
    let commands = all_commands();
    http.interaction(application_id)
        .set_guild_commands(guild_id, &commands)
        .await
        .map_err(|e| Error::Platform(format!("Failed to register guild slash commands: {e}")))?;
    Ok(())
}

pub(crate) fn user_option(options: &[CommandDataOption], name: &str) -> Option<UserId> {
    options.iter().find(|o| o.name == name).and_then(|o| match &o.value {
        CommandOptionValue::User(id) => Some(UserId::from(id.get())),
        _ => None,
    })
}

pub(crate) fn string_option(options: &[CommandDataOption], name: &str) -> Option<String> {
    options.iter().find(|o| o.name == name).and_then(|o| match &o.value {
        CommandOptionValue::String(s) => Some(s.clone()),
        _ => None,
    })
}

/// Maps a slash command name and its options to a `BotCommand`.
/// `Err` carries the text to show the invoker.
pub fn parse_command(name: &str, options: &[CommandDataOption]) -> Result<BotCommand, String> {
    match name {
        "login" => Ok(BotCommand::EnableMonitoring),
        "logout" => Ok(BotCommand::DisableMonitoring),
        "rule" => Ok(BotCommand::Rule),
        "register" => parse_register(options),
        "unregister" => parse_unregister(options),
        "check" => parse_check(options),
        other => Err(format!("Unrecognized command: {other}")),
    }
}

fn response_data(resp: &CommandResponse) -> InteractionResponseData {
    InteractionResponseData {
        content: Some(resp.text.clone()),
        flags: resp.ephemeral.then_some(MessageFlags::EPHEMERAL),
        ..Default::default()
    }
}

async fn respond(
    http: &HttpClient,
    application_id: Id<ApplicationMarker>,
    interaction_id: Id<InteractionMarker>,
    interaction_token: &str,
    resp: &CommandResponse,
) -> Result<(), Error> {
    http.interaction(application_id)
        .create_response(
            interaction_id,
            interaction_token,
            &InteractionResponse {
                kind: InteractionResponseType::ChannelMessageWithSource,
                data: Some(response_data(resp)),
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error responding to interaction: {e}")))?;
    Ok(())
}

/// Dispatch slash commands from an `InteractionCreate`.
///
/// `/check` calls out to the activity source, which can be slower than the
/// interaction deadline, so it is deferred and answered with a follow-up edit.
pub async fn handle_interaction_create(
    http: Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
    commands: Arc<CommandService>,
    event: &InteractionCreate,
) -> Result<(), Error> {
    let interaction = &event.0;
    let interaction_id = interaction.id;
    let interaction_token = interaction.token.as_str();

    let Some(InteractionData::ApplicationCommand(cmd_data)) = &interaction.data else {
        return Ok(());
    };
    let Some(invoker) = interaction.author_id().map(|id| UserId::from(id.get())) else {
        warn!("Interaction {} has no author; ignoring", interaction_id);
        return Ok(());
    };

    let cmd = match parse_command(cmd_data.name.as_str(), &cmd_data.options) {
        Ok(cmd) => cmd,
        Err(msg) => {
            let resp = CommandResponse { text: msg, ephemeral: true };
            return respond(&http, application_id, interaction_id, interaction_token, &resp).await;
        }
    };
    debug!("Slash command '{}' from {}", cmd_data.name, invoker);

    if matches!(cmd, BotCommand::Check { .. }) {
        http.interaction(application_id)
            .create_response(
                interaction_id,
                interaction_token,
                &InteractionResponse {
                    kind: InteractionResponseType::DeferredChannelMessageWithSource,
                    data: None,
                },
            )
            .await
            .map_err(|e| Error::Platform(format!("Error deferring `/check`: {e}")))?;

        let resp = commands.handle(&invoker, cmd).await;
        http.interaction(application_id)
            .update_response(interaction_token)
            .content(Some(resp.text.as_str()))
            .await
            .map_err(|e| Error::Platform(format!("Error answering `/check`: {e}")))?;
        return Ok(());
    }

    let resp = commands.handle(&invoker, cmd).await;
    respond(&http, application_id, interaction_id, interaction_token, &resp).await
}
