// File: idlewatch-core/src/services/discord/slashcommands/register.rs

use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::application_command::CommandDataOption;
use twilight_util::builder::command::{CommandBuilder, StringBuilder, UserBuilder};

use crate::services::BotCommand;
use super::{string_option, user_option};

pub fn create_register_command() -> Command {
    CommandBuilder::new("register", "Link a Riot ID (Name + #Tag) to a member", CommandType::ChatInput)
        .option(UserBuilder::new("user", "Member to link").required(true))
        .option(StringBuilder::new("riotid", "Riot ID (the Name part)").required(true))
        .option(StringBuilder::new("tag", "Tag (the part after #), unless already in riotid").required(false))
        .build()
}

pub fn create_unregister_command() -> Command {
    CommandBuilder::new("unregister", "Stop watching a member", CommandType::ChatInput)
        .option(UserBuilder::new("user", "Member to stop watching").required(true))
        .build()
}

pub fn parse_register(options: &[CommandDataOption]) -> Result<BotCommand, String> {
    let target = user_option(options, "user").ok_or("The user option is required.")?;
    let riot_id = string_option(options, "riotid").ok_or("The riotid option is required.")?;
    Ok(BotCommand::Register {
        target,
        riot_id,
        tag: string_option(options, "tag"),
    })
}

pub fn parse_unregister(options: &[CommandDataOption]) -> Result<BotCommand, String> {
    let target = user_option(options, "user").ok_or("The user option is required.")?;
    Ok(BotCommand::Unregister { target })
}
