use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::application_command::CommandDataOption;
use twilight_util::builder::command::{CommandBuilder, UserBuilder};

use crate::services::BotCommand;
use super::user_option;

/// `/check user` reports how long ago the member last finished a game.
pub fn create_check_command() -> Command {
    CommandBuilder::new("check", "How long since a member last played LoL", CommandType::ChatInput)
        .option(UserBuilder::new("user", "Member to check").required(true))
        .build()
}

pub fn parse_check(options: &[CommandDataOption]) -> Result<BotCommand, String> {
    let target = user_option(options, "user").ok_or("The user option is required.")?;
    Ok(BotCommand::Check { target })
}
