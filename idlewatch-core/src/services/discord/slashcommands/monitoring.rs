// File: idlewatch-core/src/services/discord/slashcommands/monitoring.rs

use twilight_model::application::command::{Command, CommandType};
use twilight_util::builder::command::CommandBuilder;

pub fn create_login_command() -> Command {
    CommandBuilder::new("login", "Turn inactivity monitoring on", CommandType::ChatInput).build()
}

pub fn create_logout_command() -> Command {
    CommandBuilder::new("logout", "Turn inactivity monitoring off", CommandType::ChatInput).build()
}
