use twilight_model::application::command::{Command, CommandType};
use twilight_util::builder::command::CommandBuilder;

/// `/rule` shows the help text.
pub fn create_rule_command() -> Command {
    CommandBuilder::new("rule", "Explain how the bot works", CommandType::ChatInput).build()
}
