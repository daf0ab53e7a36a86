// File: src/services/mod.rs

pub mod command_service;
pub mod discord;

pub use command_service::{BotCommand, CommandResponse, CommandService};
