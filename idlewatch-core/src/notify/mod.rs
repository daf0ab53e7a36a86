//! Delivery of inactivity notifications.

pub mod discord;
pub mod log_only;

pub use discord::DiscordNotificationSink;
pub use log_only::LogOnlyNotificationSink;
