pub mod runtime;

pub use runtime::{build_http_client, DiscordPlatform};
