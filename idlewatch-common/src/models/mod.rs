// File: idlewatch-common/src/models/mod.rs
pub mod user;
pub mod activity;

pub use user::{UserEntry, UserId, RegistrySnapshot};
pub use activity::ActivitySample;
