// src/lib.rs

pub mod config;
pub mod http;
pub mod registry;
pub mod monitor;
pub mod activity;
pub mod notify;
pub mod services;
pub mod platforms;
pub mod tasks;
pub mod health_server;
pub mod utils;

pub use idlewatch_common::error::Error;
pub use crate::http::{DefaultHttpClient, HttpClient, HttpResponse};
pub use monitor::InactivityMonitor;
pub use registry::UserRegistry;
