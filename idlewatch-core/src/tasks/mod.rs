// idlewatch-core/src/tasks/mod.rs

pub mod inactivity_scan;

pub use inactivity_scan::{spawn_inactivity_scan_task, ScanTimer};
