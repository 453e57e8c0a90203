pub mod config;
pub mod dashboard;
pub mod data;

/// Application name used in the CLI and log output.
pub const APP_NAME: &str = "music-trends";
