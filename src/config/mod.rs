//! Configuration module
//!
//! Handles the serial link and protocol timing settings

mod settings;

pub use settings::{AppConfig, ConfigError, SerialSettings, TimingConfig};

use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the application configuration directory
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "monload", "Monload").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path of the default configuration file
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}
