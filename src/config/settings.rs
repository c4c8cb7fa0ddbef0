//! Application settings

use crate::core::session::SessionConfig;
use crate::core::transport::{SerialConfig, SerialParity};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("Cannot access {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// Serializing failed
    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serial link settings
    pub serial: SerialSettings,
    /// Protocol timing
    pub timing: TimingConfig,
}

impl AppConfig {
    /// Load config from the platform config directory, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        match super::config_file() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Serial port configuration for the link
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig::new(&self.serial.port, self.serial.baud_rate)
            .data_bits(self.serial.data_bits)
            .stop_bits(self.serial.stop_bits)
            .parity(self.serial.parity)
            .read_timeout(Duration::from_millis(self.serial.read_timeout_ms))
    }

    /// Protocol timing for the session
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            line_timeout: Duration::from_millis(self.timing.line_timeout_ms),
            discard_window: Duration::from_millis(self.timing.discard_window_ms),
            echo_delay: Duration::from_micros(self.timing.echo_delay_us),
            settle_delay: Duration::from_millis(self.timing.settle_delay_ms),
        }
    }
}

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Port name
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits
    pub data_bits: u8,
    /// Stop bits
    pub stop_bits: u8,
    /// Parity
    pub parity: SerialParity,
    /// Per-read wait in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB1".to_string(),
            baud_rate: 9600,
            data_bits: 8,
            stop_bits: 1,
            parity: SerialParity::None,
            read_timeout_ms: 100,
        }
    }
}

/// Protocol timing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait for each response line
    pub line_timeout_ms: u64,
    /// Quiet period ending a discard of stale lines
    pub discard_window_ms: u64,
    /// Delay after each byte while the monitor echoes
    pub echo_delay_us: u64,
    /// Pause around reopening the link
    pub settle_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            line_timeout_ms: 1000,
            discard_window_ms: 100,
            echo_delay_us: 500,
            settle_delay_ms: 100,
        }
    }
}
