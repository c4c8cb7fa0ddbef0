//! Command-line arguments

use super::runner::{Job, UploadOptions};
use crate::config::{AppConfig, ConfigError};
use crate::core::codec::parse_hex_bytes;
use crate::core::monitor::Address;
use anyhow::Context;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Monload CLI
#[derive(Parser, Debug)]
#[command(
    name = "monload",
    version,
    about = "Serial uploader for the memory monitor firmware",
    long_about = None
)]
#[command(group(ArgGroup::new("action").required(true).args(["file", "read", "write"])))]
pub struct Cli {
    /// Serial port to use (overrides the config file)
    #[arg(short, long, env = "MONLOAD_PORT")]
    pub port: Option<String>,

    /// Baud rate (overrides the config file)
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Config file (default: platform config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to upload to, read from or write at (hex)
    #[arg(short, long, value_parser = parse_address)]
    pub address: Address,

    /// File to upload
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Number of bytes to read from memory
    #[arg(short, long)]
    pub read: Option<usize>,

    /// Hex bytes to write
    #[arg(short, long)]
    pub write: Option<String>,

    /// Skip the upload step
    #[arg(long)]
    pub skip_upload: bool,

    /// Skip validation after upload
    #[arg(long)]
    pub skip_validate: bool,

    /// Jump to this address before uploading
    #[arg(long, value_parser = parse_address)]
    pub jump_before: Option<Address>,

    /// Jump to this address after uploading
    #[arg(long, value_parser = parse_address)]
    pub jump_after: Option<Address>,

    /// Keep screen output off
    #[arg(long)]
    pub screen_off: bool,

    /// Log every raw byte and line read from the link
    #[arg(short, long)]
    pub debug: bool,

    /// Talk to an in-process simulated monitor instead of a serial port
    #[arg(long)]
    pub simulate: bool,
}

fn parse_address(s: &str) -> Result<Address, String> {
    s.parse().map_err(|e| format!("{e}"))
}

impl Cli {
    /// Load the config file and apply command-line overrides
    pub fn app_config(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match self.config {
            Some(ref path) => AppConfig::load_from(path)?,
            None => AppConfig::load()?,
        };
        if let Some(ref port) = self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        Ok(config)
    }

    /// Build the job the arguments select
    pub fn job(&self) -> anyhow::Result<Job> {
        let address = self.address;

        if let Some(length) = self.read {
            return Ok(Job::Read { address, length });
        }

        if let Some(ref hex) = self.write {
            let data = parse_hex_bytes(hex).with_context(|| format!("parsing --write '{hex}'"))?;
            return Ok(Job::Write { address, data });
        }

        let path = self
            .file
            .as_ref()
            .context("one of --read, --write or --file is required")?;
        let payload = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

        Ok(Job::Upload {
            address,
            payload,
            options: UploadOptions {
                jump_before: self.jump_before,
                jump_after: self.jump_after,
                upload: !self.skip_upload,
                validate: !self.skip_validate,
                screen_off: self.screen_off,
            },
        })
    }
}
