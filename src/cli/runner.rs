//! Jobs composed from monitor commands

use crate::core::error::MonitorError;
use crate::core::monitor::{Address, Monitor, ReadRequest};
use std::io::Write;
use thiserror::Error;

/// Read-back after an upload did not match the uploaded file
#[derive(Error, Debug)]
#[error("Validation failed: {0}")]
pub struct ValidationError(#[source] pub MonitorError);

/// Upload step switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Jump here before touching memory
    pub jump_before: Option<Address>,
    /// Jump here when done; echo stays off since the program owns the link
    pub jump_after: Option<Address>,
    /// Write the payload
    pub upload: bool,
    /// Read the payload back and compare
    pub validate: bool,
    /// Leave the screen off afterwards
    pub screen_off: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            jump_before: None,
            jump_after: None,
            upload: true,
            validate: true,
            screen_off: false,
        }
    }
}

/// Work selected on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Print `length` bytes of memory
    Read {
        /// Start address
        address: Address,
        /// Number of bytes
        length: usize,
    },
    /// Write bytes without validation
    Write {
        /// Start address
        address: Address,
        /// Bytes to write
        data: Vec<u8>,
    },
    /// Upload a file and optionally validate it
    Upload {
        /// Start address
        address: Address,
        /// File contents
        payload: Vec<u8>,
        /// Step switches
        options: UploadOptions,
    },
}

/// Run a job, printing dumps to `out`
pub fn run(monitor: &mut Monitor, job: &Job, out: &mut dyn Write) -> anyhow::Result<()> {
    monitor.initialize()?;

    match job {
        Job::Read { address, length } => {
            writeln!(out, "Reading {length} bytes from {address}:")?;
            let mut written = Ok(());
            monitor.read_memory(*address, ReadRequest::Dump { length: *length }, |row| {
                if written.is_ok() {
                    written = writeln!(out, "{row}");
                }
            })?;
            written?;
        }
        Job::Write { address, data } => {
            writeln!(out, "Writing {} to {address}:", hex::encode(data))?;
            monitor.write_memory(*address, data)?;
        }
        Job::Upload {
            address,
            payload,
            options,
        } => upload(monitor, *address, payload, options)?,
    }

    out.flush()?;
    Ok(())
}

fn upload(
    monitor: &mut Monitor,
    address: Address,
    payload: &[u8],
    options: &UploadOptions,
) -> anyhow::Result<()> {
    if let Some(target) = options.jump_before {
        monitor.jump_to(target)?;
    }
    monitor.set_echo(false)?;
    monitor.set_screen(false)?;

    if options.upload {
        tracing::info!("Uploading {} bytes to {}", payload.len(), address);
        monitor.write_memory(address, payload)?;
    }

    if options.validate {
        tracing::info!("Validating {} bytes at {}", payload.len(), address);
        monitor
            .read_memory(address, ReadRequest::Verify { payload }, |_| {})
            .map_err(|e| match e {
                MonitorError::ProtocolMismatch { .. } => anyhow::Error::new(ValidationError(e)),
                other => anyhow::Error::new(other),
            })?;
        tracing::info!("Validation passed");
    }

    monitor.set_screen(!options.screen_off)?;
    match options.jump_after {
        Some(target) => monitor.jump_to(target)?,
        None => monitor.set_echo(true)?,
    }
    Ok(())
}
