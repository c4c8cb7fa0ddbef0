//! Transport layer for the monitor link
//!
//! A [`Link`] is the bidirectional byte stream the session talks over. The
//! write side stays with the session; the read side is handed to the line
//! reader as a cloned handle.

mod serial;

pub use serial::{SerialConfig, SerialLink, SerialParity};

use std::io::{Read, Write};
use thiserror::Error;

/// Transport error types
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Not connected
    #[error("Not connected")]
    NotConnected,

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Bidirectional byte stream to the monitor
///
/// Reads on the handle returned by [`Link::try_clone_reader`] must return
/// `ErrorKind::TimedOut` (or `WouldBlock`) when no byte arrives within the
/// link's read timeout, so the reader loop can observe a stop request.
pub trait Link: Write + Send {
    /// Clone an independent read handle for the line reader thread
    fn try_clone_reader(&self) -> Result<Box<dyn Read + Send>, TransportError>;

    /// Open (or re-open) the underlying device
    fn open(&mut self) -> Result<(), TransportError>;

    /// Close the underlying device
    fn close(&mut self);

    /// Check if the device is open
    fn is_open(&self) -> bool;

    /// Get connection info string
    fn connection_info(&self) -> String;
}
