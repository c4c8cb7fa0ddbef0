//! CLI Exit Codes
//!
//! Standard exit codes for CLI operations and automation.

use super::runner::ValidationError;
use crate::config::ConfigError;
use crate::core::codec::CodecError;
use crate::core::error::MonitorError;
use crate::core::transport::TransportError;
use std::process::ExitCode;

/// Exit code constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes;

impl ExitCodes {
    /// Success
    pub const SUCCESS: u8 = 0;

    /// General error
    pub const ERROR: u8 = 1;

    /// Invalid arguments
    pub const INVALID_ARGS: u8 = 2;

    /// Connection failed
    pub const CONNECTION_FAILED: u8 = 3;

    /// Response timeout
    pub const TIMEOUT: u8 = 4;

    /// File not found
    pub const FILE_NOT_FOUND: u8 = 6;

    /// Permission denied
    pub const PERMISSION_DENIED: u8 = 7;

    /// Configuration error
    pub const CONFIG_ERROR: u8 = 8;

    /// Protocol error
    pub const PROTOCOL_ERROR: u8 = 9;

    /// Port not found
    pub const PORT_NOT_FOUND: u8 = 14;

    /// Data validation failed
    pub const VALIDATION_FAILED: u8 = 17;
}

/// CLI operation result
#[derive(Debug)]
pub enum CliResult {
    /// Success with optional message
    Success(Option<String>),

    /// Error with code and message
    Error(u8, String),
}

impl CliResult {
    /// Plain success
    pub fn success() -> Self {
        Self::Success(None)
    }

    /// Error with an explicit code
    pub fn error(code: u8, msg: impl Into<String>) -> Self {
        Self::Error(code, msg.into())
    }

    /// Classify a failed run
    pub fn from_error(err: &anyhow::Error) -> Self {
        let msg = format!("{err:#}");

        if err.downcast_ref::<ValidationError>().is_some() {
            return Self::Error(ExitCodes::VALIDATION_FAILED, msg);
        }
        if let Some(monitor) = err.downcast_ref::<MonitorError>() {
            return Self::Error(monitor_code(monitor), msg);
        }
        if let Some(transport) = err.downcast_ref::<TransportError>() {
            return Self::Error(transport_code(transport), msg);
        }
        if err.downcast_ref::<CodecError>().is_some() {
            return Self::Error(ExitCodes::INVALID_ARGS, msg);
        }
        if err.downcast_ref::<ConfigError>().is_some() {
            return Self::Error(ExitCodes::CONFIG_ERROR, msg);
        }
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return Self::Error(io_code(io), msg);
        }
        Self::Error(ExitCodes::ERROR, msg)
    }

    /// Get exit code
    pub fn code(&self) -> u8 {
        match self {
            Self::Success(_) => ExitCodes::SUCCESS,
            Self::Error(code, _) => *code,
        }
    }

    /// Get message
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(Some(msg)) | Self::Error(_, msg) => Some(msg),
            Self::Success(None) => None,
        }
    }

    /// Convert to ExitCode
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    /// Is success?
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

fn monitor_code(err: &MonitorError) -> u8 {
    match err {
        MonitorError::Timeout(_) => ExitCodes::TIMEOUT,
        MonitorError::ProtocolMismatch { .. } => ExitCodes::PROTOCOL_ERROR,
        MonitorError::Link(transport) => transport_code(transport),
        MonitorError::LinkClosed(_) => ExitCodes::CONNECTION_FAILED,
        MonitorError::Usage(_) => ExitCodes::INVALID_ARGS,
    }
}

fn transport_code(err: &TransportError) -> u8 {
    match err {
        TransportError::PortNotFound(_) => ExitCodes::PORT_NOT_FOUND,
        TransportError::PermissionDenied(_) => ExitCodes::PERMISSION_DENIED,
        TransportError::InvalidConfiguration(_) => ExitCodes::CONFIG_ERROR,
        TransportError::IoError(io) => io_code(io),
        TransportError::ConnectionFailed(_) | TransportError::NotConnected => {
            ExitCodes::CONNECTION_FAILED
        }
    }
}

fn io_code(err: &std::io::Error) -> u8 {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => ExitCodes::FILE_NOT_FOUND,
        ErrorKind::PermissionDenied => ExitCodes::PERMISSION_DENIED,
        ErrorKind::TimedOut => ExitCodes::TIMEOUT,
        ErrorKind::BrokenPipe | ErrorKind::NotConnected => ExitCodes::CONNECTION_FAILED,
        _ => ExitCodes::ERROR,
    }
}

/// Exit code description
pub fn exit_code_description(code: u8) -> &'static str {
    match code {
        0 => "Success",
        1 => "General error",
        2 => "Invalid arguments",
        3 => "Connection failed",
        4 => "Response timeout",
        6 => "File not found",
        7 => "Permission denied",
        8 => "Configuration error",
        9 => "Protocol error",
        14 => "Port not found",
        17 => "Validation failed",
        _ => "Unknown error",
    }
}
