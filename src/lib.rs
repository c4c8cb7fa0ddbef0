//! # Monload Core Library
//!
//! Host-side client for the line-oriented memory monitor firmware spoken over
//! a serial link:
//! - Upload, validate, read and write byte ranges of the 16-bit address space
//! - Jump to an address
//! - Control the monitor's echo and screen output
//!
//! ## Example
//!
//! ```rust,no_run
//! use monload_core::{Address, Monitor, ReadRequest, SerialConfig, SerialLink, SessionConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let link = SerialLink::open(SerialConfig::new("/dev/ttyUSB1", 9600))?;
//!     let mut monitor = Monitor::connect(Box::new(link), SessionConfig::default())?;
//!     monitor.initialize()?;
//!
//!     let address: Address = "8000".parse()?;
//!     monitor.read_memory(address, ReadRequest::Dump { length: 64 }, |row| println!("{row}"))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::cli::{CliResult, ExitCodes};
pub use crate::config::AppConfig;
pub use crate::core::error::MonitorError;
pub use crate::core::line_reader::{Line, LineAssembler, LineReader, PROMPT};
pub use crate::core::monitor::{Address, Monitor, ReadRequest};
pub use crate::core::session::{EchoState, Session, SessionConfig};
pub use crate::core::simulator::{FaultConfig, SimulatedMonitor, SimulatorConfig};
pub use crate::core::transport::{Link, SerialConfig, SerialLink, SerialParity, TransportError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
