//! CLI Module
//!
//! Provides the command-line driver:
//! - Argument parsing
//! - Read/write/upload jobs composed from monitor commands
//! - Exit codes for automation

mod args;
pub mod exit_codes;
mod runner;

pub use args::Cli;
pub use exit_codes::{exit_code_description, CliResult, ExitCodes};
pub use runner::{run, Job, UploadOptions, ValidationError};
