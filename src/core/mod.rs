//! Core module containing the monitor protocol engine
//!
//! This module provides:
//! - Codec for cp1252 lines and hex memory rows
//! - Transport layer (`Link`) over serial ports
//! - Background line reader
//! - Command/response session with echo-aware pacing
//! - Monitor commands (jump, write, read/verify)
//! - Simulated monitor firmware for tests and dry runs

pub mod codec;
pub mod error;
pub mod line_reader;
pub mod monitor;
pub mod session;
pub mod simulator;
pub mod transport;
