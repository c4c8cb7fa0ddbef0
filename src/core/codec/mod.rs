//! Data codec module for the monitor wire format
//!
//! Provides:
//! - cp1252 text decoding/encoding for protocol lines
//! - Hex row rendering (`AAAA: HH HH ..`) and hex byte parsing

mod hex;
mod text;

pub use self::hex::{format_hex_bytes, format_row, parse_hex_bytes, row_width, ROW_BYTES};
pub use text::{decode_cp1252, encode_cp1252};

/// Codec errors
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Invalid input format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Hex decoding failed
    #[error("Invalid hex: {0}")]
    Hex(#[from] ::hex::FromHexError),
}
