//! Hex rendering of memory rows

use super::CodecError;

/// Bytes per memory row on the wire
pub const ROW_BYTES: usize = 16;

/// Width of the `AAAA: ` address prefix minus the separator space that
/// `3 * n` already accounts for.
const ADDRESS_PREFIX: usize = 5;

/// Render bytes as space separated uppercase hex (e.g. "DE AD BE EF")
pub fn format_hex_bytes(data: &[u8]) -> String {
    let mut output = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            output.push(' ');
        }
        output.push_str(&format!("{byte:02X}"));
    }
    output
}

/// Render a memory row the way the monitor prints it (e.g. "1000: 01 AB 00")
pub fn format_row(address: u16, data: &[u8]) -> String {
    format!("{address:04X}: {}", format_hex_bytes(data))
}

/// Number of characters a rendered row with `valid_bytes` bytes occupies
pub fn row_width(valid_bytes: usize) -> usize {
    if valid_bytes == 0 {
        0
    } else {
        valid_bytes * 3 + ADDRESS_PREFIX
    }
}

/// Parse a hex byte string, tolerating whitespace and a `0x` prefix
pub fn parse_hex_bytes(text: &str) -> Result<Vec<u8>, CodecError> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let cleaned: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() {
        return Err(CodecError::InvalidFormat("no hex bytes given".to_string()));
    }

    Ok(::hex::decode(cleaned)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_row() {
        assert_eq!(format_row(0x1000, &[0x01, 0xAB, 0x00]), "1000: 01 AB 00");
        assert_eq!(format_row(0x000F, &[0xFF]), "000F: FF");
    }

    #[test]
    fn test_row_width_matches_rendering() {
        let data = [0x5Au8; ROW_BYTES];
        for n in 1..=ROW_BYTES {
            assert_eq!(format_row(0x8000, &data[..n]).len(), row_width(n));
        }
        assert_eq!(row_width(0), 0);
    }

    #[test]
    fn test_parse_with_spaces() {
        assert_eq!(parse_hex_bytes("DE AD be ef").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_parse_odd_digits() {
        assert!(matches!(parse_hex_bytes("ABC"), Err(CodecError::Hex(_))));
        assert!(matches!(parse_hex_bytes("  "), Err(CodecError::InvalidFormat(_))));
    }
}
