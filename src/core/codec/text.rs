//! Windows-1252 text codec
//!
//! The monitor speaks a single-byte Western code page. Bytes 0x00-0x7F are
//! ASCII and 0xA0-0xFF coincide with Latin-1; only 0x80-0x9F need a table.
//! The five unassigned positions decode to U+FFFD.

const UNDEFINED: char = '\u{FFFD}';

const HIGH_CONTROL: [char; 32] = [
    '\u{20AC}', UNDEFINED, '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', UNDEFINED, '\u{017D}', UNDEFINED,
    UNDEFINED, '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', UNDEFINED, '\u{017E}', '\u{0178}',
];

fn decode_byte(byte: u8) -> char {
    match byte {
        0x80..=0x9F => HIGH_CONTROL[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

fn encode_char(c: char) -> Option<u8> {
    match u32::from(c) {
        code @ (0x00..=0x7F | 0xA0..=0xFF) => u8::try_from(code).ok(),
        _ => HIGH_CONTROL
            .iter()
            .position(|&mapped| mapped == c && mapped != UNDEFINED)
            .and_then(|idx| u8::try_from(idx + 0x80).ok()),
    }
}

/// Decode cp1252 bytes into a string
pub fn decode_cp1252(data: &[u8]) -> String {
    data.iter().map(|&b| decode_byte(b)).collect()
}

/// Encode a string as cp1252, replacing unmappable characters with `?`
pub fn encode_cp1252(text: &str) -> Vec<u8> {
    text.chars().map(|c| encode_char(c).unwrap_or(b'?')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ascii() {
        assert_eq!(decode_cp1252(b"E:01"), "E:01");
    }

    #[test]
    fn test_decode_high_range() {
        assert_eq!(decode_cp1252(&[0x80, 0xE9, 0x99]), "\u{20AC}\u{E9}\u{2122}");
        assert_eq!(decode_cp1252(&[0x81]), "\u{FFFD}");
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode_cp1252("w 8000 DE"), b"w 8000 DE".to_vec());
        assert_eq!(encode_cp1252("\u{20AC}\u{E9}"), vec![0x80, 0xE9]);
        assert_eq!(encode_cp1252("\u{4E2D}"), vec![b'?']);
    }
}
