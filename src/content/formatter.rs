//! Byte renderers for fetched content.

use std::io::{self, Write};

/// Renders a run of bytes to a writer.
pub trait ByteFormatter {
    fn write_byte(&self, out: &mut dyn Write, byte: u8) -> io::Result<()>;

    fn write_all(&self, out: &mut dyn Write, bytes: &[u8]) -> io::Result<()> {
        for &b in bytes {
            self.write_byte(out, b)?;
        }
        Ok(())
    }
}

/// Two upper-case hex digits and a space per byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexFormatter;

impl ByteFormatter for HexFormatter {
    fn write_byte(&self, out: &mut dyn Write, byte: u8) -> io::Result<()> {
        write!(out, "{:02X} ", byte)
    }
}

/// One glyph per byte; anything outside printable ASCII becomes `.`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharFormatter;

impl CharFormatter {
    pub fn glyph(byte: u8) -> char {
        if byte.is_ascii_graphic() || byte == b' ' {
            byte as char
        } else {
            '.'
        }
    }
}

impl ByteFormatter for CharFormatter {
    fn write_byte(&self, out: &mut dyn Write, byte: u8) -> io::Result<()> {
        write!(out, "{}", Self::glyph(byte))
    }
}

/// Picks the formatter for a fetch mode.
pub fn formatter_for(hex: bool) -> &'static dyn ByteFormatter {
    if hex {
        &HexFormatter
    } else {
        &CharFormatter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: &dyn ByteFormatter, bytes: &[u8]) -> String {
        let mut out = Vec::new();
        f.write_all(&mut out, bytes).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_hex_formatter() {
        assert_eq!(render(&HexFormatter, &[0x00, 0xFF, 0x41]), "00 FF 41 ");
        assert_eq!(render(&HexFormatter, &[]), "");
    }

    #[test]
    fn test_char_formatter() {
        assert_eq!(render(&CharFormatter, &[0x00, 0xFF, 0x41]), "..A");
        assert_eq!(render(&CharFormatter, b"MZ \x90"), "MZ .");
    }

    #[test]
    fn test_formatter_for() {
        assert_eq!(render(formatter_for(true), b"A"), "41 ");
        assert_eq!(render(formatter_for(false), b"A"), "A");
    }
}
