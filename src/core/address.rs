//! Address kinds and offsets.
//!
//! Every offset the console handles is a plain `u64` paired with an
//! [`AddrKind`] saying which address space it lives in. Failed translations
//! produce [`INVALID_ADDR`] rather than zero so the failure propagates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An offset within one of the image's address spaces.
pub type Offset = u64;

/// Sentinel for "no valid offset".
pub const INVALID_ADDR: Offset = Offset::MAX;

/// The address space an offset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum AddrKind {
    /// Physical offset within the file on disk
    Raw,
    /// Relative Virtual Address (offset from image base)
    Rva,
    /// Virtual Address (absolute mapped address)
    Va,
    /// The value is not an address
    NotAddr,
}

impl AddrKind {
    /// Single character tag used in structure dumps.
    pub fn as_char(self) -> char {
        match self {
            AddrKind::Raw => 'r',
            AddrKind::Rva => 'v',
            AddrKind::Va => 'V',
            AddrKind::NotAddr => '_',
        }
    }

    /// Label used for prompts; empty for [`AddrKind::NotAddr`].
    pub fn label(self) -> &'static str {
        match self {
            AddrKind::Raw => "raw",
            AddrKind::Rva => "RVA",
            AddrKind::Va => "VA",
            AddrKind::NotAddr => "",
        }
    }

    pub fn is_addr(self) -> bool {
        self != AddrKind::NotAddr
    }
}

/// Decodes a numeric discriminant; anything unrecognized is not an address.
impl From<u8> for AddrKind {
    fn from(value: u8) -> Self {
        match value {
            0 => AddrKind::Raw,
            1 => AddrKind::Rva,
            2 => AddrKind::Va,
            _ => AddrKind::NotAddr,
        }
    }
}

impl fmt::Display for AddrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returns `true` when `offset` is a real offset and not the sentinel.
#[inline]
pub fn is_valid(offset: Offset) -> bool {
    offset != INVALID_ADDR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_chars() {
        assert_eq!(AddrKind::Raw.as_char(), 'r');
        assert_eq!(AddrKind::Rva.as_char(), 'v');
        assert_eq!(AddrKind::Va.as_char(), 'V');
        assert_eq!(AddrKind::NotAddr.as_char(), '_');
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(AddrKind::Raw.label(), "raw");
        assert_eq!(AddrKind::Rva.label(), "RVA");
        assert_eq!(AddrKind::Va.label(), "VA");
        assert_eq!(AddrKind::NotAddr.label(), "");
    }

    #[test]
    fn test_unknown_discriminant_is_total() {
        let kind = AddrKind::from(0xEE);
        assert_eq!(kind, AddrKind::NotAddr);
        assert_eq!(kind.as_char(), '_');
        assert_eq!(kind.label(), "");
        assert_eq!(AddrKind::from(2), AddrKind::Va);
    }

    #[test]
    fn test_sentinel() {
        assert!(!is_valid(INVALID_ADDR));
        assert!(is_valid(0));
        assert_eq!(AddrKind::Rva.to_string(), "RVA");
    }
}
