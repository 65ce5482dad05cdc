//! Contracts between the console and the image engine.

use crate::core::address::{AddrKind, Offset};
use crate::core::wrapper::WrapperNode;
use crate::error::Result;

/// An executable image with address spaces the console can translate between.
pub trait Executable {
    /// The raw file content.
    fn content(&self) -> &[u8];

    /// Raw file size in bytes.
    fn raw_size(&self) -> u64 {
        self.content().len() as u64
    }

    /// Translates `offset` from `kind` to a raw file offset.
    ///
    /// Returns `INVALID_ADDR` when the offset is unmapped, out of range, or
    /// `kind` is `AddrKind::NotAddr`.
    fn to_raw(&self, offset: Offset, kind: AddrKind) -> Offset;

    /// Translates `offset` between two address kinds; `INVALID_ADDR` on failure.
    fn convert(&self, offset: Offset, from: AddrKind, to: AddrKind) -> Offset;
}

/// An executable whose structure is exposed as a list of wrappers.
pub trait MappedExe: Executable {
    fn wrappers_count(&self) -> usize;

    /// Builds a fresh view of the wrapper at `index`; `None` when absent.
    fn wrapper(&self, index: usize) -> Option<WrapperNode>;

    fn wrapper_name(&self, index: usize) -> &'static str;

    /// Zero-fills the bytes the wrapper spans.
    fn clear_wrapper(&mut self, index: usize) -> Result<()>;

    /// Appends a new entry to the wrapper, if the wrapper supports it.
    fn add_entry(&mut self, index: usize) -> Result<()>;
}
