//! Bounded views of image content.

pub mod formatter;

pub use formatter::{formatter_for, ByteFormatter, CharFormatter, HexFormatter};

use crate::core::address::Offset;
use crate::core::executable::Executable;

/// A borrowed window of the raw image, clamped to its end.
#[derive(Debug, Clone, Copy)]
pub struct BufferView<'a> {
    start: Offset,
    bytes: &'a [u8],
}

impl<'a> BufferView<'a> {
    /// A view of up to `size` bytes starting at raw offset `start`.
    pub fn new<E: Executable + ?Sized>(exe: &'a E, start: Offset, size: u64) -> Self {
        let data = exe.content();
        let bytes = usize::try_from(start)
            .ok()
            .filter(|&s| s < data.len())
            .map(|s| {
                let end = s.saturating_add(usize::try_from(size).unwrap_or(usize::MAX));
                &data[s..end.min(data.len())]
            })
            .unwrap_or(&[]);
        Self { start, bytes }
    }

    pub fn start(&self) -> Offset {
        self.start
    }

    /// The viewed bytes, `None` when the view starts at or past the end.
    pub fn content(&self) -> Option<&'a [u8]> {
        (!self.bytes.is_empty()).then_some(self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
