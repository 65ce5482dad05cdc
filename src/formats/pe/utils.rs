//! Byte-level helpers for reading and patching PE images

/// Little-endian reads from byte slices that never panic
pub trait ReadExt {
    fn read_u8_at(&self, offset: usize) -> Option<u8>;
    fn read_u16_le_at(&self, offset: usize) -> Option<u16>;
    fn read_u32_le_at(&self, offset: usize) -> Option<u32>;
    fn read_u64_le_at(&self, offset: usize) -> Option<u64>;
    /// Reads an unsigned little-endian integer of 1, 2, 4 or 8 bytes.
    fn read_uint_at(&self, offset: usize, width: u8) -> Option<u64>;
    fn read_cstring_at(&self, offset: usize, max_len: usize) -> Option<String>;
}

impl ReadExt for [u8] {
    #[inline(always)]
    fn read_u8_at(&self, offset: usize) -> Option<u8> {
        self.get(offset).copied()
    }

    #[inline(always)]
    fn read_u16_le_at(&self, offset: usize) -> Option<u16> {
        self.get(offset..offset.checked_add(2)?)
            .and_then(|b| b.try_into().ok())
            .map(u16::from_le_bytes)
    }

    #[inline(always)]
    fn read_u32_le_at(&self, offset: usize) -> Option<u32> {
        self.get(offset..offset.checked_add(4)?)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
    }

    #[inline(always)]
    fn read_u64_le_at(&self, offset: usize) -> Option<u64> {
        self.get(offset..offset.checked_add(8)?)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_le_bytes)
    }

    fn read_uint_at(&self, offset: usize, width: u8) -> Option<u64> {
        match width {
            1 => self.read_u8_at(offset).map(u64::from),
            2 => self.read_u16_le_at(offset).map(u64::from),
            4 => self.read_u32_le_at(offset).map(u64::from),
            8 => self.read_u64_le_at(offset),
            _ => None,
        }
    }

    fn read_cstring_at(&self, offset: usize, max_len: usize) -> Option<String> {
        let end = offset.saturating_add(max_len).min(self.len());
        let slice = self.get(offset..end)?;
        let len = slice.iter().position(|&b| b == 0).unwrap_or(slice.len());
        Some(String::from_utf8_lossy(&slice[..len]).into_owned())
    }
}

/// Little-endian writes into mutable byte slices; `false` when out of bounds
pub trait WriteExt {
    fn write_u16_le_at(&mut self, offset: usize, value: u16) -> bool;
    fn write_u32_le_at(&mut self, offset: usize, value: u32) -> bool;
    fn write_bytes_at(&mut self, offset: usize, bytes: &[u8]) -> bool;
}

impl WriteExt for [u8] {
    fn write_u16_le_at(&mut self, offset: usize, value: u16) -> bool {
        self.write_bytes_at(offset, &value.to_le_bytes())
    }

    fn write_u32_le_at(&mut self, offset: usize, value: u32) -> bool {
        self.write_bytes_at(offset, &value.to_le_bytes())
    }

    fn write_bytes_at(&mut self, offset: usize, bytes: &[u8]) -> bool {
        let Some(end) = offset.checked_add(bytes.len()) else {
            return false;
        };
        match self.get_mut(offset..end) {
            Some(dst) => {
                dst.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }
}

/// Align a value up to the specified alignment
#[inline(always)]
pub fn align_up(value: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        value
    } else {
        value.div_ceil(alignment) * alignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads() {
        let data = [0x4D, 0x5A, 0x90, 0x00, 0x03, 0x00, 0x00, 0x00, 0xFF];
        assert_eq!(data.read_u16_le_at(0), Some(0x5A4D));
        assert_eq!(data.read_u32_le_at(4), Some(3));
        assert_eq!(data.read_u64_le_at(1), Some(0xFF00_0000_0300_905A));
        assert_eq!(data.read_u32_le_at(6), None);
        assert_eq!(data.read_uint_at(8, 1), Some(0xFF));
        assert_eq!(data.read_uint_at(0, 3), None);
        assert_eq!(data.read_u16_le_at(usize::MAX), None);
    }

    #[test]
    fn test_cstring() {
        let data = b"KERNEL32.dll\0junk";
        assert_eq!(data.read_cstring_at(0, 64).as_deref(), Some("KERNEL32.dll"));
        assert_eq!(data.read_cstring_at(13, 2).as_deref(), Some("ju"));
        assert_eq!(data.read_cstring_at(100, 2), None);
    }

    #[test]
    fn test_writes() {
        let mut data = [0u8; 6];
        assert!(data.write_u32_le_at(2, 0xAABBCCDD));
        assert_eq!(data, [0, 0, 0xDD, 0xCC, 0xBB, 0xAA]);
        assert!(!data.write_u16_le_at(5, 1));
        assert!(data.write_bytes_at(0, b"MZ"));
        assert_eq!(&data[..2], b"MZ");
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0x201, 0x200), 0x400);
        assert_eq!(align_up(0x400, 0x200), 0x400);
        assert_eq!(align_up(7, 0), 7);
    }
}
