//! Section table and RAW <-> RVA resolution

use crate::formats::pe::types::*;
use crate::formats::pe::utils::ReadExt;

/// Upper bound on section headers read from a single image
pub const MAX_SECTIONS: u16 = 96;

/// Section headers in declaration order
#[derive(Debug, Clone, Default)]
pub struct SectionTable {
    sections: Vec<SectionHeader>,
}

impl SectionTable {
    pub fn new(sections: Vec<SectionHeader>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[SectionHeader] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section_containing_rva(&self, rva: u64) -> Option<&SectionHeader> {
        self.sections.iter().find(|s| s.contains_rva(rva))
    }

    pub fn section_containing_raw(&self, raw: u64) -> Option<&SectionHeader> {
        self.sections.iter().find(|s| s.contains_raw(raw))
    }

    /// Convert RVA to a raw file offset.
    ///
    /// The header region maps 1:1. Inside a section, only the part backed by
    /// raw data resolves; the zero-filled virtual tail has no file offset.
    pub fn rva_to_raw(&self, rva: u64, headers_size: u64) -> Option<u64> {
        if rva < headers_size {
            return Some(rva);
        }
        let section = self.section_containing_rva(rva)?;
        let delta = rva - section.virtual_address as u64;
        if delta >= section.size_of_raw_data as u64 {
            return None;
        }
        Some(section.pointer_to_raw_data as u64 + delta)
    }

    /// Convert a raw file offset to RVA
    pub fn raw_to_rva(&self, raw: u64, headers_size: u64) -> Option<u64> {
        if raw < headers_size {
            return Some(raw);
        }
        let section = self.section_containing_raw(raw)?;
        Some(section.virtual_address as u64 + (raw - section.pointer_to_raw_data as u64))
    }

    /// Lowest raw pointer of any section with file data; the header area ends there.
    pub fn first_raw_pointer(&self) -> Option<u64> {
        self.sections
            .iter()
            .filter(|s| s.size_of_raw_data > 0 && s.pointer_to_raw_data > 0)
            .map(|s| s.pointer_to_raw_data as u64)
            .min()
    }

    /// End of the highest section in RVA space.
    pub fn virtual_end(&self) -> Option<u64> {
        self.sections.iter().map(SectionHeader::virtual_end).max()
    }
}

/// Parse section headers from data at offset
pub fn parse_section_headers(data: &[u8], offset: usize, count: u16) -> Vec<SectionHeader> {
    (0..count.min(MAX_SECTIONS) as usize)
        .map_while(|i| parse_section_header(data, offset + i * SECTION_HEADER_SIZE))
        .collect()
}

fn parse_section_header(data: &[u8], offset: usize) -> Option<SectionHeader> {
    let name: [u8; 8] = data.get(offset..offset + 8)?.try_into().ok()?;
    Some(SectionHeader {
        offset,
        name,
        virtual_size: data.read_u32_le_at(offset + 8)?,
        virtual_address: data.read_u32_le_at(offset + 12)?,
        size_of_raw_data: data.read_u32_le_at(offset + 16)?,
        pointer_to_raw_data: data.read_u32_le_at(offset + 20)?,
        characteristics: data.read_u32_le_at(offset + 36)?,
    })
}
