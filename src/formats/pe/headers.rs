//! PE header parsing
//!
//! `Layout::scan` never fails: each header that can't be read becomes absent
//! and everything that depends on it is absent too. `validate` is the strict
//! check applied when an image is first loaded.

use crate::formats::pe::sections::{parse_section_headers, SectionTable};
use crate::formats::pe::types::*;
use crate::formats::pe::utils::ReadExt;

/// Where the headers of an image live and what they say.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Offset of the PE signature, when both signatures are intact
    pub nt_offset: Option<usize>,
    pub coff: Option<CoffHeader>,
    pub optional: Option<OptionalHeader>,
    pub directories_offset: Option<usize>,
    pub directories: Vec<DataDirectory>,
    pub sections_offset: Option<usize>,
    pub sections: SectionTable,
}

impl Layout {
    pub fn scan(data: &[u8]) -> Self {
        let mut layout = Layout::default();

        let Some(nt_offset) = find_nt_headers(data) else {
            return layout;
        };
        layout.nt_offset = Some(nt_offset);

        let Some(coff) = parse_coff_header(data, nt_offset + PE_SIGNATURE.len()) else {
            return layout;
        };
        layout.coff = Some(coff);

        let opt_offset = coff.offset + COFF_HEADER_SIZE;
        let section_offset = opt_offset + coff.size_of_optional_header as usize;
        layout.sections_offset = Some(section_offset);
        layout.sections = SectionTable::new(parse_section_headers(
            data,
            section_offset,
            coff.number_of_sections,
        ));

        if let Some(optional) = parse_optional_header(data, opt_offset) {
            let dir_offset = opt_offset + optional.fixed_size();
            layout.directories_offset = Some(dir_offset);
            layout.directories =
                parse_data_directories(data, dir_offset, optional.number_of_rva_and_sizes);
            layout.optional = Some(optional);
        }

        layout
    }

    pub fn image_base(&self) -> u64 {
        self.optional.map_or(0, |o| o.image_base)
    }

    /// Size of the header region, mapped 1:1 between raw and RVA space.
    pub fn headers_size(&self) -> u64 {
        self.optional.map_or(0, |o| o.size_of_headers as u64)
    }

    pub fn directory(&self, index: usize) -> Option<&DataDirectory> {
        self.directories.get(index).filter(|d| d.is_present())
    }
}

/// Strict check used on load: both signatures and a known optional header magic.
pub fn validate(data: &[u8]) -> Result<()> {
    if data.len() < DOS_HEADER_SIZE {
        return Err(PeError::TruncatedHeader {
            expected: DOS_HEADER_SIZE,
            actual: data.len(),
        });
    }
    if data.read_u16_le_at(0) != Some(DOS_SIGNATURE) {
        return Err(PeError::InvalidDosSignature);
    }
    let nt_offset = find_nt_headers(data).ok_or(PeError::InvalidPeSignature)?;

    let opt_offset = nt_offset + PE_SIGNATURE.len() + COFF_HEADER_SIZE;
    let magic = data
        .read_u16_le_at(opt_offset)
        .ok_or(PeError::TruncatedHeader {
            expected: opt_offset + 2,
            actual: data.len(),
        })?;
    match magic {
        PE32_MAGIC | PE32PLUS_MAGIC => Ok(()),
        other => Err(PeError::InvalidMagic(other)),
    }
}

fn find_nt_headers(data: &[u8]) -> Option<usize> {
    if data.read_u16_le_at(0)? != DOS_SIGNATURE {
        return None;
    }
    let e_lfanew = data.read_u32_le_at(0x3C)? as usize;
    let signature = data.get(e_lfanew..e_lfanew.checked_add(4)?)?;
    (signature == PE_SIGNATURE).then_some(e_lfanew)
}

/// Parse COFF header at offset
pub fn parse_coff_header(data: &[u8], offset: usize) -> Option<CoffHeader> {
    Some(CoffHeader {
        offset,
        machine: Machine::from(data.read_u16_le_at(offset)?),
        number_of_sections: data.read_u16_le_at(offset + 2)?,
        time_date_stamp: data.read_u32_le_at(offset + 4)?,
        size_of_optional_header: data.read_u16_le_at(offset + 16)?,
        characteristics: data.read_u16_le_at(offset + 18)?,
    })
}

/// Parse the optional header fields the model needs, PE32 or PE32+
pub fn parse_optional_header(data: &[u8], offset: usize) -> Option<OptionalHeader> {
    let is_64bit = match data.read_u16_le_at(offset)? {
        PE32_MAGIC => false,
        PE32PLUS_MAGIC => true,
        _ => return None,
    };

    let (image_base, rva_count_at) = if is_64bit {
        (data.read_u64_le_at(offset + 24)?, offset + 108)
    } else {
        (data.read_u32_le_at(offset + 28)? as u64, offset + 92)
    };

    Some(OptionalHeader {
        offset,
        is_64bit,
        entry_point: data.read_u32_le_at(offset + 16)?,
        image_base,
        section_alignment: data.read_u32_le_at(offset + 32)?,
        file_alignment: data.read_u32_le_at(offset + 36)?,
        size_of_image: data.read_u32_le_at(offset + 56)?,
        size_of_headers: data.read_u32_le_at(offset + 60)?,
        number_of_rva_and_sizes: data.read_u32_le_at(rva_count_at)?,
    })
}

/// Parse data directories at offset, at most 16
pub fn parse_data_directories(data: &[u8], offset: usize, count: u32) -> Vec<DataDirectory> {
    let count = (count as usize).min(MAX_DATA_DIRECTORIES);

    (0..count)
        .map_while(|i| {
            let at = offset + i * DATA_DIRECTORY_SIZE;
            Some(DataDirectory {
                virtual_address: data.read_u32_le_at(at)?,
                size: data.read_u32_le_at(at + 4)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_only() -> Vec<u8> {
        let mut data = vec![0u8; 0x200];
        data[0..2].copy_from_slice(b"MZ");
        data[0x3C] = 0x80;
        data[0x80..0x84].copy_from_slice(&PE_SIGNATURE);
        data[0x84..0x86].copy_from_slice(&0x8664u16.to_le_bytes());
        data[0x94..0x96].copy_from_slice(&0xF0u16.to_le_bytes());
        data[0x98..0x9A].copy_from_slice(&PE32PLUS_MAGIC.to_le_bytes());
        data[0x98 + 24..0x98 + 32].copy_from_slice(&0x1_4000_0000u64.to_le_bytes());
        data[0x98 + 60..0x98 + 64].copy_from_slice(&0x200u32.to_le_bytes());
        data[0x98 + 108] = 16;
        data
    }

    #[test]
    fn test_scan_pe32_plus() {
        let data = headers_only();
        validate(&data).unwrap();
        let layout = Layout::scan(&data);
        assert_eq!(layout.nt_offset, Some(0x80));
        assert_eq!(layout.coff.unwrap().machine, Machine::X86_64);
        let optional = layout.optional.unwrap();
        assert!(optional.is_64bit);
        assert_eq!(layout.image_base(), 0x1_4000_0000);
        assert_eq!(layout.headers_size(), 0x200);
        assert_eq!(layout.directories.len(), 16);
        assert_eq!(layout.directories_offset, Some(0x98 + 112));
        assert!(layout.sections.is_empty());
    }

    #[test]
    fn test_scan_without_mz_is_empty() {
        let mut data = headers_only();
        data[0] = 0;
        let layout = Layout::scan(&data);
        assert!(layout.nt_offset.is_none());
        assert!(layout.coff.is_none());
        assert!(matches!(validate(&data), Err(PeError::InvalidDosSignature)));
    }

    #[test]
    fn test_validate_rejects_bad_magic() {
        let mut data = headers_only();
        data[0x98] = 0x07;
        assert!(matches!(validate(&data), Err(PeError::InvalidMagic(_))));
        assert!(Layout::scan(&data).optional.is_none());
    }

    #[test]
    fn test_validate_rejects_short_input() {
        assert!(matches!(
            validate(b"MZ"),
            Err(PeError::TruncatedHeader { expected: 64, .. })
        ));
    }
}
