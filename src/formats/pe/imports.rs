//! Import directory parsing

use crate::formats::pe::headers::Layout;
use crate::formats::pe::types::*;
use crate::formats::pe::utils::ReadExt;

pub const MAX_DESCRIPTORS: usize = 512;
pub const MAX_THUNKS: usize = 4096;
const MAX_NAME_LEN: usize = 256;

/// One IMAGE_IMPORT_DESCRIPTOR with its thunks
#[derive(Debug, Clone)]
pub struct ImportDescriptor {
    /// Raw offset of the descriptor
    pub offset: usize,
    pub original_first_thunk: u32,
    pub time_date_stamp: u32,
    pub forwarder_chain: u32,
    pub name_rva: u32,
    pub first_thunk: u32,
    pub dll_name: Option<String>,
    pub thunks: Vec<Thunk>,
}

/// One lookup-table slot
#[derive(Debug, Clone)]
pub struct Thunk {
    /// Raw offset of the slot
    pub offset: usize,
    pub value: u64,
    pub width: u8,
    pub import: ThunkTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThunkTarget {
    Ordinal(u16),
    Name {
        hint_offset: Option<usize>,
        hint: u16,
        name: String,
    },
}

/// Raw extent of the descriptor array, terminator included.
#[derive(Debug, Clone)]
pub struct ImportTable {
    pub offset: usize,
    pub descriptors: Vec<ImportDescriptor>,
}

impl ImportTable {
    pub fn size(&self) -> u64 {
        ((self.descriptors.len() + 1) * IMPORT_DESCRIPTOR_SIZE) as u64
    }
}

/// Parse the import directory; `None` when the image declares none or it is unmapped.
pub fn parse_imports(data: &[u8], layout: &Layout) -> Option<ImportTable> {
    let optional = layout.optional.as_ref()?;
    let dir = layout.directory(IMAGE_DIRECTORY_ENTRY_IMPORT)?;
    let to_raw = |rva: u64| -> Option<usize> {
        let raw = layout.sections.rva_to_raw(rva, layout.headers_size())?;
        usize::try_from(raw).ok().filter(|&r| r < data.len())
    };

    let table_offset = to_raw(dir.virtual_address as u64)?;
    let thunk_width: u8 = if optional.is_64bit { 8 } else { 4 };
    let mut descriptors = Vec::new();

    for index in 0..MAX_DESCRIPTORS {
        let offset = table_offset + index * IMPORT_DESCRIPTOR_SIZE;
        let Some(raw) = data.get(offset..offset + IMPORT_DESCRIPTOR_SIZE) else {
            break;
        };
        if raw.iter().all(|&b| b == 0) {
            break;
        }

        let original_first_thunk = data.read_u32_le_at(offset)?;
        let name_rva = data.read_u32_le_at(offset + 12)?;
        let first_thunk = data.read_u32_le_at(offset + 16)?;
        let dll_name = to_raw(name_rva as u64).and_then(|o| data.read_cstring_at(o, MAX_NAME_LEN));

        // Prefer the lookup table; bound images overwrite the IAT with addresses.
        let lookup = if original_first_thunk != 0 {
            original_first_thunk
        } else {
            first_thunk
        };
        let thunks = to_raw(lookup as u64)
            .map(|start| parse_thunks(data, start, thunk_width, &to_raw))
            .unwrap_or_default();

        descriptors.push(ImportDescriptor {
            offset,
            original_first_thunk,
            time_date_stamp: data.read_u32_le_at(offset + 4)?,
            forwarder_chain: data.read_u32_le_at(offset + 8)?,
            name_rva,
            first_thunk,
            dll_name,
            thunks,
        });
    }

    Some(ImportTable {
        offset: table_offset,
        descriptors,
    })
}

fn parse_thunks(
    data: &[u8],
    start: usize,
    width: u8,
    to_raw: &dyn Fn(u64) -> Option<usize>,
) -> Vec<Thunk> {
    let ordinal_flag = if width == 8 { 1u64 << 63 } else { 1u64 << 31 };
    let mut thunks = Vec::new();

    for index in 0..MAX_THUNKS {
        let offset = start + index * width as usize;
        let Some(value) = data.read_uint_at(offset, width) else {
            break;
        };
        if value == 0 {
            break;
        }

        let import = if value & ordinal_flag != 0 {
            ThunkTarget::Ordinal((value & 0xFFFF) as u16)
        } else {
            let hint_offset = to_raw(value & 0x7FFF_FFFF);
            let (hint, name) = hint_offset
                .map(|o| {
                    (
                        data.read_u16_le_at(o).unwrap_or(0),
                        data.read_cstring_at(o + 2, MAX_NAME_LEN).unwrap_or_default(),
                    )
                })
                .unwrap_or_default();
            ThunkTarget::Name {
                hint_offset,
                hint,
                name,
            }
        };

        thunks.push(Thunk {
            offset,
            value,
            width,
            import,
        });
    }

    thunks
}
