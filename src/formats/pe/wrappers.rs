//! Wrapper views over PE structures
//!
//! Fixed-layout headers are described by `FieldSpec` tables and turned into
//! `WrapperNode`s by reading the current image bytes. Table-like structures
//! (sections, imports) are nodes whose entries are the rows.

use crate::core::address::{AddrKind, Offset, INVALID_ADDR};
use crate::core::wrapper::{Field, WrappedValue, WrapperNode};
use crate::formats::pe::headers::Layout;
use crate::formats::pe::imports::{parse_imports, ImportDescriptor, Thunk, ThunkTarget};
use crate::formats::pe::types::*;
use crate::formats::pe::utils::ReadExt;
use AddrKind::{NotAddr, Raw, Rva, Va};

/// The wrappers a PE image exposes, in listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
    DosHeader,
    FileHeader,
    OptionalHeader,
    DataDirectories,
    SectionHeaders,
    Imports,
}

impl WrapperKind {
    pub const ALL: [WrapperKind; 6] = [
        WrapperKind::DosHeader,
        WrapperKind::FileHeader,
        WrapperKind::OptionalHeader,
        WrapperKind::DataDirectories,
        WrapperKind::SectionHeaders,
        WrapperKind::Imports,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            WrapperKind::DosHeader => "DOS Hdr",
            WrapperKind::FileHeader => "File Hdr",
            WrapperKind::OptionalHeader => "Optional Hdr",
            WrapperKind::DataDirectories => "Data Directory",
            WrapperKind::SectionHeaders => "Section Hdrs",
            WrapperKind::Imports => "Imports",
        }
    }
}

/// Layout of one fixed-size field relative to its structure.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    /// Width of one element in bytes
    pub width: u8,
    /// Number of consecutive elements (arrays like `e_res`)
    pub count: u8,
    pub kind: AddrKind,
}

const fn field(name: &'static str, offset: usize, width: u8, kind: AddrKind) -> FieldSpec {
    FieldSpec {
        name,
        offset,
        width,
        count: 1,
        kind,
    }
}

const fn array(name: &'static str, offset: usize, width: u8, count: u8) -> FieldSpec {
    FieldSpec {
        name,
        offset,
        width,
        count,
        kind: AddrKind::NotAddr,
    }
}

pub const DOS_HEADER_FIELDS: &[FieldSpec] = &[
    field("Magic number", 0, 2, NotAddr),
    field("Bytes on last page of file", 2, 2, NotAddr),
    field("Pages in file", 4, 2, NotAddr),
    field("Relocations", 6, 2, NotAddr),
    field("Size of header in paragraphs", 8, 2, NotAddr),
    field("Minimum extra paragraphs needed", 10, 2, NotAddr),
    field("Maximum extra paragraphs needed", 12, 2, NotAddr),
    field("Initial (relative) SS value", 14, 2, NotAddr),
    field("Initial SP value", 16, 2, NotAddr),
    field("Checksum", 18, 2, NotAddr),
    field("Initial IP value", 20, 2, NotAddr),
    field("Initial (relative) CS value", 22, 2, NotAddr),
    field("File address of relocation table", 24, 2, Raw),
    field("Overlay number", 26, 2, NotAddr),
    array("Reserved words[4]", 28, 2, 4),
    field("OEM identifier", 36, 2, NotAddr),
    field("OEM information", 38, 2, NotAddr),
    array("Reserved words[10]", 40, 2, 10),
    field("File address of new exe header", 60, 4, Raw),
];

pub const FILE_HEADER_FIELDS: &[FieldSpec] = &[
    field("Machine", 0, 2, NotAddr),
    field("Sections Count", 2, 2, NotAddr),
    field("Time Date Stamp", 4, 4, NotAddr),
    field("Ptr to Symbol Table", 8, 4, Raw),
    field("Num. of Symbols", 12, 4, NotAddr),
    field("Size of OptionalHdr", 16, 2, NotAddr),
    field("Characteristics", 18, 2, NotAddr),
];

pub const OPTIONAL_HEADER32_FIELDS: &[FieldSpec] = &[
    field("Magic", 0, 2, NotAddr),
    field("Linker Ver. (Major)", 2, 1, NotAddr),
    field("Linker Ver. (Minor)", 3, 1, NotAddr),
    field("Size of Code", 4, 4, NotAddr),
    field("Size of Initialized Data", 8, 4, NotAddr),
    field("Size of Uninitialized Data", 12, 4, NotAddr),
    field("Entry Point", 16, 4, Rva),
    field("Base of Code", 20, 4, Rva),
    field("Base of Data", 24, 4, Rva),
    field("Image Base", 28, 4, Va),
    field("Section Alignment", 32, 4, NotAddr),
    field("File Alignment", 36, 4, NotAddr),
    field("OS Ver. (Major)", 40, 2, NotAddr),
    field("OS Ver. (Minor)", 42, 2, NotAddr),
    field("Image Ver. (Major)", 44, 2, NotAddr),
    field("Image Ver. (Minor)", 46, 2, NotAddr),
    field("Subsystem Ver. (Major)", 48, 2, NotAddr),
    field("Subsystem Ver. (Minor)", 50, 2, NotAddr),
    field("Win32 Version Value", 52, 4, NotAddr),
    field("Size of Image", 56, 4, NotAddr),
    field("Size of Headers", 60, 4, NotAddr),
    field("Checksum", 64, 4, NotAddr),
    field("Subsystem", 68, 2, NotAddr),
    field("DLL Characteristics", 70, 2, NotAddr),
    field("Size of Stack Reserve", 72, 4, NotAddr),
    field("Size of Stack Commit", 76, 4, NotAddr),
    field("Size of Heap Reserve", 80, 4, NotAddr),
    field("Size of Heap Commit", 84, 4, NotAddr),
    field("Loader Flags", 88, 4, NotAddr),
    field("Number of RVAs and Sizes", 92, 4, NotAddr),
];

pub const OPTIONAL_HEADER64_FIELDS: &[FieldSpec] = &[
    field("Magic", 0, 2, NotAddr),
    field("Linker Ver. (Major)", 2, 1, NotAddr),
    field("Linker Ver. (Minor)", 3, 1, NotAddr),
    field("Size of Code", 4, 4, NotAddr),
    field("Size of Initialized Data", 8, 4, NotAddr),
    field("Size of Uninitialized Data", 12, 4, NotAddr),
    field("Entry Point", 16, 4, Rva),
    field("Base of Code", 20, 4, Rva),
    field("Image Base", 24, 8, Va),
    field("Section Alignment", 32, 4, NotAddr),
    field("File Alignment", 36, 4, NotAddr),
    field("OS Ver. (Major)", 40, 2, NotAddr),
    field("OS Ver. (Minor)", 42, 2, NotAddr),
    field("Image Ver. (Major)", 44, 2, NotAddr),
    field("Image Ver. (Minor)", 46, 2, NotAddr),
    field("Subsystem Ver. (Major)", 48, 2, NotAddr),
    field("Subsystem Ver. (Minor)", 50, 2, NotAddr),
    field("Win32 Version Value", 52, 4, NotAddr),
    field("Size of Image", 56, 4, NotAddr),
    field("Size of Headers", 60, 4, NotAddr),
    field("Checksum", 64, 4, NotAddr),
    field("Subsystem", 68, 2, NotAddr),
    field("DLL Characteristics", 70, 2, NotAddr),
    field("Size of Stack Reserve", 72, 8, NotAddr),
    field("Size of Stack Commit", 80, 8, NotAddr),
    field("Size of Heap Reserve", 88, 8, NotAddr),
    field("Size of Heap Commit", 96, 8, NotAddr),
    field("Loader Flags", 104, 4, NotAddr),
    field("Number of RVAs and Sizes", 108, 4, NotAddr),
];

pub const SECTION_HEADER_FIELDS: &[FieldSpec] = &[
    field("Virtual Size", 8, 4, NotAddr),
    field("Virtual Addr.", 12, 4, Rva),
    field("Raw Size", 16, 4, NotAddr),
    field("Raw Addr.", 20, 4, Raw),
    field("Ptr to Relocs", 24, 4, Raw),
    field("Ptr to Linenums", 28, 4, Raw),
    field("Num. of Relocs", 32, 2, NotAddr),
    field("Num. of Linenums", 34, 2, NotAddr),
    field("Characteristics", 36, 4, NotAddr),
];

pub const IMPORT_DESCRIPTOR_FIELDS: &[FieldSpec] = &[
    field("OriginalFirstThunk", 0, 4, Rva),
    field("TimeDateStamp", 4, 4, NotAddr),
    field("Forwarder", 8, 4, NotAddr),
    field("NameRVA", 12, 4, Rva),
    field("FirstThunk", 16, 4, Rva),
];

/// Builds a wrapper for a fixed-layout structure at `base`.
///
/// Returns `None` when the structure does not fit in `data`.
pub fn build_fixed(
    data: &[u8],
    name: &str,
    base: usize,
    size: usize,
    specs: &[FieldSpec],
    translate: impl Fn(&FieldSpec, u64) -> Option<String>,
) -> Option<WrapperNode> {
    data.get(base..base.checked_add(size)?)?;

    let mut node = WrapperNode::new(name, base as Offset, size as u64);
    push_spec_fields(&mut node, data, base, specs, translate)?;
    Some(node)
}

fn push_spec_fields(
    node: &mut WrapperNode,
    data: &[u8],
    base: usize,
    specs: &[FieldSpec],
    translate: impl Fn(&FieldSpec, u64) -> Option<String>,
) -> Option<()> {
    for spec in specs {
        let offset = base + spec.offset;
        let mut f = Field::new(spec.name, offset as Offset);
        for i in 0..spec.count as usize {
            let value = data.read_uint_at(offset + i * spec.width as usize, spec.width)?;
            f = f.with_value(WrappedValue::int(value, spec.width), spec.kind);
        }
        if let Some(text) = f
            .values
            .first()
            .and_then(|v| v.value.as_u64())
            .and_then(|first| translate(spec, first))
        {
            f = f.with_translation(text);
        }
        node.push_field(f);
    }
    Some(())
}

/// Builds the wrapper of the given kind from the current bytes.
pub fn build_wrapper(data: &[u8], layout: &Layout, kind: WrapperKind) -> Option<WrapperNode> {
    match kind {
        WrapperKind::DosHeader => build_fixed(
            data,
            kind.name(),
            0,
            DOS_HEADER_SIZE,
            DOS_HEADER_FIELDS,
            |spec, value| match spec.offset {
                0 if value == DOS_SIGNATURE as u64 => Some("MZ".to_string()),
                _ => None,
            },
        ),
        WrapperKind::FileHeader => {
            let coff = layout.coff.as_ref()?;
            build_fixed(
                data,
                kind.name(),
                coff.offset,
                COFF_HEADER_SIZE,
                FILE_HEADER_FIELDS,
                |spec, value| match spec.offset {
                    0 => Some(Machine::from(value as u16).name()),
                    18 => Some(FileFlags::from_bits_truncate(value as u16).describe()),
                    _ => None,
                },
            )
        }
        WrapperKind::OptionalHeader => {
            let optional = layout.optional.as_ref()?;
            let specs = if optional.is_64bit {
                OPTIONAL_HEADER64_FIELDS
            } else {
                OPTIONAL_HEADER32_FIELDS
            };
            build_fixed(
                data,
                kind.name(),
                optional.offset,
                optional.fixed_size(),
                specs,
                |spec, value| match spec.name {
                    "Magic" => Some(if value == PE32PLUS_MAGIC as u64 {
                        "PE32+".to_string()
                    } else {
                        "PE32".to_string()
                    }),
                    _ => None,
                },
            )
        }
        WrapperKind::DataDirectories => build_data_directories(data, layout),
        WrapperKind::SectionHeaders => build_section_headers(data, layout),
        WrapperKind::Imports => build_imports(data, layout),
    }
}

fn build_data_directories(data: &[u8], layout: &Layout) -> Option<WrapperNode> {
    let base = layout.directories_offset?;
    let count = layout.directories.len();
    let size = count * DATA_DIRECTORY_SIZE;
    data.get(base..base + size)?;

    let mut node = WrapperNode::new(WrapperKind::DataDirectories.name(), base as Offset, size as u64);
    for (index, dir) in layout.directories.iter().enumerate() {
        // The certificate table is addressed by file offset, not RVA.
        let addr_kind = if index == IMAGE_DIRECTORY_ENTRY_SECURITY {
            Raw
        } else {
            Rva
        };
        let offset = base + index * DATA_DIRECTORY_SIZE;
        node.push_field(
            Field::new(DATA_DIRECTORY_NAMES[index], offset as Offset)
                .with_value(WrappedValue::int(dir.virtual_address as u64, 4), addr_kind)
                .with_value(WrappedValue::int(dir.size as u64, 4), NotAddr),
        );
    }
    Some(node)
}

fn build_section_headers(data: &[u8], layout: &Layout) -> Option<WrapperNode> {
    let base = layout.sections_offset?;
    let sections = layout.sections.sections();
    let size = sections.len() * SECTION_HEADER_SIZE;

    let mut node = WrapperNode::new(WrapperKind::SectionHeaders.name(), base as Offset, size as u64);
    for header in sections {
        node.push_field(
            Field::new(header.name(), header.offset as Offset)
                .with_value(WrappedValue::int(header.virtual_address as u64, 4), Rva)
                .with_value(WrappedValue::int(header.pointer_to_raw_data as u64, 4), Raw)
                .with_translation(header.flags().access_string()),
        );

        data.get(header.offset..header.offset + SECTION_HEADER_SIZE)?;
        let mut entry = WrapperNode::new(
            header.name(),
            header.offset as Offset,
            SECTION_HEADER_SIZE as u64,
        );
        entry.push_field(
            Field::new("Name", header.offset as Offset)
                .with_value(WrappedValue::Str(header.name()), NotAddr),
        );
        push_spec_fields(
            &mut entry,
            data,
            header.offset,
            SECTION_HEADER_FIELDS,
            |spec, value| match spec.offset {
                36 => Some(SectionFlags::from_bits_truncate(value as u32).access_string()),
                _ => None,
            },
        )?;
        node.push_entry(entry);
    }
    Some(node)
}

fn build_imports(data: &[u8], layout: &Layout) -> Option<WrapperNode> {
    let table = parse_imports(data, layout)?;

    let mut node = WrapperNode::new(
        WrapperKind::Imports.name(),
        table.offset as Offset,
        table.size(),
    );
    for desc in &table.descriptors {
        let lib = desc.dll_name.clone().unwrap_or_default();
        node.push_field(
            Field::new(lib.clone(), desc.offset as Offset)
                .with_value(WrappedValue::int(desc.original_first_thunk as u64, 4), Rva)
                .with_value(WrappedValue::int(desc.first_thunk as u64, 4), Rva),
        );
        node.push_entry(build_descriptor(data, desc, &lib)?);
    }
    Some(node)
}

fn build_descriptor(data: &[u8], desc: &ImportDescriptor, lib: &str) -> Option<WrapperNode> {
    let mut node = build_fixed(
        data,
        lib,
        desc.offset,
        IMPORT_DESCRIPTOR_SIZE,
        IMPORT_DESCRIPTOR_FIELDS,
        |spec, _| (spec.offset == 12).then(|| lib.to_string()),
    )?;
    for thunk in &desc.thunks {
        node.push_entry(build_thunk(thunk));
    }
    Some(node)
}

fn build_thunk(thunk: &Thunk) -> WrapperNode {
    let mut node = WrapperNode::new("Thunk", thunk.offset as Offset, thunk.width as u64);
    match &thunk.import {
        ThunkTarget::Ordinal(ordinal) => {
            node.push_field(
                Field::new("Ordinal", thunk.offset as Offset)
                    .with_value(WrappedValue::int(thunk.value, thunk.width), NotAddr)
                    .with_translation(format!("#{}", ordinal)),
            );
        }
        ThunkTarget::Name {
            hint_offset,
            hint,
            name,
        } => {
            node.push_field(
                Field::new("Hint/Name RVA", thunk.offset as Offset)
                    .with_value(WrappedValue::int(thunk.value, thunk.width), Rva)
                    .with_translation(name.clone()),
            );
            let hint_offset = hint_offset.map_or(INVALID_ADDR, |o| o as Offset);
            node.push_field(
                Field::new("Hint", hint_offset)
                    .with_value(WrappedValue::int(*hint as u64, 2), NotAddr),
            );
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_indices() {
        assert_eq!(WrapperKind::from_index(0), Some(WrapperKind::DosHeader));
        assert_eq!(WrapperKind::from_index(5), Some(WrapperKind::Imports));
        assert_eq!(WrapperKind::from_index(6), None);
        assert_eq!(WrapperKind::SectionHeaders.name(), "Section Hdrs");
    }

    #[test]
    fn test_spec_tables_fit_their_structures() {
        let fits = |specs: &[FieldSpec], size: usize| {
            specs
                .iter()
                .all(|s| s.offset + s.width as usize * s.count as usize <= size)
        };
        assert!(fits(DOS_HEADER_FIELDS, DOS_HEADER_SIZE));
        assert!(fits(FILE_HEADER_FIELDS, COFF_HEADER_SIZE));
        assert!(fits(OPTIONAL_HEADER32_FIELDS, 96));
        assert!(fits(OPTIONAL_HEADER64_FIELDS, 112));
        assert!(fits(SECTION_HEADER_FIELDS, SECTION_HEADER_SIZE));
        assert!(fits(IMPORT_DESCRIPTOR_FIELDS, IMPORT_DESCRIPTOR_SIZE));
    }

    #[test]
    fn test_dos_header_array_fields_carry_every_element() {
        let mut data = vec![0u8; DOS_HEADER_SIZE];
        data[0..2].copy_from_slice(b"MZ");
        data[28] = 0x11;
        let node = build_wrapper(&data, &Layout::default(), WrapperKind::DosHeader).unwrap();

        assert_eq!(node.fields_count(), DOS_HEADER_FIELDS.len());
        assert_eq!(node.field(0).unwrap().translated(), "MZ");
        let reserved = node.field(14).unwrap();
        assert_eq!(reserved.values.len(), 4);
        assert_eq!(reserved.values[0].value, WrappedValue::int(0x11, 2));
        assert_eq!(node.sub_fields_count(17), 10);
        assert_eq!(node.field(18).unwrap().values[0].kind, AddrKind::Raw);
    }

    #[test]
    fn test_missing_headers_yield_no_wrapper() {
        let data = vec![0u8; 16];
        let layout = Layout::default();
        assert!(build_wrapper(&data, &layout, WrapperKind::DosHeader).is_none());
        assert!(build_wrapper(&data, &layout, WrapperKind::FileHeader).is_none());
        assert!(build_wrapper(&data, &layout, WrapperKind::Imports).is_none());
    }
}
