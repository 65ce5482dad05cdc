//! In-memory PE image model
//!
//! `PeImage` owns the file bytes and a `Layout` describing where the headers
//! are. Every mutation rescans the layout, and every wrapper is rebuilt from
//! the bytes when asked for, so views never go stale.

use std::fmt;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

pub mod headers;
pub mod imports;
pub mod sections;
pub mod types;
pub mod utils;
pub mod wrappers;

pub use headers::Layout;
pub use types::*;
pub use wrappers::WrapperKind;

use crate::core::address::{AddrKind, Offset, INVALID_ADDR};
use crate::core::executable::{Executable, MappedExe};
use crate::core::wrapper::WrapperNode;
use crate::error::{CommanderError, Result as CmdResult};
use crate::io::{load_file, IOLimits};
use utils::{align_up, WriteExt};

const DEFAULT_FILE_ALIGNMENT: u64 = 0x200;
const DEFAULT_SECTION_ALIGNMENT: u64 = 0x1000;
const NEW_SECTION_NAME: [u8; 8] = *b".new\0\0\0\0";

/// A loaded PE image
#[derive(Debug, Clone)]
pub struct PeImage {
    data: Vec<u8>,
    layout: Layout,
}

impl PeImage {
    /// Wraps raw bytes; the DOS and PE signatures must be intact.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        headers::validate(&data)?;
        let layout = Layout::scan(&data);
        debug!(
            size = data.len(),
            sections = layout.sections.len(),
            "Parsed PE image"
        );
        Ok(Self { data, layout })
    }

    /// Loads and parses an image file under the given I/O limits.
    pub fn load<P: AsRef<Path>>(path: P, limits: IOLimits) -> CmdResult<Self> {
        let bytes = load_file(path.as_ref(), limits)?;
        let image = Self::from_bytes(bytes.to_vec())?;
        info!(path = %path.as_ref().display(), "Loaded image");
        Ok(image)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn image_base(&self) -> u64 {
        self.layout.image_base()
    }

    /// Writes the current bytes to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path.as_ref(), &self.data)?;
        info!(path = %path.as_ref().display(), size = self.data.len(), "Saved image");
        Ok(())
    }

    /// The raw bytes spanned by the wrapper at `index`.
    pub fn wrapper_content(&self, index: usize) -> Option<&[u8]> {
        let node = self.wrapper(index)?;
        let start = usize::try_from(node.offset).ok()?;
        let end = start.checked_add(node.size as usize)?.min(self.data.len());
        self.data.get(start..end)
    }

    pub fn summary(&self) -> ImageSummary {
        let mut hasher = Sha256::new();
        hasher.update(&self.data);

        ImageSummary {
            bits: self.layout.optional.map(|o| o.bits()),
            machine: self.layout.coff.map(|c| c.machine),
            entry_point: self.layout.optional.map(|o| o.entry_point as u64),
            image_base: self.image_base(),
            sections: self.layout.sections.len(),
            raw_size: self.data.len() as u64,
            sha256: hex::encode(hasher.finalize()),
        }
    }

    fn rescan(&mut self) {
        self.layout = Layout::scan(&self.data);
        debug!(
            sections = self.layout.sections.len(),
            valid_nt = self.layout.nt_offset.is_some(),
            "Rescanned image layout"
        );
    }

    fn rva_to_raw(&self, rva: u64) -> Option<u64> {
        self.layout
            .sections
            .rva_to_raw(rva, self.layout.headers_size())
            .filter(|&raw| raw < self.raw_size())
    }

    fn raw_to_rva(&self, raw: u64) -> Option<u64> {
        if raw >= self.raw_size() {
            return None;
        }
        self.layout
            .sections
            .raw_to_rva(raw, self.layout.headers_size())
    }

    /// Appends a `.new` section header plus one file-aligned block of raw data.
    fn add_section(&mut self) -> CmdResult<()> {
        let (Some(coff), Some(optional), Some(table_offset)) = (
            self.layout.coff,
            self.layout.optional,
            self.layout.sections_offset,
        ) else {
            return Err(CommanderError::Unsupported(
                "section table is not intact".to_string(),
            ));
        };

        let count = self.layout.sections.len();
        // the new header goes after the last one we could read
        if usize::from(coff.number_of_sections) != count {
            return Err(CommanderError::Unsupported(format!(
                "section table declares {} headers, {} readable",
                coff.number_of_sections, count
            )));
        }
        let header_offset = table_offset + count * SECTION_HEADER_SIZE;
        let header_end = (header_offset + SECTION_HEADER_SIZE) as u64;
        let header_limit = self
            .layout
            .sections
            .first_raw_pointer()
            .unwrap_or(u64::MAX)
            .min(optional.size_of_headers as u64);
        if header_end > header_limit || header_end > self.raw_size() {
            return Err(PeError::NoHeaderSpace.into());
        }

        let file_alignment = match optional.file_alignment as u64 {
            0 => DEFAULT_FILE_ALIGNMENT,
            a => a,
        };
        let section_alignment = match optional.section_alignment as u64 {
            0 => DEFAULT_SECTION_ALIGNMENT,
            a => a,
        };

        let raw_ptr = align_up(self.raw_size(), file_alignment);
        let virtual_address = align_up(
            self.layout
                .sections
                .virtual_end()
                .unwrap_or(optional.size_of_headers as u64),
            section_alignment,
        );
        let size_of_image = align_up(virtual_address + file_alignment, section_alignment);
        if raw_ptr + file_alignment > u32::MAX as u64 || size_of_image > u32::MAX as u64 {
            return Err(CommanderError::Unsupported(
                "image would exceed 4GB".to_string(),
            ));
        }

        let flags = SectionFlags::CNT_INITIALIZED_DATA | SectionFlags::MEM_READ | SectionFlags::MEM_WRITE;
        let mut header = [0u8; SECTION_HEADER_SIZE];
        header.write_bytes_at(0, &NEW_SECTION_NAME);
        header.write_u32_le_at(8, file_alignment as u32);
        header.write_u32_le_at(12, virtual_address as u32);
        header.write_u32_le_at(16, file_alignment as u32);
        header.write_u32_le_at(20, raw_ptr as u32);
        header.write_u32_le_at(36, flags.bits());

        self.data.resize((raw_ptr + file_alignment) as usize, 0);
        self.data.write_bytes_at(header_offset, &header);
        self.data
            .write_u16_le_at(coff.offset + 2, coff.number_of_sections.wrapping_add(1));
        self.data
            .write_u32_le_at(optional.offset + 56, size_of_image as u32);

        info!(
            header_offset,
            virtual_address, raw_ptr, "Added section header"
        );
        Ok(())
    }
}

impl Executable for PeImage {
    fn content(&self) -> &[u8] {
        &self.data
    }

    fn to_raw(&self, offset: Offset, kind: AddrKind) -> Offset {
        let raw = match kind {
            AddrKind::Raw => (offset < self.raw_size()).then_some(offset),
            AddrKind::Rva => self.rva_to_raw(offset),
            AddrKind::Va => offset
                .checked_sub(self.image_base())
                .and_then(|rva| self.rva_to_raw(rva)),
            AddrKind::NotAddr => None,
        };
        raw.unwrap_or(INVALID_ADDR)
    }

    fn convert(&self, offset: Offset, from: AddrKind, to: AddrKind) -> Offset {
        let raw = self.to_raw(offset, from);
        if raw == INVALID_ADDR {
            return INVALID_ADDR;
        }
        let converted = match to {
            AddrKind::Raw => Some(raw),
            AddrKind::Rva => self.raw_to_rva(raw),
            AddrKind::Va => self
                .raw_to_rva(raw)
                .and_then(|rva| rva.checked_add(self.image_base())),
            AddrKind::NotAddr => None,
        };
        converted.unwrap_or(INVALID_ADDR)
    }
}

impl MappedExe for PeImage {
    fn wrappers_count(&self) -> usize {
        WrapperKind::ALL.len()
    }

    fn wrapper(&self, index: usize) -> Option<WrapperNode> {
        let kind = WrapperKind::from_index(index)?;
        wrappers::build_wrapper(&self.data, &self.layout, kind)
    }

    fn wrapper_name(&self, index: usize) -> &'static str {
        WrapperKind::from_index(index).map_or("", WrapperKind::name)
    }

    fn clear_wrapper(&mut self, index: usize) -> CmdResult<()> {
        let node = self
            .wrapper(index)
            .ok_or(CommanderError::NoSuchWrapper(index))?;
        let start = node.offset as usize;
        let end = (start + node.size as usize).min(self.data.len());
        if let Some(span) = self.data.get_mut(start..end) {
            span.fill(0);
        }
        info!(wrapper = %node.name, start, end, "Cleared wrapper content");
        self.rescan();
        Ok(())
    }

    fn add_entry(&mut self, index: usize) -> CmdResult<()> {
        match WrapperKind::from_index(index) {
            Some(WrapperKind::SectionHeaders) => {
                self.add_section()?;
                self.rescan();
                Ok(())
            }
            Some(kind) => Err(CommanderError::Unsupported(format!(
                "{} does not accept new entries",
                kind.name()
            ))),
            None => Err(CommanderError::NoSuchWrapper(index)),
        }
    }
}

/// Headline facts about an image, as printed by `info`.
#[derive(Debug, Clone)]
pub struct ImageSummary {
    pub bits: Option<u16>,
    pub machine: Option<Machine>,
    pub entry_point: Option<u64>,
    pub image_base: u64,
    pub sections: usize,
    pub raw_size: u64,
    pub sha256: String,
}

impl fmt::Display for ImageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bits {
            Some(bits) => writeln!(f, "Bit mode: {}", bits)?,
            None => writeln!(f, "Bit mode: unknown")?,
        }
        if let Some(machine) = &self.machine {
            writeln!(f, "Machine: {}", machine.name())?;
        }
        if let Some(ep) = self.entry_point {
            writeln!(f, "Entry point: {:#X} (RVA)", ep)?;
        }
        writeln!(f, "Image base: {:#X}", self.image_base)?;
        writeln!(f, "Sections: {}", self.sections)?;
        writeln!(f, "Raw size: {:#X}", self.raw_size)?;
        writeln!(f, "SHA-256: {}", self.sha256)
    }
}
