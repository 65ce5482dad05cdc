//! Core PE constants, header records and error type

use bitflags::bitflags;
use thiserror::Error;

pub const DOS_SIGNATURE: u16 = 0x5A4D; // MZ
pub const PE_SIGNATURE: [u8; 4] = *b"PE\0\0";
pub const PE32_MAGIC: u16 = 0x10B;
pub const PE32PLUS_MAGIC: u16 = 0x20B;

pub const DOS_HEADER_SIZE: usize = 64;
pub const COFF_HEADER_SIZE: usize = 20;
pub const SECTION_HEADER_SIZE: usize = 40;
pub const IMPORT_DESCRIPTOR_SIZE: usize = 20;
pub const DATA_DIRECTORY_SIZE: usize = 8;
pub const MAX_DATA_DIRECTORIES: usize = 16;

pub const IMAGE_DIRECTORY_ENTRY_IMPORT: usize = 1;
pub const IMAGE_DIRECTORY_ENTRY_SECURITY: usize = 4;

pub const DATA_DIRECTORY_NAMES: [&str; MAX_DATA_DIRECTORIES] = [
    "Export",
    "Import",
    "Resource",
    "Exception",
    "Security",
    "BaseReloc",
    "Debug",
    "Architecture",
    "GlobalPtr",
    "TLS",
    "LoadConfig",
    "BoundImport",
    "IAT",
    "DelayImport",
    ".NET",
    "Reserved",
];

/// PE parsing error types
#[derive(Debug, Clone, Error)]
pub enum PeError {
    #[error("Invalid DOS signature")]
    InvalidDosSignature,
    #[error("Invalid PE signature")]
    InvalidPeSignature,
    #[error("Invalid optional header magic: 0x{0:04x}")]
    InvalidMagic(u16),
    #[error("Truncated header: expected {expected} bytes, got {actual}")]
    TruncatedHeader { expected: usize, actual: usize },
    #[error("No room left in the header area for another section header")]
    NoHeaderSpace,
}

pub type Result<T> = std::result::Result<T, PeError>;

/// Machine types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    Unknown,
    I386,   // 0x014c
    X86_64, // 0x8664
    Arm,    // 0x01c0
    Arm64,  // 0xaa64
    ArmNT,  // 0x01c4
    IA64,   // 0x0200
    Other(u16),
}

impl From<u16> for Machine {
    fn from(value: u16) -> Self {
        match value {
            0x014c => Self::I386,
            0x8664 => Self::X86_64,
            0x01c0 => Self::Arm,
            0xaa64 => Self::Arm64,
            0x01c4 => Self::ArmNT,
            0x0200 => Self::IA64,
            0 => Self::Unknown,
            other => Self::Other(other),
        }
    }
}

impl Machine {
    pub fn name(&self) -> String {
        match self {
            Self::Unknown => "Unknown".to_string(),
            Self::I386 => "Intel 386".to_string(),
            Self::X86_64 => "AMD64".to_string(),
            Self::Arm => "ARM".to_string(),
            Self::Arm64 => "ARM64".to_string(),
            Self::ArmNT => "ARM Thumb-2".to_string(),
            Self::IA64 => "Intel Itanium".to_string(),
            Self::Other(m) => format!("0x{:04x}", m),
        }
    }
}

bitflags! {
    /// Section characteristics relevant to access rights.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionFlags: u32 {
        const CNT_CODE = 0x0000_0020;
        const CNT_INITIALIZED_DATA = 0x0000_0040;
        const CNT_UNINITIALIZED_DATA = 0x0000_0080;
        const MEM_EXECUTE = 0x2000_0000;
        const MEM_READ = 0x4000_0000;
        const MEM_WRITE = 0x8000_0000;
    }
}

impl SectionFlags {
    /// `rwx`-style rendering of the access bits.
    pub fn access_string(&self) -> String {
        let mut s = String::with_capacity(3);
        s.push(if self.contains(Self::MEM_READ) { 'r' } else { '-' });
        s.push(if self.contains(Self::MEM_WRITE) { 'w' } else { '-' });
        s.push(if self.contains(Self::MEM_EXECUTE) { 'x' } else { '-' });
        s
    }
}

bitflags! {
    /// COFF file header characteristics.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileFlags: u16 {
        const RELOCS_STRIPPED = 0x0001;
        const EXECUTABLE_IMAGE = 0x0002;
        const LARGE_ADDRESS_AWARE = 0x0020;
        const MACHINE_32BIT = 0x0100;
        const DEBUG_STRIPPED = 0x0200;
        const SYSTEM = 0x1000;
        const DLL = 0x2000;
    }
}

impl FileFlags {
    pub fn describe(&self) -> String {
        let names: Vec<&str> = self
            .iter_names()
            .map(|(name, _)| name)
            .collect();
        names.join("|")
    }
}

/// COFF header, located right after the PE signature
#[derive(Debug, Clone, Copy)]
pub struct CoffHeader {
    pub offset: usize,
    pub machine: Machine,
    pub number_of_sections: u16,
    pub time_date_stamp: u32,
    pub size_of_optional_header: u16,
    pub characteristics: u16,
}

/// Data directory entry
#[derive(Debug, Clone, Copy, Default)]
pub struct DataDirectory {
    pub virtual_address: u32,
    pub size: u32,
}

impl DataDirectory {
    pub fn is_present(&self) -> bool {
        self.virtual_address != 0 && self.size > 0
    }
}

/// Fields of the optional header the image model needs; both PE32 and PE32+.
#[derive(Debug, Clone, Copy)]
pub struct OptionalHeader {
    pub offset: usize,
    pub is_64bit: bool,
    pub entry_point: u32,
    pub image_base: u64,
    pub section_alignment: u32,
    pub file_alignment: u32,
    pub size_of_image: u32,
    pub size_of_headers: u32,
    pub number_of_rva_and_sizes: u32,
}

impl OptionalHeader {
    /// Size of the fixed part, before the data directories.
    pub fn fixed_size(&self) -> usize {
        if self.is_64bit {
            112
        } else {
            96
        }
    }

    pub fn bits(&self) -> u16 {
        if self.is_64bit {
            64
        } else {
            32
        }
    }
}

/// Section header
#[derive(Debug, Clone)]
pub struct SectionHeader {
    /// Raw offset of the header itself
    pub offset: usize,
    pub name: [u8; 8],
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
    pub characteristics: u32,
}

impl SectionHeader {
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(8);
        String::from_utf8_lossy(&self.name[..end]).to_string()
    }

    pub fn flags(&self) -> SectionFlags {
        SectionFlags::from_bits_truncate(self.characteristics)
    }

    pub fn contains_rva(&self, rva: u64) -> bool {
        let size = self.virtual_size.max(self.size_of_raw_data) as u64;
        let start = self.virtual_address as u64;
        rva >= start && rva < start + size
    }

    pub fn contains_raw(&self, raw: u64) -> bool {
        let start = self.pointer_to_raw_data as u64;
        raw >= start && raw < start + self.size_of_raw_data as u64
    }

    /// End of the section in RVA space.
    pub fn virtual_end(&self) -> u64 {
        self.virtual_address as u64 + self.virtual_size.max(self.size_of_raw_data) as u64
    }
}
