//! Common test fixtures.
//!
//! `minimal_pe32` synthesises a small but complete PE32 image so the tests
//! don't depend on sample binaries being checked out.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use exeprobe::{CmdContext, Commander, CommanderConfig, Console, PeImage};
use tempfile::NamedTempFile;

pub const IMAGE_BASE: u32 = 0x400000;
pub const TEXT_RAW: u64 = 0x200;
pub const TEXT_RVA: u64 = 0x1000;
pub const IDATA_RAW: u64 = 0x400;
pub const IDATA_RVA: u64 = 0x2000;
pub const IMAGE_SIZE: usize = 0x600;

/// Wrapper indices of a PE image
pub mod wrappers {
    pub const DOS: usize = 0;
    pub const FILE: usize = 1;
    pub const OPTIONAL: usize = 2;
    pub const DIRECTORIES: usize = 3;
    pub const SECTIONS: usize = 4;
    pub const IMPORTS: usize = 5;
}

fn put_u16(data: &mut [u8], at: usize, value: u16) {
    data[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(data: &mut [u8], at: usize, value: u32) {
    data[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_section(data: &mut [u8], at: usize, name: &[u8], rva: u32, raw: u32, flags: u32) {
    data[at..at + name.len()].copy_from_slice(name);
    put_u32(data, at + 8, 0x200);
    put_u32(data, at + 12, rva);
    put_u32(data, at + 16, 0x200);
    put_u32(data, at + 20, raw);
    put_u32(data, at + 36, flags);
}

/// PE32 image with `.text` and `.idata`; kernel32.dll imports
/// `ExitProcess` by name and ordinal 5.
pub fn minimal_pe32() -> Vec<u8> {
    let mut data = vec![0u8; IMAGE_SIZE];

    data[0..2].copy_from_slice(b"MZ");
    put_u32(&mut data, 0x3C, 0x80);
    data[0x80..0x84].copy_from_slice(b"PE\0\0");

    // COFF header
    put_u16(&mut data, 0x84, 0x014C);
    put_u16(&mut data, 0x86, 2);
    put_u16(&mut data, 0x94, 0xE0);
    put_u16(&mut data, 0x96, 0x0102);

    // Optional header
    let opt = 0x98;
    put_u16(&mut data, opt, 0x10B);
    put_u32(&mut data, opt + 16, TEXT_RVA as u32);
    put_u32(&mut data, opt + 28, IMAGE_BASE);
    put_u32(&mut data, opt + 32, 0x1000);
    put_u32(&mut data, opt + 36, 0x200);
    put_u32(&mut data, opt + 56, 0x3000);
    put_u32(&mut data, opt + 60, 0x200);
    put_u32(&mut data, opt + 92, 16);
    // import directory
    put_u32(&mut data, opt + 96 + 8, IDATA_RVA as u32);
    put_u32(&mut data, opt + 96 + 12, 40);

    let sections = opt + 0xE0;
    put_section(&mut data, sections, b".text", TEXT_RVA as u32, TEXT_RAW as u32, 0x6000_0020);
    put_section(&mut data, sections + 40, b".idata", IDATA_RVA as u32, IDATA_RAW as u32, 0xC000_0040);

    // .text: a recognisable prologue
    data[0x200..0x204].copy_from_slice(&[0x55, 0x8B, 0xEC, 0xC3]);

    // .idata
    let idata = IDATA_RAW as usize;
    let rva = |off: usize| IDATA_RVA as u32 + off as u32;
    put_u32(&mut data, idata, rva(0x40)); // OriginalFirstThunk
    put_u32(&mut data, idata + 12, rva(0x80)); // Name
    put_u32(&mut data, idata + 16, rva(0x50)); // FirstThunk
    for table in [0x40, 0x50] {
        put_u32(&mut data, idata + table, rva(0x60));
        put_u32(&mut data, idata + table + 4, 0x8000_0005);
    }
    put_u16(&mut data, idata + 0x60, 0x10);
    data[idata + 0x62..idata + 0x62 + 12].copy_from_slice(b"ExitProcess\0");
    data[idata + 0x80..idata + 0x80 + 13].copy_from_slice(b"kernel32.dll\0");

    data
}

pub fn minimal_image() -> PeImage {
    PeImage::from_bytes(minimal_pe32()).unwrap()
}

pub fn write_temp_image(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

/// Runs `script` through the executable commander and returns its output.
pub fn run_session(context: &mut CmdContext, script: &str) -> String {
    let commander = Commander::for_exe(&CommanderConfig::default());
    let mut out = Vec::new();
    {
        let mut console = Console::new(Cursor::new(script.to_string()), &mut out);
        commander.run(context, &mut console).unwrap();
    }
    String::from_utf8(out).unwrap()
}

pub fn exe_context(image: PeImage) -> CmdContext {
    CmdContext::with_image(image, "fixture.exe")
}
