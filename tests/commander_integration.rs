//! End-to-end console sessions against the synthetic PE32 fixture.

mod common;

use std::fs;

use common::{exe_context, minimal_image, minimal_pe32, run_session, wrappers};
use exeprobe::commander::util::get_exe_from_context;
use exeprobe::io::IOLimits;
use exeprobe::{CmdContext, ExeCmdContext, Executable, MappedExe, PeImage};

#[test]
fn test_info() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "info\n");
    assert!(out.contains("File: fixture.exe"));
    assert!(out.contains("Bit mode: 32"));
    assert!(out.contains("Entry point: 0x1000 (RVA)"));
    assert!(out.contains("Image base: 0x400000"));
    assert!(out.contains("Sections: 2"));
}

#[test]
fn test_address_conversions() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "r-v\n210\nv-r\n0x2010\n");
    assert!(out.contains("raw: [r] 0x210 -> [v] 0x1010\n"));
    assert!(out.contains("RVA: [v] 0x2010 -> [r] 0x410\n"));
}

#[test]
fn test_conversion_failures_are_reported() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "v-r\n9000\nr-v\nzz\ninfo\n");
    assert!(out.contains("ERROR: Invalid address supplied (convert)"));
    assert!(out.contains("ERROR: Invalid hexadecimal offset: \"zz\""));
    // the loop kept going
    assert!(out.contains("Bit mode: 32"));
}

#[test]
fn test_fetch_hex_and_chars() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "printx\n200\n");
    assert!(out.contains("Fetched:\n55 8B EC C3 00 "));
    let line = out.lines().nth(1).unwrap();
    assert_eq!(line.len(), 100 * 3);

    let out = run_session(&mut ctx, "printc\n462\n");
    assert!(out.contains("Fetched:\nExitProcess."));
}

#[test]
fn test_fetch_is_clamped_and_bounded() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "printx\n5F0\n");
    let line = out.lines().nth(1).unwrap();
    assert_eq!(line.len(), 16 * 3);

    let out = run_session(&mut ctx, "printx\n600\n");
    assert!(out.contains("ERROR: Invalid address supplied (fetch)"));
    assert!(!out.contains("Fetched:"));
}

#[test]
fn test_fetch_size_from_context() {
    let mut exe_ctx = ExeCmdContext::new(Some(minimal_image()), None);
    exe_ctx.fetch_size = 4;
    let mut ctx = CmdContext::Exe(exe_ctx);
    let out = run_session(&mut ctx, "printx\n200\n");
    assert!(out.contains("Fetched:\n55 8B EC C3 \n"));
}

#[test]
fn test_dump_lists_wrappers_and_fields() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "dump\n1\n");
    assert!(out.contains("[ 0] DOS Hdr\n[ 1] File Hdr\n"));
    assert!(out.contains("[ 5] Imports\nwrapperNum: "));
    assert!(out.contains("\t[File Hdr] size: 0X14 fieldsCount: 7\n\n"));
    assert!(out.contains("[0084] Machine :\tIntel 386\t[014C _] \n"));
    assert!(out.contains("[0086] Sections Count :\t[0002 _] \n"));
}

#[test]
fn test_dump_dos_header_arrays() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "dump\n0\n");
    assert!(out.contains("[0000] Magic number :\tMZ\t[5A4D _] \n"));
    assert!(out.contains("[001C] Reserved words[4] :\t[0000 _] [0000 _] [0000 _] [0000 _] \n"));
    assert!(out.contains("[003C] File address of new exe header :\t[00000080 r] \n"));
}

#[test]
fn test_edump_imports_counts_thunks() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "edump\n5\n");
    assert!(out.contains("\t[Imports] entriesCount: 1\n\nEntry 0:\n"));
    assert!(out.contains("[040C] NameRVA :\tkernel32.dll\t[00002080 v] \n"));
    assert!(out.contains("Have entries: 2\n"));
    assert!(!out.contains("ExitProcess"));
}

#[test]
fn test_unknown_wrapper_index() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "dump\n9\nedump\nx\n");
    assert!(out.contains("ERROR: No such wrapper: 9"));
    assert!(out.contains("ERROR: Invalid decimal number: \"x\""));
}

#[test]
fn test_clear_then_dump_absent_wrapper() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "cl\n0\ndump\n1\n");
    assert!(out.contains("Cleared: DOS Hdr"));

    let exe = get_exe_from_context(&ctx).unwrap();
    assert!(exe.content()[..64].iter().all(|&b| b == 0));
    assert!(exe.wrapper(wrappers::FILE).is_none());
    // File Hdr is gone, so its dump prints nothing
    assert!(!out.contains("[File Hdr]"));
}

#[test]
fn test_add_entry_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.exe");

    let mut ctx = exe_context(minimal_image());
    let script = format!("e_add\n4\nsave\n{}\n", path.display());
    let out = run_session(&mut ctx, &script);
    assert!(out.contains("Added entry to: Section Hdrs (entries: 3)"));
    assert!(out.contains("Saved 2048 bytes into:"));

    let saved = PeImage::load(&path, IOLimits::default()).unwrap();
    assert_eq!(saved.summary().sections, 3);
    assert_eq!(saved.content(), get_exe_from_context(&ctx).unwrap().content());
}

#[test]
fn test_add_entry_unsupported_wrapper() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "e_add\n0\n");
    assert!(out.contains("ERROR: Operation not supported: DOS Hdr does not accept new entries"));
}

#[test]
fn test_fdump_writes_wrapper_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coff.bin");

    let mut ctx = exe_context(minimal_image());
    let script = format!("fdump\n1\n{}\n", path.display());
    let out = run_session(&mut ctx, &script);
    assert!(out.contains("fileName: Dumped 20 bytes into:"));

    let dumped = fs::read(&path).unwrap();
    assert_eq!(dumped, &minimal_pe32()[0x84..0x98]);
}

#[test]
fn test_unknown_command_leaves_session_unchanged() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "bogus\n");
    assert!(out.contains("ERROR: Unknown command: bogus"));
    assert_eq!(get_exe_from_context(&ctx).unwrap().content(), &minimal_pe32()[..]);
}

#[test]
fn test_missing_image() {
    let mut ctx = CmdContext::Exe(ExeCmdContext::new(None, None));
    let out = run_session(&mut ctx, "info\nprintx\n0\n");
    assert!(out.contains("ERROR: Invalid command context: no Exe"));
    // the failed command never prompted, so "printx" and "0" were both read as commands
    assert!(out.contains("ERROR: Unknown command: 0"));
}

#[test]
fn test_end_of_input_mid_prompt_ends_session() {
    let mut ctx = exe_context(minimal_image());
    let out = run_session(&mut ctx, "r-v\n");
    assert!(out.ends_with("raw: "));
}
