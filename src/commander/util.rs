//! Helpers shared by the executable commands.

use std::io::Write;

use tracing::debug;

use crate::commander::console::Console;
use crate::commander::context::CmdContext;
use crate::content::{formatter_for, BufferView};
use crate::core::address::{is_valid, AddrKind, Offset};
use crate::core::executable::{Executable, MappedExe};
use crate::error::{CommanderError, Result};
use crate::formats::pe::PeImage;

/// The loaded image of an executable session.
pub fn get_exe_from_context(context: &CmdContext) -> Result<&PeImage> {
    let exe_ctx = context.as_exe().ok_or(CommanderError::InvalidContext)?;
    exe_ctx.exe().ok_or(CommanderError::NoImageLoaded)
}

pub fn get_exe_from_context_mut(context: &mut CmdContext) -> Result<&mut PeImage> {
    let exe_ctx = context.as_exe_mut().ok_or(CommanderError::InvalidContext)?;
    exe_ctx.exe_mut().ok_or(CommanderError::NoImageLoaded)
}

/// Prints up to `size` bytes at `offset` as hex or characters.
///
/// Nothing is written when the offset doesn't translate or the window is empty.
pub fn fetch<E: Executable + ?Sized>(
    out: &mut dyn Write,
    exe: &E,
    offset: Offset,
    kind: AddrKind,
    hex: bool,
    size: u64,
) -> Result<()> {
    let raw = exe.to_raw(offset, kind);
    if !is_valid(raw) {
        return Err(CommanderError::InvalidAddress { operation: "fetch" });
    }

    let view = BufferView::new(exe, raw, size);
    let bytes = view
        .content()
        .ok_or(CommanderError::NoContent { offset: raw })?;
    debug!(raw, len = bytes.len(), hex, "Fetching content");

    writeln!(out, "Fetched:")?;
    formatter_for(hex).write_all(out, bytes)?;
    writeln!(out)?;
    Ok(())
}

/// Lists the wrappers present in `exe` as `[%2d] name`.
pub fn print_wrapper_names<E: MappedExe + ?Sized>(out: &mut dyn Write, exe: &E) -> Result<()> {
    for i in 0..exe.wrappers_count() {
        if exe.wrapper(i).is_none() {
            continue;
        }
        writeln!(out, "[{:2}] {}", i, exe.wrapper_name(i))?;
    }
    Ok(())
}

/// Lists the wrappers and reads the user's choice.
pub fn choose_wrapper<E: MappedExe + ?Sized>(console: &mut Console<'_>, exe: &E) -> Result<usize> {
    print_wrapper_names(console.out(), exe)?;
    let index = console.read_number("wrapperNum")?;
    if index >= exe.wrappers_count() {
        return Err(CommanderError::NoSuchWrapper(index));
    }
    Ok(index)
}
