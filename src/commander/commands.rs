//! Commands operating on an executable session.

use std::fs;
use std::io::Write;

use tracing::info;

use crate::commander::console::Console;
use crate::commander::context::{CmdContext, ExeCmdContext};
use crate::commander::dump::{dump_entry_info, dump_node_info};
use crate::commander::util::{choose_wrapper, fetch, get_exe_from_context, get_exe_from_context_mut};
use crate::commander::{Command, Commander};
use crate::core::address::{is_valid, AddrKind};
use crate::core::executable::{Executable, MappedExe};
use crate::error::{CommanderError, Result};

/// Registers every executable command on `commander`.
pub fn init_commands(commander: &mut Commander) {
    commander.add_command("info", ExeInfoCommand);

    commander.add_command(
        "r-v",
        ConvertAddrCommand::new(AddrKind::Raw, AddrKind::Rva, "Convert: RAW -> RVA"),
    );
    commander.add_command(
        "v-r",
        ConvertAddrCommand::new(AddrKind::Rva, AddrKind::Raw, "Convert: RVA -> RAW"),
    );

    commander.add_command(
        "printc",
        FetchCommand::new(false, AddrKind::Raw, "Print content by Raw address"),
    );
    commander.add_command(
        "printx",
        FetchCommand::new(true, AddrKind::Raw, "Print content by Raw address - HEX"),
    );

    commander.add_command("cl", ClearWrapperCommand);
    commander.add_command("fdump", DumpWrapperToFileCommand);
    commander.add_command("dump", DumpWrapperCommand);
    commander.add_command("edump", DumpWrapperEntriesCommand);

    commander.add_command("e_add", AddEntryCommand);
    commander.add_command("save", SaveExeToFileCommand);
}

/// Prints the image summary.
pub struct ExeInfoCommand;

impl Command for ExeInfoCommand {
    fn description(&self) -> &str {
        "Print info about the loaded executable"
    }

    fn execute(&self, context: &mut CmdContext, console: &mut Console<'_>) -> Result<()> {
        let exe = get_exe_from_context(context)?;
        if let Some(path) = context.as_exe().and_then(|c| c.path()) {
            writeln!(console.out(), "File: {}", path.display())?;
        }
        write!(console.out(), "{}", exe.summary())?;
        Ok(())
    }
}

/// Reads an offset in one address space and prints it in another.
pub struct ConvertAddrCommand {
    from: AddrKind,
    to: AddrKind,
    desc: &'static str,
}

impl ConvertAddrCommand {
    pub fn new(from: AddrKind, to: AddrKind, desc: &'static str) -> Self {
        Self { from, to, desc }
    }
}

impl Command for ConvertAddrCommand {
    fn description(&self) -> &str {
        self.desc
    }

    fn execute(&self, context: &mut CmdContext, console: &mut Console<'_>) -> Result<()> {
        let exe = get_exe_from_context(context)?;
        let offset = console.read_offset(self.from)?;
        let converted = exe.convert(offset, self.from, self.to);
        if !is_valid(converted) {
            return Err(CommanderError::InvalidAddress {
                operation: "convert",
            });
        }
        writeln!(
            console.out(),
            "[{}] {:#X} -> [{}] {:#X}",
            self.from.as_char(),
            offset,
            self.to.as_char(),
            converted
        )?;
        Ok(())
    }
}

/// Reads an offset and prints the bytes there.
pub struct FetchCommand {
    hex: bool,
    kind: AddrKind,
    desc: &'static str,
}

impl FetchCommand {
    pub fn new(hex: bool, kind: AddrKind, desc: &'static str) -> Self {
        Self { hex, kind, desc }
    }
}

impl Command for FetchCommand {
    fn description(&self) -> &str {
        self.desc
    }

    fn execute(&self, context: &mut CmdContext, console: &mut Console<'_>) -> Result<()> {
        let exe = get_exe_from_context(context)?;
        let size = context
            .as_exe()
            .map_or(ExeCmdContext::DEFAULT_FETCH_SIZE, |c| c.fetch_size);
        let offset = console.read_offset(self.kind)?;
        fetch(console.out(), exe, offset, self.kind, self.hex, size)
    }
}

/// Zero-fills the chosen wrapper.
pub struct ClearWrapperCommand;

impl Command for ClearWrapperCommand {
    fn description(&self) -> &str {
        "Clear chosen wrapper Content"
    }

    fn execute(&self, context: &mut CmdContext, console: &mut Console<'_>) -> Result<()> {
        let exe = get_exe_from_context_mut(context)?;
        let index = choose_wrapper(console, &*exe)?;
        exe.clear_wrapper(index)?;
        writeln!(console.out(), "Cleared: {}", exe.wrapper_name(index))?;
        Ok(())
    }
}

/// Writes the chosen wrapper's raw bytes to a file.
pub struct DumpWrapperToFileCommand;

impl Command for DumpWrapperToFileCommand {
    fn description(&self) -> &str {
        "Dump chosen wrapper Content into a file"
    }

    fn execute(&self, context: &mut CmdContext, console: &mut Console<'_>) -> Result<()> {
        let exe = get_exe_from_context(context)?;
        let index = choose_wrapper(console, exe)?;
        let content = exe
            .wrapper_content(index)
            .ok_or(CommanderError::NoSuchWrapper(index))?;

        let path = console.prompt("fileName")?;
        fs::write(&path, content)?;
        info!(wrapper = exe.wrapper_name(index), path = %path, "Dumped wrapper content");
        writeln!(console.out(), "Dumped {} bytes into: {}", content.len(), path)?;
        Ok(())
    }
}

/// Prints the chosen wrapper's fields.
pub struct DumpWrapperCommand;

impl Command for DumpWrapperCommand {
    fn description(&self) -> &str {
        "Dump chosen wrapper info"
    }

    fn execute(&self, context: &mut CmdContext, console: &mut Console<'_>) -> Result<()> {
        let exe = get_exe_from_context(context)?;
        let index = choose_wrapper(console, exe)?;
        dump_entry_info(console.out(), exe.wrapper(index).as_ref())?;
        Ok(())
    }
}

/// Prints the chosen wrapper's entries.
pub struct DumpWrapperEntriesCommand;

impl Command for DumpWrapperEntriesCommand {
    fn description(&self) -> &str {
        "Dump wrapper entries"
    }

    fn execute(&self, context: &mut CmdContext, console: &mut Console<'_>) -> Result<()> {
        let exe = get_exe_from_context(context)?;
        let index = choose_wrapper(console, exe)?;
        dump_node_info(console.out(), exe.wrapper(index).as_ref())?;
        Ok(())
    }
}

/// Appends an entry to the chosen wrapper.
pub struct AddEntryCommand;

impl Command for AddEntryCommand {
    fn description(&self) -> &str {
        "Add entry to a wrapper"
    }

    fn execute(&self, context: &mut CmdContext, console: &mut Console<'_>) -> Result<()> {
        let exe = get_exe_from_context_mut(context)?;
        let index = choose_wrapper(console, &*exe)?;
        exe.add_entry(index)?;
        let entries = exe.wrapper(index).map_or(0, |w| w.entries_count());
        writeln!(
            console.out(),
            "Added entry to: {} (entries: {})",
            exe.wrapper_name(index),
            entries
        )?;
        Ok(())
    }
}

/// Writes the image to a file.
pub struct SaveExeToFileCommand;

impl Command for SaveExeToFileCommand {
    fn description(&self) -> &str {
        "Save exe to a file"
    }

    fn execute(&self, context: &mut CmdContext, console: &mut Console<'_>) -> Result<()> {
        let exe = get_exe_from_context(context)?;
        let path = console.prompt("fileName")?;
        exe.save(&path)?;
        writeln!(console.out(), "Saved {} bytes into: {}", exe.raw_size(), path)?;
        Ok(())
    }
}
