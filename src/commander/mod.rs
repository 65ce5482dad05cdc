//! Command registry, dispatcher and console loop.
//!
//! A [`Commander`] maps exact, case-sensitive names to [`Command`] objects.
//! Dispatch runs a command against the session [`CmdContext`] and reports any
//! failure on the console, so one bad command never ends the session. Only
//! running out of input does.

pub mod commands;
pub mod console;
pub mod context;
pub mod dump;
pub mod util;

use std::collections::BTreeMap;
use std::io::Write;

use tracing::{debug, warn};

use crate::command_span;
use crate::config::CommanderConfig;
use crate::error::{CommanderError, Result};

pub use console::Console;
pub use context::{CmdContext, ExeCmdContext};

const QUIT_COMMANDS: [&str; 3] = ["q", "quit", "exit"];
const HELP_COMMAND: &str = "help";

/// A named console operation.
pub trait Command {
    fn description(&self) -> &str;

    fn execute(&self, context: &mut CmdContext, console: &mut Console<'_>) -> Result<()>;
}

/// Registry of commands plus the loop that reads and dispatches them.
pub struct Commander {
    commands: BTreeMap<String, Box<dyn Command>>,
    prompt: String,
}

impl Default for Commander {
    fn default() -> Self {
        Self::new("$ ")
    }
}

impl Commander {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            commands: BTreeMap::new(),
            prompt: prompt.into(),
        }
    }

    /// A commander with every executable command registered.
    pub fn for_exe(config: &CommanderConfig) -> Self {
        let mut commander = Self::new(config.prompt.clone());
        commands::init_commands(&mut commander);
        commander
    }

    /// Registers `command` under `name`, replacing any earlier registration.
    pub fn add_command(&mut self, name: impl Into<String>, command: impl Command + 'static) {
        let name = name.into();
        if self.commands.insert(name.clone(), Box::new(command)).is_some() {
            debug!(name = %name, "Replaced command");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Runs the command registered under `name`.
    ///
    /// # Errors
    ///
    /// `CommanderError::UnknownCommand` when nothing is registered under
    /// `name`; otherwise whatever the command returns.
    pub fn run_command(
        &self,
        name: &str,
        context: &mut CmdContext,
        console: &mut Console<'_>,
    ) -> Result<()> {
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| CommanderError::UnknownCommand(name.to_string()))?;

        let _span = command_span!(name).entered();
        debug!("Executing command");
        command.execute(context, console)
    }

    /// Runs a command and reports its failure as `ERROR: <message>`.
    ///
    /// Only `InputClosed` and failures to write the report are returned.
    pub fn dispatch(
        &self,
        name: &str,
        context: &mut CmdContext,
        console: &mut Console<'_>,
    ) -> Result<()> {
        match self.run_command(name, context, console) {
            Ok(()) => Ok(()),
            Err(CommanderError::InputClosed) => Err(CommanderError::InputClosed),
            Err(err) => {
                warn!(command = name, error = %err, "Command failed");
                writeln!(console.out(), "ERROR: {}", err)?;
                Ok(())
            }
        }
    }

    /// Prints the built-ins and every registered command with its description.
    pub fn print_help(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{:<8} - {}", HELP_COMMAND, "Print this help")?;
        writeln!(out, "{:<8} - {}", QUIT_COMMANDS.join("/"), "Exit")?;
        for (name, command) in &self.commands {
            writeln!(out, "{:<8} - {}", name, command.description())?;
        }
        Ok(())
    }

    /// Reads and dispatches commands until a quit command or end of input.
    pub fn run(&self, context: &mut CmdContext, console: &mut Console<'_>) -> Result<()> {
        loop {
            let line = match console.read_line(&self.prompt) {
                Ok(line) => line,
                Err(CommanderError::InputClosed) => break,
                Err(err @ CommanderError::InvalidInput { .. }) => {
                    warn!(error = %err, "Unreadable command line");
                    writeln!(console.out(), "ERROR: {}", err)?;
                    continue;
                }
                Err(err) => return Err(err),
            };

            let name = line.trim();
            if name.is_empty() {
                continue;
            }
            if QUIT_COMMANDS.contains(&name) {
                break;
            }
            if name == HELP_COMMAND {
                self.print_help(console.out())?;
                continue;
            }

            match self.dispatch(name, context, console) {
                Ok(()) => {}
                Err(CommanderError::InputClosed) => break,
                Err(err) => return Err(err),
            }
        }
        debug!("Console loop finished");
        Ok(())
    }
}
