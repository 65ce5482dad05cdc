//! Line-oriented console I/O with typed prompts.

use std::io::{self, BufRead, Write};

use tracing::trace;

use crate::core::address::{AddrKind, Offset, INVALID_ADDR};
use crate::error::{CommanderError, Result};

/// Parses a hexadecimal offset; a leading `0x` or `0X` is accepted.
pub fn parse_hex(input: &str) -> Result<Offset> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    Offset::from_str_radix(digits, 16).map_err(|_| CommanderError::InvalidInput {
        input: input.to_string(),
        expected: "hexadecimal offset",
    })
}

/// Parses a decimal count.
pub fn parse_decimal(input: &str) -> Result<usize> {
    input
        .trim()
        .parse()
        .map_err(|_| CommanderError::InvalidInput {
            input: input.to_string(),
            expected: "decimal number",
        })
}

/// The user-facing side of a session: a line reader and an output sink.
pub struct Console<'a> {
    input: Box<dyn BufRead + 'a>,
    output: Box<dyn Write + 'a>,
}

impl<'a> Console<'a> {
    pub fn new(input: impl BufRead + 'a, output: impl Write + 'a) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    pub fn stdio() -> Console<'static> {
        Console::new(io::stdin().lock(), io::stdout())
    }

    pub fn out(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    /// Prints `prompt` verbatim and reads one line without its terminator.
    ///
    /// # Errors
    ///
    /// Returns `CommanderError::InputClosed` at end of input and
    /// `CommanderError::InvalidInput` for a line that is not UTF-8. The bad
    /// line is consumed either way.
    pub fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Err(CommanderError::InputClosed);
        }
        let line = String::from_utf8(buf).map_err(|err| CommanderError::InvalidInput {
            input: String::from_utf8_lossy(err.as_bytes())
                .trim_end_matches(['\r', '\n'])
                .to_string(),
            expected: "text line",
        })?;
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        trace!(prompt, line = %line, "Read console line");
        Ok(line)
    }

    /// Prompts with `"<label>: "`.
    pub fn prompt(&mut self, label: &str) -> Result<String> {
        self.read_line(&format!("{}: ", label))
    }

    /// Reads a hexadecimal offset of the given kind.
    ///
    /// `NotAddr` yields `INVALID_ADDR` without prompting.
    pub fn read_offset(&mut self, kind: AddrKind) -> Result<Offset> {
        if !kind.is_addr() {
            return Ok(INVALID_ADDR);
        }
        let line = self.prompt(kind.label())?;
        parse_hex(&line)
    }

    /// Reads a decimal count.
    pub fn read_number(&mut self, label: &str) -> Result<usize> {
        let line = self.prompt(label)?;
        parse_decimal(&line)
    }
}
