//! Error types for the exeprobe console.
//!
//! Every failure a command can hit is one variant of [`CommanderError`]. The
//! dispatcher catches them at its boundary and reports them to the user, so
//! none of them terminate the console.

use thiserror::Error;

use crate::formats::pe::PeError;
use crate::io::error::IoError;

/// Main error type for console operations.
#[derive(Debug, Error)]
pub enum CommanderError {
    /// The session context is not an executable session
    #[error("Invalid command context!")]
    InvalidContext,

    /// A command requiring an image found none
    #[error("Invalid command context: no Exe")]
    NoImageLoaded,

    /// Address translation produced the sentinel
    #[error("Invalid address supplied ({operation})")]
    InvalidAddress { operation: &'static str },

    /// A byte-range acquisition yielded nothing
    #[error("Cannot fetch content at raw offset {offset:#x}")]
    NoContent { offset: u64 },

    /// Dispatch received a name with no registration
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Malformed user input to a prompt
    #[error("Invalid {expected}: {input:?}")]
    InvalidInput {
        input: String,
        expected: &'static str,
    },

    /// Input stream ended while a prompt was waiting
    #[error("Input closed")]
    InputClosed,

    /// Wrapper index does not name an available wrapper
    #[error("No such wrapper: {0}")]
    NoSuchWrapper(usize),

    /// The wrapper does not support the requested operation
    #[error("Operation not supported: {0}")]
    Unsupported(String),

    /// The image could not be parsed
    #[error("Invalid executable format: {0}")]
    Format(#[from] PeError),

    /// Bounded reader failures
    #[error("Read error: {0}")]
    Read(#[from] IoError),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias for console operations
pub type Result<T> = std::result::Result<T, CommanderError>;
