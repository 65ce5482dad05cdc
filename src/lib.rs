//! exeprobe: an interactive console for inspecting PE images.
//!
//! The image engine lives in [`formats::pe`], the address and wrapper model
//! in [`core`], and the command registry and console loop in [`commander`].

pub mod commander;
pub mod config;
pub mod content;
pub mod core;
pub mod error;
pub mod formats;
pub mod io;
pub mod logging;

pub use commander::{CmdContext, Command, Commander, Console, ExeCmdContext};
pub use config::CommanderConfig;
pub use crate::core::address::{AddrKind, Offset, INVALID_ADDR};
pub use crate::core::executable::{Executable, MappedExe};
pub use crate::core::wrapper::{Field, SubValue, WrappedValue, WrapperNode};
pub use error::{CommanderError, Result};
pub use formats::pe::PeImage;
