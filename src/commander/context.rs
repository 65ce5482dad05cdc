//! Session state handed to every command.

use std::path::{Path, PathBuf};

use crate::formats::pe::PeImage;

/// The context a command runs against.
#[derive(Debug)]
pub enum CmdContext {
    /// A session with no executable support
    Generic,
    Exe(ExeCmdContext),
}

impl CmdContext {
    pub fn with_image(image: PeImage, path: impl Into<PathBuf>) -> Self {
        CmdContext::Exe(ExeCmdContext::new(Some(image), Some(path.into())))
    }

    pub fn as_exe(&self) -> Option<&ExeCmdContext> {
        match self {
            CmdContext::Exe(ctx) => Some(ctx),
            CmdContext::Generic => None,
        }
    }

    pub fn as_exe_mut(&mut self) -> Option<&mut ExeCmdContext> {
        match self {
            CmdContext::Exe(ctx) => Some(ctx),
            CmdContext::Generic => None,
        }
    }
}

/// State of an executable session.
#[derive(Debug)]
pub struct ExeCmdContext {
    exe: Option<PeImage>,
    path: Option<PathBuf>,
    /// Bytes shown per fetch
    pub fetch_size: u64,
}

impl ExeCmdContext {
    pub const DEFAULT_FETCH_SIZE: u64 = 100;

    pub fn new(exe: Option<PeImage>, path: Option<PathBuf>) -> Self {
        Self {
            exe,
            path,
            fetch_size: Self::DEFAULT_FETCH_SIZE,
        }
    }

    pub fn exe(&self) -> Option<&PeImage> {
        self.exe.as_ref()
    }

    pub fn exe_mut(&mut self) -> Option<&mut PeImage> {
        self.exe.as_mut()
    }

    /// Path the image was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
