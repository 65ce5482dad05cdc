//! Bounded file access for loading executable images.
//!
//! `SafeReader` memory-maps the file and hands out `Bytes` windows while
//! enforcing the `IOLimits` budget, so a console session never maps or copies
//! more than it was configured for.

pub mod error;

use crate::io::error::{IoError, Result};
use bytes::Bytes;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Resource limits for image loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IOLimits {
    /// The largest image file that may be opened.
    pub max_file_size: u64,
    /// Total number of bytes a reader may hand out across all reads.
    pub max_read_bytes: u64,
}

impl Default for IOLimits {
    fn default() -> Self {
        Self {
            max_file_size: 256 * 1024 * 1024, // 256MB
            max_read_bytes: 256 * 1024 * 1024,
        }
    }
}

/// A bounded, memory-mapped file reader.
pub struct SafeReader {
    path: PathBuf,
    // memmap cannot map empty files
    mmap: Option<Mmap>,
    limits: IOLimits,
    bytes_read: u64,
    file_size: u64,
}

impl SafeReader {
    /// Opens and maps a file, rejecting it when it exceeds `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: IOLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limit = limits.max_file_size,
            "Opening image file"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "Image file is too large"
            );
            return Err(IoError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        let mmap = if file_size == 0 {
            None
        } else {
            // Safety: read-only map of a regular file that we keep open for the map's lifetime.
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            limits,
            bytes_read: 0,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.file_size
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Reads up to `len` bytes at `offset`, clamped to the end of the file.
    ///
    /// # Errors
    ///
    /// Returns `IoError::ReadLimitExceeded` if the read would exceed the budget.
    pub fn read_at(&mut self, offset: u64, len: u64) -> Result<Bytes> {
        if self.bytes_read.saturating_add(len) > self.limits.max_read_bytes {
            warn!(
                path = %self.path.display(),
                current_read = self.bytes_read,
                requested = len,
                limit = self.limits.max_read_bytes,
                "Read limit exceeded"
            );
            return Err(IoError::ReadLimitExceeded {
                limit: self.limits.max_read_bytes,
                current: self.bytes_read,
            });
        }

        let Some(map) = &self.mmap else {
            return Ok(Bytes::new());
        };
        let Ok(start) = usize::try_from(offset) else {
            return Ok(Bytes::new());
        };
        if start >= map.len() {
            return Ok(Bytes::new());
        }
        let end = start.saturating_add(len as usize).min(map.len());

        let out = Bytes::copy_from_slice(&map[start..end]);
        self.bytes_read += out.len() as u64;

        trace!(
            path = %self.path.display(),
            offset = start,
            len = out.len(),
            total_read = self.bytes_read,
            "Performed read"
        );

        Ok(out)
    }

    /// Reads the whole file as one window.
    pub fn read_all(&mut self) -> Result<Bytes> {
        if self.file_size == 0 {
            return Err(IoError::EmptyFile);
        }
        self.read_at(0, self.file_size)
    }
}

/// Opens `path` under `limits` and returns its full contents.
pub fn load_file<P: AsRef<Path>>(path: P, limits: IOLimits) -> Result<Bytes> {
    SafeReader::open(path, limits)?.read_all()
}
