//! Errors raised while reading image files from disk.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("image file is {found} bytes, the limit is {limit} bytes")]
    FileTooLarge { limit: u64, found: u64 },

    #[error("read budget of {limit} bytes exhausted ({current} bytes already read)")]
    ReadLimitExceeded { limit: u64, current: u64 },

    #[error("image file is empty")]
    EmptyFile,

    #[error(transparent)]
    StdIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IoError>;
