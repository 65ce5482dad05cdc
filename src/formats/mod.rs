//! Executable formats understood by the console.

pub mod pe;
