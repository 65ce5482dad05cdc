//! Core data types for image inspection.
//!
//! Address spaces and conversions live in `address`, the capabilities an
//! image exposes to commands in `executable`, and the structural view model
//! that dumps render in `wrapper`.

pub mod address;
pub mod executable;
pub mod wrapper;
