//! Shared types for the Kiln program model.
//!
//! This crate defines status codes, the error type raised by program
//! objects, and device identity used to key per-device build state.

mod device;
mod error;

pub use device::{Device, DeviceId, IrKind};
pub use error::{ErrorCategory, ErrorCode, Phase, ProgramError};

/// Result type used throughout the program model.
pub type Result<T> = std::result::Result<T, ProgramError>;
