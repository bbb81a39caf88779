use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error category, determined by the status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Success,
    /// The toolchain ran and reported a failure.
    Build,
    /// Caller input or object state was rejected before anything ran.
    Validation,
    /// A supplied binary could not be used.
    Binary,
}

/// Numeric status code returned across the API boundary.
///
/// Values follow the standardized compute API, so they can be handed to
/// callers unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    pub const SUCCESS: Self = Self(0);

    // ── Toolchain failures ──
    pub const BUILD_PROGRAM_FAILURE: Self = Self(-11);
    pub const COMPILE_PROGRAM_FAILURE: Self = Self(-15);
    pub const LINK_PROGRAM_FAILURE: Self = Self(-17);

    // ── Validation ──
    pub const INVALID_VALUE: Self = Self(-30);
    pub const INVALID_DEVICE: Self = Self(-33);
    pub const INVALID_BUILD_OPTIONS: Self = Self(-43);
    pub const INVALID_PROGRAM_EXECUTABLE: Self = Self(-45);
    pub const INVALID_OPERATION: Self = Self(-59);
    pub const INVALID_COMPILER_OPTIONS: Self = Self(-66);
    pub const INVALID_LINKER_OPTIONS: Self = Self(-67);

    // ── Binaries ──
    pub const INVALID_BINARY: Self = Self(-42);

    /// Get the category for this code.
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::SUCCESS => ErrorCategory::Success,
            Self::BUILD_PROGRAM_FAILURE
            | Self::COMPILE_PROGRAM_FAILURE
            | Self::LINK_PROGRAM_FAILURE => ErrorCategory::Build,
            Self::INVALID_BINARY => ErrorCategory::Binary,
            _ => ErrorCategory::Validation,
        }
    }

    /// Symbolic name of a known code.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::SUCCESS => "SUCCESS",
            Self::BUILD_PROGRAM_FAILURE => "BUILD_PROGRAM_FAILURE",
            Self::COMPILE_PROGRAM_FAILURE => "COMPILE_PROGRAM_FAILURE",
            Self::LINK_PROGRAM_FAILURE => "LINK_PROGRAM_FAILURE",
            Self::INVALID_VALUE => "INVALID_VALUE",
            Self::INVALID_DEVICE => "INVALID_DEVICE",
            Self::INVALID_BINARY => "INVALID_BINARY",
            Self::INVALID_BUILD_OPTIONS => "INVALID_BUILD_OPTIONS",
            Self::INVALID_PROGRAM_EXECUTABLE => "INVALID_PROGRAM_EXECUTABLE",
            Self::INVALID_OPERATION => "INVALID_OPERATION",
            Self::INVALID_COMPILER_OPTIONS => "INVALID_COMPILER_OPTIONS",
            Self::INVALID_LINKER_OPTIONS => "INVALID_LINKER_OPTIONS",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "status {}", self.0),
        }
    }
}

/// Which entry point an error is reported through.
///
/// Toolchain failures map to a different status code per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Build,
    Compile,
    Link,
}

/// Errors raised by program objects and their entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    /// Malformed caller input.
    #[error("invalid value")]
    InvalidValue,

    /// A device is not part of the owning context.
    #[error("invalid device")]
    InvalidDevice,

    /// The call is illegal in the program's current state.
    #[error("invalid operation")]
    InvalidOperation,

    /// Supplied module bytes could not be decoded.
    #[error("invalid binary")]
    InvalidBinary,

    /// The program has never been built for any device.
    #[error("invalid program executable")]
    InvalidExecutable,

    /// The compiler or linker reported an error.
    #[error("build failure")]
    BuildFailure { log: String },

    /// The compiler or linker rejected the options string.
    #[error("invalid build options")]
    InvalidBuildOptions { log: String },
}

impl ProgramError {
    /// Status code for this error when reported through `phase`.
    pub fn status(&self, phase: Phase) -> ErrorCode {
        match (self, phase) {
            (Self::InvalidValue, _) => ErrorCode::INVALID_VALUE,
            (Self::InvalidDevice, _) => ErrorCode::INVALID_DEVICE,
            (Self::InvalidOperation, _) => ErrorCode::INVALID_OPERATION,
            (Self::InvalidBinary, _) => ErrorCode::INVALID_BINARY,
            (Self::InvalidExecutable, _) => ErrorCode::INVALID_PROGRAM_EXECUTABLE,
            (Self::BuildFailure { .. }, Phase::Build) => ErrorCode::BUILD_PROGRAM_FAILURE,
            (Self::BuildFailure { .. }, Phase::Compile) => ErrorCode::COMPILE_PROGRAM_FAILURE,
            (Self::BuildFailure { .. }, Phase::Link) => ErrorCode::LINK_PROGRAM_FAILURE,
            (Self::InvalidBuildOptions { .. }, Phase::Build) => ErrorCode::INVALID_BUILD_OPTIONS,
            (Self::InvalidBuildOptions { .. }, Phase::Compile) => {
                ErrorCode::INVALID_COMPILER_OPTIONS
            }
            (Self::InvalidBuildOptions { .. }, Phase::Link) => ErrorCode::INVALID_LINKER_OPTIONS,
        }
    }

    /// The toolchain log carried by build failures.
    pub fn log(&self) -> Option<&str> {
        match self {
            Self::BuildFailure { log } | Self::InvalidBuildOptions { log } => Some(log),
            _ => None,
        }
    }
}
