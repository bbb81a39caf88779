//! Compiler/linker collaborator interface.
//!
//! Front ends and back ends are black boxes to the program model. Each
//! code-representation family registers one [`Toolchain`] with the
//! [`Context`](crate::Context); programs pick it by the device's
//! [`IrKind`](kiln_types::IrKind).

use kiln_module::Module;
use kiln_types::ProgramError;
use thiserror::Error;

/// Header name → header source, in the order the caller supplied them.
pub type HeaderMap = Vec<(String, String)>;

/// Input to a front-end compile.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub source: &'a str,
    pub headers: &'a [(String, String)],
    /// Target descriptor of the device being compiled for.
    pub target: &'a str,
    pub options: &'a str,
}

/// Input to a back-end link.
#[derive(Debug, Clone, Copy)]
pub struct LinkRequest<'a> {
    pub modules: &'a [Module],
    pub target: &'a str,
    pub options: &'a str,
    /// Log accumulated by earlier stages for this device; the linker
    /// appends to it.
    pub log_seed: &'a str,
}

/// A successful toolchain run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub module: Module,
    /// Diagnostics emitted on success, typically warnings.
    pub log: String,
}

/// Why a toolchain run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The options string was rejected.
    InvalidOptions,
    /// Compilation or linking failed.
    Failed,
}

/// A failed toolchain run, with whatever log was produced up to the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("toolchain failure ({kind:?})")]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub log: String,
}

impl ToolFailure {
    pub fn failed(log: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Failed,
            log: log.into(),
        }
    }

    pub fn invalid_options(log: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::InvalidOptions,
            log: log.into(),
        }
    }
}

impl From<ToolFailure> for ProgramError {
    fn from(failure: ToolFailure) -> Self {
        match failure.kind {
            FailureKind::InvalidOptions => ProgramError::InvalidBuildOptions { log: failure.log },
            FailureKind::Failed => ProgramError::BuildFailure { log: failure.log },
        }
    }
}

/// A front-end/back-end pair for one code-representation family.
///
/// Calls are synchronous; cancellation, if any, is the implementation's
/// business.
pub trait Toolchain: Send + Sync {
    /// Compile source text to an object module.
    fn compile(&self, request: &CompileRequest<'_>) -> Result<ToolOutput, ToolFailure>;

    /// Link object or library modules into one module.
    fn link(&self, request: &LinkRequest<'_>) -> Result<ToolOutput, ToolFailure>;
}
