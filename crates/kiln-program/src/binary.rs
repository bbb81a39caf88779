//! Decoding caller-supplied binaries into modules.

use kiln_module::Module;
use kiln_types::{ErrorCode, ProgramError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-slot outcome of loading a supplied binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryStatus {
    Success,
    /// The slot held no bytes.
    InvalidValue,
    /// The bytes did not decode as a module.
    InvalidBinary,
}

impl BinaryStatus {
    pub fn code(self) -> ErrorCode {
        match self {
            Self::Success => ErrorCode::SUCCESS,
            Self::InvalidValue => ErrorCode::INVALID_VALUE,
            Self::InvalidBinary => ErrorCode::INVALID_BINARY,
        }
    }
}

/// Every slot decoded independently, with its status.
#[derive(Debug, Clone, Default)]
pub struct LoadedBinaries {
    pub statuses: Vec<BinaryStatus>,
    modules: Vec<Module>,
}

impl LoadedBinaries {
    /// The decoded modules, if every slot succeeded.
    ///
    /// An empty slot anywhere reports [`ProgramError::InvalidValue`] ahead
    /// of any undecodable one.
    pub fn into_modules(self) -> Result<Vec<Module>> {
        if self.statuses.contains(&BinaryStatus::InvalidValue) {
            return Err(ProgramError::InvalidValue);
        }
        if self.statuses.contains(&BinaryStatus::InvalidBinary) {
            return Err(ProgramError::InvalidBinary);
        }
        Ok(self.modules)
    }
}

/// Decode each blob on its own; a bad slot never stops the others.
pub fn load_binaries(blobs: &[&[u8]]) -> LoadedBinaries {
    let mut loaded = LoadedBinaries {
        statuses: Vec::with_capacity(blobs.len()),
        modules: Vec::with_capacity(blobs.len()),
    };

    for (slot, blob) in blobs.iter().enumerate() {
        let (status, module) = if blob.is_empty() {
            (BinaryStatus::InvalidValue, Module::new())
        } else {
            match Module::deserialize(blob) {
                Ok(module) => (BinaryStatus::Success, module),
                Err(err) => {
                    debug!(slot, error = %err, "binary rejected");
                    (BinaryStatus::InvalidBinary, Module::new())
                }
            }
        };
        loaded.statuses.push(status);
        loaded.modules.push(module);
    }

    loaded
}
