//! Per-device build records.

use kiln_module::{Module, SectionKind};
use serde::{Deserialize, Serialize};

/// Outcome of the latest build attempt on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    /// Never attempted.
    None,
    Error,
    Success,
}

impl BuildStatus {
    /// Value reported through the API.
    pub fn raw(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::None => -1,
            Self::Error => -2,
        }
    }
}

/// What kind of binary a build holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryType {
    None,
    CompiledObject,
    Library,
    Executable,
}

impl BinaryType {
    /// Value reported through the API.
    pub fn raw(self) -> u32 {
        match self {
            Self::None => 0,
            Self::CompiledObject => 1,
            Self::Library => 2,
            Self::Executable => 4,
        }
    }

    /// Whether a build of this type can be fed to the linker.
    pub fn is_linkable(self) -> bool {
        matches!(self, Self::CompiledObject | Self::Library)
    }
}

/// The compiled artifact for one device, with the options and log that
/// produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Build {
    pub binary: Module,
    pub opts: String,
    pub log: String,
}

impl Build {
    pub fn new(binary: Module, opts: impl Into<String>, log: impl Into<String>) -> Self {
        Self {
            binary,
            opts: opts.into(),
            log: log.into(),
        }
    }

    /// A build holding only a binary, as supplied by the caller.
    pub fn from_binary(binary: Module) -> Self {
        Self::new(binary, "", "")
    }

    /// Success when the binary has sections; otherwise a non-empty log
    /// means an attempt failed.
    pub fn status(&self) -> BuildStatus {
        if !self.binary.sections.is_empty() {
            BuildStatus::Success
        } else if !self.log.is_empty() {
            BuildStatus::Error
        } else {
            BuildStatus::None
        }
    }

    /// Classify the binary by the section kinds present.
    ///
    /// Intermediate text wins over library text, which wins over executable
    /// text.
    pub fn binary_type(&self) -> BinaryType {
        if self.binary.has_section_kind(SectionKind::TextIntermediate) {
            BinaryType::CompiledObject
        } else if self.binary.has_section_kind(SectionKind::TextLibrary) {
            BinaryType::Library
        } else if self.binary.has_section_kind(SectionKind::TextExecutable) {
            BinaryType::Executable
        } else {
            BinaryType::None
        }
    }
}
