use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a device within a context.
///
/// Build records are keyed by this id, never by device contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// Code representation a device consumes. Selects the toolchain family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IrKind {
    /// Textual shader-style intermediate code.
    Text,
    /// Bitcode handed to an optimizing back end.
    Bitcode,
}

/// A compute device, as seen by the program model.
///
/// Only identity and target queries are made; devices are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub ir_kind: IrKind,
    /// Target descriptor passed to the toolchain (e.g. a target triple).
    pub target: String,
}

impl Device {
    /// Create a new device.
    pub fn new(
        id: DeviceId,
        name: impl Into<String>,
        ir_kind: IrKind,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            ir_kind,
            target: target.into(),
        }
    }
}
