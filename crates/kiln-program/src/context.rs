//! The owning context: the device set programs may target and the
//! toolchains that build for them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use kiln_types::{Device, DeviceId, IrKind};

use crate::toolchain::Toolchain;

/// Devices and toolchains shared by every program created in it.
pub struct Context {
    devices: Vec<Arc<Device>>,
    toolchains: HashMap<IrKind, Arc<dyn Toolchain>>,
}

impl Context {
    /// Create a context over `devices`, with no toolchains registered.
    pub fn new(devices: impl IntoIterator<Item = Device>) -> Self {
        Self {
            devices: devices.into_iter().map(Arc::new).collect(),
            toolchains: HashMap::new(),
        }
    }

    /// Register the toolchain that builds for devices of `kind`.
    pub fn with_toolchain(mut self, kind: IrKind, toolchain: Arc<dyn Toolchain>) -> Self {
        self.toolchains.insert(kind, toolchain);
        self
    }

    /// Ids of the devices in the context, in enumeration order.
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.devices.iter().map(|d| d.id).collect()
    }

    pub fn device(&self, id: DeviceId) -> Option<&Arc<Device>> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.device(id).is_some()
    }

    pub fn toolchain(&self, kind: IrKind) -> Option<&dyn Toolchain> {
        self.toolchains.get(&kind).map(|t| t.as_ref())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.toolchains.keys().collect();
        kinds.sort_by_key(|k| format!("{k:?}"));
        f.debug_struct("Context")
            .field("devices", &self.devices)
            .field("toolchains", &kinds)
            .finish()
    }
}
