//! Cross-program link compatibility.

use kiln_types::{DeviceId, ProgramError, Result};
use tracing::{debug, warn};

use crate::program::Program;

/// Pick the devices a multi-program link should run on.
///
/// For each candidate device, independently:
/// - every input holds a compiled object or library → the device is linked;
/// - no input does → the device is skipped;
/// - only some do → [`ProgramError::InvalidOperation`].
pub fn validate_link_devices(programs: &[&Program], candidates: &[DeviceId]) -> Result<Vec<DeviceId>> {
    let mut devices = Vec::with_capacity(candidates.len());

    for &dev in candidates {
        let ready = programs
            .iter()
            .filter(|p| p.build(dev).binary_type().is_linkable())
            .count();

        if ready == programs.len() {
            devices.push(dev);
        } else if ready == 0 {
            debug!(device = %dev, "no linkable inputs, skipping");
        } else {
            warn!(device = %dev, ready, inputs = programs.len(), "mixed link inputs");
            return Err(ProgramError::InvalidOperation);
        }
    }

    Ok(devices)
}
