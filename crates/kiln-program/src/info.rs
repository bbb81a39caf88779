//! Program and build information queries.

use std::sync::Arc;

use kiln_module::Symbol;
use kiln_types::{DeviceId, ProgramError, Result};
use serde::{Deserialize, Serialize};

use crate::build::{BinaryType, BuildStatus};
use crate::program::Program;

/// Program-wide queries.
#[derive(Debug, Clone, Copy)]
pub struct ProgramInfo<'a> {
    program: &'a Arc<Program>,
}

impl<'a> ProgramInfo<'a> {
    pub fn new(program: &'a Arc<Program>) -> Self {
        Self { program }
    }

    pub fn reference_count(&self) -> usize {
        self.program.ref_count()
    }

    /// Devices the program targets, or the whole context if it targets none
    /// yet.
    pub fn devices(&self) -> Vec<DeviceId> {
        let devs = self.program.devices();
        if devs.is_empty() {
            self.program.context().device_ids()
        } else {
            devs
        }
    }

    pub fn num_devices(&self) -> usize {
        self.devices().len()
    }

    pub fn source(&self) -> &'a str {
        self.program.source()
    }

    /// Serialized size of each device's binary, in device order.
    pub fn binary_sizes(&self) -> Vec<usize> {
        self.program
            .devices()
            .into_iter()
            .map(|dev| self.program.build(dev).binary.size())
            .collect()
    }

    /// Serialized binary of each device, in device order.
    pub fn binaries(&self) -> Vec<Vec<u8>> {
        self.program
            .devices()
            .into_iter()
            .map(|dev| self.program.build(dev).binary.serialize())
            .collect()
    }

    pub fn num_kernels(&self) -> Result<usize> {
        Ok(self.program.symbols()?.len())
    }

    /// Kernel names joined with `;`, in listing order.
    pub fn kernel_names(&self) -> Result<String> {
        let names: Vec<String> = self
            .program
            .symbols()?
            .into_iter()
            .map(|s| s.name)
            .collect();
        Ok(names.join(";"))
    }
}

/// Build state of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub status: BuildStatus,
    pub options: String,
    pub log: String,
    pub binary_type: BinaryType,
}

/// Query the build of `device`, which must belong to the program's context.
pub fn build_info(program: &Program, device: DeviceId) -> Result<BuildInfo> {
    if !program.context().contains(device) {
        return Err(ProgramError::InvalidDevice);
    }
    let build = program.build(device);
    Ok(BuildInfo {
        status: build.status(),
        binary_type: build.binary_type(),
        options: build.opts,
        log: build.log,
    })
}

/// Serializable summary of one device's build, for tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub device: DeviceId,
    pub status: BuildStatus,
    pub binary_type: BinaryType,
    pub options: String,
    pub log: String,
    pub binary_size: usize,
    /// SHA-256 of the serialized binary; absent when nothing was built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub kernels: Vec<Symbol>,
}

/// One report per targeted device, in device order.
pub fn build_reports(program: &Program) -> Vec<BuildReport> {
    program
        .devices()
        .into_iter()
        .map(|device| {
            let build = program.build(device);
            BuildReport {
                device,
                status: build.status(),
                binary_type: build.binary_type(),
                binary_size: build.binary.size(),
                digest: (!build.binary.is_empty()).then(|| build.binary.digest()),
                kernels: build.binary.symbols,
                options: build.opts,
                log: build.log,
            }
        })
        .collect()
}

/// The build reports as pretty-printed JSON.
pub fn build_reports_json(program: &Program) -> String {
    serde_json::to_string_pretty(&build_reports(program))
        .unwrap_or_else(|e| format!(r#"{{"error":"serialization error: {e}"}}"#))
}
