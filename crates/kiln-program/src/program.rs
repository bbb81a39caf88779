//! Program objects and their per-device compile/link state.
//!
//! Each (program, device) pair moves through
//!
//! ```text
//! NONE ──compile──▶ COMPILED ──link──▶ LINKED
//!   │                  │
//!   └──────────────────┴──▶ ERROR
//! ```
//!
//! as derived from the stored [`Build`]. A new compile or link on a device
//! always replaces what was there, successful or not.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use kiln_module::{Module, Symbol};
use kiln_types::{Device, DeviceId, ProgramError, Result};
use tracing::{debug, instrument, warn};

use crate::build::Build;
use crate::context::Context;
use crate::toolchain::{CompileRequest, LinkRequest, ToolFailure, ToolOutput};

#[derive(Debug, Default)]
struct BuildState {
    /// Devices targeted by the latest compile or link.
    devices: Vec<DeviceId>,
    builds: BTreeMap<DeviceId, Build>,
}

/// A program: source text or supplied binaries, plus one build per device.
///
/// Programs are shared through `Arc`. Compile and link calls on one program
/// must not overlap; queries may run at any time.
#[derive(Debug)]
pub struct Program {
    context: Arc<Context>,
    has_source: bool,
    source: String,
    state: RwLock<BuildState>,
    kernel_refs: AtomicUsize,
}

impl Program {
    /// A source-backed program. No devices are targeted until it is built.
    pub fn with_source(context: Arc<Context>, source: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            context,
            has_source: true,
            source: source.into(),
            state: RwLock::new(BuildState::default()),
            kernel_refs: AtomicUsize::new(0),
        })
    }

    /// A binary-backed program with one module per device.
    ///
    /// `devices` and `binaries` pair up positionally.
    pub fn with_binaries(
        context: Arc<Context>,
        devices: Vec<DeviceId>,
        binaries: Vec<Module>,
    ) -> Arc<Self> {
        let builds = devices
            .iter()
            .copied()
            .zip(binaries.into_iter().map(Build::from_binary))
            .collect();
        Arc::new(Self {
            context,
            has_source: false,
            source: String::new(),
            state: RwLock::new(BuildState { devices, builds }),
            kernel_refs: AtomicUsize::new(0),
        })
    }

    /// An empty binary-backed program, used as a link target.
    pub fn empty(context: Arc<Context>) -> Arc<Self> {
        Self::with_binaries(context, Vec::new(), Vec::new())
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn has_source(&self) -> bool {
        self.has_source
    }

    /// The program source; empty for binary-backed programs.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Snapshot of the devices targeted by the latest compile or link.
    pub fn devices(&self) -> Vec<DeviceId> {
        self.read_state().devices.clone()
    }

    /// The build for `device`, or an empty build if there is none.
    pub fn build(&self, device: DeviceId) -> Build {
        self.read_state()
            .builds
            .get(&device)
            .cloned()
            .unwrap_or_default()
    }

    /// Kernel symbols of the first stored build.
    pub fn symbols(&self) -> Result<Vec<Symbol>> {
        let state = self.read_state();
        let (_, build) = state
            .builds
            .iter()
            .next()
            .ok_or(ProgramError::InvalidExecutable)?;
        Ok(build.binary.symbols.clone())
    }

    /// Number of owners of this program.
    pub fn ref_count(self: &Arc<Self>) -> usize {
        Arc::strong_count(self)
    }

    /// Number of live kernels created from this program.
    pub fn kernel_ref_count(&self) -> usize {
        self.kernel_refs.load(Ordering::Acquire)
    }

    /// Record a live kernel. The program cannot be rebuilt until the
    /// returned guard is dropped.
    pub fn retain_kernel(self: &Arc<Self>) -> KernelRef {
        self.kernel_refs.fetch_add(1, Ordering::AcqRel);
        KernelRef {
            program: Arc::clone(self),
        }
    }

    /// Compile the source for each of `devices`.
    ///
    /// The build for a device is written before any error for it is
    /// returned. Devices after a failing one are left untouched.
    #[instrument(skip_all, fields(devices = devices.len()))]
    pub fn compile(
        &self,
        devices: &[DeviceId],
        options: &str,
        headers: &[(String, String)],
    ) -> Result<()> {
        self.ensure_idle()?;
        if !self.has_source {
            return Err(ProgramError::InvalidOperation);
        }
        let targets = self.resolve(devices)?;

        let mut state = self.write_state();
        state.devices = devices.to_vec();

        for dev in &targets {
            debug!(device = %dev.id, target = %dev.target, "compiling");
            let result = match self.context.toolchain(dev.ir_kind) {
                Some(toolchain) => toolchain.compile(&CompileRequest {
                    source: &self.source,
                    headers,
                    target: &dev.target,
                    options,
                }),
                None => Err(missing_toolchain(dev)),
            };
            store(&mut state, dev, options, result)?;
        }
        Ok(())
    }

    /// Link the current builds of `programs` for each of `devices`.
    ///
    /// `programs` may include this program. Inputs are read before any
    /// build is replaced.
    #[instrument(skip_all, fields(devices = devices.len(), inputs = programs.len()))]
    pub fn link(&self, devices: &[DeviceId], options: &str, programs: &[&Program]) -> Result<()> {
        self.ensure_idle()?;
        let targets = self.resolve(devices)?;

        let inputs: Vec<(Vec<Module>, String)> = targets
            .iter()
            .map(|dev| {
                let modules = programs.iter().map(|p| p.build(dev.id).binary).collect();
                (modules, self.build(dev.id).log)
            })
            .collect();

        let mut state = self.write_state();
        state.devices = devices.to_vec();

        for (dev, (modules, log_seed)) in targets.iter().zip(&inputs) {
            debug!(device = %dev.id, modules = modules.len(), "linking");
            let result = match self.context.toolchain(dev.ir_kind) {
                Some(toolchain) => toolchain.link(&LinkRequest {
                    modules,
                    target: &dev.target,
                    options,
                    log_seed,
                }),
                None => Err(missing_toolchain(dev)),
            };
            store(&mut state, dev, options, result)?;
        }
        Ok(())
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.kernel_ref_count() {
            0 => Ok(()),
            n => {
                warn!(kernels = n, "program has live kernels");
                Err(ProgramError::InvalidOperation)
            }
        }
    }

    fn resolve(&self, devices: &[DeviceId]) -> Result<Vec<Arc<Device>>> {
        devices
            .iter()
            .map(|&id| {
                self.context
                    .device(id)
                    .cloned()
                    .ok_or(ProgramError::InvalidDevice)
            })
            .collect()
    }

    fn read_state(&self) -> RwLockReadGuard<'_, BuildState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, BuildState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Record a toolchain result, then surface its failure.
fn store(
    state: &mut BuildState,
    dev: &Device,
    options: &str,
    result: std::result::Result<ToolOutput, ToolFailure>,
) -> Result<()> {
    match result {
        Ok(out) => {
            debug!(device = %dev.id, sections = out.module.sections.len(), "build stored");
            state
                .builds
                .insert(dev.id, Build::new(out.module, options, out.log));
            Ok(())
        }
        Err(failure) => {
            warn!(device = %dev.id, kind = ?failure.kind, "build failed");
            state
                .builds
                .insert(dev.id, Build::new(Module::new(), options, failure.log.clone()));
            Err(failure.into())
        }
    }
}

fn missing_toolchain(dev: &Device) -> ToolFailure {
    ToolFailure::failed(format!(
        "no toolchain registered for {:?} devices ({})",
        dev.ir_kind, dev.name
    ))
}

/// A live kernel's hold on its program.
///
/// Dropping it releases the hold.
#[derive(Debug)]
pub struct KernelRef {
    program: Arc<Program>,
}

impl KernelRef {
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }
}

impl Drop for KernelRef {
    fn drop(&mut self) {
        self.program.kernel_refs.fetch_sub(1, Ordering::AcqRel);
    }
}
