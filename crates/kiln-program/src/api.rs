//! Program entry points.
//!
//! These mirror the standardized API calls minus buffer marshaling: they
//! validate the request, then drive [`Program`]. Validation errors are
//! raised before anything changes; toolchain failures after the affected
//! builds are recorded.

use std::sync::Arc;

use kiln_types::{DeviceId, Phase, ProgramError, Result};
use tracing::{debug, info, instrument};

use crate::binary::{load_binaries, BinaryStatus};
use crate::config::BuildConfig;
use crate::context::Context;
use crate::link::validate_link_devices;
use crate::program::Program;
use crate::toolchain::HeaderMap;

/// Result of [`create_program_with_binary`].
///
/// `statuses` has one entry per supplied binary even when `program` is an
/// error, so callers can tell which slot was bad.
#[derive(Debug)]
pub struct BinaryLoad {
    pub statuses: Vec<BinaryStatus>,
    pub program: Result<Arc<Program>>,
}

/// Result of [`link_program`].
///
/// A toolchain failure still yields the program so its build logs can be
/// queried; `error` then holds the failure.
#[derive(Debug)]
pub struct LinkedProgram {
    pub program: Arc<Program>,
    pub error: Option<ProgramError>,
}

/// Checks shared by build, compile and link: the program must have no live
/// kernels, and every named device must belong to its context.
pub fn validate_build_common(program: &Program, devices: &[DeviceId]) -> Result<()> {
    if program.kernel_ref_count() > 0 {
        return Err(ProgramError::InvalidOperation);
    }
    ensure_in_context(program.context(), devices)
}

fn ensure_in_context(ctx: &Context, devices: &[DeviceId]) -> Result<()> {
    match devices.iter().find(|&&d| !ctx.contains(d)) {
        Some(dev) => {
            debug!(device = %dev, "device not in context");
            Err(ProgramError::InvalidDevice)
        }
        None => Ok(()),
    }
}

/// Create a program from source fragments, concatenated in order.
pub fn create_program_with_source(ctx: &Arc<Context>, fragments: &[&str]) -> Result<Arc<Program>> {
    if fragments.is_empty() {
        return Err(ProgramError::InvalidValue);
    }
    Ok(Program::with_source(Arc::clone(ctx), fragments.concat()))
}

/// Create a program from one serialized module per device.
pub fn create_program_with_binary(
    ctx: &Arc<Context>,
    devices: &[DeviceId],
    binaries: &[&[u8]],
) -> BinaryLoad {
    let rejected = |err: ProgramError| BinaryLoad {
        statuses: Vec::new(),
        program: Err(err),
    };

    if devices.is_empty() || devices.len() != binaries.len() {
        return rejected(ProgramError::InvalidValue);
    }
    if let Err(err) = ensure_in_context(ctx, devices) {
        return rejected(err);
    }

    let loaded = load_binaries(binaries);
    let statuses = loaded.statuses.clone();
    let program = loaded
        .into_modules()
        .map(|modules| Program::with_binaries(Arc::clone(ctx), devices.to_vec(), modules));
    BinaryLoad { statuses, program }
}

/// No built-in kernels exist, so this only reports which error applies.
pub fn create_program_with_built_in_kernels(
    ctx: &Arc<Context>,
    devices: &[DeviceId],
    _kernel_names: &str,
) -> Result<Arc<Program>> {
    ensure_in_context(ctx, devices)?;
    Err(ProgramError::InvalidValue)
}

/// Compile and link a source program for `devices` (all context devices
/// when `None`, [`ProgramError::InvalidValue`] when empty). Binary-backed
/// programs are left as they are.
#[instrument(skip_all)]
pub fn build_program(
    program: &Arc<Program>,
    devices: Option<&[DeviceId]>,
    options: Option<&str>,
    config: &BuildConfig,
) -> Result<()> {
    let devs = target_devices(program.context(), devices)?;
    let opts = config.options(Phase::Build, options);
    validate_build_common(program, devices.unwrap_or_default())?;

    if program.has_source() {
        program.compile(&devs, &opts, &[])?;
        program.link(&devs, &opts, &[program.as_ref()])?;
        info!(devices = devs.len(), "program built");
    }
    Ok(())
}

/// Compile a source program, making `headers` available by name.
///
/// Each header is a source-backed program; when a name repeats, the first
/// one wins.
#[instrument(skip_all)]
pub fn compile_program(
    program: &Arc<Program>,
    devices: Option<&[DeviceId]>,
    options: Option<&str>,
    headers: &[(&str, &Program)],
    config: &BuildConfig,
) -> Result<()> {
    let devs = target_devices(program.context(), devices)?;
    let opts = config.options(Phase::Compile, options);
    validate_build_common(program, devices.unwrap_or_default())?;

    if !program.has_source() {
        return Err(ProgramError::InvalidOperation);
    }

    let mut header_map = HeaderMap::new();
    for &(name, header) in headers {
        if !header.has_source() {
            return Err(ProgramError::InvalidOperation);
        }
        if !header_map.iter().any(|(n, _)| n == name) {
            header_map.push((name.to_owned(), header.source().to_owned()));
        }
    }

    program.compile(&devs, &opts, &header_map)
}

/// Link `programs` into a new program.
///
/// Devices where every input is compiled are linked, devices where none is
/// are skipped, and a mix fails the whole call.
#[instrument(skip_all, fields(inputs = programs.len()))]
pub fn link_program(
    ctx: &Arc<Context>,
    devices: Option<&[DeviceId]>,
    options: Option<&str>,
    programs: &[&Program],
    config: &BuildConfig,
) -> Result<LinkedProgram> {
    let opts = config.options(Phase::Link, options);
    if programs.is_empty() {
        return Err(ProgramError::InvalidValue);
    }
    let candidates = target_devices(ctx, devices)?;
    let program = Program::empty(Arc::clone(ctx));
    let devs = validate_link_devices(programs, &candidates)?;
    validate_build_common(&program, devices.unwrap_or_default())?;

    match program.link(&devs, &opts, programs) {
        Ok(()) => Ok(LinkedProgram {
            program,
            error: None,
        }),
        Err(err @ ProgramError::BuildFailure { .. }) => Ok(LinkedProgram {
            program,
            error: Some(err),
        }),
        Err(err) => Err(err),
    }
}

/// The devices an entry point acts on: the named ones, or the whole context
/// when none are named. An explicit empty list is rejected.
fn target_devices(ctx: &Context, devices: Option<&[DeviceId]>) -> Result<Vec<DeviceId>> {
    match devices {
        Some([]) => Err(ProgramError::InvalidValue),
        Some(devs) => Ok(devs.to_vec()),
        None => Ok(ctx.device_ids()),
    }
}
