//! Kiln program objects.
//!
//! ```text
//! source / binaries → Program → compile → link → per-device Build
//! ```
//!
//! A [`Program`] holds one [`Build`] per device of its [`Context`]. The
//! compile and link steps are delegated to the [`Toolchain`] registered for
//! each device's code representation. The [`api`] module holds the entry
//! points with their argument validation; [`info`] answers queries.

pub mod api;
pub mod binary;
pub mod build;
pub mod config;
pub mod context;
pub mod info;
pub mod link;
pub mod program;
pub mod toolchain;

pub use api::{
    build_program, compile_program, create_program_with_binary,
    create_program_with_built_in_kernels, create_program_with_source, link_program,
    validate_build_common, BinaryLoad, LinkedProgram,
};
pub use binary::{load_binaries, BinaryStatus, LoadedBinaries};
pub use build::{BinaryType, Build, BuildStatus};
pub use config::BuildConfig;
pub use context::Context;
pub use info::{build_info, build_reports, build_reports_json, BuildInfo, BuildReport, ProgramInfo};
pub use link::validate_link_devices;
pub use program::{KernelRef, Program};
pub use toolchain::{
    CompileRequest, FailureKind, HeaderMap, LinkRequest, ToolFailure, ToolOutput, Toolchain,
};
