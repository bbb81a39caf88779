//! Shared fixtures: a line-oriented mock toolchain and a three-device
//! context.
//!
//! Mock source language, one directive per line:
//!
//! ```text
//! kernel <name>        declare a kernel entry point
//! #include "<header>"  must name a supplied header
//! #warning <text>      emit a warning, still succeed
//! #error <text>        fail the compile
//! ```

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use kiln_module::{ArgKind, Argument, Module, Section, SectionKind, Symbol};
use kiln_program::{CompileRequest, Context, LinkRequest, ToolFailure, ToolOutput, Toolchain};
use kiln_types::{Device, DeviceId, IrKind};

pub const D1: DeviceId = DeviceId(1);
pub const D2: DeviceId = DeviceId(2);
pub const D3: DeviceId = DeviceId(3);

pub const BAD_OPTION: &str = "--bogus";
pub const LIBRARY_OPTION: &str = "-create-library";

#[derive(Debug, Default)]
pub struct MockToolchain {
    calls: Mutex<Vec<String>>,
}

impl MockToolchain {
    /// Calls made so far, as `compile <target>` / `link <target>`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Toolchain for MockToolchain {
    fn compile(&self, req: &CompileRequest<'_>) -> Result<ToolOutput, ToolFailure> {
        self.record(format!("compile {}", req.target));
        if req.options.contains(BAD_OPTION) {
            return Err(ToolFailure::invalid_options(format!(
                "error: unknown option '{BAD_OPTION}'\n"
            )));
        }

        let mut log = String::new();
        let mut symbols = Vec::new();
        let declare = |symbols: &mut Vec<Symbol>, name: &str| {
            symbols.push(Symbol {
                name: name.trim().to_owned(),
                section: 0,
                offset: 16 * symbols.len() as u32,
                args: vec![Argument::new(ArgKind::Global, 8, 8)],
            });
        };
        for line in req.source.lines().map(str::trim) {
            if let Some(name) = line.strip_prefix("kernel ") {
                declare(&mut symbols, name);
            } else if let Some(header) = line.strip_prefix("#include ") {
                let header = header.trim_matches('"');
                // Headers may only declare kernels.
                match req.headers.iter().find(|(name, _)| name == header) {
                    Some((_, text)) => text
                        .lines()
                        .filter_map(|l| l.trim().strip_prefix("kernel "))
                        .for_each(|name| declare(&mut symbols, name)),
                    None => {
                        log.push_str(&format!("error: '{header}' file not found\n"));
                        return Err(ToolFailure::failed(log));
                    }
                }
            } else if let Some(text) = line.strip_prefix("#warning ") {
                log.push_str(&format!("warning: {text}\n"));
            } else if let Some(text) = line.strip_prefix("#error ") {
                log.push_str(&format!("error: {text}\n"));
                return Err(ToolFailure::failed(log));
            }
        }

        let section = Section::new(
            0,
            SectionKind::TextIntermediate,
            req.source.as_bytes().to_vec(),
        );
        Ok(ToolOutput {
            module: Module {
                symbols,
                sections: vec![section],
            },
            log,
        })
    }

    fn link(&self, req: &LinkRequest<'_>) -> Result<ToolOutput, ToolFailure> {
        self.record(format!("link {}", req.target));
        let mut log = req.log_seed.to_owned();
        if req.options.contains(BAD_OPTION) {
            log.push_str(&format!("error: unknown option '{BAD_OPTION}'\n"));
            return Err(ToolFailure::invalid_options(log));
        }
        if req.modules.iter().any(Module::is_empty) {
            log.push_str("error: empty input module\n");
            return Err(ToolFailure::failed(log));
        }

        let kind = if req.options.contains(LIBRARY_OPTION) {
            SectionKind::TextLibrary
        } else {
            SectionKind::TextExecutable
        };
        let symbols = req
            .modules
            .iter()
            .flat_map(|m| m.symbols.iter().cloned())
            .map(|s| Symbol { section: 0, ..s })
            .collect();
        let data = req
            .modules
            .iter()
            .flat_map(|m| m.sections.iter().flat_map(|s| s.data.iter().copied()))
            .collect();
        log.push_str(&format!("linked {} modules\n", req.modules.len()));

        Ok(ToolOutput {
            module: Module {
                symbols,
                sections: vec![Section::new(0, kind, data)],
            },
            log,
        })
    }
}

/// D1 and D2 take text IR, D3 takes bitcode; one mock serves both.
pub fn context() -> (Arc<Context>, Arc<MockToolchain>) {
    let mock = Arc::new(MockToolchain::default());
    let ctx = Context::new([
        Device::new(D1, "cpu0", IrKind::Text, "x86_64-pc-linux"),
        Device::new(D2, "cpu1", IrKind::Text, "aarch64-linux"),
        Device::new(D3, "gpu0", IrKind::Bitcode, "amdgcn--"),
    ])
    .with_toolchain(IrKind::Text, mock.clone())
    .with_toolchain(IrKind::Bitcode, mock.clone());
    (Arc::new(ctx), mock)
}

/// A context without any toolchain registered.
pub fn bare_context() -> Arc<Context> {
    Arc::new(Context::new([Device::new(D1, "cpu0", IrKind::Text, "x86_64-pc-linux")]))
}

pub fn executable(names: &[&str]) -> Module {
    Module {
        symbols: names
            .iter()
            .enumerate()
            .map(|(i, name)| Symbol {
                name: (*name).to_owned(),
                section: 0,
                offset: 16 * i as u32,
                args: Vec::new(),
            })
            .collect(),
        sections: vec![Section::new(0, SectionKind::TextExecutable, vec![0x90; 4])],
    }
}

pub fn library(names: &[&str]) -> Module {
    let mut module = executable(names);
    module.sections[0].kind = SectionKind::TextLibrary;
    module
}
