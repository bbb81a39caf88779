//! Kiln module container.
//!
//! A [`Module`] carries the output of a kernel toolchain: one [`Symbol`] per
//! kernel entry point (with its [`Argument`] layout) and the raw
//! [`Section`]s holding code and data. The payloads are opaque here; this
//! crate only defines the container and its binary encoding.
//!
//! ## Encoding
//!
//! ```text
//! Module   = symbols: [Symbol], sections: [Section]
//! Symbol   = name: str, section: u32, offset: u32, args: [Argument]
//! Argument = kind, size, target_size, target_align, ext, semantic   (all u32)
//! Section  = id: u32, kind: u32, size: u32, data: bytes
//! ```
//!
//! There is no header or version field. See [`wire`] for the primitive
//! encodings.

pub mod error;
pub mod module;
pub mod wire;

pub use error::{DecodeError, DecodeResult};
pub use module::{
    ArgKind, ArgSemantic, Argument, ExtType, Module, Section, SectionKind, Symbol,
};
pub use wire::{wire_len, Reader, Sink, SizeCounter, Wire, Writer};
