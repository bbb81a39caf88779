//! The module container and its record types.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DecodeError, DecodeResult};
use crate::wire::{wire_len, Reader, Sink, Wire, Writer};

/// Declares a `u32`-backed enum with its wire discriminants.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $field:literal { $($variant:ident = $value:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant = $value,)+
        }

        impl $name {
            /// Map a raw discriminant back to a variant.
            pub fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl Wire for $name {
            const MIN_ENCODED_LEN: usize = 4;

            fn encode<S: Sink>(&self, sink: &mut S) {
                sink.put_u32(*self as u32);
            }

            fn decode(r: &mut Reader<'_>) -> DecodeResult<Self> {
                let value = r.read_u32()?;
                Self::from_u32(value).ok_or(DecodeError::UnknownDiscriminant {
                    field: $field,
                    value,
                })
            }
        }
    };
}

wire_enum! {
    /// What a section holds.
    SectionKind as "section kind" {
        TextIntermediate = 0,
        TextLibrary = 1,
        TextExecutable = 2,
        DataConstant = 3,
        DataGlobal = 4,
        DataLocal = 5,
        DataPrivate = 6,
    }
}

wire_enum! {
    /// Address space or object class of a kernel argument.
    ArgKind as "argument kind" {
        Scalar = 0,
        Constant = 1,
        Global = 2,
        Local = 3,
        Image2dRd = 4,
        Image2dWr = 5,
        Image3dRd = 6,
        Image3dWr = 7,
        Sampler = 8,
    }
}

wire_enum! {
    /// How a scalar argument narrower than its slot is widened.
    ExtType as "extension type" {
        ZeroExt = 0,
        SignExt = 1,
    }
}

wire_enum! {
    /// Implicit arguments the runtime fills in itself.
    ArgSemantic as "argument semantic" {
        General = 0,
        GridDimension = 1,
        GridOffset = 2,
        ImageSize = 3,
        ImageFormat = 4,
    }
}

/// A raw code or data section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: u32,
    pub kind: SectionKind,
    /// Byte length of `data`, stored explicitly on the wire.
    pub size: u32,
    pub data: Vec<u8>,
}

impl Section {
    /// Create a section whose `size` matches `data`.
    ///
    /// # Panics
    ///
    /// Panics if `data` is longer than `u32::MAX` bytes.
    pub fn new(id: u32, kind: SectionKind, data: Vec<u8>) -> Self {
        Self {
            id,
            kind,
            size: wire_len(data.len()),
            data,
        }
    }
}

impl Wire for Section {
    // id, kind, size, data length
    const MIN_ENCODED_LEN: usize = 16;

    fn encode<S: Sink>(&self, sink: &mut S) {
        self.id.encode(sink);
        self.kind.encode(sink);
        self.size.encode(sink);
        sink.put_blob(&self.data);
    }

    fn decode(r: &mut Reader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            id: u32::decode(r)?,
            kind: SectionKind::decode(r)?,
            size: u32::decode(r)?,
            data: r.read_blob()?.to_vec(),
        })
    }
}

/// Calling-convention shape of one kernel parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub kind: ArgKind,
    /// Size of the argument as the API sees it.
    pub size: u32,
    /// Size of the argument slot on the device.
    pub target_size: u32,
    pub target_align: u32,
    pub ext: ExtType,
    pub semantic: ArgSemantic,
}

impl Argument {
    /// A general-purpose argument with matching host and target size.
    pub fn new(kind: ArgKind, size: u32, target_align: u32) -> Self {
        Self {
            kind,
            size,
            target_size: size,
            target_align,
            ext: ExtType::ZeroExt,
            semantic: ArgSemantic::General,
        }
    }
}

impl Wire for Argument {
    const MIN_ENCODED_LEN: usize = 24;

    fn encode<S: Sink>(&self, sink: &mut S) {
        self.kind.encode(sink);
        self.size.encode(sink);
        self.target_size.encode(sink);
        self.target_align.encode(sink);
        self.ext.encode(sink);
        self.semantic.encode(sink);
    }

    fn decode(r: &mut Reader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            kind: ArgKind::decode(r)?,
            size: u32::decode(r)?,
            target_size: u32::decode(r)?,
            target_align: u32::decode(r)?,
            ext: ExtType::decode(r)?,
            semantic: ArgSemantic::decode(r)?,
        })
    }
}

/// A kernel entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    /// Index into the owning module's sections.
    pub section: u32,
    /// Entry offset within that section.
    pub offset: u32,
    pub args: Vec<Argument>,
}

impl Wire for Symbol {
    // name length, section, offset, arg count
    const MIN_ENCODED_LEN: usize = 16;

    fn encode<S: Sink>(&self, sink: &mut S) {
        self.name.encode(sink);
        self.section.encode(sink);
        self.offset.encode(sink);
        self.args.encode(sink);
    }

    fn decode(r: &mut Reader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            name: String::decode(r)?,
            section: u32::decode(r)?,
            offset: u32::decode(r)?,
            args: Vec::decode(r)?,
        })
    }
}

/// A self-contained compiled artifact: kernel symbols plus raw sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Kernel entry points, in listing order.
    pub symbols: Vec<Symbol>,
    pub sections: Vec<Section>,
}

impl Wire for Module {
    const MIN_ENCODED_LEN: usize = 8;

    fn encode<S: Sink>(&self, sink: &mut S) {
        self.symbols.encode(sink);
        self.sections.encode(sink);
    }

    fn decode(r: &mut Reader<'_>) -> DecodeResult<Self> {
        let module = Self {
            symbols: Vec::decode(r)?,
            sections: Vec::decode(r)?,
        };
        module.check_section_refs()?;
        Ok(module)
    }
}

impl Module {
    /// Create an empty module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode the module into a fresh buffer.
    ///
    /// # Panics
    ///
    /// Panics if any string, blob or vector is too long for its `u32`
    /// length prefix.
    pub fn serialize(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(self.size());
        self.serialize_into(&mut w);
        w.into_vec()
    }

    /// Append the encoded module to `w`.
    pub fn serialize_into(&self, w: &mut Writer) {
        self.encode(w);
    }

    /// Decode a module from `bytes`. Bytes after the module are ignored.
    pub fn deserialize(bytes: &[u8]) -> DecodeResult<Self> {
        let mut r = Reader::new(bytes);
        let module = Self::decode(&mut r)?;
        tracing::trace!(
            consumed = r.offset(),
            trailing = r.remaining(),
            symbols = module.symbols.len(),
            sections = module.sections.len(),
            "module decoded"
        );
        Ok(module)
    }

    /// Exact length of [`Module::serialize`]'s output.
    pub fn size(&self) -> usize {
        self.encoded_len()
    }

    /// True when the module holds no sections, i.e. nothing was built.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Whether any section has the given kind.
    pub fn has_section_kind(&self, kind: SectionKind) -> bool {
        self.sections.iter().any(|s| s.kind == kind)
    }

    /// Look up the section a symbol lives in.
    pub fn section_of(&self, symbol: &Symbol) -> Option<&Section> {
        self.sections.get(symbol.section as usize)
    }

    /// Kernel names in listing order.
    pub fn kernel_names(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(|s| s.name.as_str())
    }

    /// Hex-encoded SHA-256 of the serialized module.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.serialize());
        hash.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn check_section_refs(&self) -> DecodeResult<()> {
        let count = self.sections.len();
        match self
            .symbols
            .iter()
            .find(|s| s.section as usize >= count)
        {
            Some(s) => Err(DecodeError::DanglingSection {
                symbol: s.name.clone(),
                section: s.section,
                count,
            }),
            None => Ok(()),
        }
    }
}
