//! Codec error types.

use thiserror::Error;

/// Errors that can occur while decoding a module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input ended before a field or declared length was complete.
    #[error("unexpected end of input at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: usize, needed: usize },

    /// An enumerated field held a value outside its declared range.
    #[error("unknown {field} value {value}")]
    UnknownDiscriminant { field: &'static str, value: u32 },

    /// A symbol name was not valid UTF-8.
    #[error("invalid UTF-8 in symbol name")]
    InvalidUtf8,

    /// A symbol referenced a section index the module does not have.
    #[error("symbol `{symbol}` references section {section}, module has {count}")]
    DanglingSection {
        symbol: String,
        section: u32,
        count: usize,
    },
}

/// Decode result type alias.
pub type DecodeResult<T> = Result<T, DecodeError>;
