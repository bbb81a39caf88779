//! Wire encoding primitives.
//!
//! Every record type implements [`Wire`] by hand, listing its fields in
//! declaration order. Encoding goes through a [`Sink`]: [`Writer`] appends
//! bytes, [`SizeCounter`] only accumulates lengths. Because both walk the
//! same `encode` body, a module's reported size always equals the length
//! of its serialized form.
//!
//! ```text
//! scalar        u32, native-endian
//! byte vector   u32 count, then count raw bytes
//! string        u32 byte length, then raw bytes (no terminator)
//! record vector u32 count, then each record encoded in turn
//! ```

use std::mem;

use crate::error::{DecodeError, DecodeResult};

/// Convert a count or byte length to its `u32` wire form.
///
/// # Panics
///
/// Panics if `len` exceeds `u32::MAX`; such a value has no encoding.
pub fn wire_len(len: usize) -> u32 {
    match u32::try_from(len) {
        Ok(len) => len,
        Err(_) => panic!("length {len} exceeds the u32 wire limit"),
    }
}

/// Destination for encoded fields.
pub trait Sink {
    fn put_u32(&mut self, v: u32);
    fn put_bytes(&mut self, bytes: &[u8]);

    /// Write a `u32` element count. See [`wire_len`] for the limit.
    fn put_len(&mut self, len: usize) {
        self.put_u32(wire_len(len));
    }

    /// Write a length-prefixed byte blob.
    fn put_blob(&mut self, bytes: &[u8]) {
        self.put_len(bytes.len());
        self.put_bytes(bytes);
    }
}

/// A type with a hand-written wire encoding.
pub trait Wire: Sized {
    /// Fewest bytes any encoded value of this type occupies.
    const MIN_ENCODED_LEN: usize;

    fn encode<S: Sink>(&self, sink: &mut S);
    fn decode(r: &mut Reader<'_>) -> DecodeResult<Self>;

    /// Exact number of bytes `encode` produces.
    fn encoded_len(&self) -> usize {
        let mut counter = SizeCounter::new();
        self.encode(&mut counter);
        counter.len()
    }
}

impl Wire for u32 {
    const MIN_ENCODED_LEN: usize = 4;

    fn encode<S: Sink>(&self, sink: &mut S) {
        sink.put_u32(*self);
    }

    fn decode(r: &mut Reader<'_>) -> DecodeResult<Self> {
        r.read_u32()
    }
}

impl Wire for String {
    const MIN_ENCODED_LEN: usize = 4;

    fn encode<S: Sink>(&self, sink: &mut S) {
        sink.put_blob(self.as_bytes());
    }

    fn decode(r: &mut Reader<'_>) -> DecodeResult<Self> {
        let bytes = r.read_blob()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8)
    }
}

impl<T: Wire> Wire for Vec<T> {
    const MIN_ENCODED_LEN: usize = 4;

    fn encode<S: Sink>(&self, sink: &mut S) {
        sink.put_len(self.len());
        for item in self {
            item.encode(sink);
        }
    }

    fn decode(r: &mut Reader<'_>) -> DecodeResult<Self> {
        let count = r.read_u32()? as usize;
        let mut out = Vec::with_capacity(capacity_hint::<T>(count, r.remaining()));
        for _ in 0..count {
            out.push(T::decode(r)?);
        }
        Ok(out)
    }
}

/// Elements to reserve for a declared `count` of `T` with `remaining`
/// input bytes left. The reservation never takes more memory than the
/// input that could back it.
pub(crate) fn capacity_hint<T: Wire>(count: usize, remaining: usize) -> usize {
    let per_element = T::MIN_ENCODED_LEN.max(mem::size_of::<T>()).max(1);
    count.min(remaining / per_element)
}

/// A byte reader with bounds checks.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader over `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Returns the current cursor offset.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left after the cursor.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        let eof = DecodeError::UnexpectedEof {
            offset: self.offset,
            needed: len,
        };
        let end = self.offset.checked_add(len).ok_or_else(|| eof.clone())?;
        let slice = self.bytes.get(self.offset..end).ok_or(eof)?;
        self.offset = end;
        Ok(slice)
    }

    /// Reads a native-endian `u32`.
    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        self.take(len)
    }

    /// Reads a `u32` length followed by that many bytes.
    pub fn read_blob(&mut self) -> DecodeResult<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }
}

/// A simple byte writer.
#[derive(Clone, Debug, Default)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Creates a writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Returns a reference to the written bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the writer and returns the underlying byte buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl Sink for Writer {
    fn put_u32(&mut self, v: u32) {
        self.bytes.extend_from_slice(&v.to_ne_bytes());
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }
}

/// A sink that counts bytes without storing them.
#[derive(Clone, Copy, Debug, Default)]
pub struct SizeCounter {
    len: usize,
}

impl SizeCounter {
    #[must_use]
    pub fn new() -> Self {
        Self { len: 0 }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Sink for SizeCounter {
    fn put_u32(&mut self, _v: u32) {
        self.len += 4;
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        self.len += bytes.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_is_native_endian() {
        let mut w = Writer::new();
        0x0102_0304u32.encode(&mut w);
        assert_eq!(w.as_slice(), &0x0102_0304u32.to_ne_bytes());
    }

    #[test]
    fn string_is_length_prefixed_without_terminator() {
        let mut w = Writer::new();
        "add".to_string().encode(&mut w);
        let bytes = w.into_vec();
        assert_eq!(bytes.len(), 4 + 3);
        assert_eq!(&bytes[..4], &3u32.to_ne_bytes());
        assert_eq!(&bytes[4..], b"add");
    }

    #[test]
    fn vector_of_records_frames_each_element() {
        let v = vec!["a".to_string(), "bc".to_string()];
        assert_eq!(v.encoded_len(), 4 + (4 + 1) + (4 + 2));

        let mut w = Writer::new();
        v.encode(&mut w);
        let mut r = Reader::new(w.as_slice());
        assert_eq!(Vec::<String>::decode(&mut r).unwrap(), v);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn size_counter_matches_writer() {
        let v = vec![1u32, 2, 3];
        let mut w = Writer::new();
        v.encode(&mut w);
        assert_eq!(v.encoded_len(), w.as_slice().len());
        assert!(!SizeCounter { len: 1 }.is_empty());
    }

    #[test]
    fn truncated_scalar_fails() {
        let mut r = Reader::new(&[1, 2, 3]);
        assert_eq!(
            r.read_u32(),
            Err(DecodeError::UnexpectedEof {
                offset: 0,
                needed: 4
            })
        );
    }

    #[test]
    fn blob_length_past_end_fails() {
        let mut bytes = 100u32.to_ne_bytes().to_vec();
        bytes.extend_from_slice(b"short");
        let mut r = Reader::new(&bytes);
        assert!(matches!(
            r.read_blob(),
            Err(DecodeError::UnexpectedEof { offset: 4, needed: 100 })
        ));
    }

    #[test]
    fn declared_count_reserves_no_more_than_the_input() {
        let remaining = 1 << 20;
        let cap = capacity_hint::<String>(u32::MAX as usize, remaining);
        assert!(cap * mem::size_of::<String>() <= remaining);
        assert_eq!(capacity_hint::<u32>(3, remaining), 3);
        assert_eq!(capacity_hint::<u32>(10, 7), 1);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "exceeds the u32 wire limit")]
    fn oversized_length_is_not_truncated() {
        SizeCounter::new().put_len(u32::MAX as usize + 1);
    }

    #[test]
    fn read_bytes_advances_the_cursor() {
        let mut r = Reader::new(b"abcdef");
        assert_eq!(r.read_bytes(2).unwrap(), b"ab");
        assert_eq!(r.offset(), 2);
        assert!(r.read_bytes(5).is_err());
    }

    #[test]
    fn huge_record_count_fails_without_allocating() {
        let bytes = u32::MAX.to_ne_bytes();
        let mut r = Reader::new(&bytes);
        assert!(Vec::<String>::decode(&mut r).is_err());
    }

    #[test]
    fn invalid_utf8_string_fails() {
        let mut w = Writer::new();
        w.put_blob(&[0xff, 0xfe]);
        let mut r = Reader::new(w.as_slice());
        assert_eq!(String::decode(&mut r), Err(DecodeError::InvalidUtf8));
    }
}
