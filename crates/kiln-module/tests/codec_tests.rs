//! Integration tests for the module codec.
//!
//! Tests validate:
//! - Round-trip of realistic multi-kernel modules
//! - `size()` agrees with the serialized length
//! - Truncated input fails at every cut point
//! - Overlong declared lengths fail instead of over-reading
//! - Trailing bytes after a complete module are ignored

use kiln_module::{
    ArgKind, ArgSemantic, Argument, DecodeError, ExtType, Module, Section, SectionKind, Symbol,
    Writer,
};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Two kernels sharing one executable section, plus constant data.
fn two_kernel_module() -> Module {
    let grid_offset = Argument {
        kind: ArgKind::Scalar,
        size: 4,
        target_size: 4,
        target_align: 4,
        ext: ExtType::ZeroExt,
        semantic: ArgSemantic::GridOffset,
    };
    let signed_char = Argument {
        kind: ArgKind::Scalar,
        size: 1,
        target_size: 4,
        target_align: 4,
        ext: ExtType::SignExt,
        semantic: ArgSemantic::General,
    };
    Module {
        symbols: vec![
            Symbol {
                name: "vector_add".into(),
                section: 0,
                offset: 0,
                args: vec![
                    Argument::new(ArgKind::Global, 8, 8),
                    Argument::new(ArgKind::Global, 8, 8),
                    Argument::new(ArgKind::Global, 8, 8),
                    grid_offset,
                ],
            },
            Symbol {
                name: "scale".into(),
                section: 0,
                offset: 256,
                args: vec![Argument::new(ArgKind::Local, 4, 4), signed_char],
            },
        ],
        sections: vec![
            Section::new(0, SectionKind::TextExecutable, (0..=255).collect()),
            Section::new(1, SectionKind::DataConstant, vec![1, 2, 3, 4]),
        ],
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Round trip
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn round_trip_two_kernels() {
    let m = two_kernel_module();
    let bytes = m.serialize();
    assert_eq!(bytes.len(), m.size());

    let back = Module::deserialize(&bytes).expect("decode failed");
    assert_eq!(back, m);
    assert_eq!(
        back.kernel_names().collect::<Vec<_>>(),
        vec!["vector_add", "scale"]
    );
}

#[test]
fn size_matches_hand_computed_layout() {
    let m = two_kernel_module();
    let symbol_bytes = |name: &str, args: usize| 4 + name.len() + 4 + 4 + 4 + args * 24;
    let section_bytes = |data: usize| 4 * 4 + data;
    let expected = 4
        + symbol_bytes("vector_add", 4)
        + symbol_bytes("scale", 2)
        + 4
        + section_bytes(256)
        + section_bytes(4);
    assert_eq!(m.size(), expected);
}

#[test]
fn serialize_into_appends() {
    let m = two_kernel_module();
    let mut w = Writer::new();
    m.serialize_into(&mut w);
    m.serialize_into(&mut w);
    let bytes = w.into_vec();
    assert_eq!(bytes.len(), 2 * m.size());
    assert_eq!(Module::deserialize(&bytes[m.size()..]).unwrap(), m);
}

#[test]
fn redundant_section_size_survives_round_trip() {
    let mut m = Module::new();
    m.sections.push(Section {
        id: 9,
        kind: SectionKind::DataGlobal,
        size: 1000,
        data: vec![7; 3],
    });
    let back = Module::deserialize(&m.serialize()).unwrap();
    assert_eq!(back.sections[0].size, 1000);
    assert_eq!(back.sections[0].data, vec![7; 3]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Malformed input
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn every_truncation_fails() {
    let bytes = two_kernel_module().serialize();
    for cut in 0..bytes.len() {
        let res = Module::deserialize(&bytes[..cut]);
        assert!(
            matches!(res, Err(DecodeError::UnexpectedEof { .. })),
            "cut at {cut} should fail with EOF, got {res:?}"
        );
    }
}

#[test]
fn empty_input_fails() {
    assert!(matches!(
        Module::deserialize(&[]),
        Err(DecodeError::UnexpectedEof { offset: 0, needed: 4 })
    ));
}

#[test]
fn overlong_symbol_count_fails() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1_000_000u32.to_ne_bytes());
    bytes.extend_from_slice(&0u32.to_ne_bytes());
    assert!(Module::deserialize(&bytes).is_err());
}

#[test]
fn overlong_section_data_fails() {
    let mut m = Module::new();
    m.sections
        .push(Section::new(0, SectionKind::TextExecutable, vec![1, 2, 3, 4]));
    let mut bytes = m.serialize();
    // Symbol count, section count, id, kind and size precede the data length.
    let len_at = 4 + 4 + 4 + 4 + 4;
    bytes[len_at..len_at + 4].copy_from_slice(&64u32.to_ne_bytes());
    assert!(matches!(
        Module::deserialize(&bytes),
        Err(DecodeError::UnexpectedEof { needed: 64, .. })
    ));
}

#[test]
fn unknown_argument_semantic_fails() {
    let mut m = two_kernel_module();
    m.symbols.truncate(1);
    m.symbols[0].args.truncate(1);
    let mut bytes = m.serialize();
    // symbol count, name, section, offset, arg count, then five argument words.
    let semantic_at = 4 + (4 + "vector_add".len()) + 4 + 4 + 4 + 5 * 4;
    bytes[semantic_at..semantic_at + 4].copy_from_slice(&42u32.to_ne_bytes());
    assert_eq!(
        Module::deserialize(&bytes),
        Err(DecodeError::UnknownDiscriminant {
            field: "argument semantic",
            value: 42
        })
    );
}

#[test]
fn trailing_bytes_are_ignored() {
    let m = two_kernel_module();
    let mut bytes = m.serialize();
    bytes.extend_from_slice(b"trailer");
    assert_eq!(Module::deserialize(&bytes).unwrap(), m);
}

#[test]
fn decode_error_messages() {
    let err = DecodeError::DanglingSection {
        symbol: "k".into(),
        section: 2,
        count: 1,
    };
    assert_eq!(
        err.to_string(),
        "symbol `k` references section 2, module has 1"
    );
}
