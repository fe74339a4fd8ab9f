//! Byte-level layout of immediates and the errors malformed streams produce.

use hhbc::Error;
use hhbc::bytecode::subop::SetOpOp;
use hhbc::bytecode::{
    Emitter, Imm, InstrIter, Op, RatTag, SubopKind, decode_variable_size_imm, encode_iva,
    encode_variable_size_imm, get_imm, get_imms, imm_offset, imm_size, instr_len,
    instr_to_string,
};

#[test]
fn test_small_iva_is_one_byte() {
    let mut out = Vec::new();
    encode_iva(5, &mut out);
    assert_eq!(out, [0b0000_1010]);
    assert_eq!(decode_variable_size_imm(&out, 0).unwrap(), (5, 1));
}

#[test]
fn test_large_iva_is_tagged_word() {
    let mut buf = [0u8; 4];
    assert_eq!(encode_variable_size_imm(200, &mut buf), 4);
    assert_eq!(buf, 401u32.to_le_bytes());
    assert_eq!(decode_variable_size_imm(&buf, 0).unwrap(), (200, 4));
}

#[test]
fn test_iva_width_boundary() {
    let mut out = Vec::new();
    encode_iva(127, &mut out);
    encode_iva(128, &mut out);
    assert_eq!(out.len(), 5);
    assert_eq!(decode_variable_size_imm(&out, 0).unwrap(), (127, 1));
    assert_eq!(decode_variable_size_imm(&out, 1).unwrap(), (128, 4));
}

#[test]
#[should_panic(expected = "out of range")]
fn test_iva_above_max_panics() {
    let mut buf = [0u8; 4];
    encode_variable_size_imm(1 << 31, &mut buf);
}

#[test]
fn test_immediate_offsets_and_sizes() {
    // IterInitK I:1 <off> L:2 L:300
    let mut e = Emitter::new();
    e.op(Op::IterInitK).iter(1).offset(-12).local(2).local(300);
    let bytes = e.finish();

    assert_eq!(instr_len(&bytes, 0).unwrap(), 1 + 1 + 4 + 1 + 4);
    let offsets: Vec<_> = (0..4).map(|i| imm_offset(&bytes, 0, i).unwrap()).collect();
    assert_eq!(offsets, [1, 2, 6, 7]);
    let sizes: Vec<_> = (0..4).map(|i| imm_size(&bytes, 0, i).unwrap()).collect();
    assert_eq!(sizes, [1, 4, 1, 4]);
    assert_eq!(get_imm(&bytes, 0, 1).unwrap(), Imm::Offset(-12));
    assert_eq!(get_imm(&bytes, 0, 3).unwrap(), Imm::Local(300));
}

#[test]
fn test_fixed_immediates_are_little_endian() {
    let mut e = Emitter::new();
    e.op(Op::Int).int64(0x0102_0304_0506_0708);
    let bytes = e.finish();
    assert_eq!(&bytes[1..], &[8, 7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn test_truncated_instruction() {
    let mut e = Emitter::new();
    e.op(Op::Int).int64(42);
    let bytes = e.finish();
    let err = instr_len(&bytes[..5], 0).unwrap_err();
    assert!(matches!(err, Error::Truncated { offset: 1, .. }), "{err}");
    assert!(matches!(instr_len(&[], 0), Err(Error::Truncated { .. })));
}

#[test]
fn test_invalid_opcode_bytes() {
    assert_eq!(
        instr_len(&[Op::LowInvalid as u8], 0),
        Err(Error::InvalidOpcode { offset: 0, byte: 0 })
    );
    assert!(matches!(
        instr_len(&[0xff], 0),
        Err(Error::InvalidOpcode { byte: 0xff, .. })
    ));
}

#[test]
fn test_unknown_subop_byte_passes_every_layer() {
    let mut e = Emitter::new();
    e.op(Op::SetOpL).local(0).subop(SetOpOp::PlusEqual);
    let mut bytes = e.finish();
    *bytes.last_mut().unwrap() = 200;

    assert_eq!(instr_len(&bytes, 0), Ok(3));
    assert_eq!(get_imm(&bytes, 0, 1), Ok(Imm::Subop(SubopKind::SetOp, 200)));
    assert_eq!(instr_to_string(&bytes, 0, None).unwrap(), "SetOpL L:0 ?200");
    // Checked emission still only accepts named sub-operators.
    let (op, imms) = get_imms(&bytes, 0).unwrap();
    assert!(matches!(
        Emitter::new().instr(op, &imms),
        Err(Error::ImmediateMismatch { idx: 1, .. })
    ));
}

#[test]
fn test_sizing_rejects_what_decoding_rejects() {
    let int_with_array = RatTag::Int as u8 | 0x80;
    let mut empty_member_vector = vec![Op::CGetM as u8];
    empty_member_vector.extend_from_slice(&0i32.to_le_bytes());
    empty_member_vector.extend_from_slice(&0i32.to_le_bytes());
    let streams = [
        vec![Op::AssertRATL as u8, 0, int_with_array, 0, 0, 0, 0],
        vec![Op::AssertRATStk as u8, 0, 0x7f],
        empty_member_vector,
    ];
    for bytes in &streams {
        let sized = instr_len(bytes, 0).unwrap_err();
        let op = Op::from_u8(bytes[0]).unwrap();
        let idx = op.num_immediates() - 1;
        assert_eq!(get_imm(bytes, 0, idx).unwrap_err(), sized, "{op}");
        assert_eq!(instr_to_string(bytes, 0, None).unwrap_err(), sized, "{op}");
        assert!(InstrIter::new(bytes).next().unwrap().is_err(), "{op}");
    }
}

#[test]
fn test_negative_vector_length() {
    let mut bytes = vec![Op::Switch as u8];
    bytes.extend_from_slice(&(-1i32).to_le_bytes());
    assert!(matches!(
        instr_len(&bytes, 0),
        Err(Error::NegativeLength { length: -1, .. })
    ));
}

#[test]
fn test_checked_emit_rejects_mismatched_immediates() {
    let mut e = Emitter::new();
    assert_eq!(
        e.instr(Op::IsTypeL, &[Imm::Local(0)]).unwrap_err(),
        Error::ImmediateCount {
            op: "IsTypeL",
            expected: 2,
            found: 1,
        }
    );
    assert!(matches!(
        e.instr(Op::IsTypeL, &[Imm::Iva(0), Imm::Subop(SubopKind::IsType, 3)]),
        Err(Error::ImmediateMismatch { idx: 0, found: "IVA", .. })
    ));
    assert!(e.as_bytes().is_empty());
    e.instr(Op::IsTypeL, &[Imm::Local(0), Imm::Subop(SubopKind::IsType, 3)])
        .unwrap();
    assert_eq!(e.as_bytes().len(), 3);
}
