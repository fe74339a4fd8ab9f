//! Member vectors as the interpreter and compiler see them: decoding, stack
//! accounting and the per-instruction attribute table.

use proptest::prelude::*;

use hhbc::bytecode::member::{LocationCode, MemberCode, get_m_instr_info, m_vector_stack_vals};
use hhbc::bytecode::{
    Emitter, Flavor, LastMember, MInstr, MInstrAttr, MemberVector, Op, get_imm_vector,
    get_m_location, get_m_vector, instr_input_flavor, instr_num_pops,
};
use hhbc::{Error, Unit};

fn emit(op: Op, vec: &MemberVector) -> Vec<u8> {
    let mut e = Emitter::new();
    e.op(op).member_vector(vec);
    e.finish()
}

fn member_vector() -> impl Strategy<Value = MemberVector> {
    let location = proptest::sample::select(LocationCode::ALL.to_vec());
    let step = (proptest::sample::select(MemberCode::ALL.to_vec()), 0i64..5000);
    (location, 0u32..1000, proptest::collection::vec(step, 0..6)).prop_map(
        |(lc, imm, steps)| {
            let base = if lc.num_imms() == 1 {
                MemberVector::with_imm(lc, imm)
            } else {
                MemberVector::new(lc)
            };
            steps
                .into_iter()
                .fold(base, |vec, (mc, imm)| vec.push(mc, imm))
        },
    )
}

proptest! {
    #[test]
    fn decoded_vector_matches_emitted(vec in member_vector()) {
        let bytes = emit(Op::CGetM, &vec);
        let imm = get_imm_vector(&bytes, 0).unwrap();

        prop_assert!(imm.is_member_vector());
        prop_assert_eq!(imm.num_stack_values(), vec.num_stack());
        prop_assert_eq!(imm.location_code().unwrap(), vec.location());

        let decoded: Vec<(MemberCode, i64)> = get_m_vector(&imm)
            .unwrap()
            .into_iter()
            .map(|item| (item.mcode, item.imm))
            .collect();
        prop_assert_eq!(decoded, vec.members().to_vec());

        let location = get_m_location(&imm).unwrap();
        prop_assert_eq!(location.lcode, vec.location());
        prop_assert_eq!(location.has_imm(), vec.location().num_imms() == 1);
    }

    #[test]
    fn pops_follow_vector_stack_values(vec in member_vector()) {
        let num_stack = vec.num_stack();
        prop_assert_eq!(instr_num_pops(&emit(Op::CGetM, &vec), 0).unwrap(), num_stack);
        prop_assert_eq!(instr_num_pops(&emit(Op::SetM, &vec), 0).unwrap(), num_stack + 1);
        prop_assert_eq!(instr_num_pops(&emit(Op::BindM, &vec), 0).unwrap(), num_stack + 1);
        prop_assert_eq!(instr_num_pops(&emit(Op::UnsetM, &vec), 0).unwrap(), num_stack);
    }

    #[test]
    fn attributes_depend_only_on_codes(
        instr in proptest::sample::select(MInstr::ALL.to_vec()),
        lc in proptest::sample::select(LocationCode::ALL.to_vec()),
        mc in proptest::sample::select(MemberCode::ALL.to_vec()),
    ) {
        let info = instr.info();
        prop_assert_eq!(info.instr(), instr);
        prop_assert_eq!(info.base_attr(lc), instr.info().base_attr(lc));
        prop_assert_eq!(info.base_attr(lc), info.base_attr(LocationCode::L));
        prop_assert!(MInstrAttr::BASE.contains(info.base_attr(lc)));
        let limit = if mc.is_prop() {
            MInstrAttr::INTERMEDIATE_PROP
        } else {
            MInstrAttr::INTERMEDIATE
        };
        prop_assert!(limit.contains(info.member_attr(mc)));
        prop_assert!(MInstrAttr::FINAL.contains(info.final_attr()));
    }
}

#[test]
fn test_reads_never_define() {
    for instr in [MInstr::CGet, MInstr::Isset, MInstr::Empty] {
        let info = instr.info();
        for lc in LocationCode::ALL {
            assert!(!info.base_attr(lc).contains(MInstrAttr::DEFINE), "{instr:?}");
        }
        for mc in MemberCode::ALL {
            assert!(!info.member_attr(mc).contains(MInstrAttr::DEFINE), "{instr:?}");
        }
        assert!(info.final_get());
        assert!(!info.new_elem());
        assert_eq!(info.val_count(), 0);
    }
}

#[test]
fn test_writes_define_and_take_values() {
    let set = get_m_instr_info(Op::SetM).unwrap();
    assert!(set.base_attr(LocationCode::L).contains(MInstrAttr::DEFINE));
    assert!(set.new_elem());
    assert!(!set.final_get());
    assert_eq!(set.val_count(), 1);
    assert_eq!(set.new_elem_op(), "SetNewElem");

    let unset = get_m_instr_info(Op::UnsetM).unwrap();
    assert!(unset.member_attr(MemberCode::EC).contains(MInstrAttr::UNSET));
    assert_eq!(unset.base_suffix(), "");
    assert_eq!(unset.intermediate_suffix(), "U");

    // Props never get a reference taken to them mid-path.
    let bind = get_m_instr_info(Op::BindM).unwrap();
    assert!(bind.member_attr(MemberCode::EC).contains(MInstrAttr::REFFY));
    assert!(!bind.member_attr(MemberCode::PT).contains(MInstrAttr::REFFY));

    assert!(get_m_instr_info(Op::FPassM).is_none());
    assert!(get_m_instr_info(Op::Nop).is_none());
}

#[test]
fn test_input_flavors_of_member_instructions() {
    // SetM $x->y[<cell>] = <cell>: RHS on top, then the key, then nothing for
    // the local base.
    let vec = MemberVector::with_imm(LocationCode::L, 0)
        .prop_cell()
        .elem_cell();
    let bytes = emit(Op::SetM, &vec);
    assert_eq!(instr_num_pops(&bytes, 0).unwrap(), 3);
    for idx in 0..3 {
        assert_eq!(instr_input_flavor(&bytes, 0, idx).unwrap(), Flavor::Cv);
    }

    // A class-ref base takes its class from the deepest slot.
    let vec = MemberVector::with_imm(LocationCode::SL, 1);
    let bytes = emit(Op::CGetM, &vec);
    assert_eq!(instr_num_pops(&bytes, 0).unwrap(), 1);
    assert_eq!(instr_input_flavor(&bytes, 0, 0).unwrap(), Flavor::Av);

    let vec = MemberVector::new(LocationCode::R).prop_str(0);
    let bytes = emit(Op::CGetM, &vec);
    assert_eq!(instr_input_flavor(&bytes, 0, 0).unwrap(), Flavor::Rv);
}

#[test]
fn test_stack_value_counts() {
    assert_eq!(m_vector_stack_vals(LocationCode::L, &[]), 0);
    assert_eq!(
        m_vector_stack_vals(LocationCode::SC, &[MemberCode::EC, MemberCode::PT]),
        3
    );
    assert_eq!(
        m_vector_stack_vals(LocationCode::NC, &[MemberCode::PL, MemberCode::W]),
        1
    );
}

#[test]
fn test_last_member_classification() {
    let mut unit = Unit::new();
    let x = unit.merge_litstr("x");

    let vec = MemberVector::with_imm(LocationCode::L, 0).elem_int(1).prop_str(x);
    let bytes = emit(Op::CGetM, &vec);
    let imm = get_imm_vector(&bytes, 0).unwrap();
    assert_eq!(
        imm.decode_last_member(&unit),
        LastMember::Literal {
            mcode: MemberCode::PT,
            str_id: x,
            value: "x",
        }
    );

    let vec = MemberVector::with_imm(LocationCode::L, 0).prop_str(x).elem_int(3);
    let bytes = emit(Op::CGetM, &vec);
    let imm = get_imm_vector(&bytes, 0).unwrap();
    assert_eq!(imm.decode_last_member(&unit), LastMember::NotLiteral(MemberCode::EI));

    // Unknown string id.
    let vec = MemberVector::new(LocationCode::H).elem_str(99);
    let bytes = emit(Op::CGetM, &vec);
    let imm = get_imm_vector(&bytes, 0).unwrap();
    assert_eq!(imm.decode_last_member(&unit), LastMember::Invalid);

    // No member steps at all.
    let vec = MemberVector::new(LocationCode::H);
    let bytes = emit(Op::CGetM, &vec);
    let imm = get_imm_vector(&bytes, 0).unwrap();
    assert!(matches!(
        imm.find_last_member(),
        Err(Error::EmptyMemberVector { .. })
    ));
    assert_eq!(imm.decode_last_member(&unit), LastMember::Invalid);
}

#[test]
fn test_find_last_member_offset() {
    let vec = MemberVector::with_imm(LocationCode::L, 2)
        .elem_local(4)
        .new_elem();
    let bytes = emit(Op::SetM, &vec);
    let imm = get_imm_vector(&bytes, 0).unwrap();
    let last = imm.find_last_member().unwrap();
    assert_eq!(last, imm.end() - 1);
    assert_eq!(bytes[last], MemberCode::W as u8);
}
