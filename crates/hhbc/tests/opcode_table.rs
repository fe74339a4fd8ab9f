//! Invariants of the opcode table that other components rely on.
//!
//! Several predicates are ordinal ranges over the declaration list. Each is
//! checked here against the set of opcodes it is meant to cover, so that a
//! reordered or inserted row shows up as a test failure.

use std::collections::{BTreeSet, HashSet};

use hhbc::bytecode::{ArgType, InstrFlags, Op, StackSpec};

fn members(pred: impl Fn(Op) -> bool) -> BTreeSet<Op> {
    Op::valid().filter(|&op| pred(op)).collect()
}

fn set(ops: &[Op]) -> BTreeSet<Op> {
    ops.iter().copied().collect()
}

#[test]
fn test_is_jmp_range() {
    assert_eq!(
        members(Op::is_jmp),
        set(&[Op::Jmp, Op::JmpNS, Op::JmpZ, Op::JmpNZ])
    );
    assert_eq!(members(Op::is_unconditional_jmp), set(&[Op::Jmp, Op::JmpNS]));
    assert_eq!(members(Op::is_conditional_jmp), set(&[Op::JmpZ, Op::JmpNZ]));
}

#[test]
fn test_fpush_ranges() {
    assert_eq!(
        members(Op::is_fpush),
        set(&[
            Op::FPushFunc,
            Op::FPushFuncD,
            Op::FPushFuncU,
            Op::FPushObjMethod,
            Op::FPushObjMethodD,
            Op::FPushClsMethod,
            Op::FPushClsMethodF,
            Op::FPushClsMethodD,
            Op::FPushCtor,
            Op::FPushCtorD,
            Op::FPushCufIter,
            Op::FPushCuf,
            Op::FPushCufF,
            Op::FPushCufSafe,
        ])
    );
    assert_eq!(
        members(Op::is_fpush_func),
        set(&[Op::FPushFunc, Op::FPushFuncD, Op::FPushFuncU])
    );
    assert_eq!(
        members(Op::is_fpush_cls_method),
        set(&[Op::FPushClsMethod, Op::FPushClsMethodF, Op::FPushClsMethodD])
    );
    assert_eq!(
        members(Op::is_fpush_cuf),
        set(&[Op::FPushCufIter, Op::FPushCuf, Op::FPushCufF, Op::FPushCufSafe])
    );
    assert_eq!(members(Op::is_fpush_ctor), set(&[Op::FPushCtor, Op::FPushCtorD]));
    assert_eq!(members(Op::pushes_act_rec), members(Op::is_fpush));
}

#[test]
fn test_fpush_name_prefix_matches_range() {
    let by_name = members(|op| op.name().starts_with("FPush"));
    assert_eq!(by_name, members(Op::is_fpush));
}

#[test]
fn test_fpass_and_fcall_sets() {
    let fpass = members(Op::is_fpass_star);
    assert!(fpass.iter().all(|op| op.name().starts_with("FPass")));
    assert!(!fpass.contains(&Op::FPassVNop));
    assert_eq!(
        members(Op::is_fcall_star),
        set(&[Op::FCall, Op::FCallD, Op::FCallArray, Op::FCallUnpack])
    );
    // Every call-frame reader is a pass or a call.
    for op in members(Op::reads_current_fpi) {
        assert!(
            op.name().starts_with("FPass") || op.is_fcall_star(),
            "{op} reads the call frame"
        );
    }
}

#[test]
fn test_names_are_unique() {
    let mut seen = HashSet::new();
    for op in Op::valid() {
        assert!(seen.insert(op.name()), "duplicate mnemonic {op}");
    }
    assert_eq!(seen.len(), Op::COUNT - 2);
}

#[test]
fn test_opcode_bytes_round_trip() {
    for op in Op::valid() {
        assert_eq!(Op::from_u8(op as u8), Some(op));
        assert_eq!(Op::from_name(op.name()), Some(op));
    }
    assert_eq!(Op::from_u8(Op::LowInvalid as u8), Some(Op::LowInvalid));
    assert!(!Op::LowInvalid.is_valid());
}

#[test]
fn test_branch_immediates_imply_control_flow() {
    for op in Op::valid() {
        if op.imm_index(ArgType::Ba).is_some() || op.is_switch() {
            assert!(op.is_control_flow(), "{op} branches but is not CF");
        }
        if op.has_conditional_branch() {
            assert!(op.is_control_flow(), "{op}");
            assert!(op.allows_fall_thru(), "{op}");
            assert!(op.imm_index(ArgType::Ba).is_some(), "{op}");
        }
    }
}

#[test]
fn test_flag_shorthands() {
    assert_eq!(InstrFlags::CF_TF.bits(), 3);
    assert_eq!(InstrFlags::CF_FF.bits(), 6);
    assert!(InstrFlags::CF_FF.contains(InstrFlags::FF));
    assert_eq!(Op::FCall.flags(), InstrFlags::CF_FF);
    assert_eq!(Op::Nop.flags(), InstrFlags::NF);
}

#[test]
fn test_non_call_control_flow_excludes_resumable_ops() {
    let excluded = set(&[
        Op::FCall,
        Op::FCallD,
        Op::FCallArray,
        Op::FCallUnpack,
        Op::Incl,
        Op::InclOnce,
        Op::Req,
        Op::ReqOnce,
        Op::ReqDoc,
        Op::Eval,
        Op::CreateCont,
        Op::ContEnter,
        Op::ContRaise,
        Op::Yield,
        Op::YieldK,
        Op::Await,
    ]);
    for op in Op::valid() {
        let expected = op.is_control_flow() && !excluded.contains(&op);
        assert_eq!(op.is_non_call_control_flow(), expected, "{op}");
    }
    assert!(!Op::FCallBuiltin.is_control_flow());
}

#[test]
fn test_runtime_count_inputs_have_count_immediate() {
    for op in Op::valid() {
        let info = op.info();
        match info.inputs {
            StackSpec::CMany | StackSpec::FMany | StackSpec::CvuMany | StackSpec::MFinal => {
                assert_eq!(info.imms.first(), Some(&ArgType::Iva), "{op}");
            }
            StackSpec::SMany => assert!(op.imm_index(ArgType::Vsa).is_some(), "{op}"),
            StackSpec::MMany | StackSpec::CMMany | StackSpec::VMMany | StackSpec::RMMany => {
                assert!(op.imm_index(ArgType::Ma).is_some(), "{op}");
            }
            StackSpec::Fixed(_) | StackSpec::InsertMid(..) => {}
        }
        assert!(
            info.outputs.fixed_count().is_some(),
            "{op} has a variable output count"
        );
    }
}

#[test]
fn test_member_classification() {
    assert_eq!(members(Op::is_member_base_op), set(&[Op::BaseL, Op::BaseH]));
    assert_eq!(
        members(Op::is_member_dim_op),
        set(&[Op::DimL, Op::DimC, Op::DimInt, Op::DimStr])
    );
    assert_eq!(
        members(Op::is_member_final_op),
        set(&[Op::QueryML, Op::QueryMC, Op::QueryMInt, Op::QueryMStr])
    );
    assert_eq!(
        members(Op::is_type_assert),
        set(&[Op::AssertRATL, Op::AssertRATStk])
    );
    assert_eq!(members(Op::is_ret), set(&[Op::RetC, Op::RetV]));
    assert!(Op::NativeImpl.is_returnish());
}
