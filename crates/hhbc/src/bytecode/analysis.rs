//! Stack effects and control flow of encoded instructions.
//!
//! Everything here is computed from the instruction stream and the opcode
//! table alone.
//!
//! # Verification boundary
//!
//! Decoding rejects what it can see locally: opcode bytes outside the valid
//! range, unknown repo type tags, immediates that run past the end of the
//! buffer, negative vector lengths, empty member vectors, jumps to a negative
//! offset. [`instr_len`] and `get_imm` reject the same bytes, so every
//! immediate of a stream [`InstrIter`] walks also decodes. Sub-operator bytes
//! are carried through unchecked, and nothing that needs a whole-function
//! view is checked. A verifier must still guarantee, before these results
//! drive execution:
//!
//! * sub-operator bytes name a member of their family;
//! * jump and switch targets land on instruction boundaries inside the
//!   function (targets past the end are returned as-is);
//! * member vectors agree with their header: the declared stack value count
//!   matches the codes, and the steps end exactly at the declared length;
//! * runtime counts (`CMANY`, `FMANY`, ...) do not exceed the stack depth at
//!   that point, so pops never underflow;
//! * local, iterator, string and array ids are in range for the unit.
//!
//! A hostile stream that passes decoding but breaks one of these first goes
//! wrong at [`instr_succ_offsets`] (a target in the middle of an instruction)
//! or [`instr_num_pops`] (a count larger than the stack).

use std::collections::BTreeSet;

use super::imm_vector::{ImmVector, StrVecItem, get_imm_vector};
use super::immediate::{Cursor, Imm, Offset, encoded_imm_size, get_imm};
use super::member::LocationCode;
use super::opcode::{ArgType, Flavor, Op, StackSpec};
use crate::error::{Error, Result};

fn read_op(bytes: &[u8], pc: usize) -> Result<Op> {
    Cursor::new(bytes, pc).read_op()
}

/// Length in bytes of the instruction at `pc`, opcode byte included.
///
/// Immediate widths are taken from their headers; no value is materialized.
/// Fails if the instruction runs past the end of `bytes`.
pub fn instr_len(bytes: &[u8], pc: usize) -> Result<usize> {
    let mut cursor = Cursor::new(bytes, pc);
    let op = cursor.read_op()?;
    for &ty in op.info().imms {
        let size = encoded_imm_size(&cursor, ty)?;
        cursor.skip(size)?;
    }
    Ok(cursor.pos() - pc)
}

fn count_imm(bytes: &[u8], pc: usize, idx: usize) -> Result<usize> {
    let imm = get_imm(bytes, pc, idx)?;
    let value = imm
        .as_u32()
        .unwrap_or_else(|| panic!("immediate {idx} is {imm:?}, not a count"));
    Ok(value as usize)
}

fn member_vector(bytes: &[u8], pc: usize) -> Result<ImmVector<'_>> {
    get_imm_vector(bytes, pc)
}

fn rhs_flavor(spec: StackSpec) -> Option<Flavor> {
    match spec {
        StackSpec::CMMany => Some(Flavor::Cv),
        StackSpec::VMMany => Some(Flavor::Vv),
        StackSpec::RMMany => Some(Flavor::Rv),
        _ => None,
    }
}

/// Stack slots consumed by the instruction at `pc`.
pub fn instr_num_pops(bytes: &[u8], pc: usize) -> Result<usize> {
    let op = read_op(bytes, pc)?;
    let spec = op.info().inputs;
    if let Some(count) = spec.fixed_count() {
        return Ok(count);
    }
    match spec {
        StackSpec::CMany | StackSpec::FMany | StackSpec::CvuMany | StackSpec::MFinal => {
            count_imm(bytes, pc, 0)
        }
        StackSpec::SMany => Ok(get_imm_vector(bytes, pc)?.size()),
        StackSpec::MMany => Ok(member_vector(bytes, pc)?.num_stack_values()),
        StackSpec::CMMany | StackSpec::VMMany | StackSpec::RMMany => {
            Ok(member_vector(bytes, pc)?.num_stack_values() + 1)
        }
        StackSpec::Fixed(_) | StackSpec::InsertMid(..) => unreachable!("fixed input {spec:?}"),
    }
}

/// Stack slots produced by the instruction at `pc`. A value inserted beneath
/// the top of the stack counts as one push.
pub fn instr_num_pushes(bytes: &[u8], pc: usize) -> Result<usize> {
    let op = read_op(bytes, pc)?;
    let spec = op.info().outputs;
    Ok(spec
        .fixed_count()
        .unwrap_or_else(|| unreachable!("{op} has variable outputs {spec:?}")))
}

/// Flavor of input slot `idx`, counted from the top of the stack.
///
/// # Panics
/// If `idx` is not below [`instr_num_pops`].
pub fn instr_input_flavor(bytes: &[u8], pc: usize, idx: usize) -> Result<Flavor> {
    let op = read_op(bytes, pc)?;
    let spec = op.info().inputs;
    let pops = instr_num_pops(bytes, pc)?;
    assert!(idx < pops, "{op} pops {pops} values, asked for input {idx}");
    Ok(match spec {
        StackSpec::Fixed(flavors) => flavors[idx],
        StackSpec::InsertMid(_, flavor) => flavor,
        StackSpec::CMany | StackSpec::SMany | StackSpec::MFinal => Flavor::Cv,
        StackSpec::FMany => Flavor::Fv,
        StackSpec::CvuMany => Flavor::Cvuv,
        StackSpec::MMany | StackSpec::CMMany | StackSpec::VMMany | StackSpec::RMMany => {
            let mut idx = idx;
            if let Some(rhs) = rhs_flavor(spec) {
                if idx == 0 {
                    return Ok(rhs);
                }
                idx -= 1;
            }
            let vec = member_vector(bytes, pc)?;
            if idx + 1 == vec.num_stack_values() {
                match vec.location_code()? {
                    LocationCode::SL | LocationCode::SC => Flavor::Av,
                    LocationCode::R => Flavor::Rv,
                    _ => Flavor::Cv,
                }
            } else {
                Flavor::Cv
            }
        }
    })
}

/// How an instruction rearranges the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackTransInfo {
    /// Pops `pops` values, then pushes `pushes`.
    PushPop { pops: usize, pushes: usize },
    /// Pushes one value beneath the top `pos` cells.
    InsertMid { pos: usize },
}

pub fn instr_stack_trans_info(bytes: &[u8], pc: usize) -> Result<StackTransInfo> {
    let op = read_op(bytes, pc)?;
    if let StackSpec::InsertMid(pos, _) = op.info().outputs {
        return Ok(StackTransInfo::InsertMid {
            pos: usize::from(pos),
        });
    }
    Ok(StackTransInfo::PushPop {
        pops: instr_num_pops(bytes, pc)?,
        pushes: instr_num_pushes(bytes, pc)?,
    })
}

/// Distance from the stack pointer to the activation record of the call in
/// progress, for opcodes that read it.
///
/// `FPass*` instructions sit above the parameters already passed, so their
/// parameter index is added to their own pops. `FCall*` pops every parameter.
///
/// # Panics
/// If the opcode does not read the current call frame.
pub fn instr_sp_to_ar_delta(bytes: &[u8], pc: usize) -> Result<usize> {
    let op = read_op(bytes, pc)?;
    assert!(op.reads_current_fpi(), "{op} does not read the current call");
    let pops = instr_num_pops(bytes, pc)?;
    let extra = if op.is_fcall_star() {
        0
    } else {
        count_imm(bytes, pc, 0)?
    };
    Ok(pops + extra)
}

/// Relative offset of the instruction's branch target, if it has one.
pub fn instr_jump_offset(bytes: &[u8], pc: usize) -> Result<Option<Offset>> {
    let op = read_op(bytes, pc)?;
    let Some(idx) = op.imm_index(ArgType::Ba) else {
        return Ok(None);
    };
    match get_imm(bytes, pc, idx)? {
        Imm::Offset(offset) => Ok(Some(offset)),
        imm => unreachable!("BA immediate decoded as {imm:?}"),
    }
}

fn absolute(pc: usize, offset: Offset) -> Result<usize> {
    let target = pc as i64 + i64::from(offset);
    usize::try_from(target).map_err(|_| Error::JumpOutOfRange { pc, target })
}

/// Absolute branch target of the instruction at `pc`, if it has one.
pub fn instr_jump_target(bytes: &[u8], pc: usize) -> Result<Option<usize>> {
    instr_jump_offset(bytes, pc)?
        .map(|offset| absolute(pc, offset))
        .transpose()
}

/// Absolute targets of a `Switch` or `SSwitch`, in encoded order. For
/// `SSwitch` the last target is the default case.
///
/// # Panics
/// If the instruction is not a switch.
pub fn switch_targets(bytes: &[u8], pc: usize) -> Result<Vec<usize>> {
    let op = read_op(bytes, pc)?;
    let vec = get_imm_vector(bytes, pc)?;
    match op {
        Op::Switch => vec.range32().map(|offset| absolute(pc, offset)).collect(),
        Op::SSwitch => vec.str_vec().map(|item| absolute(pc, item.dest)).collect(),
        _ => panic!("{op} is not a switch"),
    }
}

/// The string cases of an `SSwitch`, without the trailing default.
///
/// # Panics
/// If the instruction is not an `SSwitch`.
pub fn sswitch_strings(bytes: &[u8], pc: usize) -> Result<Vec<StrVecItem>> {
    let op = read_op(bytes, pc)?;
    assert!(op == Op::SSwitch, "{op} is not an SSwitch");
    let mut items: Vec<_> = get_imm_vector(bytes, pc)?.str_vec().collect();
    items.pop();
    Ok(items)
}

/// Offsets control may reach from the instruction at `pc` within the same
/// function.
///
/// Calls, includes and generator or async suspension resume at the next
/// instruction, so they contribute only the fall-through offset.
pub fn instr_succ_offsets(bytes: &[u8], pc: usize) -> Result<BTreeSet<usize>> {
    let op = read_op(bytes, pc)?;
    let mut succs = BTreeSet::new();

    if op.is_switch() {
        succs.extend(switch_targets(bytes, pc)?);
        return Ok(succs);
    }
    let target = if op.is_control_flow() {
        instr_jump_target(bytes, pc)?
    } else {
        None
    };
    if let Some(target) = target {
        succs.insert(target);
    }
    if op.allows_fall_thru() {
        succs.insert(pc + instr_len(bytes, pc)?);
    }
    Ok(succs)
}

/// Number of distinct successor offsets.
pub fn num_succs(bytes: &[u8], pc: usize) -> Result<usize> {
    instr_succ_offsets(bytes, pc).map(|succs| succs.len())
}

/// Walks the instructions of a byte range in order.
///
/// Yields `(pc, op)` for each instruction. The first decode error is yielded
/// once and ends the walk.
#[derive(Debug, Clone)]
pub struct InstrIter<'a> {
    bytes: &'a [u8],
    pc: usize,
    end: usize,
    failed: bool,
}

impl<'a> InstrIter<'a> {
    /// Walk all of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::range(bytes, 0, bytes.len())
    }

    /// Walk `start..end` of `bytes`. An instruction straddling `end` is an
    /// error.
    #[must_use]
    pub fn range(bytes: &'a [u8], start: usize, end: usize) -> Self {
        Self {
            bytes: &bytes[..end.min(bytes.len())],
            pc: start,
            end,
            failed: false,
        }
    }

    /// Offset of the next instruction.
    #[must_use]
    pub fn pc(&self) -> usize {
        self.pc
    }
}

impl Iterator for InstrIter<'_> {
    type Item = Result<(usize, Op)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pc >= self.end.min(self.bytes.len()) {
            return None;
        }
        let pc = self.pc;
        let decoded = read_op(self.bytes, pc)
            .and_then(|op| instr_len(self.bytes, pc).map(|len| (op, len)));
        match decoded {
            Ok((op, len)) => {
                tracing::trace!(pc, %op, len, "decoded instruction");
                self.pc += len;
                Some(Ok((pc, op)))
            }
            Err(err) => {
                tracing::debug!(pc, %err, "instruction walk stopped");
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
