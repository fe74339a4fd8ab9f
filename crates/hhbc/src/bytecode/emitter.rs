//! Building instruction streams.
//!
//! [`Emitter`] appends opcodes and immediates in the same layout the decoder
//! reads. The typed methods trust the caller to follow each opcode's
//! immediate list; [`Emitter::instr`] checks it.

use super::immediate::{Id, Imm, Offset, encode_iva};
use super::member::{self, LocationCode, MCodeImm, MemberCode};
use super::opcode::{ArgType, Op};
use super::repo_type::RepoAuthType;
use super::subop::{IterKind, Subop};
use crate::error::{Error, Result};

fn len_word(len: usize) -> [u8; 4] {
    i32::try_from(len)
        .unwrap_or_else(|_| panic!("vector length {len} does not fit in 32 bits"))
        .to_le_bytes()
}

/// A member vector under construction: a base and its steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberVector {
    location: LocationCode,
    location_imm: u32,
    members: Vec<(MemberCode, i64)>,
}

impl MemberVector {
    /// # Panics
    /// If `location` needs an immediate; use [`MemberVector::with_imm`].
    #[must_use]
    pub fn new(location: LocationCode) -> Self {
        assert_eq!(location.num_imms(), 0, "{} needs an immediate", location.as_str());
        Self {
            location,
            location_imm: 0,
            members: Vec::new(),
        }
    }

    /// # Panics
    /// If `location` takes no immediate.
    #[must_use]
    pub fn with_imm(location: LocationCode, imm: u32) -> Self {
        assert_eq!(location.num_imms(), 1, "{} takes no immediate", location.as_str());
        Self {
            location,
            location_imm: imm,
            members: Vec::new(),
        }
    }

    /// Append a step. `imm` is ignored for codes without an immediate.
    #[must_use]
    pub fn push(mut self, mcode: MemberCode, imm: i64) -> Self {
        let imm = if mcode.has_imm() { imm } else { 0 };
        self.members.push((mcode, imm));
        self
    }

    #[must_use]
    pub fn elem_cell(self) -> Self {
        self.push(MemberCode::EC, 0)
    }

    #[must_use]
    pub fn elem_local(self, local: u32) -> Self {
        self.push(MemberCode::EL, i64::from(local))
    }

    #[must_use]
    pub fn elem_str(self, id: Id) -> Self {
        self.push(MemberCode::ET, i64::from(id))
    }

    #[must_use]
    pub fn elem_int(self, key: i64) -> Self {
        self.push(MemberCode::EI, key)
    }

    #[must_use]
    pub fn prop_cell(self) -> Self {
        self.push(MemberCode::PC, 0)
    }

    #[must_use]
    pub fn prop_local(self, local: u32) -> Self {
        self.push(MemberCode::PL, i64::from(local))
    }

    #[must_use]
    pub fn prop_str(self, id: Id) -> Self {
        self.push(MemberCode::PT, i64::from(id))
    }

    #[must_use]
    pub fn nullsafe_prop_str(self, id: Id) -> Self {
        self.push(MemberCode::QT, i64::from(id))
    }

    #[must_use]
    pub fn new_elem(self) -> Self {
        self.push(MemberCode::W, 0)
    }

    #[must_use]
    pub fn location(&self) -> LocationCode {
        self.location
    }

    #[must_use]
    pub fn members(&self) -> &[(MemberCode, i64)] {
        &self.members
    }

    /// Stack values the vector consumes.
    #[must_use]
    pub fn num_stack(&self) -> usize {
        let codes: Vec<_> = self.members.iter().map(|&(mc, _)| mc).collect();
        member::m_vector_stack_vals(self.location, &codes)
    }

    fn payload(&self) -> Vec<u8> {
        let mut out = vec![self.location as u8];
        if self.location.num_imms() == 1 {
            encode_iva(self.location_imm, &mut out);
        }
        for &(mcode, imm) in &self.members {
            out.push(mcode as u8);
            match mcode.imm_kind() {
                MCodeImm::Local => {
                    let local = u32::try_from(imm)
                        .unwrap_or_else(|_| panic!("local id {imm} out of range"));
                    encode_iva(local, &mut out);
                }
                MCodeImm::String => {
                    let id = Id::try_from(imm)
                        .unwrap_or_else(|_| panic!("string id {imm} out of range"));
                    out.extend_from_slice(&id.to_le_bytes());
                }
                MCodeImm::Int => out.extend_from_slice(&imm.to_le_bytes()),
                MCodeImm::None => {}
            }
        }
        out
    }

    /// Append the encoded vector, header included.
    pub fn encode(&self, out: &mut Vec<u8>) {
        let payload = self.payload();
        out.extend_from_slice(&len_word(payload.len()));
        out.extend_from_slice(&len_word(self.num_stack()));
        out.extend_from_slice(&payload);
    }
}

/// Appends instructions to a byte buffer.
#[derive(Debug, Clone, Default)]
pub struct Emitter {
    bytes: Vec<u8>,
}

impl Emitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset the next byte will be written at.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    /// # Panics
    /// If `op` is one of the sentinels.
    pub fn op(&mut self, op: Op) -> &mut Self {
        assert!(op.is_valid(), "cannot emit sentinel {op:?}");
        self.bytes.push(op as u8);
        self
    }

    pub fn iva(&mut self, value: u32) -> &mut Self {
        encode_iva(value, &mut self.bytes);
        self
    }

    pub fn local(&mut self, id: u32) -> &mut Self {
        self.iva(id)
    }

    pub fn iter(&mut self, id: u32) -> &mut Self {
        self.iva(id)
    }

    pub fn int64(&mut self, value: i64) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn double(&mut self, value: f64) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn str_id(&mut self, id: Id) -> &mut Self {
        self.bytes.extend_from_slice(&id.to_le_bytes());
        self
    }

    pub fn arr_id(&mut self, id: Id) -> &mut Self {
        self.bytes.extend_from_slice(&id.to_le_bytes());
        self
    }

    /// A branch offset, relative to the start of the instruction.
    pub fn offset(&mut self, offset: Offset) -> &mut Self {
        self.bytes.extend_from_slice(&offset.to_le_bytes());
        self
    }

    pub fn subop<T: Subop>(&mut self, subop: T) -> &mut Self {
        self.bytes.push(subop.to_u8());
        self
    }

    pub fn rat(&mut self, rat: &RepoAuthType) -> &mut Self {
        rat.encode(&mut self.bytes);
        self
    }

    pub fn member_vector(&mut self, vec: &MemberVector) -> &mut Self {
        vec.encode(&mut self.bytes);
        self
    }

    /// `BLA` immediate.
    pub fn offset_vector(&mut self, offsets: &[Offset]) -> &mut Self {
        self.bytes.extend_from_slice(&len_word(offsets.len()));
        for offset in offsets {
            self.bytes.extend_from_slice(&offset.to_le_bytes());
        }
        self
    }

    /// `SLA` immediate. The last pair is the default case.
    pub fn str_offset_vector(&mut self, cases: &[(Id, Offset)]) -> &mut Self {
        self.bytes.extend_from_slice(&len_word(cases.len()));
        for (id, dest) in cases {
            self.bytes.extend_from_slice(&id.to_le_bytes());
            self.bytes.extend_from_slice(&dest.to_le_bytes());
        }
        self
    }

    /// `ILA` immediate.
    pub fn iter_vector(&mut self, iters: &[(IterKind, u32)]) -> &mut Self {
        self.bytes.extend_from_slice(&len_word(iters.len()));
        for &(kind, id) in iters {
            self.bytes
                .extend_from_slice(&u32::from(kind.to_u8()).to_le_bytes());
            self.bytes.extend_from_slice(&id.to_le_bytes());
        }
        self
    }

    /// `VSA` immediate.
    pub fn str_vector(&mut self, ids: &[Id]) -> &mut Self {
        self.bytes.extend_from_slice(&len_word(ids.len()));
        for id in ids {
            self.bytes.extend_from_slice(&id.to_le_bytes());
        }
        self
    }

    /// Overwrite the 4-byte offset at `at`, for branches emitted before their
    /// target was known.
    ///
    /// # Panics
    /// If `at..at + 4` is not inside the buffer.
    pub fn patch_offset(&mut self, at: usize, offset: Offset) {
        self.bytes[at..at + 4].copy_from_slice(&offset.to_le_bytes());
    }

    /// Emit `op` with already-decoded immediates, checking each against the
    /// opcode's immediate list.
    pub fn instr(&mut self, op: Op, imms: &[Imm<'_>]) -> Result<&mut Self> {
        let types = op.info().imms;
        if imms.len() != types.len() {
            return Err(Error::ImmediateCount {
                op: op.name(),
                expected: types.len(),
                found: imms.len(),
            });
        }
        for (idx, (&ty, imm)) in types.iter().zip(imms).enumerate() {
            if !imm_matches(ty, imm) {
                return Err(Error::ImmediateMismatch {
                    op: op.name(),
                    idx,
                    expected: ty,
                    found: imm.kind_name(),
                });
            }
        }
        self.op(op);
        for imm in imms {
            self.imm(imm);
        }
        Ok(self)
    }

    /// Append one already-decoded immediate without checking it against an
    /// opcode.
    pub fn imm(&mut self, imm: &Imm<'_>) -> &mut Self {
        match *imm {
            Imm::Iva(v) | Imm::Local(v) | Imm::Iter(v) => {
                self.iva(v);
            }
            Imm::Int64(v) => {
                self.int64(v);
            }
            Imm::Double(v) => {
                self.double(v);
            }
            Imm::Str(id) | Imm::Arr(id) => {
                self.str_id(id);
            }
            Imm::Rat(rat) => {
                self.rat(&rat);
            }
            Imm::Offset(offset) => {
                self.offset(offset);
            }
            Imm::Subop(_, byte) => self.bytes.push(byte),
            Imm::Vector(vec) => self.bytes.extend_from_slice(vec.raw()),
        }
        self
    }
}

fn imm_matches(ty: ArgType, imm: &Imm<'_>) -> bool {
    match (ty, imm) {
        (ArgType::Iva, Imm::Iva(_))
        | (ArgType::La, Imm::Local(_))
        | (ArgType::Ia, Imm::Iter(_))
        | (ArgType::I64a, Imm::Int64(_))
        | (ArgType::Da, Imm::Double(_))
        | (ArgType::Sa, Imm::Str(_))
        | (ArgType::Aa, Imm::Arr(_))
        | (ArgType::Rata, Imm::Rat(_))
        | (ArgType::Ba, Imm::Offset(_)) => true,
        (ArgType::Oa(kind), Imm::Subop(found, byte)) => kind == *found && kind.name_of(*byte).is_some(),
        (ArgType::Ma, Imm::Vector(vec)) => vec.is_member_vector(),
        (ArgType::Bla | ArgType::Sla | ArgType::Ila | ArgType::Vsa, Imm::Vector(vec)) => {
            vec.is_valid() && !vec.is_member_vector()
        }
        _ => false,
    }
}
