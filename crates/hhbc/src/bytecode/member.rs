//! Member-access addressing: how compound lvalues like `$x->y[0]` are encoded.
//!
//! A member vector starts with a [`LocationCode`] that says where the base
//! comes from, optionally followed by its immediate. Each following step is a
//! [`MemberCode`] plus its immediate, narrowing the value by one property or
//! element. The opcode that owns the vector performs the final operation.
//!
//! Per member-instruction kind, [`MInstrInfo`] gives the attribute mask of
//! every base and intermediate step: whether a missing link warns, is
//! created, must be a reference, or is removed.

use super::imm_vector::ImmVector;
use super::immediate::{Cursor, Id};
use super::opcode::Op;
use super::subop::{MOpFlags, QueryMOp};
use crate::error::{Error, Result};

/// Where the base of a member access comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LocationCode {
    /// Local variable, by immediate id.
    L,
    /// Cell on the stack.
    C,
    /// `$this`.
    H,
    /// Global named by a local.
    GL,
    /// Global named by a cell.
    GC,
    /// Local named by the value of a local.
    NL,
    /// Local named by a cell.
    NC,
    /// Static property named by a local; the class ref is on the stack.
    SL,
    /// Static property named by a cell; the class ref is on the stack.
    SC,
    /// Function return value.
    R,
}

pub const NUM_LOCATION_CODES: usize = LocationCode::ALL.len();

impl LocationCode {
    pub const ALL: [LocationCode; 10] = [
        Self::L,
        Self::C,
        Self::H,
        Self::GL,
        Self::GC,
        Self::NL,
        Self::NC,
        Self::SL,
        Self::SC,
        Self::R,
    ];

    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::ALL.get(usize::from(byte)).copied()
    }

    /// Immediates following the code in the vector (0 or 1).
    #[must_use]
    pub const fn num_imms(self) -> usize {
        match self {
            Self::L | Self::GL | Self::NL | Self::SL => 1,
            Self::C | Self::H | Self::GC | Self::NC | Self::SC | Self::R => 0,
        }
    }

    /// Stack values consumed to establish the base (0, 1 or 2).
    #[must_use]
    pub const fn num_stack_vals(self) -> usize {
        match self {
            Self::L | Self::H | Self::GL | Self::NL => 0,
            Self::C | Self::GC | Self::NC | Self::SL | Self::R => 1,
            Self::SC => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::C => "C",
            Self::H => "H",
            Self::GL => "GL",
            Self::GC => "GC",
            Self::NL => "NL",
            Self::NC => "NC",
            Self::SL => "SL",
            Self::SC => "SC",
            Self::R => "R",
        }
    }

    /// Parse a location code from the start of `s`. At most two bytes are
    /// examined, so trailing text is ignored.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        let first = *bytes.first()?;
        let second = bytes.get(1).copied();
        match (first, second) {
            (b'G', Some(b'L')) => Some(Self::GL),
            (b'G', Some(b'C')) => Some(Self::GC),
            (b'N', Some(b'L')) => Some(Self::NL),
            (b'N', Some(b'C')) => Some(Self::NC),
            (b'S', Some(b'L')) => Some(Self::SL),
            (b'S', Some(b'C')) => Some(Self::SC),
            (b'L', _) => Some(Self::L),
            (b'C', _) => Some(Self::C),
            (b'H', _) => Some(Self::H),
            (b'R', _) => Some(Self::R),
            _ => None,
        }
    }
}

/// How one intermediate step of a member access is keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MemberCode {
    /// Element keyed by a cell.
    EC,
    /// Property named by a cell.
    PC,
    /// Element keyed by a local.
    EL,
    /// Property named by a local.
    PL,
    /// Element keyed by a literal string.
    ET,
    /// Property named by a literal string.
    PT,
    /// Null-safe property named by a literal string.
    QT,
    /// Element keyed by a literal integer.
    EI,
    /// New element.
    W,
}

pub const NUM_MEMBER_CODES: usize = MemberCode::ALL.len();

/// Kind of immediate a member code carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MCodeImm {
    None,
    Int,
    String,
    Local,
}

impl MemberCode {
    pub const ALL: [MemberCode; 9] = [
        Self::EC,
        Self::PC,
        Self::EL,
        Self::PL,
        Self::ET,
        Self::PT,
        Self::QT,
        Self::EI,
        Self::W,
    ];

    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::ALL.get(usize::from(byte)).copied()
    }

    #[must_use]
    pub const fn imm_kind(self) -> MCodeImm {
        match self {
            Self::EL | Self::PL => MCodeImm::Local,
            Self::ET | Self::PT | Self::QT => MCodeImm::String,
            Self::EI => MCodeImm::Int,
            Self::EC | Self::PC | Self::W => MCodeImm::None,
        }
    }

    #[must_use]
    pub const fn has_imm(self) -> bool {
        !matches!(self.imm_kind(), MCodeImm::None)
    }

    /// Stack values consumed by this step (0 or 1).
    #[must_use]
    pub const fn stack_vals(self) -> usize {
        if !self.has_imm() && !matches!(self, Self::W) {
            1
        } else {
            0
        }
    }

    /// Keyed by a compile-time constant.
    #[must_use]
    pub const fn is_literal(self) -> bool {
        matches!(self, Self::ET | Self::EI | Self::PT | Self::QT)
    }

    #[must_use]
    pub const fn is_prop(self) -> bool {
        matches!(self, Self::PC | Self::PL | Self::PT | Self::QT)
    }

    #[must_use]
    pub const fn is_elem(self) -> bool {
        matches!(self, Self::EC | Self::EL | Self::ET | Self::EI)
    }

    #[must_use]
    pub const fn maybe_array_string_key(self) -> bool {
        matches!(self, Self::EC | Self::EL | Self::ET)
    }

    #[must_use]
    pub const fn maybe_array_int_key(self) -> bool {
        matches!(self, Self::EC | Self::EL | Self::EI)
    }

    #[must_use]
    pub const fn maybe_vector_key(self) -> bool {
        matches!(self, Self::EC | Self::EL | Self::EI)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EC => "EC",
            Self::PC => "PC",
            Self::EL => "EL",
            Self::PL => "PL",
            Self::ET => "ET",
            Self::PT => "PT",
            Self::QT => "QT",
            Self::EI => "EI",
            Self::W => "W",
        }
    }

    /// Parse a member code from the start of `s`, examining at most two bytes.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        match (bytes.first().copied()?, bytes.get(1).copied()) {
            (b'W', _) => Some(Self::W),
            (b'E', Some(b'C')) => Some(Self::EC),
            (b'E', Some(b'L')) => Some(Self::EL),
            (b'E', Some(b'T')) => Some(Self::ET),
            (b'E', Some(b'I')) => Some(Self::EI),
            (b'P', Some(b'C')) => Some(Self::PC),
            (b'P', Some(b'L')) => Some(Self::PL),
            (b'P', Some(b'T')) => Some(Self::PT),
            (b'Q', Some(b'T')) => Some(Self::QT),
            _ => None,
        }
    }
}

/// Attribute mask for one step of a member instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MInstrAttr(u8);

impl MInstrAttr {
    pub const NONE: Self = Self(0x00);
    pub const WARN: Self = Self(0x01);
    pub const DEFINE: Self = Self(0x02);
    pub const REFFY: Self = Self(0x04);
    pub const UNSET: Self = Self(0x08);
    pub const NEW: Self = Self(0x10);
    pub const FINAL_GET: Self = Self(0x20);
    pub const BASE: Self = Self(0x01 | 0x02);
    pub const INTERMEDIATE: Self = Self(0x01 | 0x02 | 0x04 | 0x08);
    pub const INTERMEDIATE_PROP: Self = Self(0x01 | 0x02 | 0x08);
    pub const FINAL: Self = Self(0x10 | 0x20);

    /// Extra Zend-compatible warnings, enabled with the `more-warnings`
    /// feature.
    pub const MORE_WARN: Self = if cfg!(feature = "more-warnings") {
        Self::WARN
    } else {
        Self::NONE
    };

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for MInstrAttr {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitAnd for MInstrAttr {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersect(rhs)
    }
}

/// Kind of operation a member instruction performs on its final step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MInstr {
    CGet,
    VGet,
    Isset,
    Empty,
    Set,
    SetOp,
    IncDec,
    Bind,
    Unset,
    SetWithRefL,
    SetWithRefR,
}

impl MInstr {
    pub const ALL: [MInstr; 11] = [
        Self::CGet,
        Self::VGet,
        Self::Isset,
        Self::Empty,
        Self::Set,
        Self::SetOp,
        Self::IncDec,
        Self::Bind,
        Self::Unset,
        Self::SetWithRefL,
        Self::SetWithRefR,
    ];

    #[must_use]
    pub fn info(self) -> &'static MInstrInfo {
        &M_INSTR_INFO[self as usize]
    }
}

/// Addressing attributes of one member-instruction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MInstrInfo {
    instr: MInstr,
    attrs: MInstrAttr,
    base_ops: [MInstrAttr; NUM_LOCATION_CODES],
    intermediate_ops: [MInstrAttr; NUM_MEMBER_CODES],
    val_count: usize,
    name: &'static str,
    base_suffix: &'static str,
    intermediate_suffix: &'static str,
    new_elem_op: &'static str,
}

impl MInstrInfo {
    const fn new(
        instr: MInstr,
        attrs: MInstrAttr,
        (base_suffix, intermediate_suffix): (&'static str, &'static str),
        val_count: usize,
        new_elem_op: &'static str,
        name: &'static str,
    ) -> Self {
        let base = attrs.intersect(MInstrAttr::BASE);
        let elem = attrs.intersect(MInstrAttr::INTERMEDIATE);
        let prop = attrs.intersect(MInstrAttr::INTERMEDIATE_PROP);
        Self {
            instr,
            attrs,
            base_ops: [base; NUM_LOCATION_CODES],
            // Order follows MemberCode: EC PC EL PL ET PT QT EI W.
            intermediate_ops: [elem, prop, elem, prop, elem, prop, prop, elem, elem],
            val_count,
            name,
            base_suffix,
            intermediate_suffix,
            new_elem_op,
        }
    }

    #[must_use]
    pub const fn instr(&self) -> MInstr {
        self.instr
    }

    /// Attributes of the base step when it is addressed by `lc`.
    #[must_use]
    pub const fn base_attr(&self, lc: LocationCode) -> MInstrAttr {
        self.base_ops[lc as usize]
    }

    /// Attributes of an intermediate step keyed by `mc`.
    #[must_use]
    pub const fn member_attr(&self, mc: MemberCode) -> MInstrAttr {
        self.intermediate_ops[mc as usize]
    }

    /// Attributes of the final step.
    #[must_use]
    pub const fn final_attr(&self) -> MInstrAttr {
        self.attrs.intersect(MInstrAttr::FINAL)
    }

    /// Values taken from the stack for the final operation (the RHS).
    #[must_use]
    pub const fn val_count(&self) -> usize {
        self.val_count
    }

    #[must_use]
    pub const fn new_elem(&self) -> bool {
        self.attrs.contains(MInstrAttr::NEW)
    }

    #[must_use]
    pub const fn final_get(&self) -> bool {
        self.attrs.contains(MInstrAttr::FINAL_GET)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Suffix naming the base helper variant: `W` warn, `D` define, `WD`
    /// both, `U` unset, empty for a plain lookup.
    #[must_use]
    pub const fn base_suffix(&self) -> &'static str {
        self.base_suffix
    }

    #[must_use]
    pub const fn intermediate_suffix(&self) -> &'static str {
        self.intermediate_suffix
    }

    /// Operation used when the final step is a new element.
    #[must_use]
    pub const fn new_elem_op(&self) -> &'static str {
        self.new_elem_op
    }
}

const fn attrs(bits: &[MInstrAttr]) -> MInstrAttr {
    let mut out = MInstrAttr::NONE;
    let mut i = 0;
    while i < bits.len() {
        out = out.union(bits[i]);
        i += 1;
    }
    out
}

use MInstrAttr as A;

static M_INSTR_INFO: [MInstrInfo; MInstr::ALL.len()] = [
    MInstrInfo::new(
        MInstr::CGet,
        attrs(&[A::WARN, A::FINAL_GET]),
        ("W", "W"),
        0,
        "NotSuppNewElem",
        "CGet",
    ),
    MInstrInfo::new(
        MInstr::VGet,
        attrs(&[A::DEFINE, A::REFFY, A::NEW, A::FINAL_GET]),
        ("D", "D"),
        0,
        "VGetNewElem",
        "VGet",
    ),
    MInstrInfo::new(
        MInstr::Isset,
        A::FINAL_GET,
        ("", ""),
        0,
        "NotSuppNewElem",
        "Isset",
    ),
    MInstrInfo::new(
        MInstr::Empty,
        A::FINAL_GET,
        ("", ""),
        0,
        "NotSuppNewElem",
        "Empty",
    ),
    MInstrInfo::new(
        MInstr::Set,
        attrs(&[A::DEFINE, A::NEW]),
        ("D", "D"),
        1,
        "SetNewElem",
        "Set",
    ),
    MInstrInfo::new(
        MInstr::SetOp,
        attrs(&[A::MORE_WARN, A::DEFINE, A::NEW, A::FINAL_GET]),
        ("WD", "WD"),
        1,
        "SetOpNewElem",
        "SetOp",
    ),
    MInstrInfo::new(
        MInstr::IncDec,
        attrs(&[A::MORE_WARN, A::DEFINE, A::NEW, A::FINAL_GET]),
        ("WD", "WD"),
        0,
        "IncDecNewElem",
        "IncDec",
    ),
    MInstrInfo::new(
        MInstr::Bind,
        attrs(&[A::DEFINE, A::REFFY, A::NEW, A::FINAL_GET]),
        ("D", "D"),
        1,
        "BindNewElem",
        "Bind",
    ),
    MInstrInfo::new(
        MInstr::Unset,
        A::UNSET,
        ("", "U"),
        0,
        "NotSuppNewElem",
        "Unset",
    ),
    MInstrInfo::new(
        MInstr::SetWithRefL,
        attrs(&[A::DEFINE, A::REFFY, A::NEW, A::FINAL_GET]),
        ("D", "D"),
        1,
        "SetWithRefNewElem",
        "SetWithRefL",
    ),
    MInstrInfo::new(
        MInstr::SetWithRefR,
        attrs(&[A::DEFINE, A::REFFY, A::NEW, A::FINAL_GET]),
        ("D", "D"),
        1,
        "SetWithRefNewElem",
        "SetWithRefR",
    ),
];

const _: () = {
    let mut i = 0;
    while i < MInstr::ALL.len() {
        assert!(MInstr::ALL[i] as usize == i);
        i += 1;
    }
};

/// Attribute table row for a member-vector opcode. `FPassM` has none: whether
/// it reads or binds is decided by the callee at run time.
#[must_use]
pub fn get_m_instr_info(op: Op) -> Option<&'static MInstrInfo> {
    let instr = match op {
        Op::CGetM => MInstr::CGet,
        Op::VGetM => MInstr::VGet,
        Op::IssetM => MInstr::Isset,
        Op::EmptyM => MInstr::Empty,
        Op::SetM => MInstr::Set,
        Op::SetOpM => MInstr::SetOp,
        Op::IncDecM => MInstr::IncDec,
        Op::BindM => MInstr::Bind,
        Op::UnsetM => MInstr::Unset,
        Op::SetWithRefLM => MInstr::SetWithRefL,
        Op::SetWithRefRM => MInstr::SetWithRefR,
        _ => return None,
    };
    Some(instr.info())
}

/// Base/dim flags implied by a final query operation.
#[must_use]
pub const fn get_m_op_flags(op: QueryMOp) -> MOpFlags {
    match op {
        QueryMOp::CGet => MOpFlags::Warn,
        QueryMOp::Isset | QueryMOp::Empty => MOpFlags::None,
    }
}

/// Decoded base of a member vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MInstrLocation {
    pub lcode: LocationCode,
    pub imm: i64,
}

impl MInstrLocation {
    #[must_use]
    pub const fn has_imm(&self) -> bool {
        self.lcode.num_imms() == 1
    }
}

/// Decoded intermediate step of a member vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MVectorItem {
    pub mcode: MemberCode,
    pub imm: i64,
}

impl MVectorItem {
    #[must_use]
    pub const fn has_imm(&self) -> bool {
        self.mcode.has_imm()
    }

    /// String id of a literal string key.
    #[must_use]
    pub fn str_id(&self) -> Option<Id> {
        match self.mcode.imm_kind() {
            MCodeImm::String => Id::try_from(self.imm).ok(),
            _ => None,
        }
    }
}

/// Read the immediate of a member step: a variable-width local id, a 4-byte
/// string id or an 8-byte integer. Codes without an immediate read nothing.
pub fn decode_member_code_imm(cursor: &mut Cursor<'_>, mcode: MemberCode) -> Result<i64> {
    match mcode.imm_kind() {
        MCodeImm::Local => cursor.read_iva().map(i64::from),
        MCodeImm::String => cursor.read_u32().map(i64::from),
        MCodeImm::Int => cursor.read_i64(),
        MCodeImm::None => Ok(0),
    }
}

pub(crate) fn read_location(cursor: &mut Cursor<'_>) -> Result<MInstrLocation> {
    let offset = cursor.pos();
    let byte = cursor.read_u8()?;
    let lcode =
        LocationCode::from_u8(byte).ok_or(Error::InvalidLocationCode { offset, byte })?;
    let imm = if lcode.num_imms() == 1 {
        i64::from(cursor.read_iva()?)
    } else {
        0
    };
    Ok(MInstrLocation { lcode, imm })
}

pub(crate) fn read_member(cursor: &mut Cursor<'_>) -> Result<MVectorItem> {
    let offset = cursor.pos();
    let byte = cursor.read_u8()?;
    let mcode = MemberCode::from_u8(byte).ok_or(Error::InvalidMemberCode { offset, byte })?;
    let imm = decode_member_code_imm(cursor, mcode)?;
    Ok(MVectorItem { mcode, imm })
}

/// True if `op` carries a member vector.
#[must_use]
pub fn has_m_vector(op: Op) -> bool {
    op.imm_index(super::ArgType::Ma).is_some()
}

/// Decode the base of a member vector.
pub fn get_m_location(vec: &ImmVector<'_>) -> Result<MInstrLocation> {
    read_location(&mut vec.cursor())
}

/// Decode every intermediate step of a member vector.
pub fn get_m_vector(vec: &ImmVector<'_>) -> Result<Vec<MVectorItem>> {
    let mut cursor = vec.cursor();
    read_location(&mut cursor)?;
    let mut items = Vec::new();
    while cursor.pos() < vec.end() {
        items.push(read_member(&mut cursor)?);
    }
    Ok(items)
}

/// Stack values a member vector with these codes consumes.
#[must_use]
pub fn m_vector_stack_vals(lcode: LocationCode, mcodes: &[MemberCode]) -> usize {
    lcode.num_stack_vals() + mcodes.iter().map(|mc| mc.stack_vals()).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_code_table() {
        let imms: usize = LocationCode::ALL.iter().map(|lc| lc.num_imms()).sum();
        let stack: usize = LocationCode::ALL.iter().map(|lc| lc.num_stack_vals()).sum();
        assert_eq!(imms, 4);
        assert_eq!(stack, 7);
        for lc in LocationCode::ALL {
            assert!(lc.num_imms() <= 1);
            assert!(lc.num_stack_vals() <= 2);
            assert_eq!(LocationCode::from_u8(lc as u8), Some(lc));
            assert_eq!(LocationCode::parse(lc.as_str()), Some(lc));
        }
        assert_eq!(LocationCode::from_u8(10), None);
        assert_eq!(NUM_LOCATION_CODES, 10);
    }

    #[test]
    fn test_parse_looks_at_two_bytes() {
        assert_eq!(LocationCode::parse("GLjunk"), Some(LocationCode::GL));
        assert_eq!(LocationCode::parse("L:3"), Some(LocationCode::L));
        assert_eq!(LocationCode::parse("G"), None);
        assert_eq!(LocationCode::parse(""), None);
        assert_eq!(MemberCode::parse("PT:\"x\""), Some(MemberCode::PT));
        assert_eq!(MemberCode::parse("E"), None);
        assert_eq!(MemberCode::parse("XX"), None);
    }

    #[test]
    fn test_member_code_table() {
        assert_eq!(NUM_MEMBER_CODES, 9);
        for mc in MemberCode::ALL {
            assert_eq!(MemberCode::from_u8(mc as u8), Some(mc));
            assert_eq!(MemberCode::parse(mc.as_str()), Some(mc));
            assert_eq!(mc.has_imm(), mc.imm_kind() != MCodeImm::None);
            // Each step is keyed by exactly one of: immediate, stack, nothing.
            assert!(usize::from(mc.has_imm()) + mc.stack_vals() <= 1);
            assert!(!(mc.is_prop() && mc.is_elem()));
        }
        assert_eq!(MemberCode::EC.stack_vals(), 1);
        assert_eq!(MemberCode::W.stack_vals(), 0);
        assert_eq!(MemberCode::EI.imm_kind(), MCodeImm::Int);
        assert!(MemberCode::QT.is_literal());
        assert!(!MemberCode::EL.is_literal());
    }

    #[test]
    fn test_query_kinds_never_define() {
        for instr in [MInstr::CGet, MInstr::Isset, MInstr::Empty] {
            let info = instr.info();
            for lc in LocationCode::ALL {
                assert!(!info.base_attr(lc).contains(MInstrAttr::DEFINE));
            }
            for mc in MemberCode::ALL {
                assert!(!info.member_attr(mc).contains(MInstrAttr::DEFINE));
            }
            assert!(info.final_get());
            assert!(!info.new_elem());
        }
    }

    #[test]
    fn test_only_unset_unsets() {
        for instr in MInstr::ALL {
            let info = instr.info();
            let unsets = MemberCode::ALL
                .iter()
                .any(|&mc| info.member_attr(mc).contains(MInstrAttr::UNSET));
            assert_eq!(unsets, instr == MInstr::Unset, "{}", info.name());
            assert!(info.final_attr().intersect(MInstrAttr::FINAL.union(MInstrAttr::NONE))
                == info.final_attr());
        }
    }

    #[test]
    fn test_property_steps_are_never_reffy() {
        let bind = MInstr::Bind.info();
        assert!(bind.member_attr(MemberCode::EC).contains(MInstrAttr::REFFY));
        assert!(!bind.member_attr(MemberCode::PT).contains(MInstrAttr::REFFY));
        assert!(bind.member_attr(MemberCode::PT).contains(MInstrAttr::DEFINE));
        assert!(!bind.base_attr(LocationCode::L).contains(MInstrAttr::REFFY));
    }

    #[test]
    fn test_m_instr_info_lookup() {
        assert_eq!(get_m_instr_info(Op::SetM).map(MInstrInfo::val_count), Some(1));
        assert_eq!(get_m_instr_info(Op::CGetM).map(MInstrInfo::base_suffix), Some("W"));
        assert_eq!(get_m_instr_info(Op::UnsetM).map(MInstrInfo::intermediate_suffix), Some("U"));
        assert!(get_m_instr_info(Op::FPassM).is_none());
        assert!(get_m_instr_info(Op::Add).is_none());
        assert!(has_m_vector(Op::FPassM));
        assert!(!has_m_vector(Op::CGetL));
    }

    #[test]
    fn test_query_m_flags() {
        assert_eq!(get_m_op_flags(QueryMOp::CGet), MOpFlags::Warn);
        assert_eq!(get_m_op_flags(QueryMOp::Isset), MOpFlags::None);
    }

    #[test]
    fn test_stack_vals_of_vector() {
        use MemberCode::{EC, PT, W};
        assert_eq!(m_vector_stack_vals(LocationCode::SC, &[EC, PT, W]), 3);
        assert_eq!(m_vector_stack_vals(LocationCode::L, &[PT]), 0);
    }
}
