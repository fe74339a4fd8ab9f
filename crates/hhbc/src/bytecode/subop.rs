//! Sub-operator families carried in `OA` immediates, and the registry mapping
//! each member to its canonical name.
//!
//! Every family is a closed enumeration encoded as one byte. For all families
//! except [`MOpFlags`] the byte is the declaration ordinal; `MOpFlags` uses
//! explicit bit values. Names are what the disassembler prints and what a text
//! assembler accepts back.

use super::Op;

/// A closed sub-operator enumeration stored in a single immediate byte.
pub trait Subop: Copy + Eq + Sized + 'static {
    const KIND: SubopKind;
    const ALL: &'static [Self];

    fn to_u8(self) -> u8;
    fn name(self) -> &'static str;

    #[must_use]
    fn from_u8(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.to_u8() == byte)
    }
}

/// Parse a sub-operator by name. Unknown names yield `None`.
#[must_use]
pub fn name_to_subop<T: Subop>(name: &str) -> Option<T> {
    T::ALL.iter().copied().find(|s| s.name() == name)
}

#[must_use]
pub fn subop_to_name<T: Subop>(op: T) -> &'static str {
    op.name()
}

macro_rules! subops {
    (
        $(#[$meta:meta])*
        $family:ident => $kind:ident { $($variant:ident),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $family {
            $($variant,)*
        }

        impl Subop for $family {
            const KIND: SubopKind = SubopKind::$kind;
            const ALL: &'static [Self] = &[$(Self::$variant,)*];

            fn to_u8(self) -> u8 {
                self as u8
            }

            fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                }
            }
        }

        impl std::fmt::Display for $family {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

subops!(IncDecOp => IncDec {
    PreInc, PostInc, PreDec, PostDec,
    PreIncO, PostIncO, PreDecO, PostDecO,
});

subops!(IsTypeOp => IsType { Null, Bool, Int, Dbl, Str, Arr, Obj, Scalar });

subops!(InitPropOp => InitProp { Static, NonStatic });

subops!(FatalOp => Fatal { Runtime, Parse, RuntimeOmitFrame });

subops!(
    /// Compound assignment operators. Each corresponds to a binary opcode,
    /// see [`SetOpOp::binary_op`].
    SetOpOp => SetOp {
        PlusEqual, MinusEqual, MulEqual, ConcatEqual, DivEqual, PowEqual,
        ModEqual, AndEqual, OrEqual, XorEqual, SlEqual, SrEqual,
        PlusEqualO, MinusEqualO, MulEqualO,
    }
);

subops!(BareThisOp => BareThis { Notice, NoNotice, NeverNull });

subops!(SilenceOp => Silence { Start, End });

subops!(OODeclExistsOp => OODeclExists { Class, Interface, Trait });

subops!(ObjMethodOp => ObjMethod { NullThrows, NullSafe });

subops!(SwitchKind => Switch { Unbounded, Bounded });

subops!(QueryMOp => QueryM { CGet, Isset, Empty });

subops!(PropElemOp => PropElem { Prop, PropQ, Elem });

subops!(
    /// Kind of iterator named in an `ILA` immediate.
    IterKind => Iter { Iter, MIter, CIter }
);

impl IncDecOp {
    #[must_use]
    pub const fn is_pre(self) -> bool {
        matches!(
            self,
            Self::PreInc | Self::PreIncO | Self::PreDec | Self::PreDecO
        )
    }

    #[must_use]
    pub const fn is_inc(self) -> bool {
        matches!(
            self,
            Self::PreInc | Self::PreIncO | Self::PostInc | Self::PostIncO
        )
    }

    /// The `O` forms promote to double on integer overflow.
    #[must_use]
    pub const fn is_overflow_checked(self) -> bool {
        matches!(
            self,
            Self::PreIncO | Self::PreDecO | Self::PostIncO | Self::PostDecO
        )
    }
}

const SETOP_BINARY_OPS: [(SetOpOp, Op); 15] = [
    (SetOpOp::PlusEqual, Op::Add),
    (SetOpOp::MinusEqual, Op::Sub),
    (SetOpOp::MulEqual, Op::Mul),
    (SetOpOp::ConcatEqual, Op::Concat),
    (SetOpOp::DivEqual, Op::Div),
    (SetOpOp::PowEqual, Op::Pow),
    (SetOpOp::ModEqual, Op::Mod),
    (SetOpOp::AndEqual, Op::BitAnd),
    (SetOpOp::OrEqual, Op::BitOr),
    (SetOpOp::XorEqual, Op::BitXor),
    (SetOpOp::SlEqual, Op::Shl),
    (SetOpOp::SrEqual, Op::Shr),
    (SetOpOp::PlusEqualO, Op::AddO),
    (SetOpOp::MinusEqualO, Op::SubO),
    (SetOpOp::MulEqualO, Op::MulO),
];

impl SetOpOp {
    /// The binary opcode performing the same arithmetic.
    #[must_use]
    pub fn binary_op(self) -> Op {
        SETOP_BINARY_OPS[self as usize].1
    }

    #[must_use]
    pub fn from_binary_op(op: Op) -> Option<Self> {
        SETOP_BINARY_OPS
            .iter()
            .find(|(_, bin)| *bin == op)
            .map(|(setop, _)| *setop)
    }
}

/// Flags passed to member base and dim instructions. Unlike the other
/// families these are bit values, not ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MOpFlags {
    None = 0,
    Warn = 1,
    Define = 2,
    Unset = 4,
    Reffy = 2 | 8,
    WarnDefine = 1 | 2,
}

impl MOpFlags {
    /// True if any bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: MOpFlags) -> bool {
        (self as u8) & (other as u8) != 0
    }
}

impl Subop for MOpFlags {
    const KIND: SubopKind = SubopKind::MOpFlags;
    const ALL: &'static [Self] = &[
        Self::None,
        Self::Warn,
        Self::Define,
        Self::Unset,
        Self::Reffy,
        Self::WarnDefine,
    ];

    fn to_u8(self) -> u8 {
        self as u8
    }

    fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Warn => "Warn",
            Self::Define => "Define",
            Self::Unset => "Unset",
            Self::Reffy => "Reffy",
            Self::WarnDefine => "WarnDefine",
        }
    }
}

impl std::fmt::Display for MOpFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which sub-operator family an `OA` immediate holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubopKind {
    IncDec,
    IsType,
    InitProp,
    Fatal,
    SetOp,
    BareThis,
    Silence,
    OODeclExists,
    ObjMethod,
    Switch,
    MOpFlags,
    QueryM,
    PropElem,
    Iter,
}

fn lookup_name<T: Subop>(byte: u8) -> Option<&'static str> {
    T::from_u8(byte).map(Subop::name)
}

fn lookup_byte<T: Subop>(name: &str) -> Option<u8> {
    name_to_subop::<T>(name).map(Subop::to_u8)
}

impl SubopKind {
    /// Family name used in diagnostics.
    #[must_use]
    pub const fn family(self) -> &'static str {
        match self {
            Self::IncDec => "IncDecOp",
            Self::IsType => "IsTypeOp",
            Self::InitProp => "InitPropOp",
            Self::Fatal => "FatalOp",
            Self::SetOp => "SetOpOp",
            Self::BareThis => "BareThisOp",
            Self::Silence => "SilenceOp",
            Self::OODeclExists => "OODeclExistsOp",
            Self::ObjMethod => "ObjMethodOp",
            Self::Switch => "SwitchKind",
            Self::MOpFlags => "MOpFlags",
            Self::QueryM => "QueryMOp",
            Self::PropElem => "PropElemOp",
            Self::Iter => "IterKind",
        }
    }

    /// Name of the raw byte `byte` within this family.
    #[must_use]
    pub fn name_of(self, byte: u8) -> Option<&'static str> {
        match self {
            Self::IncDec => lookup_name::<IncDecOp>(byte),
            Self::IsType => lookup_name::<IsTypeOp>(byte),
            Self::InitProp => lookup_name::<InitPropOp>(byte),
            Self::Fatal => lookup_name::<FatalOp>(byte),
            Self::SetOp => lookup_name::<SetOpOp>(byte),
            Self::BareThis => lookup_name::<BareThisOp>(byte),
            Self::Silence => lookup_name::<SilenceOp>(byte),
            Self::OODeclExists => lookup_name::<OODeclExistsOp>(byte),
            Self::ObjMethod => lookup_name::<ObjMethodOp>(byte),
            Self::Switch => lookup_name::<SwitchKind>(byte),
            Self::MOpFlags => lookup_name::<MOpFlags>(byte),
            Self::QueryM => lookup_name::<QueryMOp>(byte),
            Self::PropElem => lookup_name::<PropElemOp>(byte),
            Self::Iter => lookup_name::<IterKind>(byte),
        }
    }

    /// Byte encoding of `name` within this family.
    #[must_use]
    pub fn parse(self, name: &str) -> Option<u8> {
        match self {
            Self::IncDec => lookup_byte::<IncDecOp>(name),
            Self::IsType => lookup_byte::<IsTypeOp>(name),
            Self::InitProp => lookup_byte::<InitPropOp>(name),
            Self::Fatal => lookup_byte::<FatalOp>(name),
            Self::SetOp => lookup_byte::<SetOpOp>(name),
            Self::BareThis => lookup_byte::<BareThisOp>(name),
            Self::Silence => lookup_byte::<SilenceOp>(name),
            Self::OODeclExists => lookup_byte::<OODeclExistsOp>(name),
            Self::ObjMethod => lookup_byte::<ObjMethodOp>(name),
            Self::Switch => lookup_byte::<SwitchKind>(name),
            Self::MOpFlags => lookup_byte::<MOpFlags>(name),
            Self::QueryM => lookup_byte::<QueryMOp>(name),
            Self::PropElem => lookup_byte::<PropElemOp>(name),
            Self::Iter => lookup_byte::<IterKind>(name),
        }
    }
}
