//! The opcode catalogue.
//!
//! Every opcode is one row of the `opcodes!` invocation below: its immediate
//! operand kinds, the flavors of the stack slots it reads and writes, and its
//! control-flow flags. The [`Op`] enum, [`Op::COUNT`], the name table and the
//! descriptor array are all generated from that single list.
//!
//! Declaration order is significant. Ordinals are the encoded opcode bytes, and
//! several predicates are contiguous ranges over the list:
//!
//! * [`Op::is_jmp`]: `Jmp ..= JmpNZ`
//! * [`Op::is_fpush`]: `FPushFunc ..= FPushCufSafe`
//! * [`Op::is_fpush_func`]: `FPushFunc ..= FPushFuncU`
//! * [`Op::is_fpush_cls_method`]: `FPushClsMethod ..= FPushClsMethodD`
//! * [`Op::is_fpush_cuf`]: `FPushCufIter ..= FPushCufSafe`
//!
//! Reordering rows inside those groups, or inserting an unrelated opcode into
//! one, silently changes the predicate.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use super::subop::SubopKind;

/// Encoding of one immediate operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    /// Member vector.
    Ma,
    /// Vector of relative bytecode offsets.
    Bla,
    /// Vector of (string id, relative offset) pairs.
    Sla,
    /// Vector of (iterator kind, iterator id) pairs.
    Ila,
    /// Variable-width integer, 1 or 4 bytes.
    Iva,
    /// 64-bit integer.
    I64a,
    /// Local variable id, variable width.
    La,
    /// Iterator id, variable width.
    Ia,
    /// Double.
    Da,
    /// Static string id.
    Sa,
    /// Static array id.
    Aa,
    /// Statically inferred type.
    Rata,
    /// Relative bytecode offset.
    Ba,
    /// Sub-operator byte of the given family.
    Oa(SubopKind),
    /// Vector of static string ids.
    Vsa,
}

impl ArgType {
    #[must_use]
    pub const fn is_vector(self) -> bool {
        matches!(self, Self::Ma | Self::Bla | Self::Sla | Self::Ila | Self::Vsa)
    }

    /// Encoded width for immediates whose width never depends on the value.
    #[must_use]
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            Self::I64a | Self::Da => Some(8),
            Self::Sa | Self::Aa | Self::Ba => Some(4),
            Self::Oa(_) => Some(1),
            Self::Iva | Self::La | Self::Ia | Self::Rata => None,
            Self::Ma | Self::Bla | Self::Sla | Self::Ila | Self::Vsa => None,
        }
    }

    /// Element width of a counted vector immediate.
    #[must_use]
    pub const fn vector_elem_size(self) -> Option<usize> {
        match self {
            Self::Bla | Self::Vsa => Some(4),
            Self::Sla | Self::Ila => Some(8),
            _ => None,
        }
    }
}

/// The semantic kind of a stack slot as seen by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// Cell.
    Cv,
    /// Var (boxed reference).
    Vv,
    /// Class reference.
    Av,
    /// Return value, cell or var.
    Rv,
    /// Function parameter, cell or var.
    Fv,
    /// Uninit.
    Uv,
    /// Cell or var argument.
    Cvv,
    /// Cell or return value argument.
    Crv,
    /// Cell or uninit argument.
    Cuv,
    /// Cell, var or uninit argument.
    Cvuv,
}

impl Flavor {
    /// Flavors that stand for more than one concrete kind of value. They still
    /// occupy exactly one slot.
    #[must_use]
    pub const fn is_flexible(self) -> bool {
        matches!(
            self,
            Self::Rv | Self::Fv | Self::Cvv | Self::Crv | Self::Cuv | Self::Cvuv
        )
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cv => "C",
            Self::Vv => "V",
            Self::Av => "A",
            Self::Rv => "R",
            Self::Fv => "F",
            Self::Uv => "U",
            Self::Cvv => "C|V",
            Self::Crv => "C|R",
            Self::Cuv => "C|U",
            Self::Cvuv => "C|V|U",
        }
    }
}

/// Stack inputs or outputs of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackSpec {
    /// A fixed list of slots, top of stack first.
    Fixed(&'static [Flavor]),
    /// One value pushed beneath the top `depth` cells.
    InsertMid(u8, Flavor),
    /// Immediate 0 cells.
    CMany,
    /// One cell per string in the `Vsa` immediate.
    SMany,
    /// Immediate 0 function parameters.
    FMany,
    /// Immediate 0 cell/var/uninit arguments.
    CvuMany,
    /// The member vector's stack values.
    MMany,
    /// A cell, then the member vector's stack values.
    CMMany,
    /// A var, then the member vector's stack values.
    VMMany,
    /// A return value, then the member vector's stack values.
    RMMany,
    /// Immediate 0 cells consumed by a final member operation.
    MFinal,
}

impl StackSpec {
    /// Slot count when it does not depend on the instruction's immediates.
    #[must_use]
    pub const fn fixed_count(self) -> Option<usize> {
        match self {
            Self::Fixed(flavors) => Some(flavors.len()),
            Self::InsertMid(..) => Some(1),
            _ => None,
        }
    }
}

/// Control-flow properties of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrFlags(u8);

impl InstrFlags {
    pub const NF: Self = Self(0x0);
    /// Terminal: the next instruction is not reached by falling through or by
    /// a callee returning.
    pub const TF: Self = Self(0x1);
    /// Control flow: after completing, the pc need not point at the next
    /// instruction.
    pub const CF: Self = Self(0x2);
    /// Uses the current function-call-in-progress record.
    pub const FF: Self = Self(0x4);
    pub const CF_TF: Self = Self(0x2 | 0x1);
    pub const CF_FF: Self = Self(0x2 | 0x4);

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// One row of the opcode table.
#[derive(Debug, Clone, Copy)]
pub struct OpInfo {
    pub op: Op,
    pub name: &'static str,
    pub imms: &'static [ArgType],
    pub inputs: StackSpec,
    pub outputs: StackSpec,
    pub flags: InstrFlags,
}

macro_rules! opcodes {
    (@stack []) => { StackSpec::Fixed(&[]) };
    (@stack [$($flavor:ident),+]) => { StackSpec::Fixed(&[$(Flavor::$flavor),+]) };
    (@stack ($depth:literal $flavor:ident)) => { StackSpec::InsertMid($depth, Flavor::$flavor) };
    (@stack $special:ident) => { StackSpec::$special };

    ($( $name:ident [$($imm:expr),*] $inputs:tt $outputs:tt $flags:ident; )*) => {
        /// A bytecode instruction kind. The discriminant is the encoded byte.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u8)]
        pub enum Op {
            $($name,)*
        }

        impl Op {
            /// Number of rows in the table, sentinels included.
            pub const COUNT: usize = [$(stringify!($name)),*].len();

            const ALL: [Op; Op::COUNT] = [$(Op::$name,)*];
        }

        const OP_TABLE_ROWS: [OpInfo; Op::COUNT] = [
            $(OpInfo {
                op: Op::$name,
                name: mnemonic(stringify!($name)),
                imms: &[$($imm),*],
                inputs: opcodes!(@stack $inputs),
                outputs: opcodes!(@stack $outputs),
                flags: InstrFlags::$flags,
            },)*
        ];
    };
}

use ArgType::{Aa, Ba, Bla, Da, I64a, Ia, Ila, Iva, La, Ma, Oa, Rata, Sa, Sla, Vsa};

opcodes! {
    //               immediates                                   inputs          outputs      flags
    LowInvalid       []                                           []              []           NF;
    Nop              []                                           []              []           NF;
    BreakTraceHint   []                                           []              []           NF;
    PopA             []                                           [Av]            []           NF;
    PopC             []                                           [Cv]            []           NF;
    PopV             []                                           [Vv]            []           NF;
    PopR             []                                           [Rv]            []           NF;
    Dup              []                                           [Cv]            [Cv, Cv]     NF;
    Box              []                                           [Cv]            [Vv]         NF;
    Unbox            []                                           [Vv]            [Cv]         NF;
    BoxR             []                                           [Rv]            [Vv]         NF;
    BoxRNop          []                                           [Rv]            [Vv]         NF;
    UnboxR           []                                           [Rv]            [Cv]         NF;
    UnboxRNop        []                                           [Rv]            [Cv]         NF;
    RGetCNop         []                                           [Cv]            [Rv]         NF;
    Null             []                                           []              [Cv]         NF;
    NullUninit       []                                           []              [Uv]         NF;
    True             []                                           []              [Cv]         NF;
    False            []                                           []              [Cv]         NF;
    Int              [I64a]                                       []              [Cv]         NF;
    Double           [Da]                                         []              [Cv]         NF;
    String           [Sa]                                         []              [Cv]         NF;
    Array            [Aa]                                         []              [Cv]         NF;
    NewArray         [Iva]                                        []              [Cv]         NF;
    NewMixedArray    [Iva]                                        []              [Cv]         NF;
    NewLikeArrayL    [La, Iva]                                    []              [Cv]         NF;
    NewPackedArray   [Iva]                                        CMany           [Cv]         NF;
    NewStructArray   [Vsa]                                        SMany           [Cv]         NF;
    AddElemC         []                                           [Cv, Cv, Cv]    [Cv]         NF;
    AddElemV         []                                           [Vv, Cv, Cv]    [Cv]         NF;
    AddNewElemC      []                                           [Cv, Cv]        [Cv]         NF;
    AddNewElemV      []                                           [Vv, Cv]        [Cv]         NF;
    NewCol           [Iva]                                        []              [Cv]         NF;
    ColFromArray     [Iva]                                        [Cv]            [Cv]         NF;
    MapAddElemC      []                                           [Cv, Cv, Cv]    [Cv]         NF;
    ColAddNewElemC   []                                           [Cv, Cv]        [Cv]         NF;
    Cns              [Sa]                                         []              [Cv]         NF;
    CnsE             [Sa]                                         []              [Cv]         NF;
    CnsU             [Sa, Sa]                                     []              [Cv]         NF;
    ClsCns           [Sa]                                         [Av]            [Cv]         NF;
    ClsCnsD          [Sa, Sa]                                     []              [Cv]         NF;
    NameA            []                                           [Av]            [Cv]         NF;
    File             []                                           []              [Cv]         NF;
    Dir              []                                           []              [Cv]         NF;
    Concat           []                                           [Cv, Cv]        [Cv]         NF;
    ConcatN          [Iva]                                        CMany           [Cv]         NF;
    Add              []                                           [Cv, Cv]        [Cv]         NF;
    Sub              []                                           [Cv, Cv]        [Cv]         NF;
    Mul              []                                           [Cv, Cv]        [Cv]         NF;
    AddO             []                                           [Cv, Cv]        [Cv]         NF;
    SubO             []                                           [Cv, Cv]        [Cv]         NF;
    MulO             []                                           [Cv, Cv]        [Cv]         NF;
    Div              []                                           [Cv, Cv]        [Cv]         NF;
    Mod              []                                           [Cv, Cv]        [Cv]         NF;
    Pow              []                                           [Cv, Cv]        [Cv]         NF;
    Xor              []                                           [Cv, Cv]        [Cv]         NF;
    Not              []                                           [Cv]            [Cv]         NF;
    Same             []                                           [Cv, Cv]        [Cv]         NF;
    NSame            []                                           [Cv, Cv]        [Cv]         NF;
    Eq               []                                           [Cv, Cv]        [Cv]         NF;
    Neq              []                                           [Cv, Cv]        [Cv]         NF;
    Lt               []                                           [Cv, Cv]        [Cv]         NF;
    Lte              []                                           [Cv, Cv]        [Cv]         NF;
    Gt               []                                           [Cv, Cv]        [Cv]         NF;
    Gte              []                                           [Cv, Cv]        [Cv]         NF;
    BitAnd           []                                           [Cv, Cv]        [Cv]         NF;
    BitOr            []                                           [Cv, Cv]        [Cv]         NF;
    BitXor           []                                           [Cv, Cv]        [Cv]         NF;
    BitNot           []                                           [Cv]            [Cv]         NF;
    Shl              []                                           [Cv, Cv]        [Cv]         NF;
    Shr              []                                           [Cv, Cv]        [Cv]         NF;
    CastBool         []                                           [Cv]            [Cv]         NF;
    CastInt          []                                           [Cv]            [Cv]         NF;
    CastDouble       []                                           [Cv]            [Cv]         NF;
    CastString       []                                           [Cv]            [Cv]         NF;
    CastArray        []                                           [Cv]            [Cv]         NF;
    CastObject       []                                           [Cv]            [Cv]         NF;
    InstanceOf       []                                           [Cv, Cv]        [Cv]         NF;
    InstanceOfD      [Sa]                                         [Cv]            [Cv]         NF;
    Print            []                                           [Cv]            [Cv]         NF;
    Clone            []                                           [Cv]            [Cv]         NF;
    Exit             []                                           [Cv]            [Cv]         NF;
    Fatal            [Oa(SubopKind::Fatal)]                       [Cv]            []           TF;
    // is_jmp: Jmp ..= JmpNZ
    Jmp              [Ba]                                         []              []           CF_TF;
    JmpNS            [Ba]                                         []              []           CF_TF;
    JmpZ             [Ba]                                         [Cv]            []           CF;
    JmpNZ            [Ba]                                         [Cv]            []           CF;
    Switch           [Bla, I64a, Oa(SubopKind::Switch)]           [Cv]            []           CF_TF;
    SSwitch          [Sla]                                        [Cv]            []           CF_TF;
    RetC             []                                           [Cv]            []           CF_TF;
    RetV             []                                           [Vv]            []           CF_TF;
    Unwind           []                                           []              []           TF;
    Throw            []                                           [Cv]            []           TF;
    CGetL            [La]                                         []              [Cv]         NF;
    CUGetL           [La]                                         []              [Cuv]        NF;
    CGetL2           [La]                                         []              (1 Cv)       NF;
    CGetL3           [La]                                         []              (2 Cv)       NF;
    PushL            [La]                                         []              [Cv]         NF;
    CGetN            []                                           [Cv]            [Cv]         NF;
    CGetG            []                                           [Cv]            [Cv]         NF;
    CGetS            []                                           [Av, Cv]        [Cv]         NF;
    CGetM            [Ma]                                         MMany           [Cv]         NF;
    VGetL            [La]                                         []              [Vv]         NF;
    VGetN            []                                           [Cv]            [Vv]         NF;
    VGetG            []                                           [Cv]            [Vv]         NF;
    VGetS            []                                           [Av, Cv]        [Vv]         NF;
    VGetM            [Ma]                                         MMany           [Vv]         NF;
    AGetC            []                                           [Cv]            [Av]         NF;
    AGetL            [La]                                         []              [Av]         NF;
    GetMemoKey       []                                           [Cv]            [Cv]         NF;
    AKExists         []                                           [Cv, Cv]        [Cv]         NF;
    IssetL           [La]                                         []              [Cv]         NF;
    IssetN           []                                           [Cv]            [Cv]         NF;
    IssetG           []                                           [Cv]            [Cv]         NF;
    IssetS           []                                           [Av, Cv]        [Cv]         NF;
    IssetM           [Ma]                                         MMany           [Cv]         NF;
    EmptyL           [La]                                         []              [Cv]         NF;
    EmptyN           []                                           [Cv]            [Cv]         NF;
    EmptyG           []                                           [Cv]            [Cv]         NF;
    EmptyS           []                                           [Av, Cv]        [Cv]         NF;
    EmptyM           [Ma]                                         MMany           [Cv]         NF;
    IsTypeC          [Oa(SubopKind::IsType)]                      [Cv]            [Cv]         NF;
    IsTypeL          [La, Oa(SubopKind::IsType)]                  []              [Cv]         NF;
    AssertRATL       [La, Rata]                                   []              []           NF;
    AssertRATStk     [Iva, Rata]                                  []              []           NF;
    SetL             [La]                                         [Cv]            [Cv]         NF;
    SetN             []                                           [Cv, Cv]        [Cv]         NF;
    SetG             []                                           [Cv, Cv]        [Cv]         NF;
    SetS             []                                           [Cv, Av, Cv]    [Cv]         NF;
    SetM             [Ma]                                         CMMany          [Cv]         NF;
    SetWithRefLM     [Ma, La]                                     MMany           []           NF;
    SetWithRefRM     [Ma]                                         RMMany          []           NF;
    SetOpL           [La, Oa(SubopKind::SetOp)]                   [Cv]            [Cv]         NF;
    SetOpN           [Oa(SubopKind::SetOp)]                       [Cv, Cv]        [Cv]         NF;
    SetOpG           [Oa(SubopKind::SetOp)]                       [Cv, Cv]        [Cv]         NF;
    SetOpS           [Oa(SubopKind::SetOp)]                       [Cv, Av, Cv]    [Cv]         NF;
    SetOpM           [Oa(SubopKind::SetOp), Ma]                   CMMany          [Cv]         NF;
    IncDecL          [La, Oa(SubopKind::IncDec)]                  []              [Cv]         NF;
    IncDecN          [Oa(SubopKind::IncDec)]                      [Cv]            [Cv]         NF;
    IncDecG          [Oa(SubopKind::IncDec)]                      [Cv]            [Cv]         NF;
    IncDecS          [Oa(SubopKind::IncDec)]                      [Av, Cv]        [Cv]         NF;
    IncDecM          [Oa(SubopKind::IncDec), Ma]                  MMany           [Cv]         NF;
    BindL            [La]                                         [Vv]            [Vv]         NF;
    BindN            []                                           [Vv, Cv]        [Vv]         NF;
    BindG            []                                           [Vv, Cv]        [Vv]         NF;
    BindS            []                                           [Vv, Av, Cv]    [Vv]         NF;
    BindM            [Ma]                                         VMMany          [Vv]         NF;
    UnsetL           [La]                                         []              []           NF;
    UnsetN           []                                           [Cv]            []           NF;
    UnsetG           []                                           [Cv]            []           NF;
    UnsetM           [Ma]                                         MMany           []           NF;
    // is_fpush: FPushFunc ..= FPushCufSafe
    // is_fpush_func: FPushFunc ..= FPushFuncU
    FPushFunc        [Iva]                                        [Cv]            []           NF;
    FPushFuncD       [Iva, Sa]                                    []              []           NF;
    FPushFuncU       [Iva, Sa, Sa]                                []              []           NF;
    FPushObjMethod   [Iva, Oa(SubopKind::ObjMethod)]              [Cv, Cv]        []           NF;
    FPushObjMethodD  [Iva, Sa, Oa(SubopKind::ObjMethod)]          [Cv]            []           NF;
    // is_fpush_cls_method: FPushClsMethod ..= FPushClsMethodD
    FPushClsMethod   [Iva]                                        [Av, Cv]        []           NF;
    FPushClsMethodF  [Iva]                                        [Av, Cv]        []           NF;
    FPushClsMethodD  [Iva, Sa, Sa]                                []              []           NF;
    FPushCtor        [Iva]                                        [Av]            [Cv]         NF;
    FPushCtorD       [Iva, Sa]                                    []              [Cv]         NF;
    // is_fpush_cuf: FPushCufIter ..= FPushCufSafe
    FPushCufIter     [Iva, Ia]                                    []              []           NF;
    FPushCuf         [Iva]                                        [Cv]            []           NF;
    FPushCufF        [Iva]                                        [Cv]            []           NF;
    FPushCufSafe     [Iva]                                        [Cv, Cv]        [Cv, Cv]     NF;
    FPassC           [Iva]                                        [Cv]            [Fv]         FF;
    FPassCW          [Iva]                                        [Cv]            [Fv]         FF;
    FPassCE          [Iva]                                        [Cv]            [Fv]         FF;
    FPassV           [Iva]                                        [Vv]            [Fv]         FF;
    FPassVNop        [Iva]                                        [Vv]            [Fv]         FF;
    FPassR           [Iva]                                        [Rv]            [Fv]         FF;
    FPassL           [Iva, La]                                    []              [Fv]         FF;
    FPassN           [Iva]                                        [Cv]            [Fv]         FF;
    FPassG           [Iva]                                        [Cv]            [Fv]         FF;
    FPassS           [Iva]                                        [Av, Cv]        [Fv]         FF;
    FPassM           [Iva, Ma]                                    MMany           [Fv]         FF;
    FCall            [Iva]                                        FMany           [Rv]         CF_FF;
    FCallD           [Iva, Sa, Sa]                                FMany           [Rv]         CF_FF;
    FCallUnpack      [Iva]                                        FMany           [Rv]         CF_FF;
    FCallArray       []                                           [Fv]            [Rv]         CF_FF;
    FCallBuiltin     [Iva, Iva, Sa]                               CvuMany         [Rv]         NF;
    CufSafeArray     []                                           [Rv, Cv, Cv]    [Cv]         NF;
    CufSafeReturn    []                                           [Rv, Cv, Cv]    [Rv]         NF;
    IterInit         [Ia, Ba, La]                                 [Cv]            []           CF;
    MIterInit        [Ia, Ba, La]                                 [Vv]            []           CF;
    WIterInit        [Ia, Ba, La]                                 [Cv]            []           CF;
    IterInitK        [Ia, Ba, La, La]                             [Cv]            []           CF;
    MIterInitK       [Ia, Ba, La, La]                             [Vv]            []           CF;
    WIterInitK       [Ia, Ba, La, La]                             [Cv]            []           CF;
    IterNext         [Ia, Ba, La]                                 []              []           CF;
    MIterNext        [Ia, Ba, La]                                 []              []           CF;
    WIterNext        [Ia, Ba, La]                                 []              []           CF;
    IterNextK        [Ia, Ba, La, La]                             []              []           CF;
    MIterNextK       [Ia, Ba, La, La]                             []              []           CF;
    WIterNextK       [Ia, Ba, La, La]                             []              []           CF;
    DecodeCufIter    [Ia, Ba]                                     [Cv]            []           CF;
    IterFree         [Ia]                                         []              []           NF;
    MIterFree        [Ia]                                         []              []           NF;
    CIterFree        [Ia]                                         []              []           NF;
    IterBreak        [Ila, Ba]                                    []              []           CF_TF;
    Incl             []                                           [Cv]            [Cv]         CF;
    InclOnce         []                                           [Cv]            [Cv]         CF;
    Req              []                                           [Cv]            [Cv]         CF;
    ReqOnce          []                                           [Cv]            [Cv]         CF;
    ReqDoc           []                                           [Cv]            [Cv]         CF;
    Eval             []                                           [Cv]            [Cv]         CF;
    DefFunc          [Iva]                                        []              []           NF;
    DefCls           [Iva]                                        []              []           NF;
    DefClsNop        [Iva]                                        []              []           NF;
    DefCns           [Sa]                                         [Cv]            [Cv]         NF;
    DefTypeAlias     [Iva]                                        []              []           NF;
    This             []                                           []              [Cv]         NF;
    BareThis         [Oa(SubopKind::BareThis)]                    []              [Cv]         NF;
    CheckThis        []                                           []              []           NF;
    InitThisLoc      [La]                                         []              []           NF;
    StaticLoc        [La, Sa]                                     []              [Cv]         NF;
    StaticLocInit    [La, Sa]                                     [Cv]            []           NF;
    Catch            []                                           []              [Cv]         NF;
    OODeclExists     [Oa(SubopKind::OODeclExists)]                [Cv, Cv]        [Cv]         NF;
    VerifyParamType  [La]                                         []              []           NF;
    VerifyRetTypeC   []                                           [Cv]            [Cv]         NF;
    VerifyRetTypeV   []                                           [Vv]            [Vv]         NF;
    Self_            []                                           []              [Av]         NF;
    Parent           []                                           []              [Av]         NF;
    LateBoundCls     []                                           []              [Av]         NF;
    NativeImpl       []                                           []              []           CF_TF;
    CreateCl         [Iva, Sa]                                    CvuMany         [Cv]         NF;
    CreateCont       []                                           []              [Cv]         CF;
    ContEnter        []                                           [Cv]            [Cv]         CF;
    ContRaise        []                                           [Cv]            [Cv]         CF;
    Yield            []                                           [Cv]            [Cv]         CF;
    YieldK           []                                           [Cv, Cv]        [Cv]         CF;
    ContCheck        [Iva]                                        []              []           NF;
    ContValid        []                                           []              [Cv]         NF;
    ContKey          []                                           []              [Cv]         NF;
    ContCurrent      []                                           []              [Cv]         NF;
    WHResult         []                                           [Cv]            [Cv]         NF;
    Await            [Iva]                                        [Cv]            [Cv]         CF;
    IncStat          [Iva, Iva]                                   []              []           NF;
    Idx              []                                           [Cv, Cv, Cv]    [Cv]         NF;
    ArrayIdx         []                                           [Cv, Cv, Cv]    [Cv]         NF;
    CheckProp        [Sa]                                         []              [Cv]         NF;
    InitProp         [Sa, Oa(SubopKind::InitProp)]                [Cv]            []           NF;
    Silence          [La, Oa(SubopKind::Silence)]                 []              []           NF;
    BaseL            [La, Oa(SubopKind::MOpFlags)]                []              []           NF;
    BaseH            []                                           []              []           NF;
    DimL             [La, Oa(SubopKind::PropElem), Oa(SubopKind::MOpFlags)]   []  []           NF;
    DimC             [Iva, Oa(SubopKind::PropElem), Oa(SubopKind::MOpFlags)]  []  []           NF;
    DimInt           [I64a, Oa(SubopKind::PropElem), Oa(SubopKind::MOpFlags)] []  []           NF;
    DimStr           [Sa, Oa(SubopKind::PropElem), Oa(SubopKind::MOpFlags)]   []  []           NF;
    QueryML          [Iva, Oa(SubopKind::QueryM), Oa(SubopKind::PropElem), La]   MFinal [Cv]   NF;
    QueryMC          [Iva, Oa(SubopKind::QueryM), Oa(SubopKind::PropElem)]       MFinal [Cv]   NF;
    QueryMInt        [Iva, Oa(SubopKind::QueryM), Oa(SubopKind::PropElem), I64a] MFinal [Cv]   NF;
    QueryMStr        [Iva, Oa(SubopKind::QueryM), Oa(SubopKind::PropElem), Sa]   MFinal [Cv]   NF;
    HighInvalid      []                                           []              []           NF;
}

// Every row must sit at its opcode's ordinal.
const _: () = {
    let mut i = 0;
    while i < Op::COUNT {
        assert!(OP_TABLE_ROWS[i].op as usize == i);
        i += 1;
    }
};

static OP_TABLE: [OpInfo; Op::COUNT] = OP_TABLE_ROWS;

/// Identifiers that collide with keywords carry a trailing underscore.
const fn mnemonic(ident: &'static str) -> &'static str {
    match ident.as_bytes().split_last() {
        Some((b'_', rest)) => match std::str::from_utf8(rest) {
            Ok(name) => name,
            Err(_) => ident,
        },
        _ => ident,
    }
}

static NAME_INDEX: LazyLock<HashMap<&'static str, Op>> = LazyLock::new(|| {
    OP_TABLE
        .iter()
        .filter(|info| info.op.is_valid())
        .map(|info| (info.name, info.op))
        .collect()
});

impl Op {
    /// Decode an opcode byte. Sentinel ordinals decode to their sentinel; use
    /// [`Op::is_valid`] to reject them.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Op> {
        Self::ALL.get(usize::from(byte)).copied()
    }

    /// Look up a valid opcode by its mnemonic.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Op> {
        NAME_INDEX.get(name).copied()
    }

    /// All valid opcodes in declaration order.
    pub fn valid() -> impl Iterator<Item = Op> {
        OP_TABLE[1..Op::COUNT - 1].iter().map(|info| info.op)
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self as u8 > Op::LowInvalid as u8 && (self as u8) < Op::HighInvalid as u8
    }

    #[must_use]
    pub fn info(self) -> &'static OpInfo {
        &OP_TABLE[self as usize]
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    #[must_use]
    pub fn flags(self) -> InstrFlags {
        self.info().flags
    }

    #[must_use]
    pub fn num_immediates(self) -> usize {
        self.info().imms.len()
    }

    /// # Panics
    /// If `idx` is not below [`Op::num_immediates`].
    #[must_use]
    pub fn imm_type(self, idx: usize) -> ArgType {
        let imms = self.info().imms;
        assert!(
            idx < imms.len(),
            "{} has {} immediates, asked for {idx}",
            self.name(),
            imms.len()
        );
        imms[idx]
    }

    #[must_use]
    pub fn imm_is_vector(self, idx: usize) -> bool {
        self.imm_type(idx).is_vector()
    }

    #[must_use]
    pub fn has_imm_vector(self) -> bool {
        self.info().imms.iter().any(|imm| imm.is_vector())
    }

    /// Index of the first immediate of type `ty`, if any.
    #[must_use]
    pub fn imm_index(self, ty: ArgType) -> Option<usize> {
        self.info().imms.iter().position(|imm| *imm == ty)
    }

    #[must_use]
    pub fn is_control_flow(self) -> bool {
        self.flags().contains(InstrFlags::CF)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.flags().contains(InstrFlags::TF)
    }

    #[must_use]
    pub fn allows_fall_thru(self) -> bool {
        !self.is_terminal()
    }

    #[must_use]
    pub fn reads_current_fpi(self) -> bool {
        self.flags().contains(InstrFlags::FF)
    }

    /// Control flow that leaves the frame but resumes at the next instruction
    /// when control returns here (calls, includes, generator and async
    /// suspension) is excluded. Within a frame those behave as fall-through.
    #[must_use]
    pub fn is_non_call_control_flow(self) -> bool {
        if !self.is_control_flow() || self.is_fcall_star() {
            return false;
        }
        !matches!(
            self,
            Op::Await
                | Op::Yield
                | Op::YieldK
                | Op::ContEnter
                | Op::ContRaise
                | Op::CreateCont
                | Op::FCallBuiltin
                | Op::Incl
                | Op::InclOnce
                | Op::Req
                | Op::ReqOnce
                | Op::ReqDoc
                | Op::Eval
        )
    }

    #[must_use]
    pub const fn has_conditional_branch(self) -> bool {
        matches!(
            self,
            Op::JmpZ
                | Op::JmpNZ
                | Op::IterInit
                | Op::MIterInit
                | Op::WIterInit
                | Op::IterInitK
                | Op::MIterInitK
                | Op::WIterInitK
                | Op::IterNext
                | Op::MIterNext
                | Op::WIterNext
                | Op::IterNextK
                | Op::MIterNextK
                | Op::WIterNextK
                | Op::DecodeCufIter
        )
    }

    /// Opcodes that begin a call sequence by pushing an activation record.
    #[must_use]
    pub const fn pushes_act_rec(self) -> bool {
        self.is_fpush()
    }

    #[must_use]
    pub const fn is_unconditional_jmp(self) -> bool {
        matches!(self, Op::Jmp | Op::JmpNS)
    }

    #[must_use]
    pub const fn is_conditional_jmp(self) -> bool {
        matches!(self, Op::JmpZ | Op::JmpNZ)
    }

    #[must_use]
    pub const fn is_jmp(self) -> bool {
        in_range(self, Op::Jmp, Op::JmpNZ)
    }

    #[must_use]
    pub const fn is_fpush(self) -> bool {
        in_range(self, Op::FPushFunc, Op::FPushCufSafe)
    }

    #[must_use]
    pub const fn is_fpush_cuf(self) -> bool {
        in_range(self, Op::FPushCufIter, Op::FPushCufSafe)
    }

    #[must_use]
    pub const fn is_fpush_cls_method(self) -> bool {
        in_range(self, Op::FPushClsMethod, Op::FPushClsMethodD)
    }

    #[must_use]
    pub const fn is_fpush_ctor(self) -> bool {
        matches!(self, Op::FPushCtor | Op::FPushCtorD)
    }

    #[must_use]
    pub const fn is_fpush_func(self) -> bool {
        in_range(self, Op::FPushFunc, Op::FPushFuncU)
    }

    #[must_use]
    pub const fn is_fcall_star(self) -> bool {
        matches!(self, Op::FCall | Op::FCallD | Op::FCallArray | Op::FCallUnpack)
    }

    #[must_use]
    pub const fn is_fpass_star(self) -> bool {
        matches!(
            self,
            Op::FPassC
                | Op::FPassCW
                | Op::FPassCE
                | Op::FPassV
                | Op::FPassR
                | Op::FPassL
                | Op::FPassN
                | Op::FPassG
                | Op::FPassS
                | Op::FPassM
        )
    }

    #[must_use]
    pub const fn is_ret(self) -> bool {
        matches!(self, Op::RetC | Op::RetV)
    }

    #[must_use]
    pub const fn is_returnish(self) -> bool {
        self.is_ret() || matches!(self, Op::NativeImpl)
    }

    #[must_use]
    pub const fn is_switch(self) -> bool {
        matches!(self, Op::Switch | Op::SSwitch)
    }

    #[must_use]
    pub const fn is_type_assert(self) -> bool {
        matches!(self, Op::AssertRATL | Op::AssertRATStk)
    }

    #[must_use]
    pub const fn is_member_base_op(self) -> bool {
        matches!(self, Op::BaseL | Op::BaseH)
    }

    #[must_use]
    pub const fn is_member_dim_op(self) -> bool {
        matches!(self, Op::DimL | Op::DimC | Op::DimInt | Op::DimStr)
    }

    #[must_use]
    pub const fn is_member_final_op(self) -> bool {
        matches!(
            self,
            Op::QueryML | Op::QueryMC | Op::QueryMInt | Op::QueryMStr
        )
    }
}

const fn in_range(op: Op, first: Op, last: Op) -> bool {
    op as u8 >= first as u8 && op as u8 <= last as u8
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows_match_ordinals() {
        assert_eq!(OP_TABLE.len(), Op::COUNT);
        for (i, info) in OP_TABLE.iter().enumerate() {
            assert_eq!(info.op as usize, i, "row {i} is {}", info.name);
            assert_eq!(Op::from_u8(u8::try_from(i).unwrap()), Some(info.op));
        }
        assert_eq!(Op::from_u8(u8::try_from(Op::COUNT).unwrap()), None);
    }

    #[test]
    fn test_sentinels_are_invalid() {
        assert!(!Op::LowInvalid.is_valid());
        assert!(!Op::HighInvalid.is_valid());
        assert!(Op::Nop.is_valid());
        assert!(Op::QueryMStr.is_valid());
        assert_eq!(Op::valid().count(), Op::COUNT - 2);
        assert!(Op::valid().all(Op::is_valid));
    }

    #[test]
    fn test_names_round_trip() {
        for op in Op::valid() {
            assert_eq!(Op::from_name(op.name()), Some(op));
        }
        assert_eq!(Op::from_name("LowInvalid"), None);
        assert_eq!(Op::from_name("NotAnOpcode"), None);
        assert_eq!(Op::Self_.to_string(), "Self");
        assert_eq!(Op::from_name("Self"), Some(Op::Self_));
    }

    #[test]
    fn test_at_most_four_immediates() {
        for op in Op::valid() {
            assert!(op.num_immediates() <= 4, "{op} has too many immediates");
        }
        assert_eq!(Op::IterInitK.num_immediates(), 4);
        assert_eq!(Op::Nop.num_immediates(), 0);
    }

    #[test]
    fn test_imm_type_lookup() {
        assert_eq!(Op::Switch.imm_type(0), ArgType::Bla);
        assert_eq!(Op::Switch.imm_type(2), ArgType::Oa(SubopKind::Switch));
        assert!(Op::SetOpM.imm_is_vector(1));
        assert!(!Op::SetOpM.imm_is_vector(0));
        assert!(Op::NewStructArray.has_imm_vector());
        assert!(!Op::Jmp.has_imm_vector());
        assert_eq!(Op::SetWithRefLM.imm_index(ArgType::La), Some(1));
    }

    #[test]
    #[should_panic(expected = "has 1 immediates")]
    fn test_imm_type_past_end_panics() {
        let _ = Op::Jmp.imm_type(1);
    }

    #[test]
    fn test_control_flow_flags() {
        assert!(Op::Jmp.is_control_flow());
        assert!(Op::Jmp.is_terminal());
        assert!(Op::JmpZ.is_control_flow());
        assert!(Op::JmpZ.allows_fall_thru());
        assert!(Op::Throw.is_terminal());
        assert!(!Op::Throw.is_control_flow());
        assert!(Op::FPassC.reads_current_fpi());
        assert!(Op::FCall.reads_current_fpi());
        assert!(!Op::Add.is_control_flow());
    }

    #[test]
    fn test_non_call_control_flow() {
        assert!(Op::FCall.is_control_flow());
        assert!(!Op::FCall.is_non_call_control_flow());
        assert!(!Op::Eval.is_non_call_control_flow());
        assert!(!Op::Await.is_non_call_control_flow());
        assert!(Op::Jmp.is_non_call_control_flow());
        assert!(Op::IterNext.is_non_call_control_flow());
        assert!(Op::RetC.is_non_call_control_flow());
        assert!(!Op::Add.is_non_call_control_flow());
    }

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(ArgType::I64a.fixed_size(), Some(8));
        assert_eq!(ArgType::Ba.fixed_size(), Some(4));
        assert_eq!(ArgType::Oa(SubopKind::Fatal).fixed_size(), Some(1));
        assert_eq!(ArgType::Iva.fixed_size(), None);
        assert_eq!(ArgType::Ma.fixed_size(), None);
        assert_eq!(ArgType::Sla.vector_elem_size(), Some(8));
        assert_eq!(ArgType::Ma.vector_elem_size(), None);
    }
}
