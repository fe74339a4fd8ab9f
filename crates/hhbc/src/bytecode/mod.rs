//! The bytecode instruction set: opcodes, operand encodings and the analyses
//! that can be run over an encoded stream.

pub mod analysis;
pub mod disasm;
pub mod emitter;
pub mod imm_vector;
pub mod immediate;
pub mod member;
pub mod opcode;
pub mod repo_type;
pub mod subop;

pub use analysis::{
    InstrIter, StackTransInfo, instr_input_flavor, instr_jump_offset, instr_jump_target,
    instr_len, instr_num_pops, instr_num_pushes, instr_sp_to_ar_delta, instr_stack_trans_info,
    instr_succ_offsets, num_succs, sswitch_strings, switch_targets,
};
pub use disasm::instr_to_string;
pub use emitter::{Emitter, MemberVector};
pub use imm_vector::{ImmVector, LastMember, StrVecItem, get_imm_vector};
pub use immediate::{
    Cursor, IVA_MAX, Id, Imm, Offset, decode_variable_size_imm, encode_iva,
    encode_variable_size_imm, get_imm, get_imms, imm_offset, imm_size,
};
pub use member::{
    LocationCode, MInstr, MInstrAttr, MInstrInfo, MInstrLocation, MVectorItem, MemberCode,
    get_m_instr_info, get_m_location, get_m_op_flags, get_m_vector, has_m_vector,
};
pub use opcode::{ArgType, Flavor, InstrFlags, Op, OpInfo, StackSpec};
pub use repo_type::{RatTag, RepoAuthType};
pub use subop::{Subop, SubopKind, name_to_subop, subop_to_name};
