use crate::bytecode::ArgType;

/// Failures surfaced while decoding or encoding an instruction stream.
///
/// These describe malformed input. Misuse of the API by the caller (asking
/// for an immediate past the end of an opcode's list, encoding an
/// out-of-range variable-width value) is a programming error and panics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("stream truncated at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("invalid opcode byte {byte:#04x} at offset {offset}")]
    InvalidOpcode { offset: usize, byte: u8 },

    #[error("invalid location code {byte:#04x} at offset {offset}")]
    InvalidLocationCode { offset: usize, byte: u8 },

    #[error("invalid member code {byte:#04x} at offset {offset}")]
    InvalidMemberCode { offset: usize, byte: u8 },

    #[error("invalid repo type tag {byte:#04x} at offset {offset}")]
    InvalidRepoType { offset: usize, byte: u8 },

    #[error("negative vector length {length} at offset {offset}")]
    NegativeLength { offset: usize, length: i32 },

    #[error("jump at offset {pc} targets negative offset {target}")]
    JumpOutOfRange { pc: usize, target: i64 },

    #[error("member vector at offset {offset} has no member codes")]
    EmptyMemberVector { offset: usize },

    #[error("{op} takes {expected} immediates, got {found}")]
    ImmediateCount {
        op: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("immediate {idx} of {op} is {expected:?}, not {found}")]
    ImmediateMismatch {
        op: &'static str,
        idx: usize,
        expected: ArgType,
        found: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
