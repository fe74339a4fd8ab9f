//! Reading and writing immediate operands.
//!
//! All reads go through [`Cursor`], which checks every access against the end
//! of the buffer. Fixed-width operands are little-endian.
//!
//! Variable-width integers (`IVA`, `LA`, `IA`) use one or four bytes. The low
//! bit of the first byte selects the width: clear for a single byte, set for a
//! 32-bit word. Either way the value is the raw integer shifted right by one.
//! Values up to 127 always take the short form.

use super::imm_vector::ImmVector;
use super::opcode::{ArgType, Op};
use super::repo_type::RepoAuthType;
use super::subop::SubopKind;
use crate::error::{Error, Result};

/// Index into a unit's literal string or array table.
pub type Id = u32;

/// Bytecode offset, relative to the start of an instruction when encoded in a
/// `BA` or vector immediate.
pub type Offset = i32;

/// Largest value a variable-width immediate can hold.
pub const IVA_MAX: u32 = (1 << 31) - 1;

/// Bounds-checked reader over an instruction stream.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    fn truncated(&self, needed: usize) -> Error {
        Error::Truncated {
            offset: self.pos,
            needed,
            available: self.bytes.len().saturating_sub(self.pos),
        }
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| self.truncated(len))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_slice(len).map(|_| ())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.read_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn peek_u8(&self) -> Result<u8> {
        self.bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.truncated(1))
    }

    pub fn peek_i32(&self) -> Result<i32> {
        self.clone().read_i32()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_array().map(i64::from_le_bytes)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_array().map(f64::from_le_bytes)
    }

    /// Read a variable-width immediate.
    pub fn read_iva(&mut self) -> Result<u32> {
        let small = self.peek_u8()?;
        if small & 1 == 0 {
            self.pos += 1;
            Ok(u32::from(small >> 1))
        } else {
            self.read_u32().map(|large| large >> 1)
        }
    }

    /// Width of the variable-width immediate at the cursor.
    pub fn peek_iva_width(&self) -> Result<usize> {
        let small = self.peek_u8()?;
        let width = if small & 1 == 0 { 1 } else { 4 };
        if self.bytes.len() - self.pos < width {
            return Err(self.truncated(width));
        }
        Ok(width)
    }

    pub fn read_op(&mut self) -> Result<Op> {
        let offset = self.pos;
        let byte = self.read_u8()?;
        Op::from_u8(byte)
            .filter(|op| op.is_valid())
            .ok_or(Error::InvalidOpcode { offset, byte })
    }
}

/// Decode the variable-width immediate at `pos`, returning the value and the
/// number of bytes it occupied.
pub fn decode_variable_size_imm(bytes: &[u8], pos: usize) -> Result<(u32, usize)> {
    let mut cursor = Cursor::new(bytes, pos);
    let value = cursor.read_iva()?;
    Ok((value, cursor.pos() - pos))
}

/// Encode `value` into `buf`, returning the number of bytes used.
///
/// # Panics
/// If `value` exceeds [`IVA_MAX`].
pub fn encode_variable_size_imm(value: u32, buf: &mut [u8; 4]) -> usize {
    assert!(value <= IVA_MAX, "variable-width immediate {value} out of range");
    if value <= 0x7f {
        buf[0] = (value << 1) as u8;
        1
    } else {
        *buf = ((value << 1) | 1).to_le_bytes();
        4
    }
}

/// Append the variable-width encoding of `value` to `out`.
///
/// # Panics
/// If `value` exceeds [`IVA_MAX`].
pub fn encode_iva(value: u32, out: &mut Vec<u8>) {
    let mut buf = [0u8; 4];
    let len = encode_variable_size_imm(value, &mut buf);
    out.extend_from_slice(&buf[..len]);
}

/// A decoded immediate operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Imm<'a> {
    Iva(u32),
    Local(u32),
    Iter(u32),
    Int64(i64),
    Double(f64),
    Str(Id),
    Arr(Id),
    Rat(RepoAuthType),
    Offset(Offset),
    Subop(SubopKind, u8),
    Vector(ImmVector<'a>),
}

impl<'a> Imm<'a> {
    /// The value of a variable-width immediate.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Self::Iva(v) | Self::Local(v) | Self::Iter(v) => Some(v),
            _ => None,
        }
    }

    /// Immediate type name as written in the opcode table.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Iva(_) => "IVA",
            Self::Local(_) => "LA",
            Self::Iter(_) => "IA",
            Self::Int64(_) => "I64A",
            Self::Double(_) => "DA",
            Self::Str(_) => "SA",
            Self::Arr(_) => "AA",
            Self::Rat(_) => "RATA",
            Self::Offset(_) => "BA",
            Self::Subop(..) => "OA",
            Self::Vector(vec) if vec.is_member_vector() => "MA",
            Self::Vector(_) => "vector",
        }
    }

    #[must_use]
    pub fn as_vector(&self) -> Option<ImmVector<'a>> {
        match *self {
            Self::Vector(vec) => Some(vec),
            _ => None,
        }
    }
}

/// Decode one immediate of type `ty` at the cursor and advance past it.
pub fn decode_imm<'a>(cursor: &mut Cursor<'a>, ty: ArgType) -> Result<Imm<'a>> {
    Ok(match ty {
        ArgType::Iva => Imm::Iva(cursor.read_iva()?),
        ArgType::La => Imm::Local(cursor.read_iva()?),
        ArgType::Ia => Imm::Iter(cursor.read_iva()?),
        ArgType::I64a => Imm::Int64(cursor.read_i64()?),
        ArgType::Da => Imm::Double(cursor.read_f64()?),
        ArgType::Sa => Imm::Str(cursor.read_u32()?),
        ArgType::Aa => Imm::Arr(cursor.read_u32()?),
        ArgType::Ba => Imm::Offset(cursor.read_i32()?),
        ArgType::Rata => Imm::Rat(RepoAuthType::decode(cursor)?),
        // The byte is opaque here; `SubopKind::name_of` interprets it.
        ArgType::Oa(kind) => Imm::Subop(kind, cursor.read_u8()?),
        ArgType::Ma => {
            let vec = ImmVector::member_from_stream(cursor.bytes(), cursor.pos())?;
            cursor.skip(vec.encoded_len())?;
            Imm::Vector(vec)
        }
        ArgType::Bla | ArgType::Sla | ArgType::Ila | ArgType::Vsa => {
            let elem_size = ty.vector_elem_size().unwrap_or(4);
            let vec = ImmVector::counted_from_stream(cursor.bytes(), cursor.pos(), elem_size)?;
            cursor.skip(vec.encoded_len())?;
            Imm::Vector(vec)
        }
    })
}

/// Encoded width of the immediate of type `ty` at the cursor. Only headers
/// are read; the value itself is not materialized.
pub fn encoded_imm_size(cursor: &Cursor<'_>, ty: ArgType) -> Result<usize> {
    if let Some(size) = ty.fixed_size() {
        return Ok(size);
    }
    match ty {
        ArgType::Iva | ArgType::La | ArgType::Ia => cursor.peek_iva_width(),
        ArgType::Rata => RepoAuthType::encoded_size(cursor),
        ArgType::Ma => {
            let len = non_negative(cursor, cursor.peek_i32()?)?;
            if len == 0 {
                return Err(Error::EmptyMemberVector {
                    offset: cursor.pos(),
                });
            }
            Ok(2 * 4 + len)
        }
        _ => {
            let count = non_negative(cursor, cursor.peek_i32()?)?;
            let elem_size = ty.vector_elem_size().unwrap_or(4);
            Ok(4 + count * elem_size)
        }
    }
}

fn non_negative(cursor: &Cursor<'_>, length: i32) -> Result<usize> {
    usize::try_from(length).map_err(|_| Error::NegativeLength {
        offset: cursor.pos(),
        length,
    })
}

/// Byte offset of immediate `idx` of the instruction at `pc`.
///
/// # Panics
/// If `idx` is past the opcode's immediate list.
pub fn imm_offset(bytes: &[u8], pc: usize, idx: usize) -> Result<usize> {
    let mut cursor = Cursor::new(bytes, pc);
    let op = cursor.read_op()?;
    let _ = op.imm_type(idx);
    for &ty in &op.info().imms[..idx] {
        let size = encoded_imm_size(&cursor, ty)?;
        cursor.skip(size)?;
    }
    Ok(cursor.pos())
}

/// Encoded width of immediate `idx` of the instruction at `pc`.
///
/// # Panics
/// If `idx` is past the opcode's immediate list.
pub fn imm_size(bytes: &[u8], pc: usize, idx: usize) -> Result<usize> {
    let op = Cursor::new(bytes, pc).read_op()?;
    let at = imm_offset(bytes, pc, idx)?;
    encoded_imm_size(&Cursor::new(bytes, at), op.imm_type(idx))
}

/// Decode immediate `idx` of the instruction at `pc`.
///
/// # Panics
/// If `idx` is past the opcode's immediate list.
pub fn get_imm(bytes: &[u8], pc: usize, idx: usize) -> Result<Imm<'_>> {
    let op = Cursor::new(bytes, pc).read_op()?;
    let at = imm_offset(bytes, pc, idx)?;
    decode_imm(&mut Cursor::new(bytes, at), op.imm_type(idx))
}

/// Decode every immediate of the instruction at `pc`.
pub fn get_imms(bytes: &[u8], pc: usize) -> Result<(Op, Vec<Imm<'_>>)> {
    let mut cursor = Cursor::new(bytes, pc);
    let op = cursor.read_op()?;
    let imms = op
        .info()
        .imms
        .iter()
        .map(|&ty| decode_imm(&mut cursor, ty))
        .collect::<Result<Vec<_>>>()?;
    Ok((op, imms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_iva_is_one_byte() {
        let mut out = Vec::new();
        encode_iva(5, &mut out);
        assert_eq!(out, vec![0b0000_1010]);
        assert_eq!(decode_variable_size_imm(&out, 0).unwrap(), (5, 1));
    }

    #[test]
    fn test_large_iva_is_four_bytes() {
        let mut out = Vec::new();
        encode_iva(200, &mut out);
        assert_eq!(out, 401u32.to_le_bytes().to_vec());
        assert_eq!(decode_variable_size_imm(&out, 0).unwrap(), (200, 4));
    }

    #[test]
    fn test_iva_boundaries() {
        let mut buf = [0u8; 4];
        assert_eq!(encode_variable_size_imm(0, &mut buf), 1);
        assert_eq!(encode_variable_size_imm(127, &mut buf), 1);
        assert_eq!(buf[0], 254);
        assert_eq!(encode_variable_size_imm(128, &mut buf), 4);
        assert_eq!(encode_variable_size_imm(IVA_MAX, &mut buf), 4);
        assert_eq!(decode_variable_size_imm(&buf, 0).unwrap(), (IVA_MAX, 4));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_iva_above_max_panics() {
        let mut buf = [0u8; 4];
        encode_variable_size_imm(IVA_MAX + 1, &mut buf);
    }

    #[test]
    fn test_truncated_long_iva() {
        let bytes = [0x01, 0x00];
        assert_eq!(
            decode_variable_size_imm(&bytes, 0),
            Err(Error::Truncated {
                offset: 0,
                needed: 4,
                available: 2
            })
        );
        assert!(Cursor::new(&bytes, 0).peek_iva_width().is_err());
    }

    #[test]
    fn test_cursor_reads_little_endian() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-7i32).to_le_bytes());
        bytes.extend_from_slice(&1.5f64.to_le_bytes());
        let mut cursor = Cursor::new(&bytes, 0);
        assert_eq!(cursor.read_i32().unwrap(), -7);
        assert!((cursor.read_f64().unwrap() - 1.5).abs() < f64::EPSILON);
        assert!(cursor.read_u8().is_err());
    }

    #[test]
    fn test_read_op_rejects_sentinels() {
        let bytes = [Op::LowInvalid as u8, Op::HighInvalid as u8, 0xff];
        for pc in 0..bytes.len() {
            assert_eq!(
                Cursor::new(&bytes, pc).read_op(),
                Err(Error::InvalidOpcode {
                    offset: pc,
                    byte: bytes[pc]
                })
            );
        }
    }

    #[test]
    fn test_unknown_subop_byte_is_kept() {
        let bytes = [Op::IsTypeC as u8, 42];
        assert_eq!(get_imm(&bytes, 0, 0), Ok(Imm::Subop(SubopKind::IsType, 42)));
        assert_eq!(imm_size(&bytes, 0, 0), Ok(1));
    }

    #[test]
    fn test_imm_offsets_follow_variable_widths() {
        // IterInitK <I:3> <BA> <L:200> <L:1>
        let mut bytes = vec![Op::IterInitK as u8];
        encode_iva(3, &mut bytes);
        bytes.extend_from_slice(&12i32.to_le_bytes());
        encode_iva(200, &mut bytes);
        encode_iva(1, &mut bytes);

        assert_eq!(imm_offset(&bytes, 0, 0).unwrap(), 1);
        assert_eq!(imm_offset(&bytes, 0, 1).unwrap(), 2);
        assert_eq!(imm_offset(&bytes, 0, 2).unwrap(), 6);
        assert_eq!(imm_offset(&bytes, 0, 3).unwrap(), 10);
        assert_eq!(imm_size(&bytes, 0, 2).unwrap(), 4);
        assert_eq!(imm_size(&bytes, 0, 3).unwrap(), 1);
        assert_eq!(get_imm(&bytes, 0, 2).unwrap(), Imm::Local(200));
        assert_eq!(get_imm(&bytes, 0, 1).unwrap(), Imm::Offset(12));
    }
}
