//! Borrowed views over vector immediates.
//!
//! Two on-stream forms exist:
//!
//! * member vectors (`MA`): an `i32` byte length, an `i32` count of stack
//!   values consumed, then the location code and member steps;
//! * counted vectors (`BLA`, `SLA`, `ILA`, `VSA`): an `i32` element count,
//!   then packed fixed-width elements.
//!
//! Which form applies is decided by the opcode's immediate type, never by the
//! bytes themselves.

use std::fmt;

use super::immediate::{Cursor, Id, Offset};
use super::member::{self, LocationCode, MCodeImm, MemberCode};
use crate::error::{Error, Result};
use crate::unit::UnitLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Form {
    #[default]
    Invalid,
    Member,
    Counted { elem_size: usize },
}

/// A vector immediate inside an instruction stream.
///
/// The default value is the invalid vector; views decoded from a stream are
/// always valid.
#[derive(Clone, Copy, PartialEq, Default)]
pub struct ImmVector<'a> {
    stream: &'a [u8],
    form: Form,
    /// Stream offset of the first payload byte.
    start: usize,
    /// Payload length in bytes.
    len: usize,
    num_stack: usize,
}

impl fmt::Debug for ImmVector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImmVector")
            .field("form", &self.form)
            .field("start", &self.start)
            .field("len", &self.len)
            .field("num_stack", &self.num_stack)
            .finish()
    }
}

fn read_length(cursor: &mut Cursor<'_>) -> Result<usize> {
    let offset = cursor.pos();
    let length = cursor.read_i32()?;
    usize::try_from(length).map_err(|_| Error::NegativeLength { offset, length })
}

impl<'a> ImmVector<'a> {
    /// View the member vector whose header starts at `pos`.
    pub fn member_from_stream(bytes: &'a [u8], pos: usize) -> Result<Self> {
        let mut cursor = Cursor::new(bytes, pos);
        let len = read_length(&mut cursor)?;
        let num_stack = read_length(&mut cursor)?;
        let start = cursor.pos();
        if len == 0 {
            return Err(Error::EmptyMemberVector { offset: pos });
        }
        cursor.skip(len)?;
        Ok(Self {
            stream: bytes,
            form: Form::Member,
            start,
            len,
            num_stack,
        })
    }

    /// View the counted vector of `elem_size`-byte elements at `pos`.
    pub fn counted_from_stream(bytes: &'a [u8], pos: usize, elem_size: usize) -> Result<Self> {
        let mut cursor = Cursor::new(bytes, pos);
        let count = read_length(&mut cursor)?;
        let start = cursor.pos();
        let len = count.checked_mul(elem_size).ok_or(Error::Truncated {
            offset: start,
            needed: usize::MAX,
            available: bytes.len().saturating_sub(start),
        })?;
        cursor.skip(len)?;
        Ok(Self {
            stream: bytes,
            form: Form::Counted { elem_size },
            start,
            len,
            num_stack: 0,
        })
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.form != Form::Invalid
    }

    #[must_use]
    pub fn is_member_vector(&self) -> bool {
        self.form == Form::Member
    }

    /// Byte length of a member vector, or element count of a counted one.
    #[must_use]
    pub fn size(&self) -> usize {
        match self.form {
            Form::Invalid => 0,
            Form::Member => self.len,
            Form::Counted { elem_size } => self.len / elem_size,
        }
    }

    /// Stack values consumed by a member vector. Zero for counted vectors.
    #[must_use]
    pub fn num_stack_values(&self) -> usize {
        self.num_stack
    }

    /// Payload bytes, without the header.
    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        &self.stream[self.start..self.end()]
    }

    /// The vector as encoded on the stream, header included.
    #[must_use]
    pub fn raw(&self) -> &'a [u8] {
        &self.stream[self.end() - self.encoded_len()..self.end()]
    }

    /// Stream offset of the first payload byte.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Stream offset one past the last payload byte.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Bytes the vector occupies on the stream, header included.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let header = match self.form {
            Form::Invalid => 0,
            Form::Member => 8,
            Form::Counted { .. } => 4,
        };
        header + self.len
    }

    /// Cursor over the payload. Reads past the payload fail as truncation.
    #[must_use]
    pub fn cursor(&self) -> Cursor<'a> {
        Cursor::new(&self.stream[..self.end()], self.start)
    }

    /// Location code of a member vector.
    ///
    /// # Panics
    /// If this is not a member vector.
    pub fn location_code(&self) -> Result<LocationCode> {
        assert!(self.is_member_vector(), "location code of a non-member vector");
        let byte = self.stream[self.start];
        LocationCode::from_u8(byte).ok_or(Error::InvalidLocationCode {
            offset: self.start,
            byte,
        })
    }

    fn words(&self, width: usize) -> std::slice::ChunksExact<'a, u8> {
        self.bytes().chunks_exact(width)
    }

    /// Elements of a 4-byte vector as signed words (`BLA` offsets).
    pub fn range32(&self) -> impl Iterator<Item = i32> + 'a {
        self.words(4)
            .map(|w| i32::from_le_bytes([w[0], w[1], w[2], w[3]]))
    }

    /// Elements of a `VSA` vector.
    pub fn ids(&self) -> impl Iterator<Item = Id> + 'a {
        self.words(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
    }

    /// Elements of an `SLA` vector.
    pub fn str_vec(&self) -> impl Iterator<Item = StrVecItem> + 'a {
        self.words(8).map(|w| StrVecItem {
            str: u32::from_le_bytes([w[0], w[1], w[2], w[3]]),
            dest: i32::from_le_bytes([w[4], w[5], w[6], w[7]]),
        })
    }

    /// Elements of an `ILA` vector as `(kind, iterator id)` pairs.
    pub fn iter_pairs(&self) -> impl Iterator<Item = (u32, u32)> + 'a {
        self.words(8).map(|w| {
            (
                u32::from_le_bytes([w[0], w[1], w[2], w[3]]),
                u32::from_le_bytes([w[4], w[5], w[6], w[7]]),
            )
        })
    }

    /// Stream offset of the final member-code byte.
    ///
    /// # Panics
    /// If this is not a valid member vector.
    pub fn find_last_member(&self) -> Result<usize> {
        assert!(self.is_member_vector(), "find_last_member on a non-member vector");
        let mut cursor = self.cursor();
        member::read_location(&mut cursor)?;
        let mut last = None;
        while cursor.pos() < self.end() {
            last = Some(cursor.pos());
            member::read_member(&mut cursor)?;
        }
        last.ok_or(Error::EmptyMemberVector { offset: self.start })
    }

    /// Classify the final member step for constant-key folding. Never fails:
    /// anything that cannot be decoded or resolved is [`LastMember::Invalid`].
    #[must_use]
    pub fn decode_last_member<'u>(&self, unit: &'u dyn UnitLookup) -> LastMember<'u> {
        if !self.is_member_vector() {
            return LastMember::Invalid;
        }
        let Ok(at) = self.find_last_member() else {
            return LastMember::Invalid;
        };
        let Ok(item) = member::read_member(&mut Cursor::new(&self.stream[..self.end()], at))
        else {
            return LastMember::Invalid;
        };
        if item.mcode.imm_kind() != MCodeImm::String {
            return LastMember::NotLiteral(item.mcode);
        }
        let Some(str_id) = item.str_id() else {
            return LastMember::Invalid;
        };
        match unit.lookup_litstr(str_id) {
            Some(value) => LastMember::Literal {
                mcode: item.mcode,
                str_id,
                value,
            },
            None => LastMember::Invalid,
        }
    }
}

/// One `SLA` entry: a string case and its jump offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrVecItem {
    pub str: Id,
    pub dest: Offset,
}

/// Outcome of [`ImmVector::decode_last_member`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastMember<'u> {
    /// The final step is keyed by a literal string.
    Literal {
        mcode: MemberCode,
        str_id: Id,
        value: &'u str,
    },
    /// The final step is keyed by something other than a literal string.
    NotLiteral(MemberCode),
    /// The vector is invalid, malformed or names an unknown string.
    Invalid,
}

/// The vector immediate of the instruction at `pc`.
///
/// # Panics
/// If the opcode has no vector immediate.
pub fn get_imm_vector(bytes: &[u8], pc: usize) -> Result<ImmVector<'_>> {
    let op = Cursor::new(bytes, pc).read_op()?;
    let idx = op
        .info()
        .imms
        .iter()
        .position(|ty| ty.is_vector())
        .unwrap_or_else(|| panic!("{op} has no vector immediate"));
    let imm = super::immediate::get_imm(bytes, pc, idx)?;
    Ok(imm
        .as_vector()
        .unwrap_or_else(|| unreachable!("vector immediate decoded as {imm:?}")))
}
