//! Statically inferred types carried in `RATA` immediates.
//!
//! Layout: one tag byte. The low seven bits name the [`RatTag`]. Array tags
//! may set the high bit, in which case a 4-byte array-type id follows. The
//! four object-with-class tags are always followed by a 4-byte string id
//! naming the class.

use std::fmt;

use super::immediate::{Cursor, Id};
use crate::error::{Error, Result};

const ARRAY_DATA_BIT: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RatTag {
    Uninit,
    InitNull,
    Null,
    Int,
    OptInt,
    Dbl,
    OptDbl,
    Res,
    OptRes,
    Bool,
    OptBool,
    SStr,
    OptSStr,
    Str,
    OptStr,
    SArr,
    OptSArr,
    Arr,
    OptArr,
    Obj,
    OptObj,
    InitUnc,
    Unc,
    InitCell,
    Cell,
    Ref,
    InitGen,
    Gen,
    ExactObj,
    SubObj,
    OptExactObj,
    OptSubObj,
}

impl RatTag {
    const ALL: [RatTag; 32] = [
        Self::Uninit,
        Self::InitNull,
        Self::Null,
        Self::Int,
        Self::OptInt,
        Self::Dbl,
        Self::OptDbl,
        Self::Res,
        Self::OptRes,
        Self::Bool,
        Self::OptBool,
        Self::SStr,
        Self::OptSStr,
        Self::Str,
        Self::OptStr,
        Self::SArr,
        Self::OptSArr,
        Self::Arr,
        Self::OptArr,
        Self::Obj,
        Self::OptObj,
        Self::InitUnc,
        Self::Unc,
        Self::InitCell,
        Self::Cell,
        Self::Ref,
        Self::InitGen,
        Self::Gen,
        Self::ExactObj,
        Self::SubObj,
        Self::OptExactObj,
        Self::OptSubObj,
    ];

    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::ALL.get(usize::from(byte)).copied()
    }

    /// Tags that name a class and carry its string id.
    #[must_use]
    pub const fn has_class_name(self) -> bool {
        matches!(
            self,
            Self::ExactObj | Self::SubObj | Self::OptExactObj | Self::OptSubObj
        )
    }

    /// Tags that may carry an array-type id.
    #[must_use]
    pub const fn may_have_array_type(self) -> bool {
        matches!(self, Self::SArr | Self::OptSArr | Self::Arr | Self::OptArr)
    }

    #[must_use]
    pub const fn is_optional(self) -> bool {
        matches!(
            self,
            Self::OptInt
                | Self::OptDbl
                | Self::OptRes
                | Self::OptBool
                | Self::OptSStr
                | Self::OptStr
                | Self::OptSArr
                | Self::OptArr
                | Self::OptObj
                | Self::OptExactObj
                | Self::OptSubObj
        )
    }
}

/// A decoded `RATA` immediate.
///
/// The payload ids follow from the tag: only [`RepoAuthType::with_array`]
/// and [`RepoAuthType::with_class`] attach them, so every value encodes to a
/// stream that decodes back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepoAuthType {
    tag: RatTag,
    array: Option<Id>,
    class_name: Option<Id>,
}

/// Validate the tag byte at the cursor. Returns the tag and whether an
/// array-type id follows it.
fn read_header(cursor: &Cursor<'_>) -> Result<(RatTag, bool)> {
    let offset = cursor.pos();
    let byte = cursor.peek_u8()?;
    let invalid = Error::InvalidRepoType { offset, byte };
    let tag = RatTag::from_u8(byte & !ARRAY_DATA_BIT).ok_or_else(|| invalid.clone())?;
    let has_array = byte & ARRAY_DATA_BIT != 0;
    if has_array && !tag.may_have_array_type() {
        return Err(invalid);
    }
    Ok((tag, has_array))
}

impl RepoAuthType {
    /// # Panics
    /// If `tag` names a class; use [`RepoAuthType::with_class`].
    #[must_use]
    pub const fn new(tag: RatTag) -> Self {
        assert!(!tag.has_class_name(), "class tags need a class name");
        Self {
            tag,
            array: None,
            class_name: None,
        }
    }

    /// # Panics
    /// If `tag` cannot carry an array-type id.
    #[must_use]
    pub fn with_array(tag: RatTag, array: Id) -> Self {
        assert!(tag.may_have_array_type(), "{tag:?} has no array type");
        Self {
            tag,
            array: Some(array),
            class_name: None,
        }
    }

    /// # Panics
    /// If `tag` does not name a class.
    #[must_use]
    pub fn with_class(tag: RatTag, class_name: Id) -> Self {
        assert!(tag.has_class_name(), "{tag:?} does not name a class");
        Self {
            tag,
            array: None,
            class_name: Some(class_name),
        }
    }

    #[must_use]
    pub const fn tag(&self) -> RatTag {
        self.tag
    }

    /// Array-type id, for array tags that carry one.
    #[must_use]
    pub const fn array(&self) -> Option<Id> {
        self.array
    }

    /// Class name string id, for object-with-class tags.
    #[must_use]
    pub const fn class_name(&self) -> Option<Id> {
        self.class_name
    }

    pub(crate) fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let (tag, has_array) = read_header(cursor)?;
        cursor.skip(1)?;
        let array = if has_array {
            Some(cursor.read_u32()?)
        } else {
            None
        };
        let class_name = if tag.has_class_name() {
            Some(cursor.read_u32()?)
        } else {
            None
        };
        Ok(Self {
            tag,
            array,
            class_name,
        })
    }

    /// Encoded width of the immediate starting at the cursor, without
    /// materializing it. Rejects exactly the tag bytes [`decode`] rejects.
    ///
    /// [`decode`]: RepoAuthType::decode
    pub(crate) fn encoded_size(cursor: &Cursor<'_>) -> Result<usize> {
        let (tag, has_array) = read_header(cursor)?;
        let mut size = 1;
        if has_array {
            size += 4;
        }
        if tag.has_class_name() {
            size += 4;
        }
        Ok(size)
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        let mut byte = self.tag as u8;
        if self.array.is_some() {
            byte |= ARRAY_DATA_BIT;
        }
        out.push(byte);
        if let Some(array) = self.array {
            out.extend_from_slice(&array.to_le_bytes());
        }
        if let Some(class_name) = self.class_name {
            out.extend_from_slice(&class_name.to_le_bytes());
        }
    }
}

impl fmt::Display for RepoAuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.tag)?;
        if let Some(array) = self.array {
            write!(f, ":A{array}")?;
        }
        if let Some(class_name) = self.class_name {
            let relation = match self.tag {
                RatTag::SubObj | RatTag::OptSubObj => "<=",
                _ => "=",
            };
            write!(f, "{relation}S:{class_name}")?;
        }
        Ok(())
    }
}
