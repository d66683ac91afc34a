//! # Reading structured fields back
//!
//! This is not a full MO:DCA parser: fields are split and their brackets
//! matched, the payload is left alone.

use nom::{
    bytes::complete::{tag, take},
    combinator::{eof, verify},
    error::ParseError,
    multi::many_till,
    number::complete::{be_u16, be_u8},
    IResult,
};
use thiserror::Error;

use crate::{
    common::Name,
    field::{FieldHeader, SfFlags, SfId, CARRIAGE_CONTROL, INTRODUCER_LEN},
};

/// One structured field of an input buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field<'a> {
    /// The decoded introducer
    pub header: FieldHeader,
    /// The payload
    pub payload: &'a [u8],
}

impl<'a> Field<'a> {
    /// The identifier
    pub fn id(&self) -> SfId {
        self.header.id
    }

    /// The name of a begin or end field
    pub fn name(&self) -> Option<Name> {
        if !self.header.id.is_begin() && !self.header.id.is_end() {
            return None;
        }
        let bytes: [u8; 8] = self.payload.get(..8)?.try_into().ok()?;
        Some(Name(bytes))
    }

    /// Number of bytes this field occupies in the stream
    pub fn encoded_len(&self) -> usize {
        1 + INTRODUCER_LEN + self.payload.len()
    }
}

/// Parse a single structured field
pub fn parse_field<'a, E: ParseError<&'a [u8]>>(input: &'a [u8]) -> IResult<&'a [u8], Field<'a>, E> {
    let (rest, _) = tag(&[CARRIAGE_CONTROL][..])(input)?;
    let (rest, length) = verify(be_u16, |l| usize::from(*l) >= INTRODUCER_LEN)(rest)?;
    let (rest, id) = take(3usize)(rest)?;
    let (rest, flags) = be_u8(rest)?;
    let (rest, _reserved) = take(2usize)(rest)?;
    let (rest, payload) = take(usize::from(length) - INTRODUCER_LEN)(rest)?;
    let header = FieldHeader {
        length,
        id: SfId([id[0], id[1], id[2]]),
        flags: SfFlags::from_bits_retain(flags),
    };
    Ok((rest, Field { header, payload }))
}

/// Parse a complete data stream
pub fn parse_fields<'a, E: ParseError<&'a [u8]>>(
    input: &'a [u8],
) -> IResult<&'a [u8], Vec<Field<'a>>, E> {
    let (rest, (fields, _)) = many_till(parse_field, eof)(input)?;
    Ok((rest, fields))
}

/// The brackets of a data stream do not match up
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NestingError {
    /// An end field without an open bracket of the same type
    #[error("Field #{index} ({id}) closes a bracket that is not open")]
    Unmatched {
        /// Index of the field
        index: usize,
        /// The end field
        id: SfId,
    },
    /// Begin and end field of a bracket carry different names
    #[error("Field #{index} ({id}) ends {actual}, but {expected} is open")]
    NameMismatch {
        /// Index of the end field
        index: usize,
        /// The end field
        id: SfId,
        /// Name of the open bracket
        expected: Name,
        /// Name in the end field
        actual: Name,
    },
    /// A bracket is still open at the end of the stream
    #[error("{id} is never closed")]
    Unclosed {
        /// The begin field
        id: SfId,
    },
}

/// An end field with this name closes any open bracket of its type
const ANY_NAME: [u8; 2] = [0xFF, 0xFF];

/// Compute the nesting depth of every field
///
/// A begin field and its matching end field are at the same depth, the
/// fields between them one deeper.
pub fn nesting(fields: &[Field<'_>]) -> Result<Vec<usize>, NestingError> {
    let mut open: Vec<(SfId, Option<Name>)> = Vec::new();
    let mut depths = Vec::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        let id = field.id();
        if id.is_begin() {
            depths.push(open.len());
            open.push((id, field.name()));
        } else if id.is_end() {
            let (begin, name) = open.pop().ok_or(NestingError::Unmatched { index, id })?;
            if Some(begin) != id.matching_begin() {
                return Err(NestingError::Unmatched { index, id });
            }
            if let (Some(expected), Some(actual)) = (name, field.name()) {
                if expected != actual && !actual.0.starts_with(&ANY_NAME) {
                    return Err(NestingError::NameMismatch {
                        index,
                        id,
                        expected,
                        actual,
                    });
                }
            }
            depths.push(open.len());
        } else {
            depths.push(open.len());
        }
    }
    match open.pop() {
        Some((id, _)) => Err(NestingError::Unclosed { id }),
        None => Ok(depths),
    }
}
