//! Graphics object content (GOCA)
//!
//! Drawing orders are encoded in the long format `code | len | data`, the
//! [`chain`] module packs them into segments.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    common::{put_i16, Color, Point},
    encoding::ebcdic_encode,
    error::{AfpError, AfpResult},
};

pub mod chain;

pub use chain::{GraphicsChain, Segment, SEGMENT_BUDGET};

/// Largest data part of a single drawing order
pub const MAX_ORDER_DATA: usize = 255;

/// Order codes
pub mod code {
    /// Comment
    pub const COMMENT: u8 = 0x01;
    /// Set color (named)
    pub const SET_COLOR: u8 = 0x0A;
    /// Set line type
    pub const SET_LINE_TYPE: u8 = 0x18;
    /// Set line width
    pub const SET_LINE_WIDTH: u8 = 0x19;
    /// Set current position
    pub const SET_CURRENT_POSITION: u8 = 0x21;
    /// End area
    pub const END_AREA: u8 = 0x60;
    /// Begin area
    pub const BEGIN_AREA: u8 = 0x68;
    /// Image data
    pub const IMAGE_DATA: u8 = 0x92;
    /// End image
    pub const END_IMAGE: u8 = 0x93;
    /// Set process color
    pub const SET_PROCESS_COLOR: u8 = 0xB2;
    /// Box at given position
    pub const BOX: u8 = 0xC0;
    /// Line at given position
    pub const LINE: u8 = 0xC1;
    /// Character string at given position
    pub const CHARACTER_STRING: u8 = 0xC3;
    /// Full arc at given position
    pub const FULL_ARC: u8 = 0xC7;
    /// Begin image at given position
    pub const BEGIN_IMAGE: u8 = 0xD1;
}

/// Named colors of the standard OCA color table
pub mod named {
    /// Device default
    pub const DEFAULT: u8 = 0x00;
    /// Blue
    pub const BLUE: u8 = 0x01;
    /// Red
    pub const RED: u8 = 0x02;
    /// Green
    pub const GREEN: u8 = 0x04;
    /// Black
    pub const BLACK: u8 = 0x08;
}

/// Line types
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineType {
    /// Device default
    #[default]
    Default,
    /// Dotted
    Dotted,
    /// Short dashed
    ShortDashed,
    /// Dash dot
    DashDot,
    /// Double dotted
    DoubleDotted,
    /// Long dashed
    LongDashed,
    /// Dash double dot
    DashDoubleDot,
    /// Solid
    Solid,
    /// Invisible
    Invisible,
}

impl LineType {
    const fn value(self) -> u8 {
        match self {
            Self::Default => 0x00,
            Self::Dotted => 0x01,
            Self::ShortDashed => 0x02,
            Self::DashDot => 0x03,
            Self::DoubleDotted => 0x04,
            Self::LongDashed => 0x05,
            Self::DashDoubleDot => 0x06,
            Self::Solid => 0x07,
            Self::Invisible => 0x08,
        }
    }
}

bitflags! {
    /// Flags of the begin area order
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
    pub struct AreaFlags: u8 {
        /// Draw the boundary lines of the area
        const BOUNDARY = 0x40;
        /// Fill using the non-zero winding rule instead of even-odd
        const WINDING = 0x20;
    }
}

/// A single drawing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawingOrder {
    /// Set the color from the standard color table
    SetColor(u8),
    /// Set an RGB process color
    SetProcessColor(Color),
    /// Set the line width multiplier
    SetLineWidth(u8),
    /// Set the line type
    SetLineType(LineType),
    /// Move the current position
    SetCurrentPosition(Point),
    /// Draw a line
    Line {
        /// Start point
        from: Point,
        /// End point
        to: Point,
    },
    /// Draw a box between two corners
    Box {
        /// First corner
        from: Point,
        /// Opposite corner
        to: Point,
    },
    /// Draw a full circle
    FullArc {
        /// Center
        center: Point,
        /// Radius (integer multiplier of the arc parameters)
        radius: u8,
    },
    /// Draw a string of characters
    CharacterString {
        /// Where the baseline starts
        at: Point,
        /// The text, at most 251 characters
        text: String,
    },
    /// Start a filled area
    BeginArea(AreaFlags),
    /// End a filled area
    EndArea,
    /// Start an inline image
    BeginImage {
        /// Top left corner
        at: Point,
        /// Width in pixels
        width: u16,
        /// Height in pixels
        height: u16,
    },
    /// A chunk of inline image data, at most 255 bytes
    ImageData(Vec<u8>),
    /// End an inline image
    EndImage,
    /// A comment
    Comment(Vec<u8>),
}

/// Encoded drawing orders are usually short
pub type OrderBytes = SmallVec<[u8; 16]>;

fn put_point(out: &mut Vec<u8>, p: Point) {
    put_i16(out, p.x);
    put_i16(out, p.y);
}

impl DrawingOrder {
    /// The order code
    pub fn code(&self) -> u8 {
        match self {
            Self::SetColor(_) => code::SET_COLOR,
            Self::SetProcessColor(_) => code::SET_PROCESS_COLOR,
            Self::SetLineWidth(_) => code::SET_LINE_WIDTH,
            Self::SetLineType(_) => code::SET_LINE_TYPE,
            Self::SetCurrentPosition(_) => code::SET_CURRENT_POSITION,
            Self::Line { .. } => code::LINE,
            Self::Box { .. } => code::BOX,
            Self::FullArc { .. } => code::FULL_ARC,
            Self::CharacterString { .. } => code::CHARACTER_STRING,
            Self::BeginArea(_) => code::BEGIN_AREA,
            Self::EndArea => code::END_AREA,
            Self::BeginImage { .. } => code::BEGIN_IMAGE,
            Self::ImageData(_) => code::IMAGE_DATA,
            Self::EndImage => code::END_IMAGE,
            Self::Comment(_) => code::COMMENT,
        }
    }

    fn data(&self) -> Vec<u8> {
        let mut d = Vec::new();
        match self {
            Self::SetColor(c) => d.push(*c),
            Self::SetProcessColor(c) => {
                // RGB color space, 8 bits per component
                d.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
                d.extend_from_slice(&[8, 8, 8, 0]);
                d.extend_from_slice(&[c.r, c.g, c.b]);
            }
            Self::SetLineWidth(w) => d.push(*w),
            Self::SetLineType(t) => d.push(t.value()),
            Self::SetCurrentPosition(p) => put_point(&mut d, *p),
            Self::Line { from, to } => {
                put_point(&mut d, *from);
                put_point(&mut d, *to);
            }
            Self::Box { from, to } => {
                d.extend_from_slice(&[0x20, 0x00]);
                put_point(&mut d, *from);
                put_point(&mut d, *to);
            }
            Self::FullArc { center, radius } => {
                put_point(&mut d, *center);
                d.extend_from_slice(&[*radius, 0x00]);
            }
            Self::CharacterString { at, text } => {
                put_point(&mut d, *at);
                d.extend(ebcdic_encode(text));
            }
            Self::BeginArea(flags) => d.push(0x80 | flags.bits()),
            Self::EndArea | Self::EndImage => d.push(0x00),
            Self::BeginImage { at, width, height } => {
                put_point(&mut d, *at);
                d.extend_from_slice(&[0x00, 0x00]);
                d.extend_from_slice(&width.to_be_bytes());
                d.extend_from_slice(&height.to_be_bytes());
            }
            Self::ImageData(bytes) | Self::Comment(bytes) => d.extend_from_slice(bytes),
        }
        d
    }

    /// Append the encoding to `out`
    ///
    /// Fails if the data does not fit the one byte length, longer image data
    /// needs to go through [`GraphicsChain::add_image`].
    pub fn encode_into(&self, out: &mut Vec<u8>) -> AfpResult<()> {
        let data = self.data();
        if data.len() > MAX_ORDER_DATA {
            return Err(AfpError::OrderTooLong {
                code: self.code(),
                len: data.len(),
            });
        }
        out.push(self.code());
        out.push(data.len() as u8);
        out.extend_from_slice(&data);
        Ok(())
    }

    /// The encoded order
    pub fn encode(&self) -> AfpResult<OrderBytes> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        Ok(OrderBytes::from_vec(out))
    }

    /// The number of bytes of the encoding
    pub fn encoded_len(&self) -> usize {
        2 + self.data().len()
    }
}

/// Split encoded orders back into `(code, data)` pairs
///
/// Stops at the first order that is cut off.
pub fn split_orders(mut data: &[u8]) -> Vec<(u8, &[u8])> {
    let mut orders = Vec::new();
    while let [code, len, rest @ ..] = data {
        let len = usize::from(*len);
        if rest.len() < len {
            break;
        }
        orders.push((*code, &rest[..len]));
        data = &rest[len..];
    }
    orders
}
