//! Triplets and image metadata
//!
//! These are never written on their own, they always end up inside the
//! payload of a structured field (or an image segment) that precedes the
//! data they describe.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    common::put_i24,
    encoding::ebcdic_encode,
    error::{AfpError, AfpResult},
};

/// A short encoded record
pub type Encoded = SmallVec<[u8; 16]>;

/// The color model of image data elements
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorModel {
    /// One bit (or one gray component) per pixel
    Bilevel,
    /// Red, green, blue
    Rgb,
    /// Luminance, red and blue chrominance
    YCrCb,
    /// Luminance, blue and red chrominance
    YCbCr,
    /// Cyan, magenta, yellow, black
    Cmyk,
}

impl ColorModel {
    /// Number of components per IDE
    pub const fn components(self) -> usize {
        match self {
            Self::Bilevel => 1,
            Self::Rgb | Self::YCrCb | Self::YCbCr => 3,
            Self::Cmyk => 4,
        }
    }

    /// The IDE structure format code
    pub const fn format(self) -> u8 {
        match self {
            Self::Bilevel => 0x00,
            Self::Rgb => 0x01,
            Self::YCrCb => 0x02,
            Self::YCbCr => 0x12,
            Self::Cmyk => 0x04,
        }
    }

    /// Whether the model is subtractive by nature
    pub const fn is_subtractive(self) -> bool {
        matches!(self, Self::Cmyk)
    }
}

bitflags! {
    /// Flag byte of the IDE structure parameter
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct IdeFlags: u8 {
        /// Components are subtractive (ink) rather than additive (light)
        const SUBTRACTIVE = 0x80;
        /// Gray coding is applied to the components
        const GRAY_CODING = 0x40;
    }
}

/// IDE size parameter code
pub const IDE_SIZE: u8 = 0x96;
/// IDE structure parameter code
pub const IDE_STRUCTURE: u8 = 0x9B;

/// Encode how image data elements are laid out
///
/// Single component models are described by the IDE size parameter alone,
/// every other model by the IDE structure parameter.
pub fn encode_ide_structure(
    model: ColorModel,
    bits_per_component: &[u8],
    subtractive: bool,
) -> AfpResult<Encoded> {
    let expected = model.components();
    if bits_per_component.len() != expected {
        return Err(AfpError::InvalidComponentCount {
            model,
            expected,
            actual: bits_per_component.len(),
        });
    }

    let mut out = Encoded::new();
    if expected == 1 {
        out.extend_from_slice(&[IDE_SIZE, 0x01, bits_per_component[0]]);
        return Ok(out);
    }

    let mut flags = IdeFlags::empty();
    flags.set(IdeFlags::SUBTRACTIVE, subtractive);
    let len = 5 + bits_per_component.len();
    out.extend_from_slice(&[IDE_STRUCTURE, len as u8, flags.bits(), model.format()]);
    out.extend_from_slice(&[0x00, 0x00, 0x00]);
    out.extend_from_slice(bits_per_component);
    Ok(out)
}

/// Total bits of one IDE
pub fn ide_size(bits_per_component: &[u8]) -> u16 {
    bits_per_component.iter().map(|b| u16::from(*b)).sum()
}

/// Image compression identifiers
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    /// Uncompressed
    None,
    /// CCITT T.4 Group 3 modified Huffman
    G3Mh,
    /// CCITT T.4 Group 3 modified READ
    G3Mr,
    /// CCITT T.6 Group 4 modified modified READ
    G4Mmr,
    /// JPEG
    Jpeg,
}

impl Compression {
    /// The IOCA compression id
    pub const fn id(self) -> u8 {
        match self {
            Self::None => 0x03,
            Self::G3Mh => 0x80,
            Self::G3Mr => 0x81,
            Self::G4Mmr => 0x82,
            Self::Jpeg => 0x83,
        }
    }
}

/// Recording algorithm identifiers
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Recording {
    /// Recording image data in the compressed form
    Ridic,
    /// Unpadded, bits of consecutive lines follow each other
    Unpadded,
}

impl Recording {
    /// The IOCA recording id
    pub const fn id(self) -> u8 {
        match self {
            Self::Ridic => 0x01,
            Self::Unpadded => 0x03,
        }
    }
}

/// Encode the image encoding parameter (0x95)
pub fn encode_image_encoding(compression: Compression, recording: Recording) -> Encoded {
    let mut out = Encoded::new();
    out.extend_from_slice(&[0x95, 0x02, compression.id(), recording.id()]);
    out
}

/// How a data object is fitted into its object area
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MappingOption {
    /// Place at the origin, no scaling
    Position,
    /// Place at the origin, trim what falls outside
    PositionAndTrim,
    /// Scale to fit, keeping the aspect ratio
    #[default]
    ScaleToFit,
    /// Center and trim
    CenterAndTrim,
    /// Scale to fill, ignoring the aspect ratio
    ScaleToFill,
}

impl MappingOption {
    /// The mapping value
    pub const fn value(self) -> u8 {
        match self {
            Self::Position => 0x00,
            Self::PositionAndTrim => 0x10,
            Self::ScaleToFit => 0x20,
            Self::CenterAndTrim => 0x30,
            Self::ScaleToFill => 0x60,
        }
    }
}

/// Triplet codes used by this crate
pub mod code {
    /// Coded graphic character set global id
    pub const CGCSGID: u8 = 0x01;
    /// Fully qualified name
    pub const FQN: u8 = 0x02;
    /// Mapping option
    pub const MAPPING_OPTION: u8 = 0x04;
    /// Resource local identifier
    pub const RESOURCE_LOCAL_ID: u8 = 0x24;
    /// Attribute value
    pub const ATTRIBUTE_VALUE: u8 = 0x36;
    /// Descriptor position
    pub const DESCRIPTOR_POSITION: u8 = 0x43;
    /// Measurement units
    pub const MEASUREMENT_UNITS: u8 = 0x4B;
    /// Object area size
    pub const OBJECT_AREA_SIZE: u8 = 0x4C;
    /// Font descriptor specification
    pub const FONT_DESCRIPTOR: u8 = 0x1F;
}

/// Types of fully qualified names
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FqnType {
    /// Attribute name of a tag logical element
    AttributeName,
    /// Code page name reference
    CodePage,
    /// Font character set name reference
    CharacterSet,
    /// Begin resource group reference
    ResourceGroup,
}

impl FqnType {
    const fn code(self) -> u8 {
        match self {
            Self::AttributeName => 0x0B,
            Self::CodePage => 0x85,
            Self::CharacterSet => 0x86,
            Self::ResourceGroup => 0x8D,
        }
    }
}

fn check_triplet_len(code: u8, len: usize) -> AfpResult<()> {
    if len > u8::MAX as usize {
        return Err(AfpError::TripletTooLong { code, len });
    }
    Ok(())
}

/// Fully qualified name triplet, with a character string name
pub fn fully_qualified_name(kind: FqnType, name: &str) -> AfpResult<Vec<u8>> {
    let text = ebcdic_encode(name);
    let len = 4 + text.len();
    check_triplet_len(code::FQN, len)?;
    let mut out = Vec::with_capacity(len);
    // format 0x00: character string
    out.extend_from_slice(&[len as u8, code::FQN, kind.code(), 0x00]);
    out.extend_from_slice(&text);
    Ok(out)
}

/// Attribute value triplet
pub fn attribute_value(value: &str) -> AfpResult<Vec<u8>> {
    let text = ebcdic_encode(value);
    let len = 4 + text.len();
    check_triplet_len(code::ATTRIBUTE_VALUE, len)?;
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(&[len as u8, code::ATTRIBUTE_VALUE, 0x00, 0x00]);
    out.extend_from_slice(&text);
    Ok(out)
}

/// Coded graphic character set global id triplet, by CCSID
pub fn ccsid(ccsid: u16) -> Encoded {
    let mut out = Encoded::new();
    out.extend_from_slice(&[0x06, code::CGCSGID, 0x00, 0x00]);
    out.extend_from_slice(&ccsid.to_be_bytes());
    out
}

/// Mapping option triplet
pub fn mapping_option(option: MappingOption) -> Encoded {
    let mut out = Encoded::new();
    out.extend_from_slice(&[0x03, code::MAPPING_OPTION, option.value()]);
    out
}

/// Measurement units triplet, in units per ten inches
pub fn measurement_units(x_units: u16, y_units: u16) -> Encoded {
    let mut out = Encoded::new();
    out.extend_from_slice(&[0x08, code::MEASUREMENT_UNITS, 0x00, 0x00]);
    out.extend_from_slice(&x_units.to_be_bytes());
    out.extend_from_slice(&y_units.to_be_bytes());
    out
}

/// Object area size triplet
pub fn object_area_size(width: i32, height: i32) -> Encoded {
    let mut out = Encoded::new();
    out.extend_from_slice(&[0x09, code::OBJECT_AREA_SIZE, 0x02]);
    let mut sizes = Vec::with_capacity(6);
    put_i24(&mut sizes, width);
    put_i24(&mut sizes, height);
    out.extend_from_slice(&sizes);
    out
}

/// Descriptor position triplet, pointing at object area position `id`
pub fn descriptor_position(id: u8) -> Encoded {
    let mut out = Encoded::new();
    out.extend_from_slice(&[0x03, code::DESCRIPTOR_POSITION, id]);
    out
}

/// Resource local identifier triplet for a coded font
pub fn resource_local_id(id: u8) -> Encoded {
    let mut out = Encoded::new();
    out.extend_from_slice(&[0x04, code::RESOURCE_LOCAL_ID, 0x05, id]);
    out
}

/// Font descriptor specification triplet carrying the vertical size
///
/// The size is given in 1/20 points, i.e. twips.
pub fn font_size(point_size_twips: u16) -> Encoded {
    let mut out = Encoded::new();
    // len, code, weight class, width class, height, width, flags
    out.extend_from_slice(&[0x14, code::FONT_DESCRIPTOR, 0x00, 0x00]);
    out.extend_from_slice(&point_size_twips.to_be_bytes());
    out.extend_from_slice(&point_size_twips.to_be_bytes());
    out.extend_from_slice(&[0x00; 12]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ide_structure_cmyk() {
        let enc = encode_ide_structure(ColorModel::Cmyk, &[8, 8, 8, 8], true).unwrap();
        assert_eq!(
            enc.as_slice(),
            &[0x9B, 0x09, 0x80, 0x04, 0x00, 0x00, 0x00, 8, 8, 8, 8]
        );
        assert_eq!(usize::from(enc[1]) + 2, enc.len());
    }

    #[test]
    fn test_ide_structure_rgb_additive() {
        let enc = encode_ide_structure(ColorModel::Rgb, &[8, 8, 8], false).unwrap();
        assert_eq!(enc[2], 0x00);
        assert_eq!(enc[3], 0x01);
        assert_eq!(ide_size(&[8, 8, 8]), 24);
    }

    #[test]
    fn test_ide_bilevel() {
        let enc = encode_ide_structure(ColorModel::Bilevel, &[1], false).unwrap();
        assert_eq!(enc.as_slice(), &[0x96, 0x01, 0x01]);
    }

    #[test]
    fn test_invalid_component_count() {
        match encode_ide_structure(ColorModel::Cmyk, &[8, 8, 8], true) {
            Err(AfpError::InvalidComponentCount {
                model,
                expected,
                actual,
            }) => {
                assert_eq!(model, ColorModel::Cmyk);
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(encode_ide_structure(ColorModel::Bilevel, &[], false).is_err());
    }

    #[test]
    fn test_triplets() {
        assert_eq!(mapping_option(MappingOption::ScaleToFit).as_slice(), &[3, 4, 0x20]);
        let fqn = fully_qualified_name(FqnType::AttributeName, "AB").unwrap();
        assert_eq!(fqn, vec![6, 0x02, 0x0B, 0x00, 0xC1, 0xC2]);
        assert_eq!(measurement_units(2400, 2400).as_slice(), &[8, 0x4B, 0, 0, 0x09, 0x60, 0x09, 0x60]);
        let long = "x".repeat(300);
        assert!(attribute_value(&long).is_err());
        assert_eq!(font_size(240)[0] as usize, font_size(240).len());
    }
}
