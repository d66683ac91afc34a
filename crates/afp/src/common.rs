//! Common types shared by the object model and the encoders

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::encoding::{ebcdic_decode, ebcdic_fixed};

/// One of the four orientations supported by the architecture
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    /// 0 degrees
    #[default]
    R0,
    /// 90 degrees (clockwise)
    R90,
    /// 180 degrees
    R180,
    /// 270 degrees
    R270,
}

/// The rotation was not a multiple of 90 in `0..360`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InvalidRotation(pub u16);

impl fmt::Display for InvalidRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rotation must be one of 0, 90, 180 or 270, got {}", self.0)
    }
}

impl std::error::Error for InvalidRotation {}

impl TryFrom<u16> for Rotation {
    type Error = InvalidRotation;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::R0),
            90 => Ok(Self::R90),
            180 => Ok(Self::R180),
            270 => Ok(Self::R270),
            _ => Err(InvalidRotation(value)),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(value: Rotation) -> Self {
        value.degrees()
    }
}

impl Rotation {
    /// The angle in degrees
    pub const fn degrees(self) -> u16 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }

    /// Whether width and height trade places
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::R90 | Self::R270)
    }

    /// The MO:DCA two-byte orientation value (degrees in units of 1/2 degree, shifted)
    ///
    /// 0 → `0x0000`, 90 → `0x2D00`, 180 → `0x5A00`, 270 → `0x8700`
    pub const fn orientation(self) -> [u8; 2] {
        match self {
            Self::R0 => [0x00, 0x00],
            Self::R90 => [0x2D, 0x00],
            Self::R180 => [0x5A, 0x00],
            Self::R270 => [0x87, 0x00],
        }
    }

    /// Add another rotation
    pub const fn then(self, other: Rotation) -> Rotation {
        match (self.degrees() + other.degrees()) % 360 {
            0 => Self::R0,
            90 => Self::R90,
            180 => Self::R180,
            _ => Self::R270,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// A point in logical units
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: i32,
    /// Vertical coordinate
    pub y: i32,
}

impl Point {
    /// Create a new point
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The size of a page or object
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Extent {
    /// Horizontal size
    pub width: i32,
    /// Vertical size
    pub height: i32,
}

impl Extent {
    /// Create a new extent
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Units per inch along each axis
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Horizontal resolution
    pub x: u16,
    /// Vertical resolution
    pub y: u16,
}

impl Resolution {
    /// The same resolution along both axes
    pub const fn uniform(dpi: u16) -> Self {
        Self { x: dpi, y: dpi }
    }

    /// Units per 10 inches, as used in descriptors
    pub fn per_ten_inches(self) -> (u16, u16) {
        (self.x.saturating_mul(10), self.y.saturating_mul(10))
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::uniform(240)
    }
}

/// An RGB color
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Color {
    /// Black
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// White
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Create a new color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Luminance, using the NTSC weights
    pub fn gray(self) -> u8 {
        let lum = 0.30 * f32::from(self.r) + 0.59 * f32::from(self.g) + 0.11 * f32::from(self.b);
        lum.round().min(255.0) as u8
    }
}

/// Write the low three bytes of a (possibly negative) coordinate
pub fn put_i24(out: &mut Vec<u8>, value: i32) {
    let bytes = value.to_be_bytes();
    out.extend_from_slice(&bytes[1..]);
}

/// Write a coordinate as two signed bytes, clamped to the i16 range
pub fn put_i16(out: &mut Vec<u8>, value: i32) {
    let value = value.clamp(i16::MIN.into(), i16::MAX.into()) as i16;
    out.extend_from_slice(&value.to_be_bytes());
}

/// The 8 byte EBCDIC name of a MO:DCA object
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Name(pub [u8; 8]);

impl Name {
    /// Create a name from a string, padding with EBCDIC spaces
    pub fn new(text: &str) -> Self {
        Self(ebcdic_fixed(text))
    }

    /// The raw bytes
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", ebcdic_decode(&self.0))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ebcdic_decode(&self.0).trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::{put_i24, Color, Name, Rotation};

    #[test]
    fn test_rotation() {
        assert_eq!(Rotation::try_from(270), Ok(Rotation::R270));
        assert!(Rotation::try_from(45).is_err());
        assert_eq!(Rotation::R270.then(Rotation::R180), Rotation::R90);
        assert_eq!(Rotation::R90.orientation(), [0x2D, 0x00]);
    }

    #[test]
    fn test_i24() {
        let mut out = vec![];
        put_i24(&mut out, 600);
        put_i24(&mut out, -1);
        assert_eq!(out, [0x00, 0x02, 0x58, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_name_and_gray() {
        let name = Name::new("OVL1");
        assert_eq!(name.to_string(), "OVL1");
        assert_eq!(name.0[7], 0x40);
        assert_eq!(Color::BLACK.gray(), 0);
        assert_eq!(Color::WHITE.gray(), 255);
    }
}
