//! Encoder configuration

use serde::{Deserialize, Serialize};

use crate::{common::Rotation, triplet::MappingOption};

/// Options that are fixed for the lifetime of a data stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Units per inch of the page coordinate system
    pub resolution: u16,
    /// Rotation applied to every page
    pub rotation: Rotation,
    /// Keep images in color instead of converting them to gray
    pub color_images: bool,
    /// Bits per pixel of gray images
    pub bits_per_pixel: u8,
    /// Allow graphics objects
    pub goca: bool,
    /// Pass images through in their native (compressed) format
    pub native_images: bool,
    /// Emit shading rectangles as dithered images
    pub shading: bool,
    /// How images are fitted into their object area
    pub mapping: MappingOption,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolution: 240,
            rotation: Rotation::R0,
            color_images: false,
            bits_per_pixel: 8,
            goca: true,
            native_images: false,
            shading: true,
            mapping: MappingOption::ScaleToFit,
        }
    }
}
