//! Image object content (IOCA)
//!
//! An image object carries a single image segment. The segment is one
//! contiguous byte string that the image object splits into image picture
//! data fields.

use smallvec::SmallVec;

use crate::{
    chunk::{write_chunks, ChunkHeader},
    common::{Color, Resolution},
    error::{AfpError, AfpResult},
    triplet::{encode_ide_structure, encode_image_encoding, ColorModel, Compression, Recording},
};

/// Largest chunk of image data (FE92)
pub const MAX_IMAGE_DATA: usize = 65535;

/// Largest chunk of band data (FE9C), excluding the band number
pub const MAX_BAND_DATA: usize = 8191;

/// The content of an image segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageContent {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Pixels per inch
    pub resolution: Resolution,
    /// Compression of `data`
    pub compression: Compression,
    /// Color model of the image data elements
    pub model: ColorModel,
    /// Bits of every component
    pub bits_per_component: SmallVec<[u8; 4]>,
    /// Whether the components are ink (CMYK) rather than light
    pub subtractive: bool,
    /// Write each component as its own band
    pub banded: bool,
    /// The (possibly compressed) image data
    pub data: Vec<u8>,
}

impl ImageContent {
    /// An uncompressed image with 8 bits per component
    pub fn new(width: u16, height: u16, model: ColorModel, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            resolution: Resolution::default(),
            compression: Compression::None,
            model,
            bits_per_component: SmallVec::from_elem(8, model.components()),
            subtractive: model.is_subtractive(),
            banded: false,
            data,
        }
    }

    /// A bilevel image, one bit per pixel, rows padded to full bytes
    pub fn bilevel(width: u16, height: u16, compression: Compression, data: Vec<u8>) -> Self {
        Self {
            compression,
            bits_per_component: SmallVec::from_elem(1, 1),
            subtractive: false,
            ..Self::new(width, height, ColorModel::Bilevel, data)
        }
    }

    /// Total bits of one image data element
    pub fn ide_size(&self) -> u16 {
        crate::triplet::ide_size(&self.bits_per_component)
    }

    /// The IOCA function set the image is written in
    pub fn function_set(&self) -> u8 {
        match (self.model, self.banded) {
            (ColorModel::Bilevel, _) if self.ide_size() == 1 => 0x0A,
            (ColorModel::Cmyk, true) => 0x2D,
            _ => 0x0B,
        }
    }

    /// Convert uncompressed 8 bit RGB data to gray with 1, 4 or 8 bits per pixel
    ///
    /// Anything else is returned unchanged. Rows are padded to full bytes.
    pub fn into_gray(self, bits_per_pixel: u8) -> Self {
        if self.model != ColorModel::Rgb
            || self.width == 0
            || self.compression != Compression::None
            || self.bits_per_component.iter().any(|b| *b != 8)
        {
            return self;
        }
        let bits = match bits_per_pixel {
            1 | 4 => bits_per_pixel,
            _ => 8,
        };
        let width = usize::from(self.width);
        let row_bytes = (width * usize::from(bits) + 7) / 8;
        let mut data = Vec::with_capacity(row_bytes * usize::from(self.height));
        for row in self.data.chunks(width * 3) {
            let mut packed = vec![0u8; row_bytes];
            for (x, rgb) in row.chunks_exact(3).enumerate() {
                let gray = Color::rgb(rgb[0], rgb[1], rgb[2]).gray();
                match bits {
                    1 if gray < 128 => packed[x / 8] |= 0x80 >> (x % 8),
                    1 => {}
                    4 => packed[x / 2] |= (gray >> 4) << (4 * (1 - x % 2)),
                    _ => packed[x] = gray,
                }
            }
            data.extend_from_slice(&packed);
        }
        Self {
            model: ColorModel::Bilevel,
            bits_per_component: SmallVec::from_elem(bits, 1),
            subtractive: false,
            banded: false,
            data,
            ..self
        }
    }

    fn planes(&self) -> AfpResult<Vec<Vec<u8>>> {
        let count = self.model.components();
        if self.compression != Compression::None
            || self.bits_per_component.iter().any(|b| *b != 8)
            || self.data.len() % count != 0
        {
            return Err(AfpError::IllegalState(
                "banded images need uncompressed data with 8 bits per component",
            ));
        }
        let mut planes = vec![Vec::with_capacity(self.data.len() / count); count];
        for pixel in self.data.chunks(count) {
            for (plane, value) in planes.iter_mut().zip(pixel) {
                plane.push(*value);
            }
        }
        Ok(planes)
    }

    /// Encode the complete image segment
    pub fn encode_segment(&self) -> AfpResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.data.len() + 64);
        // begin segment, unnamed
        out.extend_from_slice(&[0x70, 0x04, 0x00, 0x00, 0x00, 0x00]);
        // begin image content
        out.extend_from_slice(&[0x91, 0x01, 0xFF]);
        // image size, units base 10 inches
        let (x_units, y_units) = self.resolution.per_ten_inches();
        out.extend_from_slice(&[0x94, 0x09, 0x00]);
        out.extend_from_slice(&x_units.to_be_bytes());
        out.extend_from_slice(&y_units.to_be_bytes());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&encode_image_encoding(self.compression, Recording::Ridic));
        if self.model.components() > 1 {
            let bits = self.ide_size();
            let size = u8::try_from(bits).map_err(|_| AfpError::IdeTooLarge(bits))?;
            out.extend_from_slice(&[0x96, 0x01, size]);
        }
        out.extend_from_slice(&encode_ide_structure(
            self.model,
            &self.bits_per_component,
            self.subtractive,
        )?);

        if self.banded {
            let planes = self.planes()?;
            out.push(0x98);
            out.push((1 + planes.len()) as u8);
            out.push(planes.len() as u8);
            out.extend_from_slice(&self.bits_per_component);
            for (index, plane) in planes.iter().enumerate() {
                let template = [0xFE, 0x9C, 0x00, 0x00, (index + 1) as u8, 0x00, 0x00];
                let header = ChunkHeader::long(&template, 2).with_bias(3);
                write_chunks(plane, &header, MAX_BAND_DATA, &mut out)?;
            }
        } else {
            let header = ChunkHeader::long(&[0xFE, 0x92, 0x00, 0x00], 2);
            write_chunks(&self.data, &header, MAX_IMAGE_DATA, &mut out)?;
        }

        // end image content, end segment
        out.extend_from_slice(&[0x93, 0x00, 0x71, 0x00]);
        Ok(out)
    }
}

/// Payload of the image data descriptor (IDD)
pub fn image_data_descriptor(content: &ImageContent) -> Vec<u8> {
    let (x_units, y_units) = content.resolution.per_ten_inches();
    let mut out = Vec::with_capacity(13);
    out.push(0x00);
    out.extend_from_slice(&x_units.to_be_bytes());
    out.extend_from_slice(&y_units.to_be_bytes());
    out.extend_from_slice(&content.width.to_be_bytes());
    out.extend_from_slice(&content.height.to_be_bytes());
    out.extend_from_slice(&[0xF7, 0x02, 0x01, content.function_set()]);
    out
}
