//! Data objects placed on pages and overlays
//!
//! Every object carries an object environment group that positions it on
//! the page, followed by its content.

use std::io::Write;

use crate::{
    common::{put_i24, Color, Name, Resolution, Rotation},
    error::AfpResult,
    field::{SfId, StructuredField, MAX_DATA_LEN},
    ioca::{image_data_descriptor, ImageContent},
    ptoca::PtocaBuilder,
    transform::Placement,
    triplet::{descriptor_position, mapping_option, measurement_units, object_area_size, MappingOption},
    write::{Formatter, Serialize},
};

/// Position, size and orientation of an object area
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ObjectArea {
    /// Device space origin and extents
    pub placement: Placement,
    /// Orientation of the object area
    pub rotation: Rotation,
    /// Units of `placement`
    pub resolution: Resolution,
}

impl ObjectArea {
    fn descriptor(&self) -> StructuredField {
        let (xu, yu) = self.resolution.per_ten_inches();
        let mut payload = Vec::with_capacity(20);
        payload.extend_from_slice(&descriptor_position(1));
        payload.extend_from_slice(&measurement_units(xu, yu));
        payload.extend_from_slice(&object_area_size(
            self.placement.width,
            self.placement.height,
        ));
        StructuredField::data(SfId::OBD, payload)
    }

    fn position(&self) -> StructuredField {
        let mut payload = Vec::with_capacity(24);
        payload.extend_from_slice(&[0x01, 0x17]);
        put_i24(&mut payload, self.placement.x);
        put_i24(&mut payload, self.placement.y);
        payload.extend_from_slice(&self.rotation.orientation());
        payload.extend_from_slice(&self.rotation.then(Rotation::R90).orientation());
        payload.push(0x00);
        // content offset and orientation, relative to the object area
        payload.extend_from_slice(&[0x00; 6]);
        payload.extend_from_slice(&[0x00, 0x00, 0x2D, 0x00]);
        // reference coordinate system: page
        payload.push(0x01);
        StructuredField::data(SfId::OBP, payload)
    }

    fn environment(
        &self,
        name: Name,
        map: Option<StructuredField>,
        descriptor: StructuredField,
    ) -> Vec<StructuredField> {
        let mut fields = Vec::with_capacity(6);
        fields.push(StructuredField::begin(SfId::BOG, name));
        fields.push(self.descriptor());
        fields.push(self.position());
        fields.extend(map);
        fields.push(descriptor);
        fields.push(StructuredField::end(SfId::EOG, name));
        fields
    }
}

fn map_field(id: SfId, option: MappingOption) -> StructuredField {
    let triplet = mapping_option(option);
    let mut payload = Vec::with_capacity(2 + triplet.len());
    payload.extend_from_slice(&((2 + triplet.len()) as u16).to_be_bytes());
    payload.extend_from_slice(&triplet);
    StructuredField::data(id, payload)
}

/// An IOCA image object
#[derive(Debug, Clone)]
pub struct ImageObject {
    name: Name,
    environment: Vec<StructuredField>,
    segment: Vec<u8>,
}

impl ImageObject {
    /// Encode the image segment and the object environment
    pub fn new(
        name: Name,
        oeg: Name,
        area: ObjectArea,
        mapping: MappingOption,
        content: &ImageContent,
    ) -> AfpResult<Self> {
        let segment = content.encode_segment()?;
        let descriptor = StructuredField::data(SfId::IDD, image_data_descriptor(content));
        let environment = area.environment(oeg, Some(map_field(SfId::MIO, mapping)), descriptor);
        Ok(Self {
            name,
            environment,
            segment,
        })
    }
}

impl Serialize for ImageObject {
    fn write<W: Write>(&self, f: &mut Formatter<W>) -> AfpResult<()> {
        f.field(&StructuredField::begin(SfId::BIM, self.name))?;
        self.environment.write(f)?;
        f.split_data(SfId::IPD, &self.segment, MAX_DATA_LEN)?;
        f.field(&StructuredField::end(SfId::EIM, self.name))?;
        Ok(())
    }
}

/// Payload of the graphics data descriptor (GDD)
fn graphics_data_descriptor(area: &ObjectArea) -> Vec<u8> {
    let (xu, yu) = area.resolution.per_ten_inches();
    let mut payload = Vec::with_capacity(30);
    // set GPS coordinate system: drawing order subset, level 2
    payload.extend_from_slice(&[0xF7, 0x07, 0xB0, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00]);
    // window specification
    payload.extend_from_slice(&[0xF6, 0x11, 0x00, 0x00, 0x00]);
    payload.extend_from_slice(&xu.to_be_bytes());
    payload.extend_from_slice(&yu.to_be_bytes());
    payload.extend_from_slice(&[0x00, 0x00]);
    let clamp = |v: i32| v.clamp(0, i32::from(i16::MAX)) as u16;
    payload.extend_from_slice(&[0x00, 0x00]);
    payload.extend_from_slice(&clamp(area.placement.width).to_be_bytes());
    payload.extend_from_slice(&[0x00, 0x00]);
    payload.extend_from_slice(&clamp(area.placement.height).to_be_bytes());
    payload
}

/// A GOCA graphics object
#[derive(Debug, Clone)]
pub struct GraphicsObject {
    name: Name,
    environment: Vec<StructuredField>,
    segments: Vec<Vec<u8>>,
}

impl GraphicsObject {
    /// Wrap the encoded segments of a finished chain
    pub fn new(name: Name, oeg: Name, area: ObjectArea, segments: Vec<Vec<u8>>) -> Self {
        let descriptor = StructuredField::data(SfId::GDD, graphics_data_descriptor(&area));
        let map = map_field(SfId::MGO, MappingOption::Position);
        Self {
            name,
            environment: area.environment(oeg, Some(map), descriptor),
            segments,
        }
    }
}

impl Serialize for GraphicsObject {
    fn write<W: Write>(&self, f: &mut Formatter<W>) -> AfpResult<()> {
        f.field(&StructuredField::begin(SfId::BGR, self.name))?;
        self.environment.write(f)?;
        for segment in &self.segments {
            f.data(SfId::GAD, segment)?;
        }
        f.field(&StructuredField::end(SfId::EGR, self.name))?;
        Ok(())
    }
}

/// A presentation text object
#[derive(Debug)]
pub struct TextObject {
    name: Name,
    builder: PtocaBuilder,
}

impl TextObject {
    /// An empty text object
    pub fn new(name: Name) -> Self {
        Self {
            name,
            builder: PtocaBuilder::new(),
        }
    }

    /// The control sequences
    pub fn builder(&mut self) -> &mut PtocaBuilder {
        &mut self.builder
    }
}

impl Serialize for TextObject {
    fn write<W: Write>(&self, f: &mut Formatter<W>) -> AfpResult<()> {
        f.field(&StructuredField::begin(SfId::BPT, self.name))?;
        for data in self.builder.fields() {
            f.data(SfId::PTX, &data)?;
        }
        f.field(&StructuredField::end(SfId::EPT, self.name))?;
        Ok(())
    }
}

/// Ordered 8x8 dither thresholds
const BAYER: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// The 8x8 bilevel cell for a color, one byte per row, set bits are inked
pub fn dither_cell(color: Color) -> [u8; 8] {
    let darkness = ((255 - u32::from(color.gray())) * 64 + 127) / 255;
    let mut cell = [0u8; 8];
    for (row, thresholds) in cell.iter_mut().zip(BAYER.iter()) {
        for (bit, threshold) in thresholds.iter().enumerate() {
            if u32::from(*threshold) < darkness {
                *row |= 0x80 >> bit;
            }
        }
    }
    cell
}

/// A rectangle filled with a dithered gray, as an IM image
#[derive(Debug, Clone)]
pub struct ShadingObject {
    name: Name,
    area: ObjectArea,
    cell: [u8; 8],
}

impl ShadingObject {
    /// Shade `area` with `color`
    pub fn new(name: Name, area: ObjectArea, color: Color) -> Self {
        Self {
            name,
            area,
            cell: dither_cell(color),
        }
    }

    fn output_control(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(24);
        put_i24(&mut payload, self.area.placement.x);
        put_i24(&mut payload, self.area.placement.y);
        payload.extend_from_slice(&self.area.rotation.orientation());
        payload.extend_from_slice(&self.area.rotation.then(Rotation::R90).orientation());
        payload.extend_from_slice(&[0x00; 8]);
        // one pel per unit in both directions
        payload.extend_from_slice(&[0x03, 0xE8, 0x03, 0xE8, 0xFF, 0xFF]);
        payload
    }

    fn input_descriptor(&self) -> Vec<u8> {
        let (xu, yu) = self.area.resolution.per_ten_inches();
        let mut payload = Vec::with_capacity(28);
        payload.extend_from_slice(&[0x00, 0x00]);
        payload.extend_from_slice(&xu.to_be_bytes());
        payload.extend_from_slice(&yu.to_be_bytes());
        // cell size in pels
        payload.extend_from_slice(&[0x00, 0x08, 0x00, 0x08]);
        payload.extend_from_slice(&[0x00; 16]);
        // default cell size, fill with the cell
        payload.extend_from_slice(&[0x00, 0x08, 0x00, 0x08]);
        payload
    }

    fn cell_position(&self) -> Vec<u8> {
        let clamp = |v: i32| v.clamp(0, i32::from(u16::MAX)) as u16;
        let mut payload = Vec::with_capacity(12);
        payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        payload.extend_from_slice(&[0x00, 0x08, 0x00, 0x08]);
        payload.extend_from_slice(&clamp(self.area.placement.width).to_be_bytes());
        payload.extend_from_slice(&clamp(self.area.placement.height).to_be_bytes());
        payload
    }
}

impl Serialize for ShadingObject {
    fn write<W: Write>(&self, f: &mut Formatter<W>) -> AfpResult<()> {
        f.field(&StructuredField::begin(SfId::BII, self.name))?;
        f.data(SfId::IOC, &self.output_control())?;
        f.data(SfId::IID, &self.input_descriptor())?;
        f.data(SfId::ICP, &self.cell_position())?;
        f.split_data(SfId::IRD, &self.cell, MAX_DATA_LEN)?;
        f.field(&StructuredField::end(SfId::EII, self.name))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{dither_cell, GraphicsObject, ImageObject, ObjectArea, ShadingObject};
    use crate::{
        common::{Color, Name, Resolution, Rotation},
        field::SfId,
        ioca::ImageContent,
        read::{nesting, parse_fields},
        transform::Placement,
        triplet::{ColorModel, MappingOption},
        write::{Formatter, Serialize},
    };

    fn area() -> ObjectArea {
        ObjectArea {
            placement: Placement {
                x: 100,
                y: 200,
                width: 300,
                height: 400,
            },
            rotation: Rotation::R0,
            resolution: Resolution::default(),
        }
    }

    fn ids<S: Serialize>(object: &S) -> Vec<SfId> {
        let mut f = Formatter::new(Vec::new());
        object.write(&mut f).unwrap();
        f.flush().unwrap();
        let out = f.into_inner();
        let (_, fields) = parse_fields::<nom::error::Error<&[u8]>>(&out).unwrap();
        nesting(&fields).unwrap();
        fields.iter().map(|f| f.id()).collect()
    }

    #[test]
    fn test_dither_cell() {
        assert_eq!(dither_cell(Color::BLACK), [0xFF; 8]);
        assert_eq!(dither_cell(Color::WHITE), [0x00; 8]);
        let half: u32 = dither_cell(Color::rgb(128, 128, 128))
            .iter()
            .map(|r| r.count_ones())
            .sum();
        assert!((30..=34).contains(&half));
    }

    #[test]
    fn test_image_object() {
        let content = ImageContent::new(100, 100, ColorModel::Rgb, vec![0x80; 30000]);
        let image = ImageObject::new(
            Name::new("IMG00001"),
            Name::new("OEG00001"),
            area(),
            MappingOption::ScaleToFit,
            &content,
        )
        .unwrap();
        let ids = ids(&image);
        assert_eq!(
            &ids[..8],
            &[
                SfId::BIM,
                SfId::BOG,
                SfId::OBD,
                SfId::OBP,
                SfId::MIO,
                SfId::IDD,
                SfId::EOG,
                SfId::IPD
            ]
        );
        // 30000 bytes of data plus the segment parameters
        assert_eq!(ids.iter().filter(|id| **id == SfId::IPD).count(), 4);
        assert_eq!(ids.last(), Some(&SfId::EIM));
    }

    #[test]
    fn test_graphics_object() {
        let object = GraphicsObject::new(
            Name::new("GRA00001"),
            Name::new("OEG00002"),
            area(),
            vec![vec![0x70, 0x0C], vec![0x70, 0x0C]],
        );
        let ids = ids(&object);
        assert_eq!(ids.iter().filter(|id| **id == SfId::GAD).count(), 2);
        assert!(ids.contains(&SfId::GDD));
        assert_eq!(ids[0], SfId::BGR);
    }

    #[test]
    fn test_shading_object() {
        let object = ShadingObject::new(Name::new("SHD00001"), area(), Color::rgb(200, 200, 200));
        assert_eq!(
            ids(&object),
            vec![SfId::BII, SfId::IOC, SfId::IID, SfId::ICP, SfId::IRD, SfId::EII]
        );
    }
}
