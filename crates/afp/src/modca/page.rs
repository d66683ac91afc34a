//! Pages and overlays
//!
//! Both share the same body: an active environment group with the page
//! descriptors, followed by the content objects in the order they were
//! created. Consecutive text calls share one presentation text object.

use std::io::Write;

use log::warn;

use crate::{
    common::{put_i24, Extent, Name, Point, Resolution, Rotation},
    encoding::ebcdic_encode,
    error::{AfpError, AfpResult},
    field::{SfId, StructuredField},
    goca::GraphicsChain,
    transform::PaintingState,
    triplet::{
        attribute_value, font_size, fully_qualified_name, resource_local_id, FqnType,
    },
    write::{Formatter, Serialize},
};

use super::{
    factory::{Factory, ObjectKind},
    object::{GraphicsObject, ImageObject, ObjectArea, ShadingObject, TextObject},
};

/// A coded font mapped into a page or overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontMapping {
    /// Local id used by the text
    pub local_id: u8,
    /// Name of the code page
    pub code_page: String,
    /// Name of the font character set
    pub character_set: String,
    /// Vertical size in 1/20 points, 0 for raster fonts
    pub size: u16,
}

impl FontMapping {
    fn repeating_group(&self) -> AfpResult<Vec<u8>> {
        let mut group = vec![0x00, 0x00];
        group.extend(fully_qualified_name(
            FqnType::CodePage,
            &format!("{:<8}", self.code_page),
        )?);
        group.extend(fully_qualified_name(
            FqnType::CharacterSet,
            &format!("{:<8}", self.character_set),
        )?);
        group.extend_from_slice(&resource_local_id(self.local_id));
        if self.size > 0 {
            group.extend_from_slice(&font_size(self.size));
        }
        let len = (group.len() as u16).to_be_bytes();
        group[..2].copy_from_slice(&len);
        Ok(group)
    }
}

/// An object that becomes part of the body
#[derive(Debug)]
enum Content {
    Field(StructuredField),
    Text(TextObject),
    Image(ImageObject),
    Graphics(GraphicsObject),
    Shading(ShadingObject),
}

/// A graphics object that is still being drawn
struct OpenGraphics {
    name: Name,
    area: ObjectArea,
    chain: GraphicsChain,
}

/// Whether a body is written as page or overlay
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyKind {
    /// A page (BPG/EPG)
    Page,
    /// A page overlay (BMO/EMO)
    Overlay,
}

impl BodyKind {
    fn brackets(self) -> (SfId, SfId) {
        match self {
            Self::Page => (SfId::BPG, SfId::EPG),
            Self::Overlay => (SfId::BMO, SfId::EMO),
        }
    }
}

/// The content of a page or overlay
pub struct PageBody {
    kind: BodyKind,
    name: Name,
    aeg: Name,
    extent: Extent,
    resolution: Resolution,
    fonts: Vec<FontMapping>,
    mapped_overlays: Vec<Name>,
    content: Vec<Content>,
    open_text: Option<TextObject>,
    graphics: Option<OpenGraphics>,
    pub(crate) painting: PaintingState,
}

impl PageBody {
    /// Create an empty body
    pub fn new(
        kind: BodyKind,
        name: Name,
        aeg: Name,
        extent: Extent,
        resolution: Resolution,
    ) -> Self {
        Self {
            kind,
            name,
            aeg,
            extent,
            resolution,
            fonts: Vec::new(),
            mapped_overlays: Vec::new(),
            content: Vec::new(),
            open_text: None,
            graphics: None,
            painting: PaintingState::for_page(extent),
        }
    }

    /// The name of the page or overlay
    pub fn name(&self) -> Name {
        self.name
    }

    /// Number of content objects (not counting open graphics)
    pub fn content_len(&self) -> usize {
        self.content.len() + usize::from(self.open_text.is_some())
    }

    /// An object area at the given logical rectangle
    pub fn object_area(&self, x: i32, y: i32, width: i32, height: i32) -> ObjectArea {
        ObjectArea {
            placement: self.painting.place(x, y, width, height),
            rotation: self.painting.rotation,
            resolution: self.resolution,
        }
    }

    /// The presentation text object for the next text call
    pub fn text(&mut self, names: &mut Factory) -> AfpResult<&mut TextObject> {
        if self.open_text.is_none() {
            self.open_text = Some(TextObject::new(names.name(ObjectKind::Text)?));
        }
        self.open_text
            .as_mut()
            .ok_or(AfpError::IllegalState("no text object is open"))
    }

    /// Later text goes into a new text object
    fn close_text(&mut self) {
        if let Some(text) = self.open_text.take() {
            self.content.push(Content::Text(text));
        }
    }

    /// Add a structured field to the content
    pub fn add_field(&mut self, field: StructuredField) {
        self.close_text();
        self.content.push(Content::Field(field));
    }

    /// Add an image object
    pub fn add_image(&mut self, image: ImageObject) {
        self.close_text();
        self.content.push(Content::Image(image));
    }

    /// Add a shading rectangle
    pub fn add_shading(&mut self, shading: ShadingObject) {
        self.close_text();
        self.content.push(Content::Shading(shading));
    }

    /// Map a coded font, replacing an earlier mapping of the same id
    pub fn add_font(&mut self, font: FontMapping) {
        self.fonts.retain(|f| f.local_id != font.local_id);
        self.fonts.push(font);
    }

    /// Include an overlay at a position on this page
    pub fn include_overlay(&mut self, name: Name, at: Point, rotation: Rotation) {
        if !self.mapped_overlays.contains(&name) {
            self.mapped_overlays.push(name);
        }
        let mut payload = Vec::with_capacity(16);
        payload.extend_from_slice(name.as_bytes());
        put_i24(&mut payload, at.x);
        put_i24(&mut payload, at.y);
        payload.extend_from_slice(&rotation.orientation());
        self.add_field(StructuredField::data(SfId::IPO, payload));
    }

    /// Include a page segment at a position
    pub fn include_page_segment(&mut self, name: Name, at: Point) {
        let mut payload = Vec::with_capacity(14);
        payload.extend_from_slice(name.as_bytes());
        put_i24(&mut payload, at.x);
        put_i24(&mut payload, at.y);
        self.add_field(StructuredField::data(SfId::IPS, payload));
    }

    /// Start a graphics object
    pub fn start_graphics(&mut self, name: Name, area: ObjectArea) -> AfpResult<()> {
        if self.graphics.is_some() {
            return Err(AfpError::IllegalState("a graphics object is already open"));
        }
        self.graphics = Some(OpenGraphics {
            name,
            area,
            chain: GraphicsChain::new(),
        });
        Ok(())
    }

    /// The chain of the open graphics object
    pub fn graphics(&mut self) -> AfpResult<&mut GraphicsChain> {
        match &mut self.graphics {
            Some(open) => Ok(&mut open.chain),
            None => Err(AfpError::IllegalState("no graphics object is open")),
        }
    }

    /// Finish the open graphics object and add it to the content
    pub fn end_graphics(&mut self, oeg: Name) -> AfpResult<()> {
        let open = self
            .graphics
            .take()
            .ok_or(AfpError::IllegalState("no graphics object is open"))?;
        let segments = open.chain.finish()?;
        let object = GraphicsObject::new(open.name, oeg, open.area, segments);
        self.close_text();
        self.content.push(Content::Graphics(object));
        Ok(())
    }

    /// End a graphics object that was left open
    pub(crate) fn close_graphics(&mut self, names: &mut Factory) -> AfpResult<()> {
        if self.graphics.is_some() {
            warn!("Closing graphics object left open in {}", self.name);
            self.end_graphics(names.name(ObjectKind::ObjectEnvironment)?)?;
        }
        Ok(())
    }

    fn descriptor_payload(&self, trailing: usize) -> Vec<u8> {
        let (xu, yu) = self.resolution.per_ten_inches();
        let mut payload = Vec::with_capacity(12 + trailing);
        payload.extend_from_slice(&[0x00, 0x00]);
        payload.extend_from_slice(&xu.to_be_bytes());
        payload.extend_from_slice(&yu.to_be_bytes());
        put_i24(&mut payload, self.extent.width);
        put_i24(&mut payload, self.extent.height);
        payload.resize(12 + trailing, 0x00);
        payload
    }

    fn environment(&self) -> AfpResult<Vec<StructuredField>> {
        let mut fields = vec![StructuredField::begin(SfId::BAG, self.aeg)];
        if !self.fonts.is_empty() {
            let mut payload = Vec::new();
            for font in &self.fonts {
                payload.extend(font.repeating_group()?);
            }
            fields.push(StructuredField::data(SfId::MCF, payload));
        }
        if !self.mapped_overlays.is_empty() {
            let mut payload = Vec::new();
            for (index, name) in self.mapped_overlays.iter().enumerate() {
                // group length, FQN overlay reference, resource local id
                payload.extend_from_slice(&[0x00, 0x12, 0x0C, 0x02, 0x84, 0x00]);
                payload.extend_from_slice(name.as_bytes());
                payload.extend_from_slice(&[0x04, 0x24, 0x02, (index + 1) as u8]);
            }
            fields.push(StructuredField::data(SfId::MPO, payload));
        }
        fields.push(StructuredField::data(SfId::PGD, self.descriptor_payload(3)));
        fields.push(StructuredField::data(SfId::PTD, self.descriptor_payload(2)));
        fields.push(StructuredField::end(SfId::EAG, self.aeg));
        Ok(fields)
    }
}

impl Serialize for PageBody {
    fn write<W: Write>(&self, f: &mut Formatter<W>) -> AfpResult<()> {
        let (begin, end) = self.kind.brackets();
        f.field(&StructuredField::begin(begin, self.name))?;
        self.environment()?.write(f)?;
        for content in &self.content {
            match content {
                Content::Field(field) => f.field(field)?,
                Content::Text(text) => text.write(f)?,
                Content::Image(image) => image.write(f)?,
                Content::Graphics(graphics) => graphics.write(f)?,
                Content::Shading(shading) => shading.write(f)?,
            }
        }
        if let Some(text) = &self.open_text {
            text.write(f)?;
        }
        f.field(&StructuredField::end(end, self.name))?;
        Ok(())
    }
}

/// Refers to a page while it is being built
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageHandle(usize);

/// A page together with the overlays defined on it
pub struct PageObject {
    pub(crate) body: PageBody,
    pub(crate) overlay: Option<PageBody>,
    overlays: Vec<PageBody>,
    resource_group: Option<Name>,
    pub(crate) in_group: bool,
    pub(crate) complete: bool,
}

impl PageObject {
    /// A new, incomplete page
    pub fn new(body: PageBody, in_group: bool) -> Self {
        Self {
            body,
            overlay: None,
            overlays: Vec::new(),
            resource_group: None,
            in_group,
            complete: false,
        }
    }

    /// Keep a finished overlay, it is written in front of the page
    pub(crate) fn add_overlay(
        &mut self,
        overlay: PageBody,
        names: &mut Factory,
    ) -> AfpResult<()> {
        if self.resource_group.is_none() {
            self.resource_group = Some(names.name(ObjectKind::ResourceGroup)?);
        }
        self.overlays.push(overlay);
        Ok(())
    }
}

impl Serialize for PageObject {
    fn write<W: Write>(&self, f: &mut Formatter<W>) -> AfpResult<()> {
        if let Some(name) = self.resource_group {
            f.field(&StructuredField::begin(SfId::BRG, name))?;
            for overlay in &self.overlays {
                overlay.write(f)?;
            }
            f.field(&StructuredField::end(SfId::ERG, name))?;
        }
        self.body.write(f)
    }
}

/// Owns all pages that are not written yet
///
/// A written page frees its contents but keeps its slot, so handles are
/// never reused within a document.
#[derive(Default)]
pub(crate) struct PageArena {
    pages: Vec<Option<PageObject>>,
}

impl PageArena {
    pub(crate) fn insert(&mut self, page: PageObject) -> PageHandle {
        self.pages.push(Some(page));
        PageHandle(self.pages.len() - 1)
    }

    pub(crate) fn get(&self, handle: PageHandle) -> Option<&PageObject> {
        self.pages.get(handle.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, handle: PageHandle) -> Option<&mut PageObject> {
        self.pages.get_mut(handle.0).and_then(Option::as_mut)
    }

    /// Free the contents of a page once it is written
    pub(crate) fn take(&mut self, handle: PageHandle) -> Option<PageObject> {
        self.pages.get_mut(handle.0).and_then(Option::take)
    }

    /// Number of pages not yet released
    pub(crate) fn live(&self) -> usize {
        self.pages.iter().filter(|p| p.is_some()).count()
    }
}

/// A tag logical element: an attribute name and value
pub fn tag_logical_element(name: &str, value: &str) -> AfpResult<StructuredField> {
    let mut payload = fully_qualified_name(FqnType::AttributeName, name)?;
    payload.extend(attribute_value(value)?);
    StructuredField::checked_data(SfId::TLE, payload)
}

/// An invoke medium map field
pub fn invoke_medium_map(name: &str) -> StructuredField {
    StructuredField::data(SfId::IMM, Name::new(name).as_bytes().to_vec())
}

/// A no-operation field carrying a comment
pub fn no_operation(content: &str) -> AfpResult<StructuredField> {
    StructuredField::checked_data(SfId::NOP, ebcdic_encode(content))
}
