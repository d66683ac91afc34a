//! The data stream state machine
//!
//! The open containers are kept on an explicit stack of frames
//! `[Document, PageGroup?, Page, Overlay?]`. Content calls are routed to the
//! innermost frame that can take them. Pages live in an arena until they
//! are written, a saved page keeps its slot in its parent so that it is
//! written in the order it was started.
//!
//! Once a write has failed, every later call fails as well.

use std::io::Write;

use log::{debug, warn};

use crate::{
    common::{Color, Extent, Name, Point, Resolution, Rotation},
    config::Config,
    error::{AfpError, AfpResult},
    field::{SfId, StructuredField},
    goca::{AreaFlags, DrawingOrder},
    ioca::ImageContent,
    ptoca::{Rule, TextRun},
    triplet::Compression,
    write::Formatter,
};

use super::{
    factory::{Factory, ObjectKind},
    group::{Child, Document, PageGroup},
    object::{ImageObject, ShadingObject},
    page::{
        invoke_medium_map, no_operation, tag_logical_element, BodyKind, FontMapping, PageArena,
        PageBody, PageHandle, PageObject,
    },
};

/// Where the stream is in the object hierarchy
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamState {
    /// Before `start_document`
    NoDocument,
    /// Directly inside the document
    InDocument,
    /// Inside a page group, outside of pages
    InPageGroup,
    /// Inside a page
    InPage,
    /// Inside an overlay of a page
    InOverlay,
    /// After `end_document`
    Complete,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Frame {
    Document,
    PageGroup,
    Page(PageHandle),
    Overlay,
}

/// Writes a MO:DCA document to a byte sink
pub struct DataStream<W: Write> {
    f: Formatter<W>,
    config: Config,
    names: Factory,
    document: Option<Document>,
    frames: Vec<Frame>,
    pages: PageArena,
    saved: Vec<PageHandle>,
    complete: bool,
    failed: bool,
}

impl<W: Write> DataStream<W> {
    /// Create a new data stream
    pub fn new(sink: W, config: Config) -> Self {
        Self {
            f: Formatter::new(sink),
            config,
            names: Factory::new(),
            document: None,
            frames: Vec::new(),
            pages: PageArena::default(),
            saved: Vec::new(),
            complete: false,
            failed: false,
        }
    }

    /// The configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The current state
    pub fn state(&self) -> StreamState {
        if self.complete {
            return StreamState::Complete;
        }
        match self.frames.last() {
            None => StreamState::NoDocument,
            Some(Frame::Document) => StreamState::InDocument,
            Some(Frame::PageGroup) => StreamState::InPageGroup,
            Some(Frame::Page(_)) => StreamState::InPage,
            Some(Frame::Overlay) => StreamState::InOverlay,
        }
    }

    /// Number of bytes that reached the sink
    pub fn bytes_written(&self) -> usize {
        self.f.bytes_written()
    }

    /// Return the sink
    pub fn into_inner(self) -> W {
        self.f.into_inner()
    }

    fn check_open(&self) -> AfpResult<()> {
        if self.failed {
            Err(AfpError::IllegalState("an earlier write failed"))
        } else if self.complete {
            Err(AfpError::IllegalState("the document is already complete"))
        } else {
            Ok(())
        }
    }

    /// Whether a write failed, leaving incomplete output in the sink
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    fn document(&mut self) -> AfpResult<&mut Document> {
        self.document
            .as_mut()
            .ok_or(AfpError::IllegalState("no document was started"))
    }

    fn current_page(&self) -> Option<PageHandle> {
        self.frames.iter().rev().find_map(|frame| match frame {
            Frame::Page(handle) => Some(*handle),
            _ => None,
        })
    }

    fn in_group(&self) -> bool {
        self.frames.contains(&Frame::PageGroup)
    }

    fn page_mut(&mut self, handle: PageHandle) -> AfpResult<&mut PageObject> {
        self.pages
            .get_mut(handle)
            .ok_or(AfpError::IllegalState("page was already written"))
    }

    /// The page or overlay that takes content
    fn target<'a>(
        frames: &[Frame],
        pages: &'a mut PageArena,
        call: &'static str,
    ) -> AfpResult<&'a mut PageBody> {
        let (handle, overlay) = match frames {
            [.., Frame::Page(handle), Frame::Overlay] => (*handle, true),
            [.., Frame::Page(handle)] => (*handle, false),
            _ => return Err(AfpError::NoActiveTarget(call)),
        };
        let page = pages
            .get_mut(handle)
            .ok_or(AfpError::NoActiveTarget(call))?;
        if overlay {
            page.overlay.as_mut().ok_or(AfpError::NoActiveTarget(call))
        } else {
            Ok(&mut page.body)
        }
    }

    /// Write complete objects and `last` to the sink
    ///
    /// A page may already be partially queued when this fails, so any error
    /// marks the stream as failed.
    fn flush_with(&mut self, last: Option<StructuredField>) -> AfpResult<()> {
        let result = self.write_pending(last);
        if result.is_err() {
            warn!("Writing failed, the output is incomplete");
            self.failed = true;
        }
        result
    }

    fn write_pending(&mut self, last: Option<StructuredField>) -> AfpResult<()> {
        if let Some(document) = &mut self.document {
            document.flush(&mut self.pages, &mut self.f)?;
        }
        if let Some(field) = last {
            self.f.field(&field)?;
        }
        self.f.flush()
    }

    fn flush(&mut self) -> AfpResult<()> {
        self.flush_with(None)
    }

    /// Start the document and write its begin field
    pub fn start_document(&mut self) -> AfpResult<()> {
        self.check_open()?;
        if self.document.is_some() {
            return Err(AfpError::IllegalState("the document was already started"));
        }
        let name = self.names.name(ObjectKind::Document)?;
        debug!("Starting document {}", name);
        self.flush_with(Some(StructuredField::begin(SfId::BDT, name)))?;
        self.document = Some(Document::new(name));
        self.frames.push(Frame::Document);
        Ok(())
    }

    /// Start a named page group
    pub fn start_page_group(&mut self) -> AfpResult<()> {
        self.check_open()?;
        if self.frames.last() != Some(&Frame::Document) {
            return Err(AfpError::IllegalState(
                "page groups can only be started directly in the document",
            ));
        }
        let name = self.names.name(ObjectKind::PageGroup)?;
        self.document()?.push(Child::Group(PageGroup::new(name)));
        self.frames.push(Frame::PageGroup);
        Ok(())
    }

    /// Start a page
    ///
    /// For a rotation of 90 or 270 degrees, width and height trade places.
    pub fn start_page(
        &mut self,
        width: i32,
        height: i32,
        rotation: Rotation,
        x_resolution: u16,
        y_resolution: u16,
    ) -> AfpResult<PageHandle> {
        self.check_open()?;
        if !matches!(
            self.frames.last(),
            Some(Frame::Document | Frame::PageGroup)
        ) {
            return Err(AfpError::IllegalState(
                "pages can only be started in a document or page group",
            ));
        }
        let extent = if rotation.swaps_axes() {
            Extent::new(height, width)
        } else {
            Extent::new(width, height)
        };
        let name = self.names.name(ObjectKind::Page)?;
        let aeg = self.names.name(ObjectKind::ActiveEnvironment)?;
        let resolution = Resolution {
            x: x_resolution,
            y: y_resolution,
        };
        let body = PageBody::new(BodyKind::Page, name, aeg, extent, resolution);
        let handle = self.pages.insert(PageObject::new(body, self.in_group()));
        self.document()?.push(Child::Page(handle));
        self.frames.push(Frame::Page(handle));
        debug!("Starting page {}", name);
        Ok(handle)
    }

    /// Start an overlay on the current page
    ///
    /// The overlay is included at `(x, y)` and written in a resource group
    /// in front of its page.
    #[allow(clippy::too_many_arguments)]
    pub fn start_overlay(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        x_resolution: u16,
        y_resolution: u16,
        rotation: Rotation,
    ) -> AfpResult<()> {
        self.check_open()?;
        let handle = match self.frames.last() {
            Some(Frame::Page(handle)) => *handle,
            Some(Frame::Overlay) => {
                return Err(AfpError::IllegalState("overlays cannot be nested"))
            }
            _ => return Err(AfpError::IllegalState("overlays need a page")),
        };
        let name = self.names.name(ObjectKind::Overlay)?;
        let aeg = self.names.name(ObjectKind::ActiveEnvironment)?;
        let resolution = Resolution {
            x: x_resolution,
            y: y_resolution,
        };
        let overlay = PageBody::new(
            BodyKind::Overlay,
            name,
            aeg,
            Extent::new(width, height),
            resolution,
        );
        let page = self.page_mut(handle)?;
        let at = page.body.painting.place_point(Point::new(x, y));
        page.body.include_overlay(name, at, rotation);
        page.overlay = Some(overlay);
        self.frames.push(Frame::Overlay);
        Ok(())
    }

    /// End the current overlay
    pub fn end_overlay(&mut self) -> AfpResult<()> {
        self.check_open()?;
        let handle = match self.frames.as_slice() {
            [.., Frame::Page(handle), Frame::Overlay] => *handle,
            _ => return Err(AfpError::IllegalState("no overlay to end")),
        };
        let page = self
            .pages
            .get_mut(handle)
            .ok_or(AfpError::IllegalState("page was already written"))?;
        let mut overlay = page
            .overlay
            .take()
            .ok_or(AfpError::IllegalState("no overlay to end"))?;
        overlay.close_graphics(&mut self.names)?;
        page.add_overlay(overlay, &mut self.names)?;
        self.frames.pop();
        Ok(())
    }

    /// End the current page
    ///
    /// Outside of a page group, the page is written right away.
    pub fn end_page(&mut self) -> AfpResult<()> {
        self.check_open()?;
        let handle = match self.frames.last() {
            Some(Frame::Page(handle)) => *handle,
            Some(Frame::Overlay) => return Err(AfpError::UnterminatedOverlay),
            _ => return Err(AfpError::IllegalState("no page to end")),
        };
        let in_group = self.in_group();
        let blocked = self.saved.iter().any(|saved| {
            *saved < handle
                && self
                    .pages
                    .get(*saved)
                    .map_or(false, |p| p.in_group == in_group)
        });
        if blocked {
            return Err(AfpError::IllegalState(
                "an earlier saved page must be restored and ended first",
            ));
        }
        let page = self
            .pages
            .get_mut(handle)
            .ok_or(AfpError::IllegalState("page was already written"))?;
        page.body.close_graphics(&mut self.names)?;
        page.complete = true;
        self.frames.pop();
        if !in_group {
            self.flush()?;
        }
        Ok(())
    }

    /// End the current page group and write it
    pub fn end_page_group(&mut self) -> AfpResult<()> {
        self.check_open()?;
        if self.frames.last() != Some(&Frame::PageGroup) {
            return Err(AfpError::IllegalState("no page group to end"));
        }
        let pages = &self.pages;
        if self
            .saved
            .iter()
            .any(|saved| pages.get(*saved).map_or(false, |p| p.in_group))
        {
            return Err(AfpError::IllegalState(
                "a saved page of the page group must be restored and ended first",
            ));
        }
        let group = self
            .document()?
            .open_group()
            .ok_or(AfpError::IllegalState("no page group to end"))?;
        group.complete = true;
        self.frames.pop();
        self.flush()
    }

    /// End the document, closing whatever is still open
    ///
    /// This is terminal, every later call fails.
    pub fn end_document(&mut self) -> AfpResult<()> {
        self.check_open()?;
        if self.document.is_none() {
            return Err(AfpError::IllegalState("no document was started"));
        }
        if !self.saved.is_empty() {
            return Err(AfpError::IllegalState(
                "saved pages must be restored and ended first",
            ));
        }
        loop {
            match self.frames.last() {
                Some(Frame::Overlay) => {
                    warn!("Closing overlay left open at the end of the document");
                    self.end_overlay()?;
                }
                Some(Frame::Page(_)) => {
                    warn!("Closing page left open at the end of the document");
                    self.end_page()?;
                }
                Some(Frame::PageGroup) => {
                    warn!("Closing page group left open at the end of the document");
                    self.end_page_group()?;
                }
                Some(Frame::Document) | None => break,
            }
        }
        self.flush()?;
        let document = self.document()?;
        if !document.is_drained() {
            return Err(AfpError::IllegalState("incomplete objects at end of document"));
        }
        let name = document.name;
        self.flush_with(Some(StructuredField::end(SfId::EDT, name)))?;
        self.frames.clear();
        self.complete = true;
        debug!("Ended document {} ({} bytes)", name, self.f.bytes_written());
        Ok(())
    }

    /// Detach the current page, it can be resumed with [`DataStream::restore_page`]
    ///
    /// The page keeps its position in its parent, an open overlay or
    /// graphics object is kept with it.
    pub fn save_page(&mut self) -> AfpResult<PageHandle> {
        self.check_open()?;
        let handle = self
            .current_page()
            .ok_or(AfpError::IllegalState("no page to save"))?;
        while matches!(self.frames.last(), Some(Frame::Page(_) | Frame::Overlay)) {
            self.frames.pop();
        }
        self.saved.push(handle);
        Ok(handle)
    }

    /// Make a saved page the current page again
    pub fn restore_page(&mut self, handle: PageHandle) -> AfpResult<()> {
        self.check_open()?;
        if self.current_page().is_some() {
            return Err(AfpError::IllegalState("another page is still current"));
        }
        let index = self
            .saved
            .iter()
            .position(|saved| *saved == handle)
            .ok_or(AfpError::IllegalState("page was not saved"))?;
        let in_group = self.in_group();
        let page = self
            .pages
            .get(handle)
            .ok_or(AfpError::IllegalState("page was already written"))?;
        if page.in_group != in_group {
            return Err(AfpError::IllegalState(
                "page must be restored in the container it was started in",
            ));
        }
        let has_overlay = page.overlay.is_some();
        self.saved.remove(index);
        self.frames.push(Frame::Page(handle));
        if has_overlay {
            self.frames.push(Frame::Overlay);
        }
        Ok(())
    }

    /// Set offset and rotation for the following content of the current page
    pub fn set_offsets(&mut self, x: i32, y: i32, rotation: Rotation) -> AfpResult<()> {
        self.check_open()?;
        let body = Self::target(&self.frames, &mut self.pages, "set_offsets")?;
        body.painting.set_offsets(x, y, rotation);
        Ok(())
    }

    /// Write a run of text
    pub fn create_text(&mut self, run: &TextRun) -> AfpResult<()> {
        self.check_open()?;
        let body = Self::target(&self.frames, &mut self.pages, "create_text")?;
        let painting = body.painting;
        let placed = TextRun {
            x: run.x + painting.offset.x,
            y: run.y + painting.offset.y,
            orientation: painting.rotation.then(run.orientation),
            ..run.clone()
        };
        body.text(&mut self.names)?.builder().add_text(&placed)
    }

    /// Draw a horizontal or vertical line
    pub fn create_line(
        &mut self,
        from: Point,
        to: Point,
        thickness: i32,
        color: Color,
    ) -> AfpResult<()> {
        self.check_open()?;
        let body = Self::target(&self.frames, &mut self.pages, "create_line")?;
        let painting = body.painting;
        let rule = Rule {
            x1: from.x + painting.offset.x,
            y1: from.y + painting.offset.y,
            x2: to.x + painting.offset.x,
            y2: to.y + painting.offset.y,
            thickness,
            color,
            orientation: painting.rotation,
        };
        body.text(&mut self.names)?.builder().add_rule(&rule)
    }

    /// Fill a rectangle with a color
    ///
    /// With shading enabled this is a dithered IM image, otherwise a rule as
    /// thick as the rectangle is high.
    pub fn create_shading(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Color,
    ) -> AfpResult<()> {
        self.check_open()?;
        if !self.config.shading {
            return self.create_line(
                Point::new(x, y),
                Point::new(x + width, y),
                height,
                color,
            );
        }
        let body = Self::target(&self.frames, &mut self.pages, "create_shading")?;
        let area = body.object_area(x, y, width, height);
        let shading = ShadingObject::new(self.names.name(ObjectKind::Shading)?, area, color);
        body.add_shading(shading);
        Ok(())
    }

    /// Place an image
    ///
    /// Color images are converted to gray unless `color_images` is set,
    /// compressed data is only accepted with `native_images`.
    pub fn create_image(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        content: ImageContent,
    ) -> AfpResult<()> {
        self.check_open()?;
        if content.compression != Compression::None && !self.config.native_images {
            return Err(AfpError::IllegalState(
                "compressed image data needs native images to be enabled",
            ));
        }
        let content = if self.config.color_images {
            content
        } else {
            content.into_gray(self.config.bits_per_pixel)
        };
        let body = Self::target(&self.frames, &mut self.pages, "create_image")?;
        let area = body.object_area(x, y, width, height);
        let image = ImageObject::new(
            self.names.name(ObjectKind::Image)?,
            self.names.name(ObjectKind::ObjectEnvironment)?,
            area,
            self.config.mapping,
            &content,
        )?;
        body.add_image(image);
        Ok(())
    }

    /// Map a coded font to a local id
    pub fn create_font(
        &mut self,
        local_id: u8,
        code_page: &str,
        character_set: &str,
        size: u16,
    ) -> AfpResult<()> {
        self.check_open()?;
        let body = Self::target(&self.frames, &mut self.pages, "create_font")?;
        body.add_font(FontMapping {
            local_id,
            code_page: code_page.to_owned(),
            character_set: character_set.to_owned(),
            size,
        });
        Ok(())
    }

    /// Include an external page segment
    pub fn create_include_page_segment(&mut self, name: &str, x: i32, y: i32) -> AfpResult<()> {
        self.check_open()?;
        let body = Self::target(&self.frames, &mut self.pages, "create_include_page_segment")?;
        let at = body.painting.place_point(Point::new(x, y));
        body.include_page_segment(Name::new(name), at);
        Ok(())
    }

    /// Include an overlay by name on the current page
    pub fn create_include_page_overlay(
        &mut self,
        name: &str,
        x: i32,
        y: i32,
        rotation: Rotation,
    ) -> AfpResult<()> {
        self.check_open()?;
        let handle = match self.frames.last() {
            Some(Frame::Page(handle)) => *handle,
            _ => return Err(AfpError::NoActiveTarget("create_include_page_overlay")),
        };
        let page = self.page_mut(handle)?;
        let at = page.body.painting.place_point(Point::new(x, y));
        page.body.include_overlay(Name::new(name), at, rotation);
        Ok(())
    }

    /// Attach an attribute to the current page, overlay or page group
    pub fn create_tag_logical_element(&mut self, name: &str, value: &str) -> AfpResult<()> {
        self.check_open()?;
        let field = tag_logical_element(name, value)?;
        if let Ok(body) = Self::target(&self.frames, &mut self.pages, "create_tag_logical_element") {
            body.add_field(field);
            return Ok(());
        }
        match self.document.as_mut().and_then(Document::open_group) {
            Some(group) => {
                group.children.push(Child::Field(field));
                Ok(())
            }
            None => Err(AfpError::NoActiveTarget("create_tag_logical_element")),
        }
    }

    /// Select a medium map for the following pages
    pub fn create_invoke_medium_map(&mut self, name: &str) -> AfpResult<()> {
        self.check_open()?;
        let field = invoke_medium_map(name);
        if let Some(group) = self.document.as_mut().and_then(Document::open_group) {
            group.children.push(Child::Field(field));
            return Ok(());
        }
        if let Some(handle) = self.current_page() {
            self.page_mut(handle)?.body.add_field(field);
            return Ok(());
        }
        match &mut self.document {
            Some(document) => {
                document.children.push(Child::Field(field));
                Ok(())
            }
            None => Err(AfpError::NoActiveTarget("create_invoke_medium_map")),
        }
    }

    /// Add a comment
    pub fn create_no_operation(&mut self, content: &str) -> AfpResult<()> {
        self.check_open()?;
        let field = no_operation(content)?;
        if let Ok(body) = Self::target(&self.frames, &mut self.pages, "create_no_operation") {
            body.add_field(field);
            return Ok(());
        }
        match &mut self.document {
            Some(document) => {
                document.push(Child::Field(field));
                Ok(())
            }
            None => Err(AfpError::NoActiveTarget("create_no_operation")),
        }
    }

    fn check_goca(&self) -> AfpResult<()> {
        self.check_open()?;
        if self.config.goca {
            Ok(())
        } else {
            Err(AfpError::IllegalState("graphics are disabled"))
        }
    }

    /// Start a graphics object at the given area
    pub fn start_graphics(&mut self, x: i32, y: i32, width: i32, height: i32) -> AfpResult<()> {
        self.check_goca()?;
        let body = Self::target(&self.frames, &mut self.pages, "start_graphics")?;
        let area = body.object_area(x, y, width, height);
        body.start_graphics(self.names.name(ObjectKind::Graphics)?, area)
    }

    /// Add a drawing order to the open graphics object
    pub fn add_drawing_order(&mut self, order: &DrawingOrder) -> AfpResult<()> {
        self.check_goca()?;
        Self::target(&self.frames, &mut self.pages, "add_drawing_order")?
            .graphics()?
            .add_drawing_order(order)
    }

    /// Start a filled area in the open graphics object
    pub fn begin_area(&mut self, flags: AreaFlags) -> AfpResult<()> {
        self.check_goca()?;
        Self::target(&self.frames, &mut self.pages, "begin_area")?
            .graphics()?
            .begin_area(flags)
    }

    /// End the filled area of the open graphics object
    pub fn end_area(&mut self) -> AfpResult<()> {
        self.check_goca()?;
        Self::target(&self.frames, &mut self.pages, "end_area")?
            .graphics()?
            .end_area()
    }

    /// Add an inline image to the open graphics object
    pub fn add_graphics_image(
        &mut self,
        at: Point,
        width: u16,
        height: u16,
        data: &[u8],
    ) -> AfpResult<()> {
        self.check_goca()?;
        Self::target(&self.frames, &mut self.pages, "add_graphics_image")?
            .graphics()?
            .add_image(at, width, height, data)
    }

    /// Finish the open graphics object
    pub fn end_graphics(&mut self) -> AfpResult<()> {
        self.check_goca()?;
        let body = Self::target(&self.frames, &mut self.pages, "end_graphics")?;
        body.end_graphics(self.names.name(ObjectKind::ObjectEnvironment)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use super::{DataStream, StreamState};
    use crate::{common::Rotation, config::Config, error::AfpError, ptoca::TextRun};

    /// Accepts a fixed number of bytes
    struct Limited(usize);

    impl Write for Limited {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.len() > self.0 {
                return Err(io::Error::new(io::ErrorKind::Other, "sink is full"));
            }
            self.0 -= buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_states() {
        let mut ds = DataStream::new(Vec::new(), Config::default());
        assert_eq!(ds.state(), StreamState::NoDocument);
        ds.start_document().unwrap();
        assert_eq!(ds.state(), StreamState::InDocument);
        assert!(matches!(ds.start_document(), Err(AfpError::IllegalState(_))));
        ds.start_page_group().unwrap();
        assert_eq!(ds.state(), StreamState::InPageGroup);
        ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
        assert_eq!(ds.state(), StreamState::InPage);
        ds.start_overlay(0, 0, 50, 50, 240, 240, Rotation::R0).unwrap();
        assert_eq!(ds.state(), StreamState::InOverlay);
        assert!(matches!(
            ds.start_overlay(0, 0, 50, 50, 240, 240, Rotation::R0),
            Err(AfpError::IllegalState(_))
        ));
        assert!(matches!(ds.end_page(), Err(AfpError::UnterminatedOverlay)));
        ds.end_overlay().unwrap();
        ds.end_page().unwrap();
        ds.end_page_group().unwrap();
        ds.end_document().unwrap();
        assert_eq!(ds.state(), StreamState::Complete);
        assert!(matches!(
            ds.create_text(&TextRun::new(0, 0, 1, "late")),
            Err(AfpError::IllegalState(_))
        ));
        assert!(matches!(ds.end_document(), Err(AfpError::IllegalState(_))));
    }

    #[test]
    fn test_pages_stream_out() {
        let mut ds = DataStream::new(Vec::new(), Config::default());
        ds.start_document().unwrap();
        let after_bdt = ds.bytes_written();
        assert_eq!(after_bdt, 17);
        ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
        ds.create_text(&TextRun::new(0, 0, 1, "x")).unwrap();
        assert_eq!(ds.bytes_written(), after_bdt);
        ds.end_page().unwrap();
        assert!(ds.bytes_written() > after_bdt);
    }

    #[test]
    fn test_group_buffers_pages() {
        let mut ds = DataStream::new(Vec::new(), Config::default());
        ds.start_document().unwrap();
        let after_bdt = ds.bytes_written();
        ds.start_page_group().unwrap();
        ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
        ds.end_page().unwrap();
        assert_eq!(ds.bytes_written(), after_bdt);
        ds.end_page_group().unwrap();
        assert!(ds.bytes_written() > after_bdt);
    }

    #[test]
    fn test_failed_write_stops_the_stream() {
        let mut ds = DataStream::new(Limited(17), Config::default());
        ds.start_document().unwrap();
        assert!(!ds.has_failed());
        ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
        ds.create_text(&TextRun::new(0, 0, 1, "x")).unwrap();
        assert!(matches!(ds.end_page(), Err(AfpError::Sink(_))));
        assert!(ds.has_failed());
        assert!(matches!(
            ds.start_page(100, 100, Rotation::R0, 240, 240),
            Err(AfpError::IllegalState(_))
        ));
        assert!(matches!(ds.end_document(), Err(AfpError::IllegalState(_))));
        assert_ne!(ds.state(), StreamState::Complete);
        assert_eq!(ds.bytes_written(), 17);
    }

    #[test]
    fn test_failed_begin_stops_the_stream() {
        let mut ds = DataStream::new(Limited(0), Config::default());
        assert!(matches!(ds.start_document(), Err(AfpError::Sink(_))));
        assert!(matches!(ds.start_document(), Err(AfpError::IllegalState(_))));
    }

    #[test]
    fn test_goca_disabled() {
        let config = Config {
            goca: false,
            ..Config::default()
        };
        let mut ds = DataStream::new(Vec::new(), config);
        ds.start_document().unwrap();
        ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
        assert!(matches!(
            ds.start_graphics(0, 0, 10, 10),
            Err(AfpError::IllegalState(_))
        ));
    }
}
