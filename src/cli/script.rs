//! Job scripts
//!
//! A job script is a RON file that lists the pages of a document and what
//! to draw on them. Paths in the script are relative to the script file.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use afp_create::{
    common::{Color, Point, Resolution, Rotation},
    goca::{AreaFlags, DrawingOrder, LineType},
    modca::DataStream,
    ptoca::TextRun,
};
use color_eyre::eyre::{self, WrapErr};
use log::{info, warn};
use serde::Deserialize;

use super::image::load_image;

fn one() -> i32 {
    1
}

/// An attribute attached to a page group or page
#[derive(Debug, Clone, Deserialize)]
pub struct Attribute {
    /// Attribute name
    pub name: String,
    /// Attribute value
    pub value: String,
}

/// A coded font used by the text of a page or overlay
#[derive(Debug, Clone, Deserialize)]
pub struct FontScript {
    /// The local id that text refers to
    pub id: u8,
    /// Code page name
    pub code_page: String,
    /// Font character set name
    pub character_set: String,
    /// Vertical size in 1/20 points, 0 for raster fonts
    #[serde(default)]
    pub size: u16,
}

/// One element of a graphics object
#[derive(Debug, Clone, Deserialize)]
pub enum Shape {
    /// Set the color for the following shapes
    Color(Color),
    /// Set the line width multiplier
    LineWidth(u8),
    /// Set the line type
    LineType(LineType),
    /// A line between two points
    Line {
        /// Start point
        from: Point,
        /// End point
        to: Point,
    },
    /// A rectangle between two corners
    Box {
        /// First corner
        from: Point,
        /// Opposite corner
        to: Point,
    },
    /// A circle
    Circle {
        /// Center
        center: Point,
        /// Radius
        radius: u8,
    },
    /// A string of characters
    Text {
        /// Start of the baseline
        at: Point,
        /// The text
        text: String,
    },
    /// A filled area
    Area {
        /// Draw the outline too
        #[serde(default)]
        boundary: bool,
        /// The shapes that enclose the area
        shapes: Vec<Shape>,
    },
}

/// An element of a page or overlay
#[derive(Debug, Clone, Deserialize)]
pub enum Item {
    /// Move and rotate the following items
    Offset {
        /// Horizontal offset
        x: i32,
        /// Vertical offset
        y: i32,
        /// Rotation of the following items
        #[serde(default)]
        rotation: Rotation,
    },
    /// A run of text
    Text {
        /// Start of the baseline
        x: i32,
        /// Position of the baseline
        y: i32,
        /// Local font id
        font: u8,
        /// The text
        text: String,
        /// Text color
        #[serde(default)]
        color: Color,
        /// Additional text rotation
        #[serde(default)]
        rotation: Rotation,
    },
    /// A horizontal or vertical rule
    Line {
        /// Start point
        from: Point,
        /// End point
        to: Point,
        /// Thickness in device units
        #[serde(default = "one")]
        thickness: i32,
        /// Color of the rule
        #[serde(default)]
        color: Color,
    },
    /// A filled rectangle
    Shading {
        /// Left
        x: i32,
        /// Top
        y: i32,
        /// Width
        width: i32,
        /// Height
        height: i32,
        /// Fill color
        color: Color,
    },
    /// An image file, scaled into the given area
    Image {
        /// Left
        x: i32,
        /// Top
        y: i32,
        /// Width of the area
        width: i32,
        /// Height of the area
        height: i32,
        /// The image file
        path: PathBuf,
    },
    /// A graphics object
    Graphics {
        /// Left
        x: i32,
        /// Top
        y: i32,
        /// Width of the area
        width: i32,
        /// Height of the area
        height: i32,
        /// What to draw
        shapes: Vec<Shape>,
    },
    /// Include a page segment by name
    PageSegment {
        /// Name of the page segment
        name: String,
        /// Left
        x: i32,
        /// Top
        y: i32,
    },
    /// Include an overlay by name (pages only)
    Overlay {
        /// Name of the overlay resource
        name: String,
        /// Left
        x: i32,
        /// Top
        y: i32,
        /// Rotation of the overlay
        #[serde(default)]
        rotation: Rotation,
    },
    /// Tag with an attribute
    Attribute(Attribute),
    /// A comment that ends up in the file
    Comment(String),
}

/// An overlay drawn on a page
#[derive(Debug, Clone, Deserialize)]
pub struct OverlayScript {
    /// Left
    pub x: i32,
    /// Top
    pub y: i32,
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
    /// Rotation of the overlay on the page
    #[serde(default)]
    pub rotation: Rotation,
    /// Fonts of the overlay
    #[serde(default)]
    pub fonts: Vec<FontScript>,
    /// What to draw
    #[serde(default)]
    pub content: Vec<Item>,
}

/// A page of a job script
#[derive(Debug, Clone, Deserialize)]
pub struct PageScript {
    /// Width in device units
    pub width: i32,
    /// Height in device units
    pub height: i32,
    /// Page rotation, defaults to the configured one
    #[serde(default)]
    pub rotation: Option<Rotation>,
    /// Resolution, defaults to the configured one
    #[serde(default)]
    pub resolution: Option<u16>,
    /// Fonts of the page
    #[serde(default)]
    pub fonts: Vec<FontScript>,
    /// Overlays defined on this page
    #[serde(default)]
    pub overlays: Vec<OverlayScript>,
    /// What to draw
    #[serde(default)]
    pub content: Vec<Item>,
}

/// A document to render
#[derive(Debug, Clone, Deserialize)]
pub struct JobScript {
    /// A comment at the start of the document
    #[serde(default)]
    pub comment: Option<String>,
    /// Medium map to invoke before the pages
    #[serde(default)]
    pub medium_map: Option<String>,
    /// Put the pages into a named page group
    #[serde(default)]
    pub group: bool,
    /// Attributes of the page group
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// The pages
    pub pages: Vec<PageScript>,
}

fn add_fonts<W: Write>(ds: &mut DataStream<W>, fonts: &[FontScript]) -> eyre::Result<()> {
    for font in fonts {
        ds.create_font(font.id, &font.code_page, &font.character_set, font.size)
            .wrap_err_with(|| format!("Failed to map font {}", font.id))?;
    }
    Ok(())
}

fn draw_shapes<W: Write>(ds: &mut DataStream<W>, shapes: &[Shape]) -> eyre::Result<()> {
    for shape in shapes {
        let order = match shape {
            Shape::Color(color) => DrawingOrder::SetProcessColor(*color),
            Shape::LineWidth(width) => DrawingOrder::SetLineWidth(*width),
            Shape::LineType(line_type) => DrawingOrder::SetLineType(*line_type),
            Shape::Line { from, to } => DrawingOrder::Line {
                from: *from,
                to: *to,
            },
            Shape::Box { from, to } => DrawingOrder::Box {
                from: *from,
                to: *to,
            },
            Shape::Circle { center, radius } => DrawingOrder::FullArc {
                center: *center,
                radius: *radius,
            },
            Shape::Text { at, text } => DrawingOrder::CharacterString {
                at: *at,
                text: text.clone(),
            },
            Shape::Area { boundary, shapes } => {
                let flags = if *boundary {
                    AreaFlags::BOUNDARY
                } else {
                    AreaFlags::empty()
                };
                ds.begin_area(flags)?;
                draw_shapes(ds, shapes)?;
                ds.end_area()?;
                continue;
            }
        };
        ds.add_drawing_order(&order)?;
    }
    Ok(())
}

fn draw_item<W: Write>(
    ds: &mut DataStream<W>,
    item: &Item,
    base: &Path,
    resolution: Resolution,
) -> eyre::Result<()> {
    match item {
        Item::Offset { x, y, rotation } => ds.set_offsets(*x, *y, *rotation)?,
        Item::Text {
            x,
            y,
            font,
            text,
            color,
            rotation,
        } => {
            let mut run = TextRun::new(*x, *y, *font, text.as_str());
            run.color = *color;
            run.orientation = *rotation;
            ds.create_text(&run)?;
        }
        Item::Line {
            from,
            to,
            thickness,
            color,
        } => ds.create_line(*from, *to, *thickness, *color)?,
        Item::Shading {
            x,
            y,
            width,
            height,
            color,
        } => ds.create_shading(*x, *y, *width, *height, *color)?,
        Item::Image {
            x,
            y,
            width,
            height,
            path,
        } => {
            let content = load_image(&base.join(path), resolution)?;
            ds.create_image(*x, *y, *width, *height, content)
                .wrap_err_with(|| format!("Failed to place image `{}`", path.display()))?;
        }
        Item::Graphics {
            x,
            y,
            width,
            height,
            shapes,
        } => {
            if !ds.config().goca {
                info!("Skipping graphics at ({}, {})", x, y);
                return Ok(());
            }
            ds.start_graphics(*x, *y, *width, *height)?;
            draw_shapes(ds, shapes).wrap_err("Failed to draw graphics")?;
            ds.end_graphics()?;
        }
        Item::PageSegment { name, x, y } => ds.create_include_page_segment(name, *x, *y)?,
        Item::Overlay {
            name,
            x,
            y,
            rotation,
        } => ds.create_include_page_overlay(name, *x, *y, *rotation)?,
        Item::Attribute(attr) => ds.create_tag_logical_element(&attr.name, &attr.value)?,
        Item::Comment(text) => ds.create_no_operation(text)?,
    }
    Ok(())
}

impl JobScript {
    /// Write the document described by this script
    pub fn render<W: Write>(&self, ds: &mut DataStream<W>, base: &Path) -> eyre::Result<()> {
        ds.start_document()?;
        if let Some(comment) = &self.comment {
            ds.create_no_operation(comment)?;
        }
        if self.group {
            ds.start_page_group()?;
            for attr in &self.attributes {
                ds.create_tag_logical_element(&attr.name, &attr.value)?;
            }
        } else if !self.attributes.is_empty() {
            warn!("Ignoring attributes of a document without page group");
        }
        if let Some(medium_map) = &self.medium_map {
            ds.create_invoke_medium_map(medium_map)?;
        }

        for (index, page) in self.pages.iter().enumerate() {
            self.render_page(ds, page, base)
                .wrap_err_with(|| format!("Failed to render page {}", index + 1))?;
        }

        if self.group {
            ds.end_page_group()?;
        }
        ds.end_document()?;
        Ok(())
    }

    fn render_page<W: Write>(
        &self,
        ds: &mut DataStream<W>,
        page: &PageScript,
        base: &Path,
    ) -> eyre::Result<()> {
        let config = ds.config();
        let rotation = page.rotation.unwrap_or(config.rotation);
        let dpi = page.resolution.unwrap_or(config.resolution);
        let resolution = Resolution::uniform(dpi);

        ds.start_page(page.width, page.height, rotation, dpi, dpi)?;
        add_fonts(ds, &page.fonts)?;
        for overlay in &page.overlays {
            ds.start_overlay(
                overlay.x,
                overlay.y,
                overlay.width,
                overlay.height,
                dpi,
                dpi,
                overlay.rotation,
            )?;
            add_fonts(ds, &overlay.fonts)?;
            for item in &overlay.content {
                draw_item(ds, item, base, resolution)?;
            }
            ds.end_overlay()?;
        }
        for item in &page.content {
            draw_item(ds, item, base, resolution)?;
        }
        ds.end_page()?;
        Ok(())
    }
}
