//! Placing objects on a rotated page
//!
//! Coordinates are reflected against the extents of the page, never against
//! the extents of the object that is placed.

use crate::common::{Extent, Point, Rotation};

/// Where an object area ends up on the page
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Horizontal origin
    pub x: i32,
    /// Vertical origin
    pub y: i32,
    /// Horizontal extent
    pub width: i32,
    /// Vertical extent
    pub height: i32,
}

/// Map a logical rectangle into device space
pub fn place(
    rotation: Rotation,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    offset: Point,
    page: Extent,
) -> Placement {
    let (x, y) = (x + offset.x, y + offset.y);
    match rotation {
        Rotation::R0 => Placement {
            x,
            y,
            width,
            height,
        },
        Rotation::R90 => Placement {
            x: page.width - y,
            y: x,
            width: height,
            height: width,
        },
        Rotation::R180 => Placement {
            x: page.width - x,
            y: page.height - y,
            width,
            height,
        },
        Rotation::R270 => Placement {
            x: y,
            y: page.height - x,
            width: height,
            height: width,
        },
    }
}

/// The transformation in effect for the current page
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PaintingState {
    /// Rotation applied to placed objects
    pub rotation: Rotation,
    /// Added to every logical position
    pub offset: Point,
    /// Extent of the page objects are reflected against
    pub page: Extent,
}

impl PaintingState {
    /// The initial state for a new page
    pub fn for_page(page: Extent) -> Self {
        Self {
            rotation: Rotation::R0,
            offset: Point::default(),
            page,
        }
    }

    /// Change offset and rotation
    pub fn set_offsets(&mut self, x: i32, y: i32, rotation: Rotation) {
        self.offset = Point::new(x, y);
        self.rotation = rotation;
    }

    /// Place a rectangle with the current state
    pub fn place(&self, x: i32, y: i32, width: i32, height: i32) -> Placement {
        place(self.rotation, x, y, width, height, self.offset, self.page)
    }

    /// Place a single point with the current state
    pub fn place_point(&self, p: Point) -> Point {
        let placed = self.place(p.x, p.y, 0, 0);
        Point::new(placed.x, placed.y)
    }
}
