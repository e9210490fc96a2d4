//! Screen to document coordinate mapping
//!
//! The template is shown scaled inside a surface on screen. Screen
//! coordinates grow right and down from the surface's top-left corner in
//! CSS pixels; document coordinates grow right and up from the page's
//! bottom-left corner in points.

use crate::{LayoutError, Result};

/// A position in either coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width and height in either coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Center of a rectangle of this size anchored at the origin
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// Where the template is drawn on screen and how big it really is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    /// Top-left corner of the rendered surface in viewport pixels
    pub origin: Point,
    /// Size of the surface as laid out on screen
    pub rendered: Size,
    /// Size of the template in document units
    pub native: Size,
}

impl SurfaceGeometry {
    /// Describe a surface, rejecting zero or negative sizes
    pub fn new(origin: Point, rendered: Size, native: Size) -> Result<Self> {
        if rendered.is_degenerate() {
            return Err(LayoutError::DegenerateSurface(
                rendered.width,
                rendered.height,
            ));
        }
        if native.is_degenerate() {
            return Err(LayoutError::DegenerateSurface(native.width, native.height));
        }
        Ok(Self {
            origin,
            rendered,
            native,
        })
    }

    /// Document units per screen pixel along each axis
    pub fn scale(&self) -> (f64, f64) {
        (
            self.native.width / self.rendered.width,
            self.native.height / self.rendered.height,
        )
    }

    /// Map a viewport position to document coordinates
    pub fn to_document(&self, screen: Point) -> Point {
        let (sx, sy) = self.scale();
        Point {
            x: (screen.x - self.origin.x) * sx,
            y: self.native.height - (screen.y - self.origin.y) * sy,
        }
    }

    /// Map a viewport position to document coordinates rounded to whole units
    pub fn to_document_rounded(&self, screen: Point) -> Point {
        let point = self.to_document(screen);
        Point::new(point.x.round(), point.y.round())
    }

    /// Map document coordinates back to a viewport position
    pub fn to_screen(&self, document: Point) -> Point {
        let (sx, sy) = self.scale();
        Point {
            x: self.origin.x + document.x / sx,
            y: self.origin.y + (self.native.height - document.y) / sy,
        }
    }
}
