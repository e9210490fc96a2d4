//! The document engine contract
//!
//! The render pipeline only talks to documents through [`DocumentEngine`],
//! so it can be driven by [`crate::PdfDocument`] or by a recording engine
//! in tests.

use crate::{Color, Result, StandardFont};

/// Handle to a font embedded in a specific document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontHandle(pub usize);

/// Handle to an image embedded in a specific document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub usize);

/// Placement and styling of a single text draw call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextDraw {
    /// Baseline start x in points
    pub x: f64,
    /// Baseline y in points, measured from the bottom of the page
    pub y: f64,
    /// Font size in points
    pub size: f64,
    pub color: Color,
    /// Horizontal stretch factor
    pub x_scale: f64,
    /// Vertical stretch factor
    pub y_scale: f64,
    /// Degrees, clockwise as seen on screen
    pub rotate: f64,
}

impl TextDraw {
    /// Unscaled, unrotated black text at a position
    pub fn at(x: f64, y: f64, size: f64) -> Self {
        Self {
            x,
            y,
            size,
            color: Color::black(),
            x_scale: 1.0,
            y_scale: 1.0,
            rotate: 0.0,
        }
    }
}

/// Operations the render pipeline needs from a document implementation
///
/// Pages are numbered from 1. Handles are only valid for the document that
/// returned them.
pub trait DocumentEngine: Sized {
    /// Load an existing document from bytes
    fn load(bytes: &[u8]) -> Result<Self>;

    /// Create an empty document with no pages
    fn create() -> Self;

    /// Number of pages
    fn page_count(&self) -> usize;

    /// Page width and height in points
    fn page_size(&self, page: usize) -> Result<(f64, f64)>;

    /// Append a page of the given size, returning its page number
    fn add_page(&mut self, width: f64, height: f64) -> Result<usize>;

    /// Embed a raster image (JPEG, PNG, ...)
    fn embed_image(&mut self, bytes: &[u8]) -> Result<ImageHandle>;

    /// Draw an embedded image into a rectangle on a page
    fn draw_image(
        &mut self,
        page: usize,
        image: ImageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()>;

    /// Make one of the standard fonts available
    fn embed_standard_font(&mut self, font: StandardFont) -> Result<FontHandle>;

    /// Embed a TrueType/OpenType font file
    fn embed_font(&mut self, name: &str, bytes: &[u8]) -> Result<FontHandle>;

    /// Unscaled width of `text` in points at `size`
    fn text_width(&self, font: FontHandle, text: &str, size: f64) -> Result<f64>;

    /// Draw a line of text
    fn draw_text(&mut self, page: usize, text: &str, font: FontHandle, draw: &TextDraw)
        -> Result<()>;

    /// Serialize the document
    fn save(&mut self) -> Result<Vec<u8>>;
}
