//! PDF Core - Document engine for certificate rendering
//!
//! This crate provides functionality for:
//! - Opening an existing PDF page as a template, or creating a blank document
//! - Embedding raster images (JPEG, PNG and other decodable formats)
//! - Embedding the standard PDF fonts and TrueType/OpenType fonts
//! - Measuring and drawing scaled, rotated, colored text
//! - Serializing the result back to bytes
//!
//! All coordinates are PDF user-space points with the origin at the
//! bottom-left corner of the page.
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Color, DocumentEngine, PdfDocument, StandardFont, TextDraw};
//!
//! let mut doc = PdfDocument::load(&template_bytes)?;
//! let font = doc.embed_standard_font(StandardFont::HelveticaBold)?;
//! let width = doc.text_width(font, "Jane Doe", 40.0)?;
//! doc.draw_text(1, "Jane Doe", font, &TextDraw::at(300.0 - width / 2.0, 400.0, 40.0))?;
//! let bytes = doc.save()?;
//! ```

mod document;
mod engine;
mod font;
mod image;
mod standard;
mod text;

pub use document::{Color, PdfDocument};
pub use engine::{DocumentEngine, FontHandle, ImageHandle, TextDraw};
pub use font::FontData;
pub use image::{detect_format, ImageFormat, ImageXObject};
pub use standard::StandardFont;
pub use text::{generate_text_operators, text_matrix};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Cannot encode {0:?} with font {1}")]
    UnencodableText(String, String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Invalid page size: {0} x {1}")]
    InvalidPageSize(f64, f64),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;
