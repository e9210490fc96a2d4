//! Template ingestion
//!
//! A template is either the first page of a PDF (vector) or a single raster
//! image. Either way ingestion settles the page size every field is placed
//! against.

use crate::{CertgenError, Result};
use pdf_core::{DocumentEngine, PdfDocument};
use std::sync::Arc;

/// How a template is turned into a page for each row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// First page of a PDF, reloaded for every row
    Vector,
    /// An image drawn as the full-page background of a new document
    Raster,
}

/// An uploaded template file
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateUpload {
    pub file_name: Option<String>,
    /// Declared media type, e.g. `application/pdf` or `image/png`
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl TemplateUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            media_type: None,
            bytes,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

/// A loaded template
///
/// Immutable; uploading another template replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateAsset {
    kind: TemplateKind,
    width: f64,
    height: f64,
    bytes: Arc<[u8]>,
    file_name: Option<String>,
}

impl TemplateAsset {
    /// Classify, decode and measure an upload
    pub fn ingest(upload: TemplateUpload) -> Result<Self> {
        let kind = classify(upload.media_type.as_deref(), &upload.bytes)?;
        let (width, height) = match kind {
            TemplateKind::Raster => raster_size(&upload.bytes)?,
            TemplateKind::Vector => vector_size(&upload.bytes)?,
        };
        if !(width > 0.0 && height > 0.0) {
            return Err(CertgenError::Ingestion(format!(
                "template has no area ({width} x {height})"
            )));
        }

        log::info!(
            "Loaded {:?} template {} ({width} x {height})",
            kind,
            upload.file_name.as_deref().unwrap_or("<unnamed>")
        );
        Ok(Self {
            kind,
            width,
            height,
            bytes: upload.bytes.into(),
            file_name: upload.file_name,
        })
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Page width in document units (points, or pixels for images)
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// The original file contents
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}

/// Decide between vector and raster handling
///
/// The declared media type wins; without a usable one the leading bytes
/// decide.
fn classify(media_type: Option<&str>, bytes: &[u8]) -> Result<TemplateKind> {
    let media_type = media_type.map(|m| m.trim().to_ascii_lowercase());
    match media_type.as_deref() {
        Some("application/pdf") => return Ok(TemplateKind::Vector),
        Some(m) if m.starts_with("image/") => return Ok(TemplateKind::Raster),
        _ => {}
    }

    if bytes.starts_with(b"%PDF-") {
        Ok(TemplateKind::Vector)
    } else if image::guess_format(bytes).is_ok() {
        Ok(TemplateKind::Raster)
    } else {
        Err(CertgenError::Ingestion(
            "unsupported template type, expected a PDF or an image".into(),
        ))
    }
}

fn raster_size(bytes: &[u8]) -> Result<(f64, f64)> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| CertgenError::Ingestion(format!("cannot decode image: {e}")))?;
    Ok((image.width() as f64, image.height() as f64))
}

fn vector_size(bytes: &[u8]) -> Result<(f64, f64)> {
    let doc =
        PdfDocument::load(bytes).map_err(|e| CertgenError::Ingestion(e.to_string()))?;
    if doc.page_count() == 0 {
        return Err(CertgenError::Ingestion("document has no pages".into()));
    }
    doc.page_size(1)
        .map_err(|e| CertgenError::Ingestion(e.to_string()))
}
