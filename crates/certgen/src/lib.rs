//! certgen - Batch certificate generation
//!
//! This crate provides:
//! - Template ingestion (a PDF page or a raster image)
//! - The tabular dataset the batch iterates over
//! - The font library and the per-document font cache
//! - The per-row render pipeline with optional rasterization
//! - Batch orchestration into a zip archive
//! - [`Workspace`], the application state a front end drives
//!
//! # Example
//!
//! ```ignore
//! use certgen::{TemplateUpload, Workspace};
//!
//! let mut workspace = Workspace::new();
//! workspace.upload_template(TemplateUpload::new("template.pdf", template_bytes))?;
//! workspace.load_csv(&csv_text)?;
//! workspace.update_field(workspace.fields().active_id(), "colName", "Name")?;
//! let zip_bytes = workspace.generate_zip(None)?;
//! ```

pub mod archive;
pub mod batch;
pub mod dataset;
pub mod fonts;
pub mod raster;
pub mod renderer;
pub mod template;
pub mod workspace;

pub use archive::{ArchiveSink, ZipArchiveSink};
pub use batch::{
    generate_batch, preview, sanitize_file_stem, BatchJob, BatchOptions, BatchSummary, Preview,
    ARCHIVE_NAME,
};
pub use dataset::{DataRow, Dataset};
pub use fonts::{FontAsset, FontCache, FontLibrary, FontOption};
#[cfg(feature = "pdfium")]
pub use raster::PdfiumRasterizer;
pub use raster::{encode_image, OutputKind, PageRasterizer};
pub use renderer::Renderer;
pub use template::{TemplateAsset, TemplateKind, TemplateUpload};
pub use workspace::Workspace;

use layout::LayoutError;
use thiserror::Error;

/// Errors that can occur while preparing or generating a batch
#[derive(Debug, Error)]
pub enum CertgenError {
    #[error("Failed to load template: {0}")]
    Ingestion(String),

    #[error("Failed to parse data: {0}")]
    Parse(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid layout preset: {0}")]
    Preset(String),

    #[error("Failed to render row {row}: {message}")]
    Render { row: usize, message: String },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Rasterization error: {0}")]
    Raster(String),

    #[error("Layout error: {0}")]
    Layout(#[source] LayoutError),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),
}

impl From<LayoutError> for CertgenError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::LastField => CertgenError::Validation(err.to_string()),
            LayoutError::Preset(message) => CertgenError::Preset(message),
            other => CertgenError::Layout(other),
        }
    }
}

/// Result type for certgen operations
pub type Result<T> = std::result::Result<T, CertgenError>;
