//! Output kinds and page rasterization

use crate::{CertgenError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format of each generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Pdf,
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
}

impl OutputKind {
    pub const ALL: [OutputKind; 3] = [OutputKind::Pdf, OutputKind::Png, OutputKind::Jpg];

    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Pdf => "pdf",
            OutputKind::Png => "png",
            OutputKind::Jpg => "jpg",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            OutputKind::Pdf => "application/pdf",
            OutputKind::Png => "image/png",
            OutputKind::Jpg => "image/jpeg",
        }
    }

    /// Whether the page has to be rasterized
    pub fn is_image(self) -> bool {
        !matches!(self, OutputKind::Pdf)
    }
}

impl FromStr for OutputKind {
    type Err = CertgenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputKind::Pdf),
            "png" => Ok(OutputKind::Png),
            "jpg" | "jpeg" => Ok(OutputKind::Jpg),
            other => Err(CertgenError::Validation(format!(
                "Unknown output format {other:?}, expected pdf, png or jpg"
            ))),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Turns page 1 of a PDF into pixels
pub trait PageRasterizer {
    /// Render the first page at `scale` pixels per point
    fn rasterize(&self, pdf: &[u8], scale: f32) -> Result<RgbaImage>;
}

/// Encode a rendered page at maximum quality
///
/// JPEG has no alpha channel, so the page is composited onto white first.
pub fn encode_image(page: RgbaImage, kind: OutputKind) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoded = match kind {
        OutputKind::Png => DynamicImage::ImageRgba8(page).write_with_encoder(
            PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, FilterType::Adaptive),
        ),
        OutputKind::Jpg => DynamicImage::ImageRgb8(flatten_on_white(&page))
            .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, 100)),
        OutputKind::Pdf => {
            return Err(CertgenError::Validation(
                "PDF output is not an image format".into(),
            ))
        }
    };
    encoded.map_err(|e| CertgenError::Raster(e.to_string()))?;
    Ok(bytes)
}

fn flatten_on_white(page: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(page.width(), page.height(), |x, y| {
        let [r, g, b, a] = page.get_pixel(x, y).0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(feature = "pdfium")]
pub use self::pdfium::PdfiumRasterizer;

#[cfg(feature = "pdfium")]
mod pdfium {
    use super::PageRasterizer;
    use crate::{CertgenError, Result};
    use image::RgbaImage;
    use pdfium_render::prelude::*;
    use std::path::Path;

    /// Rasterizer backed by a pdfium shared library loaded at runtime
    pub struct PdfiumRasterizer {
        pdfium: Pdfium,
    }

    impl PdfiumRasterizer {
        /// Bind the pdfium library in `dir`, or the system one when `None`
        pub fn bind(dir: Option<&Path>) -> Result<Self> {
            let bindings = match dir {
                Some(dir) => Pdfium::bind_to_library(
                    Pdfium::pdfium_platform_library_name_at_path(dir),
                ),
                None => Pdfium::bind_to_system_library(),
            }
            .map_err(|e| CertgenError::Raster(format!("cannot load pdfium: {e:?}")))?;
            Ok(Self {
                pdfium: Pdfium::new(bindings),
            })
        }
    }

    impl PageRasterizer for PdfiumRasterizer {
        fn rasterize(&self, pdf: &[u8], scale: f32) -> Result<RgbaImage> {
            let raster_err = |e: PdfiumError| CertgenError::Raster(format!("{e:?}"));
            let document = self
                .pdfium
                .load_pdf_from_byte_slice(pdf, None)
                .map_err(raster_err)?;
            let page = document.pages().get(0).map_err(raster_err)?;
            let bitmap = page
                .render_with_config(&PdfRenderConfig::new().scale_page_by_factor(scale))
                .map_err(raster_err)?;

            let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
            RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(|| {
                CertgenError::Raster(format!("bitmap does not match {width} x {height}"))
            })
        }
    }
}
