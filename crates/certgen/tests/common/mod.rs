//! Shared fixtures: in-memory templates, a recording document engine and a
//! stub rasterizer

#![allow(dead_code)]

use certgen::{PageRasterizer, TemplateAsset, TemplateUpload};
use image::RgbaImage;
use lopdf::{dictionary, Object};
use pdf_core::{
    DocumentEngine, FontHandle, ImageHandle, PdfError, Result as PdfResult, StandardFont, TextDraw,
};

/// A one-page PDF with the given MediaBox and a little template content
pub fn template_pdf(width: f64, height: f64) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let contents_id = doc.add_object(lopdf::Stream::new(
        dictionary! {},
        b"0.9 0.9 0.9 rg 20 20 100 50 re f".to_vec(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Resources" => dictionary! {},
        "Contents" => contents_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![page_id.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

pub fn template_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([250, 245, 230]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn vector_template() -> TemplateAsset {
    TemplateAsset::ingest(TemplateUpload::new("template.pdf", template_pdf(842.0, 595.0)))
        .unwrap()
}

pub fn raster_template(width: u32, height: u32) -> TemplateAsset {
    TemplateAsset::ingest(
        TemplateUpload::new("template.png", template_png(width, height))
            .with_media_type("image/png"),
    )
    .unwrap()
}

/// A draw operation seen by [`RecordingEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Image {
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Text {
        page: usize,
        text: String,
        font: String,
        draw: TextDraw,
    },
}

/// Document engine that records what the renderer asks of it
///
/// Custom fonts are measured as if they were Helvetica.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub loaded_bytes: usize,
    pub pages: Vec<(f64, f64)>,
    pub images: usize,
    /// Font names in embedding order
    pub fonts: Vec<String>,
    pub calls: Vec<Call>,
}

impl RecordingEngine {
    pub fn texts(&self) -> Vec<(&str, &str, TextDraw)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Text {
                    text, font, draw, ..
                } => Some((text.as_str(), font.as_str(), *draw)),
                Call::Image { .. } => None,
            })
            .collect()
    }

    fn metrics(&self, font: FontHandle) -> PdfResult<StandardFont> {
        let name = self
            .fonts
            .get(font.0)
            .ok_or_else(|| PdfError::FontNotFound(format!("handle {}", font.0)))?;
        Ok(StandardFont::from_name(name).unwrap_or(StandardFont::Helvetica))
    }
}

impl DocumentEngine for RecordingEngine {
    fn load(bytes: &[u8]) -> PdfResult<Self> {
        Ok(Self {
            loaded_bytes: bytes.len(),
            pages: vec![(842.0, 595.0)],
            ..Self::default()
        })
    }

    fn create() -> Self {
        Self::default()
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page: usize) -> PdfResult<(f64, f64)> {
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .copied()
            .ok_or(PdfError::InvalidPage(page, self.pages.len()))
    }

    fn add_page(&mut self, width: f64, height: f64) -> PdfResult<usize> {
        self.pages.push((width, height));
        Ok(self.pages.len())
    }

    fn embed_image(&mut self, _bytes: &[u8]) -> PdfResult<ImageHandle> {
        self.images += 1;
        Ok(ImageHandle(self.images - 1))
    }

    fn draw_image(
        &mut self,
        page: usize,
        _image: ImageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> PdfResult<()> {
        self.calls.push(Call::Image {
            page,
            x,
            y,
            width,
            height,
        });
        Ok(())
    }

    fn embed_standard_font(&mut self, font: StandardFont) -> PdfResult<FontHandle> {
        self.fonts.push(font.name().to_string());
        Ok(FontHandle(self.fonts.len() - 1))
    }

    fn embed_font(&mut self, name: &str, _bytes: &[u8]) -> PdfResult<FontHandle> {
        self.fonts.push(name.to_string());
        Ok(FontHandle(self.fonts.len() - 1))
    }

    fn text_width(&self, font: FontHandle, text: &str, size: f64) -> PdfResult<f64> {
        self.metrics(font)?.text_width_points(text, size)
    }

    fn draw_text(
        &mut self,
        page: usize,
        text: &str,
        font: FontHandle,
        draw: &TextDraw,
    ) -> PdfResult<()> {
        let font = self.fonts[font.0].clone();
        self.calls.push(Call::Text {
            page,
            text: text.to_string(),
            font,
            draw: *draw,
        });
        Ok(())
    }

    fn save(&mut self) -> PdfResult<Vec<u8>> {
        Ok(format!("{:?}", self.calls).into_bytes())
    }
}

/// Rasterizer that returns a blank page of a fixed size
pub struct StubRasterizer;

impl PageRasterizer for StubRasterizer {
    fn rasterize(&self, _pdf: &[u8], scale: f32) -> certgen::Result<RgbaImage> {
        let side = (10.0 * scale) as u32;
        Ok(RgbaImage::from_pixel(side, side, image::Rgba([0, 0, 0, 0])))
    }
}
