//! Per-row render pipeline

use crate::fonts::{FontCache, FontLibrary};
use crate::template::{TemplateAsset, TemplateKind};
use crate::{DataRow, Result};
use layout::TextField;
use pdf_core::{Color, DocumentEngine, TextDraw};

/// Page every field is drawn on
const PAGE: usize = 1;

/// Draws a layout onto fresh copies of a template
///
/// Each call works on its own document and its own [`FontCache`], so rows
/// never see each other's edits.
pub struct Renderer<'a> {
    template: &'a TemplateAsset,
    fields: &'a [TextField],
    fonts: &'a FontLibrary,
}

impl<'a> Renderer<'a> {
    pub fn new(template: &'a TemplateAsset, fields: &'a [TextField], fonts: &'a FontLibrary) -> Self {
        Self {
            template,
            fields,
            fonts,
        }
    }

    /// Build the document for one row without serializing it
    pub fn compose<E: DocumentEngine>(&self, row: &DataRow) -> Result<E> {
        let mut doc = self.fresh_page::<E>()?;
        let mut cache = FontCache::new(self.fonts);

        for field in self.fields {
            let Some(text) = field.column.as_deref().and_then(|c| row.value(c)) else {
                continue;
            };

            let font = cache.handle(&mut doc, &field.font)?;
            let width = doc.text_width(font, text, field.size)?;
            let fill = field.fill();
            let draw = TextDraw {
                x: field.x - width * field.scale_x / 2.0,
                y: field.y,
                size: field.size,
                color: Color::from_rgb(fill.r, fill.g, fill.b),
                x_scale: field.scale_x,
                y_scale: field.scale_y,
                rotate: field.rotate,
            };
            doc.draw_text(PAGE, text, font, &draw)?;
        }

        log::debug!(
            "Composed row {} with {} font(s)",
            row.index(),
            cache.len()
        );
        Ok(doc)
    }

    /// Render one row to PDF bytes
    pub fn render<E: DocumentEngine>(&self, row: &DataRow) -> Result<Vec<u8>> {
        let mut doc = self.compose::<E>(row)?;
        Ok(doc.save()?)
    }

    fn fresh_page<E: DocumentEngine>(&self) -> Result<E> {
        let bytes = self.template.bytes();
        match self.template.kind() {
            TemplateKind::Vector => Ok(E::load(bytes)?),
            TemplateKind::Raster => {
                let (width, height) = self.template.size();
                let mut doc = E::create();
                let page = doc.add_page(width, height)?;
                let image = doc.embed_image(bytes)?;
                doc.draw_image(page, image, 0.0, 0.0, width, height)?;
                Ok(doc)
            }
        }
    }
}
