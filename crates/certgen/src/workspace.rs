//! Application state
//!
//! [`Workspace`] holds everything an editing session owns (template,
//! layout, dataset, fonts, the current gesture and batch settings) and is
//! the single place front ends mutate it through.

use crate::archive::ZipArchiveSink;
use crate::batch::{self, BatchJob, BatchOptions, BatchSummary, Preview};
use crate::raster::{OutputKind, PageRasterizer};
use crate::template::{TemplateAsset, TemplateUpload};
use crate::{CertgenError, DataRow, Dataset, FontLibrary, Result};
use layout::{
    FieldAttr, FieldId, FieldSet, GestureMode, Interaction, Point, Size, SurfaceGeometry,
};
use pdf_core::{DocumentEngine, PdfDocument};

/// Where new fields go when no template is loaded
const FALLBACK_CENTER: Point = Point { x: 100.0, y: 100.0 };

/// State of one editing session
#[derive(Debug, Clone)]
pub struct Workspace {
    template: Option<TemplateAsset>,
    fields: FieldSet,
    dataset: Dataset,
    fonts: FontLibrary,
    interaction: Interaction,
    geometry: Option<SurfaceGeometry>,
    options: BatchOptions,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            template: None,
            fields: FieldSet::new(Point::default()),
            dataset: Dataset::default(),
            fonts: FontLibrary::new(),
            interaction: Interaction::default(),
            geometry: None,
            options: BatchOptions::default(),
        }
    }

    pub fn template(&self) -> Option<&TemplateAsset> {
        self.template.as_ref()
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn fonts(&self) -> &FontLibrary {
        &self.fonts
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn geometry(&self) -> Option<&SurfaceGeometry> {
        self.geometry.as_ref()
    }

    // Template

    /// Load a template and re-center every field on it
    ///
    /// On failure nothing changes.
    pub fn upload_template(&mut self, upload: TemplateUpload) -> Result<&TemplateAsset> {
        let asset = TemplateAsset::ingest(upload)?;
        self.fields.recenter(asset.width(), asset.height());
        // The surface has to be measured again for the new page
        self.geometry = None;
        Ok(self.template.insert(asset))
    }

    /// Record where the template is drawn on screen
    pub fn set_surface(&mut self, origin: Point, rendered: Size) -> Result<()> {
        let template = self.require_template()?;
        let native = Size::new(template.width(), template.height());
        self.geometry = Some(SurfaceGeometry::new(origin, rendered, native)?);
        Ok(())
    }

    // Data

    /// Replace the dataset with parsed CSV text
    ///
    /// Fields without a column, or bound to a column the new data lacks,
    /// move to the first header. On failure the previous data stays.
    pub fn load_csv(&mut self, text: &str) -> Result<()> {
        let dataset = Dataset::from_csv(text)?;
        self.fields.bind_columns(dataset.headers());
        self.dataset = dataset;
        Ok(())
    }

    pub fn add_row(&mut self) -> usize {
        self.dataset.add_row()
    }

    pub fn remove_row(&mut self, index: usize) -> Result<()> {
        self.dataset.remove_row(index)
    }

    pub fn edit_cell(&mut self, index: usize, column: &str, value: &str) -> Result<()> {
        self.dataset.edit_cell(index, column, value)
    }

    pub fn filter_rows(&self, query: &str) -> Vec<&DataRow> {
        self.dataset.filter(query)
    }

    // Fonts

    /// Add font files; the first one is assigned to the active field
    pub fn upload_fonts(&mut self, files: Vec<(String, Vec<u8>)>) -> Result<Vec<String>> {
        let values = self.fonts.upload_all(files)?;
        if let Some(first) = values.first() {
            let active = self.fields.active_id();
            self.fields.update(active, FieldAttr::Font, first)?;
        }
        Ok(values)
    }

    // Fields

    /// Add a field at the page center bound to the first column
    pub fn add_field(&mut self) -> FieldId {
        let center = self
            .template
            .as_ref()
            .map(|t| Point::new(t.width() / 2.0, t.height() / 2.0))
            .unwrap_or(FALLBACK_CENTER);
        let column = self.dataset.headers().first().cloned();
        self.fields.add_field(center, column)
    }

    pub fn remove_field(&mut self, id: FieldId) -> Result<()> {
        Ok(self.fields.remove_field(id)?)
    }

    /// Set a field attribute by its preset key
    pub fn update_field(&mut self, id: FieldId, key: &str, raw: &str) -> Result<()> {
        let attr: FieldAttr = key.parse()?;
        Ok(self.fields.update(id, attr, raw)?)
    }

    pub fn set_active(&mut self, id: FieldId) -> Result<()> {
        Ok(self.fields.set_active(id)?)
    }

    pub fn import_preset(&mut self, json: &str) -> Result<()> {
        let fields = layout::import_preset(json)?;
        Ok(self.fields.replace_all(fields)?)
    }

    pub fn export_preset(&self) -> Result<String> {
        Ok(layout::export_preset(&self.fields)?)
    }

    // Pointer input

    /// Move the active field to a clicked point
    ///
    /// Returns false when a gesture is running, in which case the click is
    /// the tail of that gesture and is ignored.
    pub fn place_active_at(&mut self, pointer: Point) -> Result<bool> {
        if self.interaction.is_active() {
            return Ok(false);
        }
        let geometry = self.require_geometry()?;
        let target = geometry.to_document_rounded(pointer);
        self.fields.move_to(self.fields.active_id(), target)?;
        Ok(true)
    }

    /// Start a gesture on one of a field's handles
    pub fn pointer_down(&mut self, id: FieldId, mode: GestureMode, pointer: Point) -> Result<()> {
        let geometry = *self.require_geometry()?;
        let anchor = self
            .fields
            .get(id)
            .map(|f| f.position())
            .ok_or(layout::LayoutError::UnknownField(id))?;
        let pivot = geometry.to_screen(anchor);
        Ok(self
            .interaction
            .begin(&mut self.fields, id, mode, pointer, pivot)?)
    }

    /// Feed a pointer move to the running gesture
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        match &self.geometry {
            Some(geometry) => self.interaction.update(&mut self.fields, geometry, pointer),
            None => false,
        }
    }

    /// End the running gesture, wherever the pointer is
    pub fn pointer_up(&mut self) -> Option<FieldId> {
        self.interaction.end()
    }

    // Generation

    pub fn set_output(&mut self, output: OutputKind) {
        self.options.output = output;
    }

    pub fn set_identity_column(&mut self, column: Option<String>) {
        self.options.identity_column = column;
    }

    pub fn set_options(&mut self, options: BatchOptions) {
        self.options = options;
    }

    /// Run the batch into any sink with any document engine
    pub fn generate<E: DocumentEngine, S: crate::ArchiveSink + ?Sized>(
        &self,
        sink: &mut S,
        rasterizer: Option<&dyn PageRasterizer>,
    ) -> Result<BatchSummary> {
        let job = self.job(rasterizer)?;
        batch::generate_batch::<E, S>(&job, sink)
    }

    /// Run the batch and return the finished zip archive
    pub fn generate_zip(&self, rasterizer: Option<&dyn PageRasterizer>) -> Result<Vec<u8>> {
        let mut sink = ZipArchiveSink::new();
        self.generate::<PdfDocument, _>(&mut sink, rasterizer)?;
        sink.finish()
    }

    /// Render the first eligible row
    pub fn preview(&self, rasterizer: Option<&dyn PageRasterizer>) -> Result<Preview> {
        let job = self.job(rasterizer)?;
        batch::preview::<PdfDocument>(&job)
    }

    fn job<'a>(&'a self, rasterizer: Option<&'a dyn PageRasterizer>) -> Result<BatchJob<'a>> {
        Ok(BatchJob {
            template: self.require_template()?,
            fields: &self.fields,
            fonts: &self.fonts,
            dataset: &self.dataset,
            options: &self.options,
            rasterizer,
        })
    }

    fn require_template(&self) -> Result<&TemplateAsset> {
        self.template
            .as_ref()
            .ok_or_else(|| CertgenError::Validation("Upload a template first".into()))
    }

    fn require_geometry(&self) -> Result<&SurfaceGeometry> {
        self.geometry
            .as_ref()
            .ok_or_else(|| CertgenError::Validation("The template is not on screen".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn png_upload(width: u32, height: u32) -> TemplateUpload {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        TemplateUpload::new("bg.png", bytes).with_media_type("image/png")
    }

    #[test]
    fn test_upload_template_recenters() {
        let mut workspace = Workspace::new();
        workspace.add_field();
        workspace.upload_template(png_upload(400, 300)).unwrap();
        assert!(workspace
            .fields()
            .iter()
            .all(|f| f.position() == Point::new(200.0, 150.0)));
    }

    #[test]
    fn test_failed_upload_keeps_state() {
        let mut workspace = Workspace::new();
        workspace.upload_template(png_upload(400, 300)).unwrap();
        let id = workspace.fields().active_id();
        workspace.update_field(id, "x", "12").unwrap();

        let bad = TemplateUpload::new("bad.pdf", b"nope".to_vec()).with_media_type("application/pdf");
        assert!(workspace.upload_template(bad).is_err());
        assert_eq!(workspace.template().unwrap().size(), (400.0, 300.0));
        assert_eq!(workspace.fields().active().x, 12.0);
    }

    #[test]
    fn test_load_csv_binds_columns() {
        let mut workspace = Workspace::new();
        workspace.load_csv("Name,Course\nAlice,Rust\n").unwrap();
        assert_eq!(workspace.fields().first().column.as_deref(), Some("Name"));

        let id = workspace.add_field();
        assert_eq!(workspace.fields().get(id).unwrap().column.as_deref(), Some("Name"));
        workspace.update_field(id, "colName", "Course").unwrap();

        // A bad file keeps the previous data and bindings
        assert!(workspace.load_csv("").is_err());
        assert_eq!(workspace.dataset().len(), 1);
        assert_eq!(workspace.fields().get(id).unwrap().column.as_deref(), Some("Course"));
    }

    #[test]
    fn test_add_field_without_template_uses_fallback() {
        let mut workspace = Workspace::new();
        let id = workspace.add_field();
        assert_eq!(workspace.fields().get(id).unwrap().position(), FALLBACK_CENTER);
        assert_eq!(workspace.fields().active_id(), id);
    }

    #[test]
    fn test_remove_last_field_is_validation_error() {
        let mut workspace = Workspace::new();
        let id = workspace.fields().active_id();
        assert!(matches!(
            workspace.remove_field(id),
            Err(CertgenError::Validation(_))
        ));
    }

    #[test]
    fn test_click_placement_suppressed_during_gesture() {
        let mut workspace = Workspace::new();
        workspace.upload_template(png_upload(800, 600)).unwrap();
        workspace
            .set_surface(Point::new(0.0, 0.0), Size::new(400.0, 300.0))
            .unwrap();
        let id = workspace.fields().active_id();

        assert!(workspace.place_active_at(Point::new(100.0, 100.0)).unwrap());
        assert_eq!(workspace.fields().active().position(), Point::new(200.0, 400.0));

        workspace
            .pointer_down(id, GestureMode::Move, Point::new(100.0, 100.0))
            .unwrap();
        assert!(workspace.pointer_move(Point::new(110.0, 100.0)));
        assert!(!workspace.place_active_at(Point::new(0.0, 0.0)).unwrap());
        assert_eq!(workspace.pointer_up(), Some(id));
        assert_eq!(workspace.fields().active().position(), Point::new(220.0, 400.0));
    }

    #[test]
    fn test_non_finite_drag_keeps_layout_exportable() {
        let mut workspace = Workspace::new();
        workspace.upload_template(png_upload(800, 600)).unwrap();
        workspace
            .set_surface(Point::new(0.0, 0.0), Size::new(400.0, 300.0))
            .unwrap();
        let id = workspace.fields().active_id();
        let before = workspace.export_preset().unwrap();

        workspace
            .pointer_down(id, GestureMode::Move, Point::new(10.0, 10.0))
            .unwrap();
        assert!(!workspace.pointer_move(Point::new(f64::NAN, 10.0)));
        assert_eq!(workspace.pointer_up(), Some(id));

        assert_eq!(workspace.fields().active().position(), Point::new(400.0, 300.0));
        assert_eq!(workspace.export_preset().unwrap(), before);
        assert!(matches!(
            workspace.pointer_down(id, GestureMode::Move, Point::new(f64::INFINITY, 0.0)),
            Err(CertgenError::Layout(layout::LayoutError::InvalidPointer))
        ));
    }

    #[test]
    fn test_pointer_needs_surface() {
        let mut workspace = Workspace::new();
        let id = workspace.fields().active_id();
        assert!(workspace
            .pointer_down(id, GestureMode::Move, Point::default())
            .is_err());
        assert!(!workspace.pointer_move(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_generate_requires_template() {
        let mut workspace = Workspace::new();
        workspace.load_csv("Name\nAlice\n").unwrap();
        let err = workspace.generate_zip(None).unwrap_err();
        assert!(matches!(err, CertgenError::Validation(_)));
    }

    #[test]
    fn test_generate_requires_rows() {
        let mut workspace = Workspace::new();
        workspace.upload_template(png_upload(10, 10)).unwrap();
        workspace.load_csv("Name\n").unwrap();
        let err = workspace.generate_zip(None).unwrap_err();
        assert_eq!(err.to_string(), "The data file has no rows");
    }

    #[test]
    fn test_preset_roundtrip_through_workspace() {
        let mut workspace = Workspace::new();
        workspace.add_field();
        let json = workspace.export_preset().unwrap();

        let mut other = Workspace::new();
        other.import_preset(&json).unwrap();
        assert_eq!(other.fields().len(), 2);
        assert!(matches!(
            other.import_preset("[]"),
            Err(CertgenError::Preset(_))
        ));
        assert_eq!(other.fields().len(), 2);
    }
}
