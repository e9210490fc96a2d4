//! Batch orchestration
//!
//! Rows are rendered one at a time in original order. The identity column
//! decides both whether a row takes part (a blank value skips it) and what
//! its file is called.

use crate::archive::ArchiveSink;
use crate::raster::{encode_image, OutputKind, PageRasterizer};
use crate::{CertgenError, DataRow, Dataset, FontLibrary, Renderer, Result, TemplateAsset};
use layout::FieldSet;
use pdf_core::DocumentEngine;
use serde::{Deserialize, Serialize};

/// File name of the downloaded archive
pub const ARCHIVE_NAME: &str = "certificates-batch.zip";

/// Settings for one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BatchOptions {
    pub output: OutputKind,
    /// Column that names output files; the first field's column when unset
    pub identity_column: Option<String>,
    /// Pixels per point when rasterizing
    pub raster_scale: f32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output: OutputKind::Pdf,
            identity_column: None,
            raster_scale: 2.0,
        }
    }
}

/// Everything a batch run reads
pub struct BatchJob<'a> {
    pub template: &'a TemplateAsset,
    pub fields: &'a FieldSet,
    pub fonts: &'a FontLibrary,
    pub dataset: &'a Dataset,
    pub options: &'a BatchOptions,
    /// Required for image output kinds
    pub rasterizer: Option<&'a dyn PageRasterizer>,
}

/// Outcome of a completed batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Archive entry names in the order they were written
    pub files: Vec<String>,
    /// Rows left out because their identity value was blank
    pub skipped: usize,
}

/// A single rendered row, for showing instead of archiving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub row_index: usize,
    pub file_name: String,
    pub kind: OutputKind,
    pub bytes: Vec<u8>,
}

/// Replace everything outside `[A-Za-z0-9]` with `_`
pub fn sanitize_file_stem(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

impl<'a> BatchJob<'a> {
    /// The column that names output files
    pub fn identity_column(&self) -> Result<&'a str> {
        self.options
            .identity_column
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.fields.first().column.as_deref())
            .ok_or_else(|| {
                CertgenError::Validation(
                    "Choose the column that names each output file".into(),
                )
            })
    }

    /// Check the job can run at all
    pub fn validate(&self) -> Result<&'a str> {
        if self.dataset.is_empty() {
            return Err(CertgenError::Validation(
                "The data file has no rows".into(),
            ));
        }
        if self.options.output.is_image() && self.rasterizer.is_none() {
            return Err(CertgenError::Validation(format!(
                "{} output needs a page rasterizer",
                self.options.output.extension().to_uppercase()
            )));
        }
        self.identity_column()
    }

    fn renderer(&self) -> Renderer<'a> {
        Renderer::new(self.template, self.fields.fields(), self.fonts)
    }

    /// Render one row in the requested output kind
    pub fn render_row<E: DocumentEngine>(&self, row: &DataRow) -> Result<Vec<u8>> {
        let pdf = self.renderer().render::<E>(row)?;
        if !self.options.output.is_image() {
            return Ok(pdf);
        }
        let rasterizer = self.rasterizer.ok_or_else(|| {
            CertgenError::Validation("Image output needs a page rasterizer".into())
        })?;
        let page = rasterizer.rasterize(&pdf, self.options.raster_scale)?;
        encode_image(page, self.options.output)
    }

    fn file_name(&self, identity: &str) -> String {
        format!(
            "{}.{}",
            sanitize_file_stem(identity),
            self.options.output.extension()
        )
    }
}

/// Render every eligible row into `sink`
///
/// The first failing row aborts the run; the caller drops the partial
/// archive.
pub fn generate_batch<E: DocumentEngine, S: ArchiveSink + ?Sized>(
    job: &BatchJob<'_>,
    sink: &mut S,
) -> Result<BatchSummary> {
    let identity = job.validate()?;
    let mut summary = BatchSummary::default();

    for row in job.dataset.rows() {
        let Some(value) = row.value(identity) else {
            log::debug!("Skipping row {}: no {identity:?}", row.index());
            summary.skipped += 1;
            continue;
        };

        let bytes = job
            .render_row::<E>(row)
            .map_err(|e| CertgenError::Render {
                row: row.index() + 1,
                message: e.to_string(),
            })?;
        let name = sink.add(&job.file_name(value), &bytes)?;
        log::debug!("Row {} -> {name} ({} bytes)", row.index(), bytes.len());
        summary.files.push(name);
    }

    if summary.skipped > 0 {
        log::warn!(
            "Skipped {} row(s) with an empty {identity:?} value",
            summary.skipped
        );
    }
    log::info!(
        "Generated {} {} file(s)",
        summary.files.len(),
        job.options.output
    );
    Ok(summary)
}

/// Render the first eligible row
pub fn preview<E: DocumentEngine>(job: &BatchJob<'_>) -> Result<Preview> {
    let identity = job.validate()?;
    let (row, value) = job
        .dataset
        .rows()
        .iter()
        .find_map(|row| row.value(identity).map(|value| (row, value)))
        .ok_or_else(|| {
            CertgenError::Validation(format!("No row has a value in column {identity:?}"))
        })?;

    let bytes = job
        .render_row::<E>(row)
        .map_err(|e| CertgenError::Render {
            row: row.index() + 1,
            message: e.to_string(),
        })?;
    Ok(Preview {
        row_index: row.index(),
        file_name: job.file_name(value),
        kind: job.options.output,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Alice"), "Alice");
        assert_eq!(sanitize_file_stem("Jane Doe-Smith"), "Jane_Doe_Smith");
        assert_eq!(sanitize_file_stem("Zoë/../x"), "Zo_____x");
        assert_eq!(sanitize_file_stem(""), "");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for input in ["Dr. José Müller", "a/b\\c", "名前", "   ", "ok_123"] {
            let once = sanitize_file_stem(input);
            assert_eq!(sanitize_file_stem(&once), once);
            assert!(once.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }

    #[test]
    fn test_default_options() {
        let options = BatchOptions::default();
        assert_eq!(options.output, OutputKind::Pdf);
        assert_eq!(options.raster_scale, 2.0);
        let parsed: BatchOptions = serde_json::from_str(r#"{"output":"jpg"}"#).unwrap();
        assert_eq!(parsed.output, OutputKind::Jpg);
        assert_eq!(parsed.identity_column, None);
    }
}
