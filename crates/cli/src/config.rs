use anyhow::Context as _;
use certgen::OutputKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Job file format
///
/// Every key is optional; command-line flags fill in or override them.
/// Relative paths are relative to the job file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobConfig {
    /// Template PDF or image
    pub template: Option<PathBuf>,
    /// CSV file path or http(s) URL
    pub data: Option<String>,
    /// Layout preset
    pub layout: Option<PathBuf>,
    /// TrueType/OpenType files the layout refers to by file name
    pub fonts: Vec<PathBuf>,
    pub output: Option<OutputKind>,
    /// Column that names output files
    pub identity_column: Option<String>,
    /// Where to write the archive or preview
    pub out: Option<PathBuf>,
    /// Directory holding the pdfium library, for image output
    pub pdfium_dir: Option<PathBuf>,
}

impl JobConfig {
    /// Read a job file and anchor its relative paths at the file's directory
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file {}", path.display()))?;
        let mut config: JobConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid job file {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }
        Ok(config)
    }

    pub fn resolve_relative(&mut self, base: &Path) {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.template.iter_mut().for_each(anchor);
        self.layout.iter_mut().for_each(anchor);
        self.fonts.iter_mut().for_each(anchor);
        self.out.iter_mut().for_each(anchor);
        self.pdfium_dir.iter_mut().for_each(anchor);
        if let Some(data) = &mut self.data {
            if !is_url(data) && Path::new(data.as_str()).is_relative() {
                *data = base.join(data.as_str()).to_string_lossy().into_owned();
            }
        }
    }

    /// Layer `overrides` on top; set values and non-empty lists win
    pub fn merge(self, overrides: JobConfig) -> JobConfig {
        JobConfig {
            template: overrides.template.or(self.template),
            data: overrides.data.or(self.data),
            layout: overrides.layout.or(self.layout),
            fonts: if overrides.fonts.is_empty() {
                self.fonts
            } else {
                overrides.fonts
            },
            output: overrides.output.or(self.output),
            identity_column: overrides.identity_column.or(self.identity_column),
            out: overrides.out.or(self.out),
            pdfium_dir: overrides.pdfium_dir.or(self.pdfium_dir),
        }
    }

    pub fn output(&self) -> OutputKind {
        self.output.unwrap_or_default()
    }
}

pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
