//! # certgen CLI
//!
//! Batch certificate generation from the command line.
//!
//! ## Usage
//!
//! ```bash
//! # Every row of a CSV into certificates-batch.zip
//! certgen generate --template certificate.pdf --data people.csv --layout layout.json
//!
//! # The same job described in a file, rendered as JPEG images
//! certgen generate --job job.json --output jpg --pdfium-dir /opt/pdfium/lib
//!
//! # Look at the first certificate before running the batch
//! certgen preview --job job.json --out preview.pdf
//!
//! # Page size and columns
//! certgen inspect --template certificate.pdf --data https://example.com/people.csv
//!
//! # A starting layout centered on the template
//! certgen export-layout --template certificate.pdf --data people.csv > layout.json
//! ```

mod config;

use anyhow::{bail, Context as _};
use certgen::{
    OutputKind, PageRasterizer, PdfiumRasterizer, TemplateUpload, Workspace, ZipArchiveSink,
    ARCHIVE_NAME,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use config::{is_url, JobConfig};
use pdf_core::PdfDocument;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// certgen - Bulk certificate generator
#[derive(Parser, Debug)]
#[command(name = "certgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every row into a zip archive
    Generate(JobArgs),

    /// Render the first row that has a value in the identity column
    Preview(JobArgs),

    /// Show the template size and the data columns
    Inspect(JobArgs),

    /// Write a layout preset, normalized from --layout or a default one
    ExportLayout(JobArgs),
}

#[derive(Args, Debug, Default)]
struct JobArgs {
    /// Job file (JSON); flags override its values
    #[arg(long)]
    job: Option<PathBuf>,

    /// Template PDF or image
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// CSV file or http(s) URL
    #[arg(short, long)]
    data: Option<String>,

    /// Layout preset (JSON)
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// Font file referenced by the layout (repeatable)
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Output format: pdf, png or jpg
    #[arg(long, value_parser = parse_output)]
    output: Option<OutputKind>,

    /// Column that names output files (default: the first field's column)
    #[arg(long)]
    identity_column: Option<String>,

    /// Output file
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Directory containing the pdfium library (image output only)
    #[arg(long)]
    pdfium_dir: Option<PathBuf>,
}

impl JobArgs {
    /// Job file values overlaid with flags
    fn resolve(self) -> anyhow::Result<JobConfig> {
        let base = match &self.job {
            Some(path) => JobConfig::load(path)?,
            None => JobConfig::default(),
        };
        Ok(base.merge(JobConfig {
            template: self.template,
            data: self.data,
            layout: self.layout,
            fonts: self.fonts,
            output: self.output,
            identity_column: self.identity_column,
            out: self.out,
            pdfium_dir: self.pdfium_dir,
        }))
    }
}

fn parse_output(value: &str) -> Result<OutputKind, String> {
    value.parse().map_err(|e: certgen::CertgenError| e.to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Generate(args) => cmd_generate(args.resolve()?),
        Command::Preview(args) => cmd_preview(args.resolve()?),
        Command::Inspect(args) => cmd_inspect(args.resolve()?),
        Command::ExportLayout(args) => cmd_export_layout(args.resolve()?),
    }
}

fn cmd_generate(job: JobConfig) -> anyhow::Result<()> {
    let workspace = build_workspace(&job, true)?;
    let rasterizer = rasterizer_for(&job)?;
    let out = job.out.clone().unwrap_or_else(|| PathBuf::from(ARCHIVE_NAME));

    let started = Instant::now();
    let mut sink = ZipArchiveSink::new();
    let summary = workspace
        .generate::<PdfDocument, _>(&mut sink, rasterizer.as_ref().map(as_dyn))
        .context("Batch generation failed")?;
    let archive = sink.finish()?;
    log::info!("Batch finished in {:.2?}", started.elapsed());

    write_output(&out, &archive)?;
    println!(
        "Generated {} file(s), skipped {} row(s) -> {}",
        summary.files.len(),
        summary.skipped,
        out.display()
    );
    Ok(())
}

fn cmd_preview(job: JobConfig) -> anyhow::Result<()> {
    let workspace = build_workspace(&job, true)?;
    let rasterizer = rasterizer_for(&job)?;

    let preview = workspace
        .preview(rasterizer.as_ref().map(as_dyn))
        .context("Preview failed")?;
    let out = job
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&preview.file_name));

    write_output(&out, &preview.bytes)?;
    println!(
        "Row {} -> {} ({})",
        preview.row_index + 1,
        out.display(),
        preview.kind.media_type()
    );
    Ok(())
}

fn cmd_inspect(job: JobConfig) -> anyhow::Result<()> {
    if job.template.is_none() && job.data.is_none() {
        bail!("Nothing to inspect, pass --template and/or --data");
    }

    if let Some(path) = &job.template {
        let workspace = with_template(Workspace::new(), path)?;
        if let Some(template) = workspace.template() {
            println!(
                "Template: {} ({:?}, {} x {})",
                path.display(),
                template.kind(),
                template.width(),
                template.height()
            );
        }
    }

    if let Some(source) = &job.data {
        let mut workspace = Workspace::new();
        workspace
            .load_csv(&read_data(source)?)
            .with_context(|| format!("Failed to parse {source}"))?;
        let data = workspace.dataset();
        println!("Data: {source} ({} rows)", data.len());
        for header in data.headers() {
            println!("  - {header}");
        }
    }
    Ok(())
}

fn cmd_export_layout(job: JobConfig) -> anyhow::Result<()> {
    let workspace = build_workspace(&job, false)?;
    let json = workspace.export_preset()?;
    match &job.out {
        Some(path) => {
            write_output(path, json.as_bytes())?;
            println!("Wrote {} field(s) to {}", workspace.fields().len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Load everything a job names into a fresh workspace
///
/// Fonts go in before the layout so a preset's font choices are kept.
fn build_workspace(job: &JobConfig, require_inputs: bool) -> anyhow::Result<Workspace> {
    let mut workspace = Workspace::new();

    match &job.template {
        Some(path) => workspace = with_template(workspace, path)?,
        None if require_inputs => bail!("No template given, use --template or a job file"),
        None => {}
    }

    match &job.data {
        Some(source) => workspace
            .load_csv(&read_data(source)?)
            .with_context(|| format!("Failed to parse {source}"))?,
        None if require_inputs => bail!("No data given, use --data or a job file"),
        None => {}
    }

    if !job.fonts.is_empty() {
        let files = job
            .fonts
            .iter()
            .map(|path| Ok((file_name(path), read_file(path)?)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let values = workspace.upload_fonts(files)?;
        log::info!("Loaded fonts {values:?}");
    }

    if let Some(path) = &job.layout {
        let preset = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout {}", path.display()))?;
        workspace
            .import_preset(&preset)
            .with_context(|| format!("Failed to load layout {}", path.display()))?;
    }

    workspace.set_output(job.output());
    workspace.set_identity_column(job.identity_column.clone());
    Ok(workspace)
}

fn with_template(mut workspace: Workspace, path: &Path) -> anyhow::Result<Workspace> {
    let bytes = read_file(path)?;
    workspace
        .upload_template(TemplateUpload::new(file_name(path), bytes))
        .with_context(|| format!("Failed to load template {}", path.display()))?;
    Ok(workspace)
}

/// Bind pdfium when the job produces images
fn rasterizer_for(job: &JobConfig) -> anyhow::Result<Option<PdfiumRasterizer>> {
    if !job.output().is_image() {
        return Ok(None);
    }
    let rasterizer = PdfiumRasterizer::bind(job.pdfium_dir.as_deref())
        .context("Image output needs the pdfium library, see --pdfium-dir")?;
    Ok(Some(rasterizer))
}

fn as_dyn(rasterizer: &PdfiumRasterizer) -> &dyn PageRasterizer {
    rasterizer
}

fn read_data(source: &str) -> anyhow::Result<String> {
    if is_url(source) {
        log::info!("Fetching {source}");
        let response = reqwest::blocking::get(source)
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch {source}"))?;
        return response
            .text()
            .with_context(|| format!("Failed to read {source}"));
    }
    std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}
