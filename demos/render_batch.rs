//! Batch Renderer
//!
//! Renders one certificate per CSV row from a template and an optional
//! layout preset, and writes the zip archive.
//!
//! Usage:
//!   cargo run -p certgen --example render_batch -- <template.pdf|png|jpg> <data.csv> [layout.json] [output.zip]
//!
//! Examples:
//!   cargo run -p certgen --example render_batch -- assets/certificate.pdf input/participants.csv
//!   cargo run -p certgen --example render_batch -- assets/background.png input/participants.csv assets/layout.json output/batch.zip

use certgen::{TemplateUpload, Workspace, ARCHIVE_NAME};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <template.pdf|png|jpg> <data.csv> [layout.json] [output.zip]",
            args[0]
        );
        std::process::exit(1);
    }

    let template_path = &args[1];
    let data_path = &args[2];
    let layout_path = args.get(3);
    let output_path = args
        .get(4)
        .cloned()
        .unwrap_or_else(|| format!("output/{ARCHIVE_NAME}"));

    if let Some(parent) = Path::new(&output_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let template_bytes = std::fs::read(template_path)
        .map_err(|e| format!("Failed to read template '{}': {}", template_path, e))?;
    let file_name = Path::new(template_path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("template");

    let mut workspace = Workspace::new();
    workspace.upload_template(TemplateUpload::new(file_name, template_bytes))?;

    let csv = std::fs::read_to_string(data_path)
        .map_err(|e| format!("Failed to read data '{}': {}", data_path, e))?;
    workspace.load_csv(&csv)?;

    if let Some(layout_path) = layout_path {
        let preset = std::fs::read_to_string(layout_path)
            .map_err(|e| format!("Failed to read layout '{}': {}", layout_path, e))?;
        workspace.import_preset(&preset)?;
    }

    println!(
        "Rendering {} rows with {} field(s)",
        workspace.dataset().len(),
        workspace.fields().len()
    );

    let archive = workspace.generate_zip(None)?;
    std::fs::write(&output_path, &archive)?;
    println!("Wrote {} ({} bytes)", output_path, archive.len());

    Ok(())
}
