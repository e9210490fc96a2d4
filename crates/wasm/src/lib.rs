//! WASM bindings for certgen
//!
//! This crate provides a JavaScript-friendly API for:
//! - Uploading a template, a CSV file and fonts
//! - Editing fields and driving pointer gestures on the preview surface
//! - Importing and exporting layout presets
//! - Generating the zip archive (the page decides how to download it)
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { CertWorkspace } from 'certgen-wasm';
//!
//! await init();
//!
//! const ws = new CertWorkspace();
//! ws.uploadTemplate(file.name, file.type, new Uint8Array(await file.arrayBuffer()));
//! ws.setSurface(rect.left, rect.top, rect.width, rect.height);
//! ws.loadCsv(csvText);
//!
//! canvas.onclick = (e) => ws.placeActiveAt(e.clientX, e.clientY);
//! handle.onpointerdown = (e) => ws.pointerDown(fieldId, 'move', e.clientX, e.clientY);
//! window.onpointermove = (e) => ws.pointerMove(e.clientX, e.clientY);
//! window.onpointerup = () => ws.pointerUp();
//!
//! const zip = ws.generate(); // Uint8Array
//! ```

use certgen::{CertgenError, OutputKind, PageRasterizer, TemplateUpload, Workspace};
use image::RgbaImage;
use layout::{FieldId, GestureMode, Point, PresetField, Size};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Initialize panic hook and logging for the browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if log::set_logger(&CONSOLE_LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

/// Forwards `log` records to the browser console
struct ConsoleLogger;

static CONSOLE_LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&message),
            log::Level::Warn => web_sys::console::warn_1(&message),
            _ => web_sys::console::log_1(&message),
        }
    }

    fn flush(&self) {}
}

fn js_error(err: CertgenError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

/// Rasterizer backed by a synchronous JavaScript callback
///
/// The callback receives `(pdfBytes: Uint8Array, scale: number)` and returns
/// `{ width, height, data }` where `data` holds RGBA pixels, e.g. an
/// `ImageData` from a canvas.
struct JsRasterizer {
    callback: js_sys::Function,
}

impl PageRasterizer for JsRasterizer {
    fn rasterize(&self, pdf: &[u8], scale: f32) -> certgen::Result<RgbaImage> {
        let raster_err = |what: &str| CertgenError::Raster(format!("rasterize callback: {what}"));

        let result = self
            .callback
            .call2(
                &JsValue::NULL,
                &js_sys::Uint8Array::from(pdf).into(),
                &JsValue::from_f64(scale as f64),
            )
            .map_err(|e| raster_err(&e.as_string().unwrap_or_else(|| "threw".into())))?;

        let number = |key: &str| {
            js_sys::Reflect::get(&result, &JsValue::from_str(key))
                .ok()
                .and_then(|v| v.as_f64())
                .ok_or_else(|| raster_err(&format!("missing {key}")))
        };
        let width = number("width")? as u32;
        let height = number("height")? as u32;
        let data = js_sys::Reflect::get(&result, &JsValue::from_str("data"))
            .map_err(|_| raster_err("missing data"))?;
        let pixels = js_sys::Uint8Array::new(&data).to_vec();

        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| raster_err(&format!("data does not match {width} x {height}")))
    }
}

/// A field as shown in the editor
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldView {
    id: u32,
    active: bool,
    label: String,
    col_name: String,
    x: f64,
    y: f64,
    size: f64,
    font_value: String,
    color: String,
    scale_x: f64,
    scale_y: f64,
    rotate: f64,
    lock_ratio: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateView {
    kind: &'static str,
    width: f64,
    height: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RowView {
    index: usize,
    values: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FontView {
    label: String,
    value: String,
    custom: bool,
}

/// Editing session exposed to the page
#[wasm_bindgen]
pub struct CertWorkspace {
    inner: Workspace,
}

#[wasm_bindgen]
impl CertWorkspace {
    /// Create an empty session
    #[wasm_bindgen(constructor)]
    pub fn new() -> CertWorkspace {
        CertWorkspace {
            inner: Workspace::new(),
        }
    }

    /// Name to give the downloaded archive
    #[wasm_bindgen(js_name = archiveName)]
    pub fn archive_name() -> String {
        certgen::ARCHIVE_NAME.to_string()
    }

    /// Load a template PDF or image
    ///
    /// @param fileName - Original file name
    /// @param mediaType - `File.type`, may be empty
    /// @param data - File bytes (Uint8Array)
    /// @returns `{ kind, width, height }`
    #[wasm_bindgen(js_name = uploadTemplate)]
    pub fn upload_template(
        &mut self,
        file_name: &str,
        media_type: &str,
        data: &[u8],
    ) -> Result<JsValue, JsValue> {
        let mut upload = TemplateUpload::new(file_name, data.to_vec());
        if !media_type.is_empty() {
            upload = upload.with_media_type(media_type);
        }
        let template = self.inner.upload_template(upload).map_err(js_error)?;
        to_js(&TemplateView {
            kind: match template.kind() {
                certgen::TemplateKind::Vector => "vector",
                certgen::TemplateKind::Raster => "raster",
            },
            width: template.width(),
            height: template.height(),
        })
    }

    /// Report where the template is drawn, in viewport pixels
    #[wasm_bindgen(js_name = setSurface)]
    pub fn set_surface(&mut self, left: f64, top: f64, width: f64, height: f64) -> Result<(), JsValue> {
        self.inner
            .set_surface(Point::new(left, top), Size::new(width, height))
            .map_err(js_error)
    }

    /// Parse CSV text, returning its headers
    #[wasm_bindgen(js_name = loadCsv)]
    pub fn load_csv(&mut self, text: &str) -> Result<Vec<String>, JsValue> {
        self.inner.load_csv(text).map_err(js_error)?;
        Ok(self.inner.dataset().headers().to_vec())
    }

    /// Rows matching `query` (all rows when empty) as `{ index, values }`
    pub fn rows(&self, query: &str) -> Result<JsValue, JsValue> {
        let headers = self.inner.dataset().headers();
        let rows: Vec<RowView> = self
            .inner
            .filter_rows(query)
            .into_iter()
            .map(|row| RowView {
                index: row.index(),
                values: headers
                    .iter()
                    .map(|h| row.get(h).unwrap_or_default().to_string())
                    .collect(),
            })
            .collect();
        to_js(&rows)
    }

    #[wasm_bindgen(js_name = addRow)]
    pub fn add_row(&mut self) -> usize {
        self.inner.add_row()
    }

    #[wasm_bindgen(js_name = removeRow)]
    pub fn remove_row(&mut self, index: usize) -> Result<(), JsValue> {
        self.inner.remove_row(index).map_err(js_error)
    }

    #[wasm_bindgen(js_name = editCell)]
    pub fn edit_cell(&mut self, index: usize, column: &str, value: &str) -> Result<(), JsValue> {
        self.inner.edit_cell(index, column, value).map_err(js_error)
    }

    /// Add a font file; it becomes the active field's font
    ///
    /// @returns The font value fields refer to
    #[wasm_bindgen(js_name = uploadFont)]
    pub fn upload_font(&mut self, file_name: &str, data: &[u8]) -> Result<String, JsValue> {
        let mut values = self
            .inner
            .upload_fonts(vec![(file_name.to_string(), data.to_vec())])
            .map_err(js_error)?;
        values
            .pop()
            .ok_or_else(|| JsValue::from_str("No font was added"))
    }

    /// Font picker entries as `{ label, value, custom }`
    #[wasm_bindgen(js_name = fontOptions)]
    pub fn font_options(&self) -> Result<JsValue, JsValue> {
        let options: Vec<FontView> = self
            .inner
            .fonts()
            .options()
            .into_iter()
            .map(|o| FontView {
                label: o.label,
                value: o.value,
                custom: o.custom,
            })
            .collect();
        to_js(&options)
    }

    /// All fields in order
    pub fn fields(&self) -> Result<JsValue, JsValue> {
        let fields = self.inner.fields();
        let views: Vec<FieldView> = fields
            .iter()
            .map(|field| {
                let preset = PresetField::from(field);
                FieldView {
                    id: field.id.0,
                    active: field.id == fields.active_id(),
                    label: field.placeholder_label(),
                    col_name: preset.col_name,
                    x: preset.x,
                    y: preset.y,
                    size: preset.size,
                    font_value: preset.font_value,
                    color: preset.color,
                    scale_x: preset.scale_x,
                    scale_y: preset.scale_y,
                    rotate: preset.rotate,
                    lock_ratio: preset.lock_ratio,
                }
            })
            .collect();
        to_js(&views)
    }

    #[wasm_bindgen(js_name = addField)]
    pub fn add_field(&mut self) -> u32 {
        self.inner.add_field().0
    }

    #[wasm_bindgen(js_name = removeField)]
    pub fn remove_field(&mut self, id: u32) -> Result<(), JsValue> {
        self.inner.remove_field(FieldId(id)).map_err(js_error)
    }

    /// Set an attribute by its preset key (`x`, `size`, `fontValue`, ...)
    #[wasm_bindgen(js_name = updateField)]
    pub fn update_field(&mut self, id: u32, key: &str, value: &str) -> Result<(), JsValue> {
        self.inner
            .update_field(FieldId(id), key, value)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setActive)]
    pub fn set_active(&mut self, id: u32) -> Result<(), JsValue> {
        self.inner.set_active(FieldId(id)).map_err(js_error)
    }

    /// Canvas click; returns false when ignored because a drag is running
    #[wasm_bindgen(js_name = placeActiveAt)]
    pub fn place_active_at(&mut self, x: f64, y: f64) -> Result<bool, JsValue> {
        self.inner
            .place_active_at(Point::new(x, y))
            .map_err(js_error)
    }

    /// Start a gesture; `mode` is `move`, `resize` or `rotate`
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, id: u32, mode: &str, x: f64, y: f64) -> Result<(), JsValue> {
        let mode = match mode {
            "move" => GestureMode::Move,
            "resize" => GestureMode::Resize,
            "rotate" => GestureMode::Rotate,
            other => return Err(JsValue::from_str(&format!("Unknown gesture {other:?}"))),
        };
        self.inner
            .pointer_down(FieldId(id), mode, Point::new(x, y))
            .map_err(js_error)
    }

    /// @returns Whether a field changed
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.inner.pointer_move(Point::new(x, y))
    }

    /// @returns The id of the field the gesture ended on, if any
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) -> Option<u32> {
        self.inner.pointer_up().map(|id| id.0)
    }

    #[wasm_bindgen(js_name = importPreset)]
    pub fn import_preset(&mut self, json: &str) -> Result<(), JsValue> {
        self.inner.import_preset(json).map_err(js_error)
    }

    #[wasm_bindgen(js_name = exportPreset)]
    pub fn export_preset(&self) -> Result<String, JsValue> {
        self.inner.export_preset().map_err(js_error)
    }

    /// `pdf`, `png` or `jpg`
    #[wasm_bindgen(js_name = setOutput)]
    pub fn set_output(&mut self, kind: &str) -> Result<(), JsValue> {
        let kind: OutputKind = kind.parse().map_err(js_error)?;
        self.inner.set_output(kind);
        Ok(())
    }

    #[wasm_bindgen(js_name = setIdentityColumn)]
    pub fn set_identity_column(&mut self, column: Option<String>) {
        self.inner
            .set_identity_column(column.filter(|c| !c.is_empty()));
    }

    /// Render every row into a zip archive
    ///
    /// @param rasterize - Page rasterizer callback, required for image output
    /// @returns Zip bytes (Uint8Array)
    pub fn generate(&self, rasterize: Option<js_sys::Function>) -> Result<Vec<u8>, JsValue> {
        let rasterizer = rasterize.map(|callback| JsRasterizer { callback });
        self.inner
            .generate_zip(rasterizer.as_ref().map(|r| r as &dyn PageRasterizer))
            .map_err(js_error)
    }

    /// Render the first row with a value in the identity column
    ///
    /// @returns `{ rowIndex, fileName, mediaType, bytes }`
    pub fn preview(&self, rasterize: Option<js_sys::Function>) -> Result<JsValue, JsValue> {
        let rasterizer = rasterize.map(|callback| JsRasterizer { callback });
        let preview = self
            .inner
            .preview(rasterizer.as_ref().map(|r| r as &dyn PageRasterizer))
            .map_err(js_error)?;

        let result = js_sys::Object::new();
        let set = |key: &str, value: JsValue| {
            js_sys::Reflect::set(&result, &JsValue::from_str(key), &value).map(|_| ())
        };
        set("rowIndex", JsValue::from_f64(preview.row_index as f64))?;
        set("fileName", JsValue::from_str(&preview.file_name))?;
        set("mediaType", JsValue::from_str(preview.kind.media_type()))?;
        set(
            "bytes",
            js_sys::Uint8Array::from(preview.bytes.as_slice()).into(),
        )?;
        Ok(result.into())
    }
}

impl Default for CertWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
