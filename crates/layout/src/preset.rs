//! Layout presets
//!
//! A preset is a JSON array with one object per field:
//!
//! ```json
//! [{ "colName": "Name", "x": 421, "y": 300, "size": 40,
//!    "fontValue": "Helvetica-Bold", "color": "#000000",
//!    "scaleX": 1, "scaleY": 1, "rotate": 0, "lockRatio": true }]
//! ```
//!
//! Presets written by older tools omit the last four keys and sometimes store
//! numbers as strings, so import reads each key leniently and fills in
//! defaults. Export always writes every key.

use crate::{
    field::normalize_degrees, FieldId, FieldSet, FontRef, LayoutError, Point, Result, TextField,
    DEFAULT_COLOR, DEFAULT_SIZE, MIN_SCALE,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Anchor used when a preset entry has no position
const DEFAULT_POSITION: f64 = 100.0;

/// One field as stored in a preset file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetField {
    pub col_name: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub font_value: String,
    pub color: String,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotate: f64,
    pub lock_ratio: bool,
}

impl From<&TextField> for PresetField {
    fn from(field: &TextField) -> Self {
        Self {
            col_name: field.column.clone().unwrap_or_default(),
            x: field.x,
            y: field.y,
            size: field.size,
            font_value: field.font.value().to_string(),
            color: field.color.clone(),
            scale_x: field.scale_x,
            scale_y: field.scale_y,
            rotate: field.rotate,
            lock_ratio: field.lock_ratio,
        }
    }
}

impl PresetField {
    /// Read one preset entry, defaulting missing or unusable values
    pub fn from_json(entry: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            entry
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let number = |key: &str| entry.get(key).and_then(lenient_number);

        Self {
            col_name: text("colName").unwrap_or_default(),
            x: number("x").unwrap_or(DEFAULT_POSITION),
            y: number("y").unwrap_or(DEFAULT_POSITION),
            size: number("size").filter(|v| *v > 0.0).unwrap_or(DEFAULT_SIZE),
            font_value: text("fontValue")
                .unwrap_or_else(|| FontRef::default().value().to_string()),
            color: text("color").unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            scale_x: number("scaleX").map_or(1.0, |v| v.max(MIN_SCALE)),
            scale_y: number("scaleY").map_or(1.0, |v| v.max(MIN_SCALE)),
            rotate: number("rotate").map_or(0.0, normalize_degrees),
            lock_ratio: entry
                .get("lockRatio")
                .and_then(lenient_bool)
                .unwrap_or(true),
        }
    }

    /// Build a field; ids are reassigned when the preset is applied
    pub fn into_field(self, id: FieldId) -> TextField {
        let mut field = TextField::new(id, Point::new(self.x, self.y), None);
        field.column = Some(self.col_name).filter(|c| !c.trim().is_empty());
        field.size = self.size;
        field.font = FontRef::parse(&self.font_value);
        field.color = self.color;
        field.scale_x = self.scale_x;
        field.scale_y = self.scale_y;
        field.rotate = self.rotate;
        field.lock_ratio = self.lock_ratio;
        field
    }
}

fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Serialize a layout as a pretty-printed preset
pub fn export_preset(fields: &FieldSet) -> Result<String> {
    let entries: Vec<PresetField> = fields.iter().map(PresetField::from).collect();
    serde_json::to_string_pretty(&entries).map_err(|e| LayoutError::Preset(e.to_string()))
}

/// Parse a preset into fields
///
/// Fails on malformed JSON, a non-array document, a non-object entry or an
/// empty list.
pub fn import_preset(json: &str) -> Result<Vec<TextField>> {
    let document: Value =
        serde_json::from_str(json).map_err(|e| LayoutError::Preset(e.to_string()))?;
    let Value::Array(entries) = document else {
        return Err(LayoutError::Preset("expected an array of fields".into()));
    };
    if entries.is_empty() {
        return Err(LayoutError::Preset("preset contains no fields".into()));
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let object = entry.as_object().ok_or_else(|| {
                LayoutError::Preset(format!("entry {} is not an object", index + 1))
            })?;
            let id = FieldId(index as u32 + 1);
            Ok(PresetField::from_json(object).into_field(id))
        })
        .collect()
}
