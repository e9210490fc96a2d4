//! Layout - Field model and pointer interaction for certificate templates
//!
//! This crate provides:
//! - Conversion between screen pixels and document points
//! - The text field model and the set of fields placed on a template
//! - The move / resize / rotate gesture state machine
//! - Layout presets (JSON import and export)
//!
//! Nothing in here touches files, documents or the network; every operation
//! is a pure state transition that the certgen workspace drives.
//!
//! # Example
//!
//! ```ignore
//! use layout::{FieldAttr, FieldSet, Point};
//!
//! let mut fields = FieldSet::new(Point::new(421.0, 297.5));
//! let id = fields.active_id();
//! fields.update(id, FieldAttr::Column, "Name")?;
//! fields.update(id, FieldAttr::Size, "36")?;
//! let json = layout::export_preset(&fields)?;
//! ```

pub mod field;
pub mod geometry;
pub mod interaction;
pub mod preset;

pub use field::{
    normalize_degrees, FieldAttr, FieldId, FieldSet, FontRef, Rgb, TextField, DEFAULT_COLOR,
    DEFAULT_FONT, DEFAULT_SIZE, MIN_SCALE,
};
pub use geometry::{Point, Size, SurfaceGeometry};
pub use interaction::{GestureMode, Interaction, InteractionSession, RESIZE_SENSITIVITY};
pub use preset::{export_preset, import_preset, PresetField};

use thiserror::Error;

/// Errors that can occur while editing a layout
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("At least one field must remain")]
    LastField,

    #[error("Unknown field: {0}")]
    UnknownField(FieldId),

    #[error("Unknown field attribute: {0}")]
    UnknownAttribute(String),

    #[error("Invalid value {value:?} for {attr}")]
    InvalidValue { attr: FieldAttr, value: String },

    #[error("A gesture is already in progress on field {0}")]
    GestureInProgress(FieldId),

    #[error("Pointer position is not a finite number")]
    InvalidPointer,

    #[error("Surface has no area: {0} x {1}")]
    DegenerateSurface(f64, f64),

    #[error("Invalid layout preset: {0}")]
    Preset(String),
}

/// Result type for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;
