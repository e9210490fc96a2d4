//! Text fields and the set of fields placed on a template

use crate::{LayoutError, Point, Result};
use pdf_core::StandardFont;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Font size of a newly added field
pub const DEFAULT_SIZE: f64 = 40.0;

/// Fill color of a newly added field
pub const DEFAULT_COLOR: &str = "#000000";

/// Font of a newly added field, and the fallback for unknown uploads
pub const DEFAULT_FONT: StandardFont = StandardFont::HelveticaBold;

/// Smallest allowed scale factor on either axis
pub const MIN_SCALE: f64 = 0.1;

/// Stable identifier of a field within a [`FieldSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub u32);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The font a field is drawn with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FontRef {
    Standard(StandardFont),
    /// Value of an uploaded font (its file name)
    Custom(String),
}

impl FontRef {
    /// Parse a font value as stored in presets and field updates
    ///
    /// Standard font names are recognized both in PostScript form
    /// (`Helvetica-Bold`) and in the compact form older presets carry
    /// (`HelveticaBold`). Anything else refers to an uploaded font; an empty
    /// value means the default font.
    pub fn parse(value: &str) -> Self {
        if value.is_empty() {
            return Self::default();
        }
        if let Some(font) = StandardFont::from_name(value) {
            return FontRef::Standard(font);
        }
        let alias = match value {
            "HelveticaBold" => Some(StandardFont::HelveticaBold),
            "TimesRoman" => Some(StandardFont::TimesRoman),
            "TimesRomanBold" | "TimesBold" => Some(StandardFont::TimesBold),
            _ => None,
        };
        match alias {
            Some(font) => FontRef::Standard(font),
            None => FontRef::Custom(value.to_string()),
        }
    }

    /// The value written back to presets
    pub fn value(&self) -> &str {
        match self {
            FontRef::Standard(font) => font.name(),
            FontRef::Custom(value) => value,
        }
    }
}

impl Default for FontRef {
    fn default() -> Self {
        FontRef::Standard(DEFAULT_FONT)
    }
}

impl fmt::Display for FontRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// An 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Parse `#rrggbb` or `rrggbb`, case-insensitive
    pub fn parse_hex(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#').unwrap_or(value);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Parse a hex color, falling back to black
    pub fn from_hex_or_black(value: &str) -> Self {
        Self::parse_hex(value).unwrap_or(Self::BLACK)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Wrap an angle in degrees into `[0, 360)`
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        // Folds negative zero
        wrapped + 0.0
    }
}

/// Attributes addressable by [`FieldSet::update`]
///
/// The string forms are the keys used in layout presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldAttr {
    Column,
    X,
    Y,
    Size,
    Font,
    Color,
    ScaleX,
    ScaleY,
    Rotate,
    LockRatio,
}

impl FieldAttr {
    pub const ALL: [FieldAttr; 10] = [
        FieldAttr::Column,
        FieldAttr::X,
        FieldAttr::Y,
        FieldAttr::Size,
        FieldAttr::Font,
        FieldAttr::Color,
        FieldAttr::ScaleX,
        FieldAttr::ScaleY,
        FieldAttr::Rotate,
        FieldAttr::LockRatio,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FieldAttr::Column => "colName",
            FieldAttr::X => "x",
            FieldAttr::Y => "y",
            FieldAttr::Size => "size",
            FieldAttr::Font => "fontValue",
            FieldAttr::Color => "color",
            FieldAttr::ScaleX => "scaleX",
            FieldAttr::ScaleY => "scaleY",
            FieldAttr::Rotate => "rotate",
            FieldAttr::LockRatio => "lockRatio",
        }
    }
}

impl FromStr for FieldAttr {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|attr| attr.key() == s)
            .ok_or_else(|| LayoutError::UnknownAttribute(s.to_string()))
    }
}

impl fmt::Display for FieldAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A text element bound to a dataset column
#[derive(Debug, Clone, PartialEq)]
pub struct TextField {
    pub id: FieldId,
    /// Source column; `None` until one is chosen
    pub column: Option<String>,
    /// Anchor in document space: horizontal center of the baseline
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub font: FontRef,
    /// Fill color as entered; see [`TextField::fill`]
    pub color: String,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Degrees clockwise on screen, in `[0, 360)`
    pub rotate: f64,
    pub lock_ratio: bool,
}

impl TextField {
    /// A field with default styling anchored at `position`
    pub fn new(id: FieldId, position: Point, column: Option<String>) -> Self {
        Self {
            id,
            column,
            x: position.x,
            y: position.y,
            size: DEFAULT_SIZE,
            font: FontRef::default(),
            color: DEFAULT_COLOR.to_string(),
            scale_x: 1.0,
            scale_y: 1.0,
            rotate: 0.0,
            lock_ratio: true,
        }
    }

    /// Resolved fill color; unparseable colors render black
    pub fn fill(&self) -> Rgb {
        Rgb::from_hex_or_black(&self.color)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Text shown in the editor when no data is bound
    pub fn placeholder_label(&self) -> String {
        match &self.column {
            Some(column) => format!("[ {column} ]"),
            None => "[ Empty text ]".to_string(),
        }
    }

    /// Set the horizontal scale, carrying it to the vertical axis when locked
    pub fn set_scale_x(&mut self, value: f64) {
        let value = value.max(MIN_SCALE);
        self.scale_x = value;
        if self.lock_ratio {
            self.scale_y = value;
        }
    }

    /// Set the vertical scale, carrying it to the horizontal axis when locked
    pub fn set_scale_y(&mut self, value: f64) {
        let value = value.max(MIN_SCALE);
        self.scale_y = value;
        if self.lock_ratio {
            self.scale_x = value;
        }
    }

    pub fn set_rotate(&mut self, degrees: f64) {
        self.rotate = normalize_degrees(degrees);
    }

    fn apply(&mut self, attr: FieldAttr, raw: &str) -> Result<()> {
        let invalid = || LayoutError::InvalidValue {
            attr,
            value: raw.to_string(),
        };
        let number = || -> Result<f64> {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(invalid)
        };

        match attr {
            FieldAttr::Column => {
                self.column = if raw.trim().is_empty() {
                    None
                } else {
                    Some(raw.to_string())
                };
            }
            FieldAttr::X => self.x = number()?,
            FieldAttr::Y => self.y = number()?,
            FieldAttr::Size => {
                let size = number()?;
                if size <= 0.0 {
                    return Err(invalid());
                }
                self.size = size;
            }
            FieldAttr::Font => {
                if raw.is_empty() {
                    return Err(invalid());
                }
                self.font = FontRef::parse(raw);
            }
            FieldAttr::Color => self.color = raw.to_string(),
            FieldAttr::ScaleX => self.set_scale_x(number()?),
            FieldAttr::ScaleY => self.set_scale_y(number()?),
            FieldAttr::Rotate => self.set_rotate(number()?),
            FieldAttr::LockRatio => {
                self.lock_ratio = match raw.trim() {
                    "true" | "1" | "on" => true,
                    "false" | "0" | "off" => false,
                    _ => return Err(invalid()),
                };
            }
        }
        Ok(())
    }
}

/// The ordered fields of a layout plus the active one
///
/// There is always at least one field and the active id always refers to
/// one of them.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    fields: Vec<TextField>,
    active: FieldId,
    next_id: u32,
}

impl FieldSet {
    /// A layout holding a single default field at `center`
    pub fn new(center: Point) -> Self {
        let first = TextField::new(FieldId(1), center, None);
        Self {
            active: first.id,
            fields: vec![first],
            next_id: 2,
        }
    }

    pub fn fields(&self) -> &[TextField] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, id: FieldId) -> Option<&TextField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: FieldId) -> Option<&mut TextField> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    /// The first field; its column names output files by default
    pub fn first(&self) -> &TextField {
        &self.fields[0]
    }

    pub fn active_id(&self) -> FieldId {
        self.active
    }

    pub fn active(&self) -> &TextField {
        self.get(self.active).unwrap_or(&self.fields[0])
    }

    pub fn set_active(&mut self, id: FieldId) -> Result<()> {
        if self.get(id).is_none() {
            return Err(LayoutError::UnknownField(id));
        }
        self.active = id;
        Ok(())
    }

    /// Append a default field at `center` and make it active
    pub fn add_field(&mut self, center: Point, column: Option<String>) -> FieldId {
        let id = self.allocate_id();
        self.fields.push(TextField::new(id, center, column));
        self.active = id;
        log::debug!("Added field {id}");
        id
    }

    /// Remove a field, keeping at least one
    pub fn remove_field(&mut self, id: FieldId) -> Result<()> {
        let index = self
            .fields
            .iter()
            .position(|f| f.id == id)
            .ok_or(LayoutError::UnknownField(id))?;
        if self.fields.len() == 1 {
            return Err(LayoutError::LastField);
        }
        self.fields.remove(index);
        if self.active == id {
            self.active = self.fields[0].id;
        }
        log::debug!("Removed field {id}");
        Ok(())
    }

    /// Set one attribute from its textual form
    ///
    /// Invalid input leaves the field unchanged.
    pub fn update(&mut self, id: FieldId, attr: FieldAttr, raw: &str) -> Result<()> {
        let field = self.get_mut(id).ok_or(LayoutError::UnknownField(id))?;
        field.apply(attr, raw)
    }

    /// Place a field at a document position
    pub fn move_to(&mut self, id: FieldId, position: Point) -> Result<()> {
        let field = self.get_mut(id).ok_or(LayoutError::UnknownField(id))?;
        if !(position.x.is_finite() && position.y.is_finite()) {
            return Err(LayoutError::InvalidValue {
                attr: FieldAttr::X,
                value: format!("{}, {}", position.x, position.y),
            });
        }
        field.x = position.x;
        field.y = position.y;
        Ok(())
    }

    /// Move every field to the center of a `width` x `height` page
    pub fn recenter(&mut self, width: f64, height: f64) {
        for field in &mut self.fields {
            field.x = width / 2.0;
            field.y = height / 2.0;
        }
    }

    /// Point fields at `first_header` when their column is unset or missing
    /// from `headers`
    pub fn bind_columns(&mut self, headers: &[String]) {
        let Some(first_header) = headers.first() else {
            return;
        };
        for field in &mut self.fields {
            let bound = field
                .column
                .as_ref()
                .is_some_and(|column| headers.contains(column));
            if !bound {
                field.column = Some(first_header.clone());
            }
        }
    }

    /// Replace the whole layout, renumbering ids; the first field becomes active
    pub fn replace_all(&mut self, mut fields: Vec<TextField>) -> Result<()> {
        if fields.is_empty() {
            return Err(LayoutError::Preset("preset contains no fields".into()));
        }
        for (index, field) in fields.iter_mut().enumerate() {
            field.id = FieldId(index as u32 + 1);
        }
        self.next_id = fields.len() as u32 + 1;
        self.fields = fields;
        self.active = self.fields[0].id;
        Ok(())
    }

    fn allocate_id(&mut self) -> FieldId {
        let id = FieldId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set() -> FieldSet {
        FieldSet::new(Point::new(421.0, 297.5))
    }

    #[test]
    fn test_new_field_defaults() {
        let fields = set();
        let field = fields.active();
        assert_eq!(field.id, FieldId(1));
        assert_eq!(field.column, None);
        assert_eq!(field.position(), Point::new(421.0, 297.5));
        assert_eq!(field.size, 40.0);
        assert_eq!(field.font, FontRef::Standard(StandardFont::HelveticaBold));
        assert_eq!(field.fill(), Rgb::BLACK);
        assert_eq!((field.scale_x, field.scale_y, field.rotate), (1.0, 1.0, 0.0));
        assert!(field.lock_ratio);
    }

    #[test]
    fn test_add_field_becomes_active() {
        let mut fields = set();
        let id = fields.add_field(Point::new(10.0, 20.0), Some("Name".into()));
        assert_eq!(id, FieldId(2));
        assert_eq!(fields.active_id(), id);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.active().column.as_deref(), Some("Name"));
    }

    #[test]
    fn test_remove_last_field_rejected() {
        let mut fields = set();
        let before = fields.clone();
        assert_eq!(fields.remove_field(FieldId(1)), Err(LayoutError::LastField));
        assert_eq!(fields, before);
    }

    #[test]
    fn test_remove_active_field_reassigns_first() {
        let mut fields = set();
        let second = fields.add_field(Point::default(), None);
        let third = fields.add_field(Point::default(), None);
        fields.set_active(second).unwrap();
        fields.remove_field(second).unwrap();
        assert_eq!(fields.active_id(), FieldId(1));

        fields.set_active(third).unwrap();
        fields.remove_field(FieldId(1)).unwrap();
        assert_eq!(fields.active_id(), third);
    }

    #[test]
    fn test_remove_unknown_field() {
        let mut fields = set();
        assert_eq!(
            fields.remove_field(FieldId(9)),
            Err(LayoutError::UnknownField(FieldId(9)))
        );
    }

    #[test]
    fn test_locked_scale_propagates() {
        let mut fields = set();
        let id = fields.active_id();
        fields.update(id, FieldAttr::ScaleX, "1.5").unwrap();
        let field = fields.get(id).unwrap();
        assert_eq!((field.scale_x, field.scale_y), (1.5, 1.5));

        fields.update(id, FieldAttr::ScaleY, "0.5").unwrap();
        let field = fields.get(id).unwrap();
        assert_eq!((field.scale_x, field.scale_y), (0.5, 0.5));
    }

    #[test]
    fn test_unlocked_scales_independent() {
        let mut fields = set();
        let id = fields.active_id();
        fields.update(id, FieldAttr::ScaleX, "1.5").unwrap();
        fields.update(id, FieldAttr::LockRatio, "false").unwrap();
        // Toggling the lock keeps existing values
        let field = fields.get(id).unwrap();
        assert_eq!((field.scale_x, field.scale_y), (1.5, 1.5));

        fields.update(id, FieldAttr::ScaleX, "2").unwrap();
        let field = fields.get(id).unwrap();
        assert_eq!((field.scale_x, field.scale_y), (2.0, 1.5));

        fields.update(id, FieldAttr::LockRatio, "true").unwrap();
        let field = fields.get(id).unwrap();
        assert_eq!((field.scale_x, field.scale_y), (2.0, 1.5));
    }

    #[test]
    fn test_scale_floor() {
        let mut fields = set();
        let id = fields.active_id();
        fields.update(id, FieldAttr::ScaleX, "-3").unwrap();
        assert_eq!(fields.get(id).unwrap().scale_x, MIN_SCALE);
    }

    #[test]
    fn test_invalid_numbers_fail_closed() {
        let mut fields = set();
        let id = fields.active_id();
        let before = fields.clone();

        for (attr, raw) in [
            (FieldAttr::X, "abc"),
            (FieldAttr::Y, ""),
            (FieldAttr::Size, "0"),
            (FieldAttr::Size, "-5"),
            (FieldAttr::ScaleX, "NaN"),
            (FieldAttr::Rotate, "inf"),
            (FieldAttr::LockRatio, "maybe"),
            (FieldAttr::Font, ""),
        ] {
            let err = fields.update(id, attr, raw).unwrap_err();
            assert_eq!(
                err,
                LayoutError::InvalidValue {
                    attr,
                    value: raw.to_string()
                }
            );
        }
        assert_eq!(fields, before);
    }

    #[test]
    fn test_update_coerces_numbers() {
        let mut fields = set();
        let id = fields.active_id();
        fields.update(id, FieldAttr::X, " 120 ").unwrap();
        fields.update(id, FieldAttr::Size, "36.5").unwrap();
        fields.update(id, FieldAttr::Rotate, "-90").unwrap();
        let field = fields.get(id).unwrap();
        assert_eq!(field.x, 120.0);
        assert_eq!(field.size, 36.5);
        assert_eq!(field.rotate, 270.0);
    }

    #[test]
    fn test_update_column_and_font() {
        let mut fields = set();
        let id = fields.active_id();
        fields.update(id, FieldAttr::Column, "Name").unwrap();
        fields.update(id, FieldAttr::Font, "Courier").unwrap();
        assert_eq!(fields.get(id).unwrap().column.as_deref(), Some("Name"));
        assert_eq!(
            fields.get(id).unwrap().font,
            FontRef::Standard(StandardFont::Courier)
        );

        fields.update(id, FieldAttr::Column, "").unwrap();
        assert_eq!(fields.get(id).unwrap().column, None);
    }

    #[test]
    fn test_update_unknown_field() {
        let mut fields = set();
        assert_eq!(
            fields.update(FieldId(7), FieldAttr::X, "1"),
            Err(LayoutError::UnknownField(FieldId(7)))
        );
    }

    #[test]
    fn test_set_active_unknown() {
        let mut fields = set();
        assert!(fields.set_active(FieldId(3)).is_err());
        assert_eq!(fields.active_id(), FieldId(1));
    }

    #[test]
    fn test_move_to() {
        let mut fields = set();
        let id = fields.active_id();
        fields.move_to(id, Point::new(12.0, 34.0)).unwrap();
        assert_eq!(fields.active().position(), Point::new(12.0, 34.0));
        assert!(fields.move_to(id, Point::new(f64::NAN, 0.0)).is_err());
        assert_eq!(fields.active().position(), Point::new(12.0, 34.0));
    }

    #[test]
    fn test_recenter() {
        let mut fields = set();
        fields.add_field(Point::new(1.0, 2.0), None);
        fields.recenter(800.0, 600.0);
        assert!(fields.iter().all(|f| f.position() == Point::new(400.0, 300.0)));
    }

    #[test]
    fn test_bind_columns() {
        let mut fields = set();
        let bound = fields.add_field(Point::default(), Some("Course".into()));
        let stale = fields.add_field(Point::default(), Some("Old".into()));
        let headers = vec!["Name".to_string(), "Course".to_string()];
        fields.bind_columns(&headers);

        assert_eq!(fields.get(FieldId(1)).unwrap().column.as_deref(), Some("Name"));
        assert_eq!(fields.get(bound).unwrap().column.as_deref(), Some("Course"));
        assert_eq!(fields.get(stale).unwrap().column.as_deref(), Some("Name"));
    }

    #[test]
    fn test_replace_all_renumbers() {
        let mut fields = set();
        fields.add_field(Point::default(), None);
        let incoming = vec![
            TextField::new(FieldId(40), Point::default(), Some("A".into())),
            TextField::new(FieldId(40), Point::default(), Some("B".into())),
        ];
        fields.replace_all(incoming).unwrap();
        let ids: Vec<FieldId> = fields.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![FieldId(1), FieldId(2)]);
        assert_eq!(fields.active_id(), FieldId(1));
        assert_eq!(fields.add_field(Point::default(), None), FieldId(3));
    }

    #[test]
    fn test_replace_all_empty_rejected() {
        let mut fields = set();
        let before = fields.clone();
        assert!(matches!(
            fields.replace_all(Vec::new()),
            Err(LayoutError::Preset(_))
        ));
        assert_eq!(fields, before);
    }

    #[test]
    fn test_font_ref_parse() {
        assert_eq!(FontRef::parse(""), FontRef::default());
        assert_eq!(
            FontRef::parse("Times-Roman"),
            FontRef::Standard(StandardFont::TimesRoman)
        );
        assert_eq!(
            FontRef::parse("HelveticaBold"),
            FontRef::Standard(StandardFont::HelveticaBold)
        );
        assert_eq!(
            FontRef::parse("Sarabun.ttf"),
            FontRef::Custom("Sarabun.ttf".into())
        );
        assert_eq!(FontRef::parse("TimesRomanBold").value(), "Times-Bold");
    }

    #[test]
    fn test_rgb_parse_hex() {
        assert_eq!(Rgb::parse_hex("#FF8000"), Some(Rgb { r: 255, g: 128, b: 0 }));
        assert_eq!(Rgb::parse_hex("0a0B0c"), Some(Rgb { r: 10, g: 11, b: 12 }));
        assert_eq!(Rgb::parse_hex("#fff"), None);
        assert_eq!(Rgb::parse_hex("#gg0000"), None);
        assert_eq!(Rgb::from_hex_or_black("red"), Rgb::BLACK);
        assert_eq!(Rgb { r: 255, g: 128, b: 0 }.to_hex(), "#ff8000");
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
        assert!(normalize_degrees(-1e-20) < 360.0);
    }

    #[test]
    fn test_field_attr_keys() {
        for attr in FieldAttr::ALL {
            assert_eq!(attr.key().parse::<FieldAttr>(), Ok(attr));
        }
        assert_eq!(
            "bogus".parse::<FieldAttr>(),
            Err(LayoutError::UnknownAttribute("bogus".into()))
        );
    }

    #[test]
    fn test_placeholder_label() {
        let mut field = TextField::new(FieldId(1), Point::default(), None);
        assert_eq!(field.placeholder_label(), "[ Empty text ]");
        field.column = Some("Name".into());
        assert_eq!(field.placeholder_label(), "[ Name ]");
    }
}
