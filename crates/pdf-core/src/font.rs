//! Font handling for PDF documents
//!
//! Uploaded TrueType/OpenType fonts are embedded whole as a composite
//! (Type0) font with Identity-H encoding, so text is written as glyph IDs.

use crate::{PdfError, Result};
use lopdf::{Dictionary, Object, Stream};
use std::collections::BTreeSet;

/// Font data structure for embedded fonts
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font name/identifier (PostScript name when the font has one)
    pub name: String,
    /// Raw font file data
    pub font_data: Vec<u8>,
    /// Characters used, for the widths array and ToUnicode map
    pub used_chars: BTreeSet<char>,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    cap_height: i16,
    bbox: [i16; 4],
    is_italic: bool,
    /// Glyph outlines are CFF (OpenType) rather than TrueType
    is_cff: bool,
}

/// PDF objects generated for font embedding
pub struct FontObjects {
    /// Type0 font dictionary
    pub type0_font: Dictionary,
    /// CIDFont dictionary
    pub cid_font: Dictionary,
    /// Font descriptor dictionary
    pub font_descriptor: Dictionary,
    /// Key under which the font file is referenced from the descriptor
    pub font_file_key: &'static str,
    /// Font file stream
    pub font_file_stream: Stream,
    /// ToUnicode CMap stream
    pub tounicode_stream: Stream,
}

impl FontData {
    /// Create font data from TTF/OTF bytes
    ///
    /// # Arguments
    /// * `fallback_name` - Name used when the font carries no PostScript name
    /// * `font_data` - Font file bytes
    pub fn from_bytes(fallback_name: &str, font_data: &[u8]) -> Result<Self> {
        let face = ttf_parser::Face::parse(font_data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{e:?}")))?;

        let name = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .map(|name| sanitize_font_name(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| sanitize_font_name(fallback_name));

        let rect = face.global_bounding_box();

        Ok(Self {
            name,
            font_data: font_data.to_vec(),
            used_chars: BTreeSet::new(),
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            cap_height: face.capital_height().unwrap_or_else(|| face.ascender()),
            bbox: [rect.x_min, rect.y_min, rect.x_max, rect.y_max],
            is_italic: face.is_italic(),
            is_cff: face.tables().cff.is_some(),
        })
    }

    // Re-parsing only reads the table directory, so faces are not cached.
    fn face(&self) -> Result<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.font_data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{e:?}")))
    }

    /// Add characters to the used set
    pub fn add_chars(&mut self, text: &str) {
        self.used_chars.extend(text.chars());
    }

    /// Get font units per em
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Calculate text width in font units
    ///
    /// Characters without a glyph count as `.notdef`, matching what is drawn.
    pub fn text_width(&self, text: &str) -> Result<u32> {
        let face = self.face()?;
        Ok(text
            .chars()
            .filter_map(|c| face.glyph_hor_advance(glyph_or_notdef(&face, c)))
            .map(|w| w as u32)
            .sum())
    }

    /// Calculate text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f64) -> Result<f64> {
        let width = self.text_width(text)?;
        Ok(width as f64 / self.units_per_em as f64 * font_size)
    }

    /// Encode text as hex string for PDF Tj operator
    ///
    /// Characters without a glyph are written as GID 0 (`.notdef`).
    pub fn encode_text_hex(&self, text: &str) -> Result<String> {
        let face = self.face()?;
        let mut result = String::with_capacity(text.len() * 4 + 2);
        result.push('<');
        for c in text.chars() {
            let gid = glyph_or_notdef(&face, c).0;
            result.push_str(&format!("{gid:04X}"));
        }
        result.push('>');
        Ok(result)
    }

    /// Generate all PDF objects needed to embed this font
    pub fn to_pdf_objects(&self) -> Result<FontObjects> {
        let face = self.face()?;
        let font_name = Object::Name(self.name.clone().into_bytes());

        // Metrics are scaled to the 1000-unit glyph space PDF expects
        let upem = self.units_per_em as f64;
        let scale = |v: i16| -> i64 { (v as f64 * 1000.0 / upem).round() as i64 };

        let tounicode_content = self.generate_tounicode_cmap(&face);
        let tounicode_stream = Stream::new(Dictionary::new(), tounicode_content.into_bytes());

        let (font_file_key, font_file_stream, cid_subtype) = if self.is_cff {
            let dict = Dictionary::from_iter(vec![("Subtype", "OpenType".into())]);
            (
                "FontFile3",
                Stream::new(dict, self.font_data.clone()),
                "CIDFontType0",
            )
        } else {
            let dict =
                Dictionary::from_iter(vec![("Length1", (self.font_data.len() as i64).into())]);
            (
                "FontFile2",
                Stream::new(dict, self.font_data.clone()),
                "CIDFontType2",
            )
        };

        let font_bbox: Vec<Object> = self.bbox.iter().map(|&v| scale(v).into()).collect();

        let mut flags = 1 << 2; // Symbolic
        if self.is_italic {
            flags |= 1 << 6;
        }

        let font_descriptor = Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", font_name.clone()),
            ("Flags", Object::Integer(flags)),
            ("FontBBox", font_bbox.into()),
            ("ItalicAngle", 0.into()),
            ("Ascent", scale(self.ascender).into()),
            ("Descent", scale(self.descender).into()),
            ("CapHeight", scale(self.cap_height).into()),
            ("StemV", 80.into()),
        ]);

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", Object::string_literal("Adobe")),
            ("Ordering", Object::string_literal("Identity")),
            ("Supplement", 0.into()),
        ]);

        let mut cid_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", cid_subtype.into()),
            ("BaseFont", font_name.clone()),
            ("CIDSystemInfo", cid_system_info.into()),
            ("W", self.generate_widths_array(&face).into()),
            ("DW", 1000.into()),
        ]);
        if !self.is_cff {
            cid_font.set("CIDToGIDMap", "Identity");
        }

        // DescendantFonts and ToUnicode are linked by the document at embed time
        let type0_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", font_name),
            ("Encoding", "Identity-H".into()),
        ]);

        Ok(FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_key,
            font_file_stream,
            tounicode_stream,
        })
    }

    /// Generate /W array for glyph widths
    fn generate_widths_array(&self, face: &ttf_parser::Face<'_>) -> Vec<Object> {
        let mut gids: Vec<u16> = self
            .used_chars
            .iter()
            .map(|&c| glyph_or_notdef(face, c).0)
            .collect();
        gids.sort_unstable();
        gids.dedup();

        // Individual mapping format: [gid1 [width1] gid2 [width2] ...]
        let mut widths = Vec::with_capacity(gids.len() * 2);
        for gid in gids {
            let advance = face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .unwrap_or(self.units_per_em);
            let scaled = (advance as f64 * 1000.0 / self.units_per_em as f64).round() as i64;
            widths.push((gid as i64).into());
            widths.push(vec![scaled.into()].into());
        }
        widths
    }

    /// Generate ToUnicode CMap stream content
    fn generate_tounicode_cmap(&self, face: &ttf_parser::Face<'_>) -> String {
        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        let mapped: Vec<(u16, char)> = self
            .used_chars
            .iter()
            .filter_map(|&c| face.glyph_index(c).map(|id| (id.0, c)))
            .filter(|(gid, _)| *gid != 0)
            .collect();

        // At most 100 entries per bfchar block
        for chunk in mapped.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, c) in chunk {
                let mut utf16 = [0u16; 2];
                let units: String = c
                    .encode_utf16(&mut utf16)
                    .iter()
                    .map(|u| format!("{u:04X}"))
                    .collect();
                cmap.push_str(&format!("<{gid:04X}> <{units}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}

fn glyph_or_notdef(face: &ttf_parser::Face<'_>, c: char) -> ttf_parser::GlyphId {
    face.glyph_index(c).unwrap_or(ttf_parser::GlyphId(0))
}

/// Keep only characters valid in a PDF name token
fn sanitize_font_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
        .collect()
}
