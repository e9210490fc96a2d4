//! The built-in (non-embedded) PDF fonts
//!
//! These fonts are referenced by name and rendered by the viewer, so only
//! their metrics live here. Text is encoded with WinAnsiEncoding, which
//! covers ASCII, Latin-1 and a handful of typographic punctuation marks.

use crate::{PdfError, Result};
use lopdf::{dictionary, Dictionary};
use std::fmt;
use std::str::FromStr;

/// Standard fonts offered in the font picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
}

impl StandardFont {
    /// All standard fonts, in picker order
    pub const ALL: [StandardFont; 5] = [
        StandardFont::Helvetica,
        StandardFont::HelveticaBold,
        StandardFont::TimesRoman,
        StandardFont::TimesBold,
        StandardFont::Courier,
    ];

    /// PostScript name, also used as the font value in layout presets
    pub fn name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::Courier => "Courier",
        }
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica Bold",
            StandardFont::TimesRoman => "Times Roman",
            StandardFont::TimesBold => "Times Roman Bold",
            StandardFont::Courier => "Courier",
        }
    }

    /// Look up a standard font by its PostScript name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|font| font.name() == name)
    }

    /// Advance width of a character in 1/1000 em
    ///
    /// Returns `None` when the character has no WinAnsi code.
    pub fn char_width(self, c: char) -> Option<u16> {
        let code = win_ansi_code(c)?;
        if (32..=126).contains(&code) {
            return Some(self.ascii_widths()[(code - 32) as usize]);
        }
        let width = match latin1_base_letter(c) {
            Some(base) => self.ascii_widths()[(base as u8 - 32) as usize],
            None => self.fallback_width(),
        };
        Some(width)
    }

    /// Text width in points at the given size
    pub fn text_width_points(self, text: &str, font_size: f64) -> Result<f64> {
        let mut units = 0u32;
        for c in text.chars() {
            let width = self
                .char_width(c)
                .ok_or_else(|| PdfError::UnencodableText(text.to_string(), self.name().into()))?;
            units += width as u32;
        }
        Ok(units as f64 * font_size / 1000.0)
    }

    /// Encode text as a hex string operand for the `Tj` operator
    pub fn encode_text_hex(self, text: &str) -> Result<String> {
        let mut result = String::with_capacity(text.len() * 2 + 2);
        result.push('<');
        for c in text.chars() {
            let code = win_ansi_code(c)
                .ok_or_else(|| PdfError::UnencodableText(text.to_string(), self.name().into()))?;
            result.push_str(&format!("{code:02X}"));
        }
        result.push('>');
        Ok(result)
    }

    /// Font dictionary referencing this font by name
    pub fn to_pdf_dictionary(self) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.name(),
            "Encoding" => "WinAnsiEncoding",
        }
    }

    fn fallback_width(self) -> u16 {
        match self {
            StandardFont::Helvetica => 556,
            StandardFont::HelveticaBold => 611,
            StandardFont::TimesRoman => 500,
            StandardFont::TimesBold => 556,
            StandardFont::Courier => 600,
        }
    }

    fn ascii_widths(self) -> &'static [u16; 95] {
        match self {
            StandardFont::Helvetica => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
            StandardFont::TimesRoman => &TIMES_ROMAN_WIDTHS,
            StandardFont::TimesBold => &TIMES_BOLD_WIDTHS,
            StandardFont::Courier => &COURIER_WIDTHS,
        }
    }
}

impl fmt::Display for StandardFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StandardFont {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| PdfError::FontNotFound(s.to_string()))
    }
}

/// Map a character to its WinAnsiEncoding byte
pub fn win_ansi_code(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => match c {
            '\u{20AC}' => Some(0x80),
            '\u{201A}' => Some(0x82),
            '\u{0192}' => Some(0x83),
            '\u{201E}' => Some(0x84),
            '\u{2026}' => Some(0x85),
            '\u{2020}' => Some(0x86),
            '\u{2021}' => Some(0x87),
            '\u{02C6}' => Some(0x88),
            '\u{2030}' => Some(0x89),
            '\u{0160}' => Some(0x8A),
            '\u{2039}' => Some(0x8B),
            '\u{0152}' => Some(0x8C),
            '\u{017D}' => Some(0x8E),
            '\u{2018}' => Some(0x91),
            '\u{2019}' => Some(0x92),
            '\u{201C}' => Some(0x93),
            '\u{201D}' => Some(0x94),
            '\u{2022}' => Some(0x95),
            '\u{2013}' => Some(0x96),
            '\u{2014}' => Some(0x97),
            '\u{02DC}' => Some(0x98),
            '\u{2122}' => Some(0x99),
            '\u{0161}' => Some(0x9A),
            '\u{203A}' => Some(0x9B),
            '\u{0153}' => Some(0x9C),
            '\u{017E}' => Some(0x9E),
            '\u{0178}' => Some(0x9F),
            _ => None,
        },
    }
}

/// Unaccented ASCII letter sharing the advance width of an accented one
fn latin1_base_letter(c: char) -> Option<char> {
    const BASES: &str = "AAAAAA\0CEEEEIIIIDNOOOOO\0OUUUUY\0\0aaaaaa\0ceeeeiiiidnooooo\0ouuuuy\0y";
    let code = c as u32;
    let base = match code {
        0xC0..=0xFF => BASES.chars().nth((code - 0xC0) as usize)?,
        0x160 => 'S',
        0x161 => 's',
        0x17D => 'Z',
        0x17E => 'z',
        0x178 => 'Y',
        _ => return None,
    };
    (base != '\0').then_some(base)
}

// Advance widths for codes 32..=126 from the Adobe core font metrics.

const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 32
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 48
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 64
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 80
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 96
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 112
];

const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // 32
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, // 48
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, // 64
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500, // 80
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, // 96
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541, // 112
];

const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278, // 32
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500, // 48
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778, // 64
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500, // 80
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500, // 96
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520, // 112
];

const COURIER_WIDTHS: [u16; 95] = [600; 95];
