//! Font library and per-document font cache

use crate::{CertgenError, Result};
use layout::{FontRef, DEFAULT_FONT};
use pdf_core::{DocumentEngine, FontData, FontHandle, StandardFont};
use std::collections::HashMap;
use std::sync::Arc;

/// An uploaded TrueType/OpenType font
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAsset {
    pub label: String,
    /// Identifying value fields refer to; the file name
    pub value: String,
    pub bytes: Arc<[u8]>,
    /// Uploaded by the user rather than built in
    pub custom: bool,
}

/// An entry of the font picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontOption {
    pub label: String,
    pub value: String,
    pub custom: bool,
}

/// The standard fonts plus every font uploaded so far
///
/// Fonts are never removed. A field that refers to a value the library
/// does not know renders with the default font.
#[derive(Debug, Clone, Default)]
pub struct FontLibrary {
    custom: Vec<FontAsset>,
}

/// What a [`FontRef`] resolves to at render time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFont<'a> {
    Standard(StandardFont),
    Custom(&'a FontAsset),
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add uploaded font files, returning their values in upload order
    ///
    /// Every file is checked before any is added, so a bad file leaves the
    /// library unchanged. Uploading a value that already exists replaces its
    /// bytes.
    pub fn upload_all(&mut self, files: Vec<(String, Vec<u8>)>) -> Result<Vec<String>> {
        for (name, bytes) in &files {
            FontData::from_bytes(name, bytes)
                .map_err(|e| CertgenError::Ingestion(format!("{name}: {e}")))?;
        }

        let mut values = Vec::with_capacity(files.len());
        for (name, bytes) in files {
            values.push(self.insert(name, bytes));
        }
        Ok(values)
    }

    /// Add a single font file
    pub fn upload(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<String> {
        let name = name.into();
        let mut values = self.upload_all(vec![(name, bytes)])?;
        values
            .pop()
            .ok_or_else(|| CertgenError::Ingestion("no font uploaded".into()))
    }

    fn insert(&mut self, name: String, bytes: Vec<u8>) -> String {
        let bytes: Arc<[u8]> = bytes.into();
        if let Some(existing) = self.custom.iter_mut().find(|f| f.value == name) {
            log::debug!("Replacing font {name}");
            existing.bytes = bytes;
        } else {
            log::debug!("Adding font {name} ({} bytes)", bytes.len());
            self.custom.push(FontAsset {
                label: name.clone(),
                value: name.clone(),
                bytes,
                custom: true,
            });
        }
        name
    }

    pub fn get(&self, value: &str) -> Option<&FontAsset> {
        self.custom.iter().find(|f| f.value == value)
    }

    pub fn custom_fonts(&self) -> &[FontAsset] {
        &self.custom
    }

    /// Picker entries: standard fonts first, then uploads in order
    pub fn options(&self) -> Vec<FontOption> {
        let standard = StandardFont::ALL.into_iter().map(|font| FontOption {
            label: font.label().to_string(),
            value: font.name().to_string(),
            custom: false,
        });
        let custom = self.custom.iter().map(|font| FontOption {
            label: font.label.clone(),
            value: font.value.clone(),
            custom: font.custom,
        });
        standard.chain(custom).collect()
    }

    /// Resolve a field's font, falling back to the default for unknown uploads
    pub fn resolve(&self, font: &FontRef) -> ResolvedFont<'_> {
        match font {
            FontRef::Standard(standard) => ResolvedFont::Standard(*standard),
            FontRef::Custom(value) => match self.get(value) {
                Some(asset) => ResolvedFont::Custom(asset),
                None => {
                    log::warn!("Font {value:?} is not loaded, using the default font");
                    ResolvedFont::Standard(DEFAULT_FONT)
                }
            },
        }
    }
}

/// Fonts embedded into one document
///
/// Created per render job and dropped with it; each distinct font is
/// embedded at most once per document.
pub struct FontCache<'a> {
    library: &'a FontLibrary,
    handles: HashMap<FontRef, FontHandle>,
}

impl<'a> FontCache<'a> {
    pub fn new(library: &'a FontLibrary) -> Self {
        Self {
            library,
            handles: HashMap::new(),
        }
    }

    /// Handle for `font` in `doc`, embedding it on first use
    pub fn handle<E: DocumentEngine>(&mut self, doc: &mut E, font: &FontRef) -> Result<FontHandle> {
        let resolved = self.library.resolve(font);
        let key = match resolved {
            ResolvedFont::Standard(standard) => FontRef::Standard(standard),
            ResolvedFont::Custom(asset) => FontRef::Custom(asset.value.clone()),
        };
        if let Some(handle) = self.handles.get(&key) {
            return Ok(*handle);
        }

        let handle = match resolved {
            ResolvedFont::Standard(standard) => doc.embed_standard_font(standard)?,
            ResolvedFont::Custom(asset) => doc.embed_font(&asset.value, &asset.bytes)?,
        };
        log::debug!("Embedded font {key}");
        self.handles.insert(key, handle);
        Ok(handle)
    }

    /// Number of distinct fonts embedded so far
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DEJAVU: &[u8] = include_bytes!("../../pdf-core/tests/fonts/DejaVuSans-Subset.ttf");

    #[test]
    fn test_options_standard_first() {
        let library = FontLibrary::new();
        let options = library.options();
        assert_eq!(options.len(), 5);
        assert_eq!(options[1].value, "Helvetica-Bold");
        assert_eq!(options[1].label, "Helvetica Bold");
        assert!(options.iter().all(|o| !o.custom));
    }

    #[test]
    fn test_upload_rejects_invalid_font() {
        let mut library = FontLibrary::new();
        let err = library
            .upload_all(vec![("broken.ttf".into(), vec![0, 1, 2, 3])])
            .unwrap_err();
        assert!(matches!(err, CertgenError::Ingestion(_)));
        assert!(library.custom_fonts().is_empty());
    }

    #[test]
    fn test_upload_adds_custom_option() {
        let mut library = FontLibrary::new();
        let value = library.upload("DejaVuSans.ttf", DEJAVU.to_vec()).unwrap();
        assert_eq!(value, "DejaVuSans.ttf");

        let asset = library.get(&value).unwrap();
        assert!(asset.custom);
        assert_eq!(asset.label, "DejaVuSans.ttf");
        assert_eq!(asset.bytes.len(), DEJAVU.len());

        let options = library.options();
        assert_eq!(options.len(), 6);
        assert_eq!(
            options[5],
            FontOption {
                label: "DejaVuSans.ttf".into(),
                value: "DejaVuSans.ttf".into(),
                custom: true,
            }
        );
        assert_eq!(
            library.resolve(&FontRef::Custom(value)),
            ResolvedFont::Custom(asset)
        );
    }

    #[test]
    fn test_reupload_replaces_bytes() {
        let mut library = FontLibrary::new();
        library.upload("Body.ttf", DEJAVU.to_vec()).unwrap();
        let mut changed = DEJAVU.to_vec();
        changed.extend_from_slice(&[0, 0, 0, 0]);
        library.upload("Body.ttf", changed).unwrap();

        assert_eq!(library.custom_fonts().len(), 1);
        assert_eq!(library.custom_fonts()[0].bytes.len(), DEJAVU.len() + 4);
    }

    #[test]
    fn test_upload_all_is_atomic() {
        let mut library = FontLibrary::new();
        let err = library
            .upload_all(vec![
                ("Good.ttf".into(), DEJAVU.to_vec()),
                ("broken.ttf".into(), vec![0; 16]),
            ])
            .unwrap_err();
        assert!(err.to_string().contains("broken.ttf"), "{err}");
        assert!(library.custom_fonts().is_empty());
    }

    #[test]
    fn test_resolve_dangling_custom_font() {
        let library = FontLibrary::new();
        assert_eq!(
            library.resolve(&FontRef::Custom("Gone.ttf".into())),
            ResolvedFont::Standard(StandardFont::HelveticaBold)
        );
        assert_eq!(
            library.resolve(&FontRef::Standard(StandardFont::Courier)),
            ResolvedFont::Standard(StandardFont::Courier)
        );
    }
}
