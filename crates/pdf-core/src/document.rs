//! PDF Document wrapper

use crate::engine::{DocumentEngine, FontHandle, ImageHandle, TextDraw};
use crate::image::{generate_image_operators, ImageXObject};
use crate::text::generate_text_operators;
use crate::{FontData, PdfError, Result, StandardFont};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Components widened for content stream output
    pub fn components(&self) -> (f64, f64, f64) {
        (self.r as f64, self.g as f64, self.b as f64)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// A font registered with the document
#[derive(Debug)]
enum DocumentFont {
    /// Referenced by name, the font dictionary is written on registration
    Standard {
        font: StandardFont,
        object_id: ObjectId,
    },
    /// Embedded at save time, once every used character is known
    Embedded {
        data: FontData,
        object_id: Option<ObjectId>,
    },
}

/// An image XObject added to the document
#[derive(Debug, Clone, Copy)]
struct EmbeddedImage {
    object_id: ObjectId,
    width: u32,
    height: u32,
}

/// PDF Document wrapper providing high-level operations
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Registered fonts, indexed by `FontHandle`
    fonts: Vec<DocumentFont>,
    /// Standard fonts already registered
    standard_fonts: HashMap<StandardFont, FontHandle>,
    /// Font files already registered (data hash -> handle)
    font_hashes: HashMap<u64, FontHandle>,
    /// Page font resources (page number -> font -> resource name)
    page_font_resources: HashMap<usize, HashMap<FontHandle, String>>,
    /// Embedded images, indexed by `ImageHandle`
    images: Vec<EmbeddedImage>,
    /// Images already embedded (data hash -> handle)
    image_hashes: HashMap<u64, ImageHandle>,
    /// Page image resources (page number -> image -> resource name)
    page_image_resources: HashMap<usize, HashMap<ImageHandle, String>>,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: BTreeMap<usize, Vec<u8>>,
}

impl PdfDocument {
    fn from_inner(inner: Document) -> Self {
        Self {
            inner,
            fonts: Vec::new(),
            standard_fonts: HashMap::new(),
            font_hashes: HashMap::new(),
            page_font_resources: HashMap::new(),
            images: Vec::new(),
            image_hashes: HashMap::new(),
            page_image_resources: HashMap::new(),
            page_content_buffer: BTreeMap::new(),
        }
    }

    /// Open a PDF document from bytes
    ///
    /// # Arguments
    /// * `data` - PDF file bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;

        if inner.trailer.get(b"Encrypt").is_ok() {
            return Err(PdfError::OpenError(
                "Encrypted documents are not supported".to_string(),
            ));
        }

        Ok(Self::from_inner(inner))
    }

    /// Create a new, empty document
    pub fn new() -> Self {
        let mut inner = Document::with_version("1.5");

        let pages_id = inner.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);

        Self::from_inner(inner)
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Register one of the standard fonts
    ///
    /// Registering the same font twice returns the same handle.
    pub fn add_standard_font(&mut self, font: StandardFont) -> FontHandle {
        if let Some(handle) = self.standard_fonts.get(&font) {
            return *handle;
        }

        let object_id = self.inner.add_object(font.to_pdf_dictionary());
        let handle = FontHandle(self.fonts.len());
        self.fonts.push(DocumentFont::Standard { font, object_id });
        self.standard_fonts.insert(font, handle);

        log::debug!("registered standard font {font} as {handle:?}");
        handle
    }

    /// Add a TrueType/OpenType font to the document
    ///
    /// # Arguments
    /// * `name` - Font identifier, used when the file has no PostScript name
    /// * `font_data` - Font file bytes
    ///
    /// The same bytes registered twice share one handle.
    pub fn add_font(&mut self, name: &str, font_data: &[u8]) -> Result<FontHandle> {
        let data_hash = hash_bytes(font_data);
        if let Some(handle) = self.font_hashes.get(&data_hash) {
            return Ok(*handle);
        }

        let data = FontData::from_bytes(name, font_data)?;
        let handle = FontHandle(self.fonts.len());
        log::debug!("registered font {} as {handle:?}", data.name);
        self.fonts.push(DocumentFont::Embedded {
            data,
            object_id: None,
        });
        self.font_hashes.insert(data_hash, handle);

        Ok(handle)
    }

    fn font(&self, handle: FontHandle) -> Result<&DocumentFont> {
        self.fonts
            .get(handle.0)
            .ok_or_else(|| PdfError::FontNotFound(format!("{handle:?}")))
    }

    /// Get text width in points for a font and size
    ///
    /// # Arguments
    /// * `font` - Font handle returned by this document
    /// * `text` - The text to measure
    /// * `size` - Font size in points
    pub fn get_text_width(&self, font: FontHandle, text: &str, size: f64) -> Result<f64> {
        match self.font(font)? {
            DocumentFont::Standard { font, .. } => font.text_width_points(text, size),
            DocumentFont::Embedded { data, .. } => data.text_width_points(text, size),
        }
    }

    /// Insert a line of text
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    /// * `text` - Text to insert
    /// * `font` - Font handle returned by this document
    /// * `draw` - Baseline position (PDF coordinates), size, color, scale, rotation
    pub fn insert_text(
        &mut self,
        page: usize,
        text: &str,
        font: FontHandle,
        draw: &TextDraw,
    ) -> Result<()> {
        self.check_page(page)?;

        // Skip empty text - nothing to render
        if text.is_empty() {
            return Ok(());
        }

        let text_hex = match self.fonts.get_mut(font.0) {
            Some(DocumentFont::Standard { font, .. }) => font.encode_text_hex(text)?,
            Some(DocumentFont::Embedded { data, .. }) => {
                // Track characters for the widths array and ToUnicode map
                data.add_chars(text);
                data.encode_text_hex(text)?
            }
            None => return Err(PdfError::FontNotFound(format!("{font:?}"))),
        };

        let font_resource_name = self.get_or_create_font_ref(font, page)?;
        let operators = generate_text_operators(&text_hex, &font_resource_name, draw);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Embed an image, deduplicated by a hash of its data
    pub fn add_image(&mut self, data: &[u8]) -> Result<ImageHandle> {
        let data_hash = hash_bytes(data);
        if let Some(handle) = self.image_hashes.get(&data_hash) {
            return Ok(*handle);
        }

        let xobject = ImageXObject::from_bytes(data)
            .map_err(|e| PdfError::ImageError(format!("Failed to create image XObject: {e}")))?;
        let object_id = self.inner.add_object(xobject.to_pdf_stream());

        let handle = ImageHandle(self.images.len());
        self.images.push(EmbeddedImage {
            object_id,
            width: xobject.width,
            height: xobject.height,
        });
        self.image_hashes.insert(data_hash, handle);

        Ok(handle)
    }

    /// Pixel dimensions of an embedded image
    pub fn image_dimensions(&self, image: ImageHandle) -> Result<(u32, u32)> {
        self.images
            .get(image.0)
            .map(|img| (img.width, img.height))
            .ok_or_else(|| PdfError::ImageError(format!("Unknown image {image:?}")))
    }

    /// Insert an image into a rectangle
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    /// * `image` - Image handle returned by this document
    /// * `x`, `y` - Lower-left corner in PDF coordinates
    /// * `width`, `height` - Size in points
    pub fn insert_image(
        &mut self,
        page: usize,
        image: ImageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        self.check_page(page)?;
        self.image_dimensions(image)?;

        let image_resource_name = self.get_or_create_image_ref(image, page)?;
        let operators = generate_image_operators(&image_resource_name, x, y, width, height);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Add a blank page of the given size
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_blank_page(&mut self, width: f64, height: f64) -> Result<usize> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(PdfError::InvalidPageSize(width, height));
        }

        let page_count = self.page_count();
        let pages_id = self.pages_root_id()?;

        let new_page_id = self.inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Resources" => Dictionary::new(),
        });

        let pages_dict = self
            .inner
            .get_object(pages_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Pages object is not a dictionary".to_string()))?;

        let mut kids_array = pages_dict
            .get(b"Kids")
            .and_then(Object::as_array)
            .map_err(|_| PdfError::ParseError("Pages object missing Kids array".to_string()))?
            .clone();
        kids_array.push(Object::Reference(new_page_id));

        let current_count = pages_dict
            .get(b"Count")
            .and_then(Object::as_i64)
            .map_err(|_| PdfError::ParseError("Pages object missing Count".to_string()))?;

        let mut new_pages_dict = pages_dict.clone();
        new_pages_dict.set("Kids", Object::Array(kids_array));
        new_pages_dict.set("Count", Object::Integer(current_count + 1));
        self.inner.objects.insert(pages_id, new_pages_dict.into());

        Ok(page_count + 1)
    }

    /// Get page width and height in points
    ///
    /// Reads the MediaBox (or CropBox), following the parent chain.
    pub fn get_page_size(&self, page: usize) -> Result<(f64, f64)> {
        let page_id = self.page_id(page)?;
        let media_box = self.get_inherited_media_box(page_id)?;

        let coords: Vec<f64> = media_box.iter().filter_map(as_number).collect();
        if coords.len() < 4 {
            return Err(PdfError::ParseError("Invalid MediaBox format".to_string()));
        }

        Ok(((coords[2] - coords[0]).abs(), (coords[3] - coords[1]).abs()))
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        // 1. Embed fonts now that every used character is known
        self.embed_fonts()?;

        // 2. Register fonts and images in the page resources
        self.finalize_page_resources()?;

        // 3. Flush buffered content streams to pages
        self.flush_content_buffers()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    fn check_page(&self, page: usize) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }
        Ok(())
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    /// Object ID of the root Pages node
    fn pages_root_id(&self) -> Result<ObjectId> {
        let catalog_id = self
            .inner
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))?;
        let catalog_dict = self
            .inner
            .get_object(catalog_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))?;
        catalog_dict
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Catalog missing Pages entry".to_string()))
    }

    /// Get MediaBox, following parent inheritance chain if needed
    fn get_inherited_media_box(&self, page_id: ObjectId) -> Result<Vec<Object>> {
        let mut current_id = page_id;

        // Follow parent chain up to 10 levels (safety limit)
        for _ in 0..10 {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

            if let Ok(media_box) = dict.get(b"MediaBox").or_else(|_| dict.get(b"CropBox")) {
                let media_box_array = self
                    .resolve(media_box)?
                    .as_array()
                    .map_err(|_| PdfError::ParseError("MediaBox is not an array".to_string()))?
                    .clone();
                return Ok(media_box_array);
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        // Fallback: assume A4 page size
        Ok(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(595.28),
            Object::Real(841.89),
        ])
    }

    /// Follow a reference to the object it points at
    fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        match object {
            Object::Reference(id) => Ok(self.inner.get_object(*id)?),
            other => Ok(other),
        }
    }

    /// Resources dictionary in effect for a page, inherited ones included
    fn effective_resources(&self, page_id: ObjectId) -> Result<Dictionary> {
        let mut current_id = page_id;
        for _ in 0..10 {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

            if let Ok(resources) = dict.get(b"Resources") {
                return Ok(self
                    .resolve(resources)?
                    .as_dict()
                    .cloned()
                    .unwrap_or_else(|_| Dictionary::new()));
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }
        Ok(Dictionary::new())
    }

    /// Resource names already taken in one category of a page's resources
    fn existing_resource_names(&self, page: usize, category: &[u8]) -> Result<Vec<Vec<u8>>> {
        let resources = self.effective_resources(self.page_id(page)?)?;
        let names = match resources.get(category) {
            Ok(obj) => match self.resolve(obj)?.as_dict() {
                Ok(dict) => dict.iter().map(|(key, _)| key.clone()).collect(),
                Err(_) => Vec::new(),
            },
            Err(_) => Vec::new(),
        };
        Ok(names)
    }

    /// Get or create a font reference for a specific page
    ///
    /// Returns the resource name (e.g., "F1", "F2") for use in content
    /// streams. Names already used by the page are skipped.
    fn get_or_create_font_ref(&mut self, font: FontHandle, page: usize) -> Result<String> {
        if let Some(name) = self
            .page_font_resources
            .get(&page)
            .and_then(|fonts| fonts.get(&font))
        {
            return Ok(name.clone());
        }

        let mut taken = self.existing_resource_names(page, b"Font")?;
        if let Some(fonts) = self.page_font_resources.get(&page) {
            taken.extend(fonts.values().map(|name| name.as_bytes().to_vec()));
        }
        let resource_name = next_free_name("F", &taken);

        self.page_font_resources
            .entry(page)
            .or_default()
            .insert(font, resource_name.clone());

        Ok(resource_name)
    }

    /// Get or create an image reference for a specific page
    ///
    /// Returns the resource name (e.g., "Im1", "Im2").
    fn get_or_create_image_ref(&mut self, image: ImageHandle, page: usize) -> Result<String> {
        if let Some(name) = self
            .page_image_resources
            .get(&page)
            .and_then(|images| images.get(&image))
        {
            return Ok(name.clone());
        }

        let mut taken = self.existing_resource_names(page, b"XObject")?;
        if let Some(images) = self.page_image_resources.get(&page) {
            taken.extend(images.values().map(|name| name.as_bytes().to_vec()));
        }
        let resource_name = next_free_name("Im", &taken);

        self.page_image_resources
            .entry(page)
            .or_default()
            .insert(image, resource_name.clone());

        Ok(resource_name)
    }

    /// Embed all used TrueType/OpenType fonts into the PDF
    fn embed_fonts(&mut self) -> Result<()> {
        for index in 0..self.fonts.len() {
            let used = matches!(
                &self.fonts[index],
                DocumentFont::Embedded { data, .. } if !data.used_chars.is_empty()
            );
            if used {
                self.embed_font_object(index)?;
            }
        }
        Ok(())
    }

    /// Embed a single font object into the PDF
    ///
    /// Saving twice rewrites the Type0 object in place so references stay valid.
    fn embed_font_object(&mut self, index: usize) -> Result<ObjectId> {
        let (font_objects, existing_id) = match &self.fonts[index] {
            DocumentFont::Embedded { data, object_id } => (data.to_pdf_objects()?, *object_id),
            DocumentFont::Standard { object_id, .. } => return Ok(*object_id),
        };

        let font_file_id = self.inner.add_object(font_objects.font_file_stream);

        let mut font_descriptor = font_objects.font_descriptor;
        font_descriptor.set(font_objects.font_file_key, Object::Reference(font_file_id));
        let font_descriptor_id = self.inner.add_object(font_descriptor);

        let mut cid_font = font_objects.cid_font;
        cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
        let cid_font_id = self.inner.add_object(cid_font);

        let tounicode_id = self.inner.add_object(font_objects.tounicode_stream);

        let mut type0_font = font_objects.type0_font;
        type0_font.set(
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        );
        type0_font.set("ToUnicode", Object::Reference(tounicode_id));

        let type0_font_id = match existing_id {
            Some(id) => {
                self.inner.objects.insert(id, type0_font.into());
                id
            }
            None => self.inner.add_object(type0_font),
        };

        if let DocumentFont::Embedded { object_id, .. } = &mut self.fonts[index] {
            *object_id = Some(type0_font_id);
        }

        Ok(type0_font_id)
    }

    fn font_object_id(&self, font: FontHandle) -> Result<ObjectId> {
        match self.font(font)? {
            DocumentFont::Standard { object_id, .. } => Ok(*object_id),
            DocumentFont::Embedded { object_id, data } => {
                object_id.ok_or_else(|| PdfError::FontNotFound(data.name.clone()))
            }
        }
    }

    /// Write the font and image references of every touched page
    fn finalize_page_resources(&mut self) -> Result<()> {
        let mut pages: Vec<usize> = self
            .page_font_resources
            .keys()
            .chain(self.page_image_resources.keys())
            .copied()
            .collect();
        pages.sort_unstable();
        pages.dedup();

        for page in pages {
            let mut fonts = Vec::new();
            if let Some(map) = self.page_font_resources.get(&page) {
                for (handle, name) in map {
                    fonts.push((name.clone(), self.font_object_id(*handle)?));
                }
            }

            let mut images = Vec::new();
            if let Some(map) = self.page_image_resources.get(&page) {
                for (handle, name) in map {
                    let image = self
                        .images
                        .get(handle.0)
                        .ok_or_else(|| PdfError::ImageError(format!("Unknown image {handle:?}")))?;
                    images.push((name.clone(), image.object_id));
                }
            }

            self.add_to_page_resources(page, b"Font", &fonts)?;
            self.add_to_page_resources(page, b"XObject", &images)?;
        }

        Ok(())
    }

    /// Add named references to one category of a page's Resources dictionary
    ///
    /// Inherited resources are copied onto the page so they stay visible.
    fn add_to_page_resources(
        &mut self,
        page: usize,
        category: &[u8],
        entries: &[(String, ObjectId)],
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let page_id = self.page_id(page)?;
        let mut resources_dict = self.effective_resources(page_id)?;

        let mut category_dict = match resources_dict.get(category) {
            Ok(obj) => self
                .resolve(obj)?
                .as_dict()
                .cloned()
                .unwrap_or_else(|_| Dictionary::new()),
            Err(_) => Dictionary::new(),
        };
        for (name, object_id) in entries {
            category_dict.set(name.as_bytes().to_vec(), Object::Reference(*object_id));
        }
        resources_dict.set(category.to_vec(), Object::Dictionary(category_dict));

        let mut new_page_dict = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::SaveError("Page object is not a dictionary".to_string()))?
            .clone();
        new_page_dict.set("Resources", Object::Dictionary(resources_dict));
        self.inner.objects.insert(page_id, new_page_dict.into());

        Ok(())
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers = std::mem::take(&mut self.page_content_buffer);

        for (page, content) in buffers {
            if !content.is_empty() {
                self.append_to_content_stream(page, &content)?;
            }
        }

        Ok(())
    }

    /// Append content to a page's content stream
    ///
    /// The existing streams are kept untouched and bracketed by `q`/`Q`, so
    /// graphics state left over by the template cannot leak into the new
    /// operators.
    fn append_to_content_stream(&mut self, page: usize, content: &[u8]) -> Result<()> {
        let page_id = self.page_id(page)?;
        let mut page_dict = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
            .clone();

        let existing: Vec<Object> = match page_dict.get(b"Contents") {
            Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
            Ok(Object::Array(arr)) => arr.clone(),
            Ok(Object::Stream(stream)) => {
                let stream = stream.clone();
                vec![Object::Reference(self.inner.add_object(stream))]
            }
            _ => Vec::new(),
        };

        let mut contents = Vec::with_capacity(existing.len() + 2);
        if !existing.is_empty() {
            let open_id = self
                .inner
                .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            contents.push(Object::Reference(open_id));
            contents.extend(existing);
        }

        let mut new_content = Vec::with_capacity(content.len() + 3);
        if contents.len() > 1 {
            new_content.extend_from_slice(b"\nQ\n");
        }
        new_content.extend_from_slice(content);
        let stream_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), new_content));
        contents.push(Object::Reference(stream_id));

        page_dict.set("Contents", Object::Array(contents));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentEngine for PdfDocument {
    fn load(bytes: &[u8]) -> Result<Self> {
        Self::open_from_bytes(bytes)
    }

    fn create() -> Self {
        Self::new()
    }

    fn page_count(&self) -> usize {
        PdfDocument::page_count(self)
    }

    fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        self.get_page_size(page)
    }

    fn add_page(&mut self, width: f64, height: f64) -> Result<usize> {
        self.add_blank_page(width, height)
    }

    fn embed_image(&mut self, bytes: &[u8]) -> Result<ImageHandle> {
        self.add_image(bytes)
    }

    fn draw_image(
        &mut self,
        page: usize,
        image: ImageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        self.insert_image(page, image, x, y, width, height)
    }

    fn embed_standard_font(&mut self, font: StandardFont) -> Result<FontHandle> {
        Ok(self.add_standard_font(font))
    }

    fn embed_font(&mut self, name: &str, bytes: &[u8]) -> Result<FontHandle> {
        self.add_font(name, bytes)
    }

    fn text_width(&self, font: FontHandle, text: &str, size: f64) -> Result<f64> {
        self.get_text_width(font, text, size)
    }

    fn draw_text(
        &mut self,
        page: usize,
        text: &str,
        font: FontHandle,
        draw: &TextDraw,
    ) -> Result<()> {
        self.insert_text(page, text, font, draw)
    }

    fn save(&mut self) -> Result<Vec<u8>> {
        self.to_bytes()
    }
}

fn hash_bytes(data: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}

fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(*v as f64),
        _ => None,
    }
}

/// First `{prefix}{n}` not present in `taken`
fn next_free_name(prefix: &str, taken: &[Vec<u8>]) -> String {
    (1..)
        .map(|n| format!("{prefix}{n}"))
        .find(|name| !taken.iter().any(|t| t.as_slice() == name.as_bytes()))
        .unwrap_or_else(|| prefix.to_string())
}
