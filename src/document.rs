//! Document assembly.
//!
//! [`PdfDocument`] owns the object table and the write pipeline. Objects are
//! allocated as content is added and pushed to the sink as soon as they are
//! complete, so memory use is bounded by the page retention window plus the
//! few objects that stay open until [`PdfDocument::finish`] (catalog, page
//! tree, name dictionary and font dictionaries).
//!
//! ```ignore
//! use pdf_quill::{DocumentOptions, PdfDocument};
//!
//! let options = DocumentOptions::new("Roboto", std::fs::read("Roboto.ttf")?);
//! let mut doc = PdfDocument::new(options)?;
//! doc.text("Roboto", 12.0, 72.0, 720.0, "Hello")?;
//! let bytes = doc.finish()?;
//! ```

use crate::compliance::{pdf_a, pdf_ua, Subset};
use crate::config::{DocumentOptions, PdfVersion};
use crate::encryption::{self, EncryptionProvider};
use crate::error::{Error, Result};
use crate::fonts::{EmbeddedFont, FontLoader, TrueTypeLoader};
use crate::object::{Dictionary, NameTree, Object, ObjectRef};
use crate::writer::embedded_files::{
    embed_file, AttachmentOptions, AttachmentRegistry, AttachmentSink, AttachmentSource,
};
use crate::writer::image_handler::{ImageData, ImagePlacement};
use crate::writer::object_serializer::format_number;
use crate::writer::object_table::ObjectTable;
use crate::writer::page::{Page, PageEvent};
use crate::writer::pdf_writer::{PdfWriter, Trailer, WriteContext};
use crate::writer::xmp_metadata::XmpWriter;
use indexmap::IndexMap;
use std::collections::VecDeque;
use std::io::Write;

/// Callback invoked for every page added to the document.
pub type PageObserver = Box<dyn FnMut(&PageEvent)>;

/// An image XObject that can be drawn on any page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle {
    /// Resource name, e.g. `Im1`
    pub name: String,
    /// The image XObject
    pub reference: ObjectRef,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Configures the sink and the pluggable parts of a document.
pub struct DocumentBuilder<W: Write = Vec<u8>> {
    options: DocumentOptions,
    sink: W,
    font_loader: Box<dyn FontLoader>,
    encryption: Option<Box<dyn EncryptionProvider>>,
}

impl DocumentBuilder<Vec<u8>> {
    /// Builder writing to an in-memory buffer.
    pub fn new(options: DocumentOptions) -> Self {
        Self {
            options,
            sink: Vec::new(),
            font_loader: Box::new(TrueTypeLoader::new()),
            encryption: None,
        }
    }
}

impl<W: Write> DocumentBuilder<W> {
    /// Write to `sink` instead.
    pub fn sink<S: Write>(self, sink: S) -> DocumentBuilder<S> {
        DocumentBuilder {
            options: self.options,
            sink,
            font_loader: self.font_loader,
            encryption: self.encryption,
        }
    }

    /// Replace the font parser.
    pub fn font_loader(mut self, loader: impl FontLoader + 'static) -> Self {
        self.font_loader = Box::new(loader);
        self
    }

    /// Install an encryption handler.
    pub fn encryption(mut self, provider: impl EncryptionProvider + 'static) -> Self {
        self.encryption = Some(Box::new(provider));
        self
    }

    /// Validate the options, write the header and allocate the fixed objects.
    pub fn build(self) -> Result<PdfDocument<W>> {
        PdfDocument::construct(self)
    }
}

/// A document being written.
pub struct PdfDocument<W: Write = Vec<u8>> {
    options: DocumentOptions,
    table: ObjectTable,
    writer: PdfWriter<W>,
    encryption: Option<Box<dyn EncryptionProvider>>,
    font_loader: Box<dyn FontLoader>,
    file_id: Vec<u8>,
    pages_ref: ObjectRef,
    names_ref: ObjectRef,
    catalog_ref: ObjectRef,
    struct_tree: Option<ObjectRef>,
    encrypt_ref: Option<ObjectRef>,
    kids: Vec<ObjectRef>,
    buffered: VecDeque<Page>,
    buffer_start: usize,
    active: Option<usize>,
    observers: Vec<PageObserver>,
    fonts: IndexMap<String, EmbeddedFont>,
    default_font: String,
    images: usize,
    attachments: AttachmentRegistry,
    associated_files: Vec<ObjectRef>,
    embedded_files: NameTree,
}

impl PdfDocument<Vec<u8>> {
    /// Create a document writing to an in-memory buffer.
    pub fn new(options: DocumentOptions) -> Result<Self> {
        DocumentBuilder::new(options).build()
    }

    /// Start configuring a document.
    pub fn builder(options: DocumentOptions) -> DocumentBuilder<Vec<u8>> {
        DocumentBuilder::new(options)
    }
}

impl<W: Write> PdfDocument<W> {
    fn construct(builder: DocumentBuilder<W>) -> Result<Self> {
        let DocumentBuilder {
            mut options,
            sink,
            font_loader,
            encryption,
        } = builder;

        options.validate()?;
        let encryption = encryption::create(&options.security, encryption)?;

        let default_font = options.font.clone().unwrap_or_default();
        let program = font_loader.open(
            options.font_data.as_deref().unwrap_or_default(),
            Some(&default_font),
        )?;

        let file_id = encryption::generate_file_id(&options.info);
        let mut writer = PdfWriter::new(sink);
        writer.write_header(options.pdf_version.as_str())?;

        let mut table = ObjectTable::new();
        let pages_ref = table.create(Object::dict(vec![("Type", Object::name("Pages"))]));
        let names_ref = table.create(Object::dict(vec![]));
        let catalog_ref = table.create(Object::dict(vec![
            ("Type", Object::name("Catalog")),
            ("Pages", Object::Reference(pages_ref)),
            ("Names", Object::Reference(names_ref)),
        ]));

        let struct_tree = options
            .tagged
            .then(|| table.create(Object::dict(vec![("Type", Object::name("StructTreeRoot"))])));

        let encrypt_ref = match encryption.as_deref() {
            Some(provider) => {
                let dict = provider.encrypt_dictionary(&file_id, &options.security);
                let r = table.create(Object::Dictionary(dict));
                let obj = table.get_mut(r)?;
                obj.set_encrypt(false);
                obj.end();
                Some(r)
            },
            None => None,
        };

        let font = EmbeddedFont::from_program(&mut table, program, "F1", options.font_layout_cache);
        let mut fonts = IndexMap::new();
        fonts.insert(default_font.clone(), font);

        log::info!(
            "Started PDF {} document (subset: {}, tagged: {}, encrypted: {})",
            options.pdf_version,
            options.subset.map(|s| s.to_string()).unwrap_or_else(|| "none".to_string()),
            options.tagged,
            encrypt_ref.is_some()
        );

        let auto_first_page = options.auto_first_page;
        let mut doc = Self {
            options,
            table,
            writer,
            encryption,
            font_loader,
            file_id,
            pages_ref,
            names_ref,
            catalog_ref,
            struct_tree,
            encrypt_ref,
            kids: Vec::new(),
            buffered: VecDeque::new(),
            buffer_start: 0,
            active: None,
            observers: Vec::new(),
            fonts,
            default_font,
            images: 0,
            attachments: AttachmentRegistry::new(),
            associated_files: Vec::new(),
            embedded_files: NameTree::new(),
        };
        if auto_first_page {
            doc.add_page()?;
        }
        Ok(doc)
    }

    /// The validated options.
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// The permanent file identifier written to the trailer.
    pub fn file_id(&self) -> &[u8] {
        &self.file_id
    }

    /// Allocated objects.
    pub fn objects(&self) -> &ObjectTable {
        &self.table
    }

    /// Bytes written to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.writer.position()
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Register a callback run whenever a page is added.
    pub fn on_page_added(&mut self, observer: impl FnMut(&PageEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Add a page and make it the active one.
    ///
    /// Pages beyond the retention window are committed oldest first and
    /// every completed object is flushed to the sink.
    pub fn add_page(&mut self) -> Result<ObjectRef> {
        let index = self.kids.len();
        let page = Page::create(&mut self.table, self.pages_ref, index, self.options.size);
        let page_ref = page.dictionary();
        self.kids.push(page_ref);
        self.buffered.push_back(page);
        self.active = Some(index);

        let event = PageEvent {
            index,
            page: page_ref,
        };
        for observer in &mut self.observers {
            observer(&event);
        }

        if let Some(capacity) = self.options.buffer_pages.capacity() {
            while self.buffered.len() > capacity {
                self.commit_oldest()?;
            }
        }
        self.flush()?;
        Ok(page_ref)
    }

    /// Buffered pages as `(first index, count)`.
    pub fn buffered_page_range(&self) -> (usize, usize) {
        (self.buffer_start, self.buffered.len())
    }

    /// Make a buffered page the active one.
    pub fn switch_to_page(&mut self, index: usize) -> Result<()> {
        let end = self.buffer_start + self.buffered.len();
        if !(self.buffer_start..end).contains(&index) {
            return Err(Error::NotFound(format!(
                "page {} is not buffered (buffered pages {}..{})",
                index, self.buffer_start, end
            )));
        }
        self.active = Some(index);
        Ok(())
    }

    /// Commit every buffered page and flush.
    ///
    /// No page is active afterwards.
    pub fn flush_pages(&mut self) -> Result<()> {
        while !self.buffered.is_empty() {
            self.commit_oldest()?;
        }
        self.active = None;
        self.flush()?;
        Ok(())
    }

    fn commit_oldest(&mut self) -> Result<()> {
        if let Some(page) = self.buffered.pop_front() {
            page.commit(&mut self.table)?;
            self.buffer_start += 1;
            if self.active.is_some_and(|a| a < self.buffer_start) {
                self.active = None;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<usize> {
        let ctx = WriteContext {
            compress: self.options.compress,
            encryption: self.encryption.as_deref(),
        };
        self.writer.flush_ready(&mut self.table, &ctx)
    }

    fn active_page(
        buffered: &mut VecDeque<Page>,
        buffer_start: usize,
        active: Option<usize>,
    ) -> Result<&mut Page> {
        active
            .and_then(|index| index.checked_sub(buffer_start))
            .and_then(|offset| buffered.get_mut(offset))
            .ok_or_else(|| Error::NotFound("no active page".to_string()))
    }

    /// Append raw operators to the active page's content stream.
    pub fn append_content(&mut self, operators: &[u8]) -> Result<()> {
        let page = Self::active_page(&mut self.buffered, self.buffer_start, self.active)?;
        page.append(&mut self.table, operators)
    }

    /// Parse and register an additional font under `name`.
    ///
    /// Registering an existing name is a no-op.
    pub fn register_font(&mut self, name: &str, data: &[u8], family: Option<&str>) -> Result<()> {
        if self.fonts.contains_key(name) {
            log::debug!("Font '{}' already registered", name);
            return Ok(());
        }
        let id = format!("F{}", self.fonts.len() + 1);
        let font = EmbeddedFont::open(
            &mut self.table,
            self.font_loader.as_ref(),
            data,
            family.or(Some(name)),
            id,
            self.options.font_layout_cache,
        )?;
        self.fonts.insert(name.to_string(), font);
        Ok(())
    }

    /// Name of the font given in the options.
    pub fn default_font(&self) -> &str {
        &self.default_font
    }

    /// A registered font.
    pub fn font_mut(&mut self, name: &str) -> Result<&mut EmbeddedFont> {
        self.fonts
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("font '{}' is not registered", name)))
    }

    /// Draw `text` on the active page with its baseline origin at `(x, y)`.
    ///
    /// Glyphs are registered with the font only once the page, font and
    /// coordinates are known to be valid.
    pub fn text(&mut self, font: &str, size: f64, x: f64, y: f64, text: &str) -> Result<()> {
        let page = Self::active_page(&mut self.buffered, self.buffer_start, self.active)?;
        let font = self
            .fonts
            .get_mut(font)
            .ok_or_else(|| Error::NotFound(format!("font '{}' is not registered", font)))?;
        let (size, x, y) = (format_number(size)?, format_number(x)?, format_number(y)?);
        let operand = font.encode(text);
        let ops = format!("BT\n/{} {} Tf\n{} {} Td\n{} Tj\nET\n", font.id(), size, x, y, operand);

        page.use_font(font.id(), font.dictionary());
        page.append(&mut self.table, ops.as_bytes())
    }

    /// Embed a JPEG or PNG image.
    ///
    /// `label` names the image in error messages.
    pub fn embed_image(&mut self, data: &[u8], label: &str) -> Result<ImageHandle> {
        let image = ImageData::from_bytes(data, label)?;

        let soft_mask = match (image.build_soft_mask_dict(), image.soft_mask.as_deref()) {
            (Some(dict), Some(alpha)) => {
                let r = self.table.create_stream(Object::Dictionary(dict), alpha);
                self.table.end(r)?;
                Some(r)
            },
            _ => None,
        };

        let reference = self
            .table
            .create_stream(Object::Dictionary(image.build_xobject_dict(soft_mask)), &image.data);
        self.table.end(reference)?;

        self.images += 1;
        let name = format!("Im{}", self.images);
        log::debug!(
            "Embedded {:?} image '{}' ({}x{}) as {} {}",
            image.format,
            label,
            image.width,
            image.height,
            name,
            reference
        );
        Ok(ImageHandle {
            name,
            reference,
            width: image.width,
            height: image.height,
        })
    }

    /// Draw an embedded image on the active page.
    pub fn draw_image(&mut self, image: &ImageHandle, placement: ImagePlacement) -> Result<()> {
        let ops = placement.to_operators(&image.name)?;
        let page = Self::active_page(&mut self.buffered, self.buffer_start, self.active)?;
        page.use_xobject(&image.name, image.reference);
        page.append(&mut self.table, ops.as_bytes())
    }

    /// Attach a file, returning its file specification.
    ///
    /// Identical content under the same name shares one embedded stream.
    pub fn file(
        &mut self,
        source: impl Into<AttachmentSource>,
        options: AttachmentOptions,
    ) -> Result<ObjectRef> {
        embed_file(self, source.into(), options)
    }

    /// Complete every object, write the cross-reference table and trailer,
    /// and return the sink.
    pub fn finish(mut self) -> Result<W> {
        while !self.buffered.is_empty() {
            self.commit_oldest()?;
        }
        self.active = None;

        let info_dict: Dictionary = self.options.info.entries().into_iter().collect();
        let info = self.table.create(Object::Dictionary(info_dict));
        self.table.end(info)?;

        for font in self.fonts.values_mut() {
            font.embed(&mut self.table)?;
        }

        let output_intent = match self.options.pdfa_level() {
            Some(_) => Some(pdf_a::append_output_intent(
                &mut self.table,
                self.options.color_profile.as_deref(),
            )?),
            None => None,
        };

        let metadata = if self.options.pdf_version >= PdfVersion::V1_4 {
            let xmp = XmpWriter::from_info(&self.options.info)
                .conformance(self.options.subset)
                .build_bytes();
            let r = self.table.create_stream(
                Object::dict(vec![
                    ("Type", Object::name("Metadata")),
                    ("Subtype", Object::name("XML")),
                ]),
                &xmp,
            );
            let obj = self.table.get_mut(r)?;
            obj.set_compress(false);
            obj.end();
            Some(r)
        } else {
            None
        };

        self.fill_catalog(output_intent, metadata)?;

        self.table.end_all();
        self.flush()?;
        let trailer = Trailer {
            root: self.catalog_ref,
            info,
            id: self.file_id.clone(),
            encrypt: self.encrypt_ref,
        };
        self.writer.write_xref_and_trailer(&self.table, &trailer)?;
        log::info!(
            "Finished document: {} pages, {} objects, {} bytes",
            self.kids.len(),
            self.table.len(),
            self.writer.position()
        );
        self.writer.into_inner()
    }

    fn fill_catalog(&mut self, output_intent: Option<ObjectRef>, metadata: Option<ObjectRef>) -> Result<()> {
        let pages = self.table.dict_mut(self.pages_ref)?;
        pages.insert(
            "Kids".to_string(),
            Object::Array(self.kids.iter().copied().map(Object::Reference).collect()),
        );
        pages.insert("Count".to_string(), Object::Integer(self.kids.len() as i64));

        if !self.embedded_files.is_empty() {
            let names = self.table.dict_mut(self.names_ref)?;
            names.insert(
                "EmbeddedFiles".to_string(),
                Object::Tree(std::mem::take(&mut self.embedded_files)),
            );
        }

        let catalog = self.table.dict_mut(self.catalog_ref)?;
        if !self.associated_files.is_empty() {
            catalog.insert(
                "AF".to_string(),
                Object::Array(self.associated_files.iter().copied().map(Object::Reference).collect()),
            );
        }
        if let Some(metadata) = metadata {
            catalog.insert("Metadata".to_string(), Object::Reference(metadata));
        }
        if let Some(intent) = output_intent {
            catalog.insert("OutputIntents".to_string(), Object::Array(vec![Object::Reference(intent)]));
        }
        if let Some(struct_tree) = self.struct_tree {
            catalog.insert("MarkInfo".to_string(), Object::dict(vec![("Marked", Object::Boolean(true))]));
            catalog.insert("StructTreeRoot".to_string(), Object::Reference(struct_tree));
        }
        if let Some(lang) = &self.options.lang {
            catalog.insert("Lang".to_string(), Object::text(lang.clone()));
        }
        if self.options.display_title {
            catalog.insert(
                "ViewerPreferences".to_string(),
                Object::dict(vec![("DisplayDocTitle", Object::Boolean(true))]),
            );
        }
        if self.options.subset == Some(Subset::PdfUA) {
            pdf_ua::apply_catalog_entries(catalog);
        }
        Ok(())
    }
}

impl<W: Write> AttachmentSink for PdfDocument<W> {
    fn add_stream(&mut self, dict: Dictionary, data: &[u8]) -> Result<ObjectRef> {
        let r = self.table.create_stream(Object::Dictionary(dict), data);
        self.table.end(r)?;
        Ok(r)
    }

    fn add_object(&mut self, dict: Dictionary) -> Result<ObjectRef> {
        let r = self.table.create(Object::Dictionary(dict));
        self.table.end(r)?;
        Ok(r)
    }

    fn attachment_registry(&mut self) -> &mut AttachmentRegistry {
        &mut self.attachments
    }

    fn register_attachment(&mut self, name: &str, filespec: ObjectRef, hidden: bool) -> Result<()> {
        self.associated_files.push(filespec);
        if !hidden {
            self.embedded_files.insert(name.to_string(), Object::Reference(filespec));
        }
        Ok(())
    }
}
