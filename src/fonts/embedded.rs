//! Fonts embedded as CID-keyed Type0 composite fonts.
//!
//! An [`EmbeddedFont`] wraps a parsed [`FontProgram`], records every glyph the
//! document uses, and at finalize writes the font dictionaries:
//!
//! ```text
//! Type0 (Identity-H) ─┬─ DescendantFonts ─ CIDFontType2/0 ─ FontDescriptor ─┬─ FontFile2/3
//!                     │                                                    └─ CIDSet
//!                     └─ ToUnicode
//! ```

use super::cmap::ToUnicodeCMap;
use super::font_subsetter::{subset_font_name, CidAssignment, CidWidths, GlyphTable};
use super::program::{FontLoader, FontProgram, GlyphRun, OutlineFormat};
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use crate::writer::object_table::ObjectTable;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// A font program bound to one document.
pub struct EmbeddedFont {
    id: String,
    program: Box<dyn FontProgram>,
    dictionary: ObjectRef,
    glyphs: GlyphTable,
    layout_cache: Option<HashMap<String, Rc<GlyphRun>>>,
    embedded: bool,
}

impl fmt::Debug for EmbeddedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedFont")
            .field("id", &self.id)
            .field("postscript_name", &self.program.postscript_name())
            .field("dictionary", &self.dictionary)
            .field("glyphs", &self.glyphs.len())
            .field("embedded", &self.embedded)
            .finish()
    }
}

impl EmbeddedFont {
    /// Parse `data` and allocate the font's dictionary object.
    ///
    /// Nothing is allocated when the bytes are rejected.
    pub fn open(
        table: &mut ObjectTable,
        loader: &dyn FontLoader,
        data: &[u8],
        family: Option<&str>,
        id: impl Into<String>,
        layout_cache: bool,
    ) -> Result<Self> {
        let program = loader.open(data, family)?;
        Ok(Self::from_program(table, program, id, layout_cache))
    }

    /// Bind an already parsed program.
    pub fn from_program(
        table: &mut ObjectTable,
        program: Box<dyn FontProgram>,
        id: impl Into<String>,
        layout_cache: bool,
    ) -> Self {
        let id = id.into();
        let assignment = match program.outline_format() {
            OutlineFormat::TrueType => CidAssignment::Dense,
            OutlineFormat::Cff => CidAssignment::Identity,
        };
        let dictionary = table.create(Object::dict(vec![("Type", Object::name("Font"))]));
        log::debug!(
            "Opened font {} ('{}') as object {}",
            id,
            program.postscript_name(),
            dictionary
        );
        Self {
            id,
            program,
            dictionary,
            glyphs: GlyphTable::new(assignment),
            layout_cache: layout_cache.then(HashMap::new),
            embedded: false,
        }
    }

    /// Resource name, e.g. `F1`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Reference to the Type0 font dictionary.
    pub fn dictionary(&self) -> ObjectRef {
        self.dictionary
    }

    /// The wrapped program.
    pub fn program(&self) -> &dyn FontProgram {
        self.program.as_ref()
    }

    /// `TAG+PostScriptName`.
    pub fn base_font_name(&self) -> String {
        subset_font_name(&self.id, self.program.postscript_name())
    }

    /// Distinct glyphs registered so far, `.notdef` included.
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// The used-glyph table.
    pub fn glyphs(&self) -> &GlyphTable {
        &self.glyphs
    }

    /// Whether [`embed`](Self::embed) has run.
    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    /// Shape `text`, reusing a cached run for identical input.
    pub fn layout(&mut self, text: &str) -> Rc<GlyphRun> {
        if let Some(run) = self.layout_cache.as_ref().and_then(|c| c.get(text)) {
            return Rc::clone(run);
        }
        let run = Rc::new(GlyphRun::new(text, self.program.shape(text)));
        if let Some(cache) = self.layout_cache.as_mut() {
            cache.insert(text.to_string(), Rc::clone(&run));
        }
        run
    }

    /// Shape `text`, register its glyphs and return the hex string operand
    /// for `Tj`.
    pub fn encode(&mut self, text: &str) -> String {
        let run = self.layout(text);
        let mut hex = String::with_capacity(run.len() * 4 + 2);
        hex.push('<');
        for (glyph, source) in run.iter() {
            let cid = self.glyphs.register(glyph.glyph_id, source);
            hex.push_str(&format!("{:04X}", cid));
        }
        hex.push('>');
        hex
    }

    /// Width of `text` at `size` points.
    pub fn width_of(&mut self, text: &str, size: f64) -> f64 {
        let advance = self.layout(text).advance();
        self.program.metrics().scale(advance as i32) * size / 1000.0
    }

    /// Ascender at `size` points.
    pub fn ascender(&self, size: f64) -> f64 {
        let metrics = self.program.metrics();
        metrics.scale(metrics.ascender as i32) * size / 1000.0
    }

    /// `/CIDSet` bitmask for the registered glyphs.
    pub fn cid_set(&self) -> Vec<u8> {
        self.glyphs.cid_set()
    }

    /// ToUnicode map for the registered glyphs.
    pub fn to_unicode_cmap(&self) -> ToUnicodeCMap {
        ToUnicodeCMap::from_mappings(self.glyphs.iter().map(|g| (g.cid, g.text.as_str())))
    }

    fn scaled(&self, value: i32) -> i64 {
        self.program.metrics().scale(value).round() as i64
    }

    fn widths(&self) -> CidWidths {
        let widths: BTreeMap<u16, i64> = self
            .glyphs
            .iter()
            .map(|g| (g.cid, self.scaled(self.program.glyph_advance(g.glyph_id) as i32)))
            .collect();
        CidWidths::compute(&widths)
    }

    /// Write the font program and dictionaries, then complete the Type0
    /// dictionary.
    ///
    /// Objects are allocated in the order: font file, CIDSet, descriptor,
    /// CIDToGIDMap (whole TrueType programs only), descendant font, ToUnicode.
    pub fn embed(&mut self, table: &mut ObjectTable) -> Result<()> {
        if self.embedded {
            return Err(Error::Invariant(format!("font {} embedded twice", self.id)));
        }
        let format = self.program.outline_format();
        let base_font = self.base_font_name();

        let subset = match format {
            OutlineFormat::TrueType => self.program.subset(&self.glyphs.glyph_ids()),
            OutlineFormat::Cff => None,
        };
        if subset.is_none() && format == OutlineFormat::TrueType {
            log::warn!("Font {} cannot be subset; embedding the whole program", self.id);
        }

        // Font program
        let font_file = match (&subset, format) {
            (Some(data), _) => table.create_stream(
                Object::dict(vec![("Length1", Object::Integer(data.len() as i64))]),
                data,
            ),
            (None, OutlineFormat::TrueType) => {
                let data = self.program.data();
                table.create_stream(
                    Object::dict(vec![("Length1", Object::Integer(data.len() as i64))]),
                    data,
                )
            },
            (None, OutlineFormat::Cff) => table.create_stream(
                Object::dict(vec![("Subtype", Object::name("OpenType"))]),
                self.program.data(),
            ),
        };
        table.end(font_file)?;

        let cid_set = table.create_stream(Object::dict(vec![]), &self.glyphs.cid_set());
        table.end(cid_set)?;

        let metrics = self.program.metrics();
        let bbox = metrics.bbox;
        let font_file_key = match format {
            OutlineFormat::TrueType => "FontFile2",
            OutlineFormat::Cff => "FontFile3",
        };
        let descriptor = table.create(Object::dict(vec![
            ("Type", Object::name("FontDescriptor")),
            ("FontName", Object::name(base_font.as_str())),
            ("Flags", Object::Integer(metrics.descriptor_flags().bits() as i64)),
            (
                "FontBBox",
                Object::Array(
                    bbox.iter()
                        .map(|&v| Object::Integer(self.scaled(v as i32)))
                        .collect(),
                ),
            ),
            ("ItalicAngle", Object::Real(metrics.italic_angle as f64)),
            ("Ascent", Object::Integer(self.scaled(metrics.ascender as i32))),
            ("Descent", Object::Integer(self.scaled(metrics.descender as i32))),
            ("CapHeight", Object::Integer(self.scaled(metrics.cap_height as i32))),
            ("XHeight", Object::Integer(self.scaled(metrics.x_height as i32))),
            ("StemV", Object::Integer(0)),
            (font_file_key, Object::Reference(font_file)),
            ("CIDSet", Object::Reference(cid_set)),
        ]));
        table.end(descriptor)?;

        let cid_to_gid = match (format, &subset) {
            (OutlineFormat::TrueType, None) => {
                let map = table.create_stream(Object::dict(vec![]), &self.glyphs.cid_to_gid_map()?);
                table.end(map)?;
                Some(Object::Reference(map))
            },
            (OutlineFormat::TrueType, Some(_)) => Some(Object::name("Identity")),
            (OutlineFormat::Cff, _) => None,
        };

        let widths = self.widths();
        let subtype = match format {
            OutlineFormat::TrueType => "CIDFontType2",
            OutlineFormat::Cff => "CIDFontType0",
        };
        let mut descendant = vec![
            ("Type", Object::name("Font")),
            ("Subtype", Object::name(subtype)),
            ("BaseFont", Object::name(base_font.as_str())),
            (
                "CIDSystemInfo",
                Object::dict(vec![
                    ("Registry", Object::text("Adobe")),
                    ("Ordering", Object::text("Identity")),
                    ("Supplement", Object::Integer(0)),
                ]),
            ),
            ("FontDescriptor", Object::Reference(descriptor)),
            ("DW", Object::Integer(widths.default_width)),
            ("W", widths.to_array()),
        ];
        if let Some(map) = cid_to_gid {
            descendant.push(("CIDToGIDMap", map));
        }
        let descendant = table.create(Object::dict(descendant));
        table.end(descendant)?;

        let cmap = self.to_unicode_cmap().to_cmap_string();
        let to_unicode = table.create_stream(Object::dict(vec![]), cmap.as_bytes());
        table.end(to_unicode)?;

        let dict = table.dict_mut(self.dictionary)?;
        dict.insert("Subtype".to_string(), Object::name("Type0"));
        dict.insert("BaseFont".to_string(), Object::name(base_font.as_str()));
        dict.insert("Encoding".to_string(), Object::name("Identity-H"));
        dict.insert(
            "DescendantFonts".to_string(),
            Object::Array(vec![Object::Reference(descendant)]),
        );
        dict.insert("ToUnicode".to_string(), Object::Reference(to_unicode));
        table.end(self.dictionary)?;

        self.embedded = true;
        log::debug!(
            "Embedded font {} as {} with {} glyphs",
            self.id,
            base_font,
            self.glyphs.len()
        );
        Ok(())
    }
}
